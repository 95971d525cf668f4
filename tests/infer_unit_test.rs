//! Unit tests for foreign key inference over hand-built snapshots.

use schema_erd::infer::{
    dedup_against_explicit, extract_foreign_keys, infer, potential_key_for,
    resolve_potential_foreign_keys, InferOptions,
};
use schema_erd::schema::{ForeignKey, Snapshot, SnapshotColumn, SnapshotTable, Table};

fn fk(src_table: &str, src_column: &str, dest_table: &str, dest_column: &str) -> ForeignKey {
    ForeignKey::new(src_table, src_column, dest_table, dest_column)
}

fn tables(names: &[&str]) -> Vec<Table> {
    names
        .iter()
        .map(|n| Table::from_snapshot(&SnapshotTable::new(*n)))
        .collect()
}

fn shop_snapshot() -> Snapshot {
    Snapshot::new()
        .with_table(
            SnapshotTable::new("customers")
                .with_column(SnapshotColumn::new("id", "integer"))
                .with_column(SnapshotColumn::new("name", "text")),
        )
        .with_table(
            SnapshotTable::new("orders")
                .with_column(SnapshotColumn::new("id", "integer"))
                .with_column(
                    SnapshotColumn::new("customer_id", "integer").references("customers", "id"),
                )
                .with_column(SnapshotColumn::new("warehouse_id", "integer"))
                .with_column(SnapshotColumn::new("coupon_id", "integer")),
        )
        .with_table(
            SnapshotTable::new("warehouse")
                .with_column(SnapshotColumn::new("id", "integer"))
                .with_column(SnapshotColumn::new("region_id", "integer")),
        )
}

mod extract_tests {
    use super::*;

    #[test]
    fn test_declared_and_naming_keys_on_same_column() {
        let snapshot = shop_snapshot();
        let keys = extract_foreign_keys(&snapshot.tables).unwrap();

        assert_eq!(keys.explicit, vec![fk("orders", "customer_id", "customers", "id")]);
        assert!(keys
            .potential
            .contains(&fk("orders", "customer_id", "customer", "id")));
    }

    #[test]
    fn test_every_id_column_is_proposed() {
        let snapshot = shop_snapshot();
        let keys = extract_foreign_keys(&snapshot.tables).unwrap();

        // three bare `id` columns plus four `<noun>_id` columns
        assert_eq!(keys.potential.len(), 7);
        assert_eq!(keys.potential[0], fk("customers", "id", "", "id"));
    }

    #[test]
    fn test_multi_word_noun() {
        assert_eq!(
            potential_key_for("lines", "order_item_id"),
            Some(fk("lines", "order_item_id", "order_item", "id"))
        );
        assert_eq!(potential_key_for("lines", "order_item_uuid"), None);
        assert_eq!(potential_key_for("lines", "idea"), None);
    }

    #[test]
    fn test_malformed_reference_is_fatal() {
        let snapshot = Snapshot::new().with_table(SnapshotTable::new("a").with_column(
            SnapshotColumn {
                name: "b_id".to_string(),
                col_type: "int".to_string(),
                references: vec!["public.b.id".to_string()],
            },
        ));

        let err = extract_foreign_keys(&snapshot.tables).unwrap_err();
        assert!(err.to_string().contains("public.b.id"));
    }
}

mod resolve_tests {
    use super::*;

    #[test]
    fn test_singular_noun_resolves_to_plural_table() {
        let resolved = resolve_potential_foreign_keys(
            &tables(&["customers"]),
            &[fk("orders", "customer_id", "customer", "id")],
        );
        assert_eq!(resolved, vec![fk("orders", "customer_id", "customers", "id")]);
    }

    #[test]
    fn test_singular_table_name_matches_directly() {
        let resolved = resolve_potential_foreign_keys(
            &tables(&["warehouse"]),
            &[fk("orders", "warehouse_id", "warehouse", "id")],
        );
        assert_eq!(resolved, vec![fk("orders", "warehouse_id", "warehouse", "id")]);
    }

    #[test]
    fn test_y_plural() {
        let resolved = resolve_potential_foreign_keys(
            &tables(&["categories"]),
            &[fk("posts", "category_id", "category", "id")],
        );
        assert_eq!(resolved, vec![fk("posts", "category_id", "categories", "id")]);
    }

    #[test]
    fn test_irregular_plurals() {
        let resolved = resolve_potential_foreign_keys(
            &tables(&["people", "mice", "children", "sales_people"]),
            &[
                fk("orders", "person_id", "person", "id"),
                fk("traps", "mouse_id", "mouse", "id"),
                fk("toys", "child_id", "child", "id"),
                fk("deals", "sales_person_id", "sales_person", "id"),
            ],
        );
        assert_eq!(
            resolved,
            vec![
                fk("orders", "person_id", "people", "id"),
                fk("traps", "mouse_id", "mice", "id"),
                fk("toys", "child_id", "children", "id"),
                fk("deals", "sales_person_id", "sales_people", "id"),
            ]
        );
    }

    #[test]
    fn test_ambiguous_key_is_dropped() {
        let resolved = resolve_potential_foreign_keys(
            &tables(&["user", "users"]),
            &[fk("orders", "user_id", "user", "id")],
        );
        assert!(resolved.is_empty());
    }

    #[test]
    fn test_case_sensitive_matching() {
        let resolved = resolve_potential_foreign_keys(
            &tables(&["Customers"]),
            &[fk("orders", "customer_id", "customer", "id")],
        );
        assert!(resolved.is_empty());
    }

    #[test]
    fn test_bare_id_never_resolves() {
        let resolved =
            resolve_potential_foreign_keys(&tables(&["customers"]), &[fk("customers", "id", "", "id")]);
        assert!(resolved.is_empty());
    }
}

mod dedup_tests {
    use super::*;

    #[test]
    fn test_declared_key_removes_guess() {
        let explicit = vec![fk("orders", "customer_id", "customers", "id")];
        let resolved = vec![
            fk("orders", "customer_id", "customers", "id"),
            fk("orders", "warehouse_id", "warehouse", "id"),
        ];

        let kept = dedup_against_explicit(resolved, &explicit);
        assert_eq!(kept, vec![fk("orders", "warehouse_id", "warehouse", "id")]);
    }

    #[test]
    fn test_all_four_fields_compared() {
        let explicit = vec![fk("orders", "customer_id", "customers", "uuid")];
        let resolved = vec![fk("orders", "customer_id", "customers", "id")];

        assert_eq!(dedup_against_explicit(resolved.clone(), &explicit), resolved);
    }
}

mod pipeline_tests {
    use super::*;

    #[test]
    fn test_shop_inference() {
        let inference = infer(&shop_snapshot(), &InferOptions::default()).unwrap();

        assert_eq!(
            inference.foreign_keys,
            vec![fk("orders", "customer_id", "customers", "id")]
        );
        // customer_id is declared, coupon and region have no table, bare ids never match
        assert_eq!(
            inference.potential_foreign_keys,
            vec![fk("orders", "warehouse_id", "warehouse", "id")]
        );

        let orders = inference.table("orders").unwrap();
        assert_eq!(orders.foreign_keys.len(), 1);
        assert_eq!(orders.potential_foreign_keys.len(), 1);
        assert!(inference.table("customers").unwrap().foreign_keys.is_empty());
        assert_eq!(inference.relationship_count(), 2);
    }

    #[test]
    fn test_inference_without_naming_guesses() {
        let options = InferOptions {
            potential_keys: false,
        };
        let inference = infer(&shop_snapshot(), &options).unwrap();

        assert_eq!(inference.foreign_keys.len(), 1);
        assert!(inference.potential_foreign_keys.is_empty());
    }

    #[test]
    fn test_empty_snapshot() {
        let inference = infer(&Snapshot::new(), &InferOptions::default()).unwrap();
        assert!(inference.tables.is_empty());
        assert_eq!(inference.relationship_count(), 0);
    }

    #[test]
    fn test_resolved_keys_point_at_real_tables() {
        let inference = infer(&shop_snapshot(), &InferOptions::default()).unwrap();

        for key in &inference.potential_foreign_keys {
            assert!(inference.table(&key.dest_table).is_some());
            assert!(!inference.foreign_keys.contains(key));
        }
    }
}
