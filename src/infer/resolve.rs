//! Resolution of naming-convention keys against real table names.

use crate::schema::{ForeignKey, Table};
use tracing::debug;

/// English plural of a guessed table name, e.g. `category` -> `categories`.
///
/// Only the last `_`-separated word is inflected, so `sales_person` becomes
/// `sales_people`.
pub fn plural(name: &str) -> String {
    match name.rsplit_once('_') {
        Some((head, last)) if !last.is_empty() => format!("{}_{}", head, plural_word(last)),
        _ => plural_word(name),
    }
}

fn plural_word(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    pluralizer::pluralize(word, 2, false)
}

/// Match each potential key's guessed table against the real tables.
///
/// A table is a candidate when its name equals the guess or the guess's
/// plural, compared case-sensitively. Keys with exactly one candidate are
/// emitted pointing at that table's real name; the rest are dropped.
pub fn resolve_potential_foreign_keys(
    tables: &[Table],
    potential_foreign_keys: &[ForeignKey],
) -> Vec<ForeignKey> {
    let mut resolved = Vec::new();

    for potential in potential_foreign_keys {
        let plural_name = plural(&potential.dest_table);
        let candidates: Vec<&Table> = tables
            .iter()
            .filter(|t| t.name == potential.dest_table || t.name == plural_name)
            .collect();

        match candidates.as_slice() {
            [table] => resolved.push(ForeignKey {
                src_table: potential.src_table.clone(),
                src_column: potential.src_column.clone(),
                dest_table: table.name.clone(),
                dest_column: potential.dest_column.clone(),
            }),
            [] => debug!(key = %potential, "no table matches potential foreign key"),
            _ => debug!(
                key = %potential,
                candidates = candidates.len(),
                "ambiguous potential foreign key"
            ),
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SnapshotTable;

    fn tables(names: &[&str]) -> Vec<Table> {
        names
            .iter()
            .map(|n| Table::from_snapshot(&SnapshotTable::new(*n)))
            .collect()
    }

    #[test]
    fn test_plural_rules() {
        assert_eq!(plural("customer"), "customers");
        assert_eq!(plural("category"), "categories");
        assert_eq!(plural("company"), "companies");
        assert_eq!(plural("order_item"), "order_items");
        assert_eq!(plural(""), "");
    }

    #[test]
    fn test_plural_irregular_nouns() {
        assert_eq!(plural("person"), "people");
        assert_eq!(plural("mouse"), "mice");
        assert_eq!(plural("child"), "children");
        assert_eq!(plural("sales_person"), "sales_people");
    }

    #[test]
    fn test_resolves_plural_table_name() {
        let tables = tables(&["customers", "orders"]);
        let potential = vec![ForeignKey::new("orders", "customer_id", "customer", "id")];

        assert_eq!(
            resolve_potential_foreign_keys(&tables, &potential),
            vec![ForeignKey::new("orders", "customer_id", "customers", "id")]
        );
    }

    #[test]
    fn test_resolves_y_plural() {
        let tables = tables(&["categories", "products"]);
        let potential = vec![ForeignKey::new("products", "category_id", "category", "id")];

        let resolved = resolve_potential_foreign_keys(&tables, &potential);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].dest_table, "categories");
    }

    #[test]
    fn test_resolves_irregular_plurals() {
        let tables = tables(&["people", "mice", "children", "sales_people"]);
        let potential = vec![
            ForeignKey::new("orders", "person_id", "person", "id"),
            ForeignKey::new("traps", "mouse_id", "mouse", "id"),
            ForeignKey::new("toys", "child_id", "child", "id"),
            ForeignKey::new("deals", "sales_person_id", "sales_person", "id"),
        ];

        let resolved = resolve_potential_foreign_keys(&tables, &potential);
        let targets: Vec<&str> = resolved.iter().map(|k| k.dest_table.as_str()).collect();
        assert_eq!(targets, vec!["people", "mice", "children", "sales_people"]);
    }

    #[test]
    fn test_resolves_singular_table_name() {
        let tables = tables(&["customer", "orders"]);
        let potential = vec![ForeignKey::new("orders", "customer_id", "customer", "id")];

        let resolved = resolve_potential_foreign_keys(&tables, &potential);
        assert_eq!(resolved[0].dest_table, "customer");
    }

    #[test]
    fn test_drops_ambiguous_keys() {
        let tables = tables(&["customer", "customers", "orders"]);
        let potential = vec![ForeignKey::new("orders", "customer_id", "customer", "id")];

        assert!(resolve_potential_foreign_keys(&tables, &potential).is_empty());
    }

    #[test]
    fn test_drops_unmatched_keys() {
        let tables = tables(&["customers", "orders"]);
        let potential = vec![
            ForeignKey::new("orders", "warehouse_id", "warehouse", "id"),
            ForeignKey::new("orders", "id", "", "id"),
        ];

        assert!(resolve_potential_foreign_keys(&tables, &potential).is_empty());
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let tables = tables(&["customer", "customers"]);
        let potential = vec![ForeignKey::new("orders", "Customer_id", "Customer", "id")];

        assert!(resolve_potential_foreign_keys(&tables, &potential).is_empty());
    }

    #[test]
    fn test_keeps_input_order() {
        let tables = tables(&["customers", "products", "orders"]);
        let potential = vec![
            ForeignKey::new("orders", "product_id", "product", "id"),
            ForeignKey::new("orders", "customer_id", "customer", "id"),
        ];

        let resolved = resolve_potential_foreign_keys(&tables, &potential);
        let targets: Vec<&str> = resolved.iter().map(|k| k.dest_table.as_str()).collect();
        assert_eq!(targets, vec!["products", "customers"]);
    }
}
