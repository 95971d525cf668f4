//! Removal of resolved keys the schema already declares.

use crate::schema::ForeignKey;
use ahash::AHashSet;

/// Drop every resolved key equal (all four fields) to an explicit key,
/// keeping the order of the rest.
pub fn dedup_against_explicit(
    resolved: Vec<ForeignKey>,
    explicit: &[ForeignKey],
) -> Vec<ForeignKey> {
    let declared: AHashSet<&ForeignKey> = explicit.iter().collect();
    resolved
        .into_iter()
        .filter(|key| !declared.contains(key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_declared_duplicates() {
        let explicit = vec![ForeignKey::new("orders", "customer_id", "customers", "id")];
        let resolved = vec![
            ForeignKey::new("orders", "customer_id", "customers", "id"),
            ForeignKey::new("orders", "product_id", "products", "id"),
        ];

        assert_eq!(
            dedup_against_explicit(resolved, &explicit),
            vec![ForeignKey::new("orders", "product_id", "products", "id")]
        );
    }

    #[test]
    fn test_keeps_keys_differing_in_one_field() {
        let explicit = vec![ForeignKey::new("orders", "customer_id", "customers", "uuid")];
        let resolved = vec![
            ForeignKey::new("orders", "customer_id", "customers", "id"),
            ForeignKey::new("orders", "customer_id", "Customers", "uuid"),
        ];

        assert_eq!(dedup_against_explicit(resolved.clone(), &explicit), resolved);
    }

    #[test]
    fn test_is_idempotent() {
        let explicit = vec![ForeignKey::new("orders", "customer_id", "customers", "id")];
        let resolved = vec![
            ForeignKey::new("orders", "customer_id", "customers", "id"),
            ForeignKey::new("orders", "product_id", "products", "id"),
            ForeignKey::new("lines", "order_id", "orders", "id"),
        ];

        let once = dedup_against_explicit(resolved, &explicit);
        let twice = dedup_against_explicit(once.clone(), &explicit);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_explicit_keeps_everything() {
        let resolved = vec![ForeignKey::new("orders", "customer_id", "customers", "id")];
        assert_eq!(dedup_against_explicit(resolved.clone(), &[]), resolved);
    }
}
