//! Normalization of per-backend result shapes.

use crate::types::ScenarioResult;
use rust_decimal::Decimal;
use std::time::Duration;

/// Raw outputs of one scenario batch, as the operations produced them.
///
/// The driver crates already collapse driver-native types (RETURNING rows,
/// `last_insert_id()` integers, numeric wire formats) into these fields; the
/// aggregator finishes the job so every backend answers with the identical
/// [`ScenarioResult`] shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBatch {
    pub normal_insert_id: i64,
    pub slow_query_count: i64,
    pub wait_elapsed: Duration,
    pub blocking_read_price: Decimal,
}

/// Assemble the canonical record. The wait becomes elapsed milliseconds;
/// whatever scalar the backend's sleep primitive returned was discarded at
/// the driver boundary.
pub fn canonicalize(raw: RawBatch) -> ScenarioResult {
    ScenarioResult {
        normal_insert_id: raw.normal_insert_id,
        slow_query_count: raw.slow_query_count,
        wait_result: raw.wait_elapsed.as_millis() as u64,
        blocking_read_price: raw.blocking_read_price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_shape_is_stable() {
        let result = canonicalize(RawBatch {
            normal_insert_id: 7,
            slow_query_count: 9_981,
            wait_elapsed: Duration::from_millis(503),
            blocking_read_price: Decimal::new(12_345, 2),
        });
        assert_eq!(result.normal_insert_id, 7);
        assert_eq!(result.slow_query_count, 9_981);
        assert_eq!(result.wait_result, 503);
        assert_eq!(result.blocking_read_price, Decimal::new(12_345, 2));
    }

    #[test]
    fn serializes_with_stable_field_names() {
        let result = canonicalize(RawBatch {
            normal_insert_id: 1,
            slow_query_count: 2,
            wait_elapsed: Duration::from_millis(500),
            blocking_read_price: Decimal::new(1_000, 2),
        });
        let json = serde_json::to_value(&result).unwrap();
        for field in [
            "normal_insert_id",
            "slow_query_count",
            "wait_result",
            "blocking_read_price",
        ] {
            assert!(json.get(field).is_some(), "missing field {field}");
        }
    }
}
