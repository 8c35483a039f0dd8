//! Key/value field encoding for log records.
//!
//! Log calls take a flat list of extra values. How that list becomes a field map
//! depends only on its length:
//!
//! | values            | fields                                  |
//! |-------------------|-----------------------------------------|
//! | `[]`, `[v]`       | `{"data": [...]}` (the list verbatim)   |
//! | `[k1, v1, k2, v2]`| `{k1: v1, k2: v2}`                      |
//! | `[k1, v1, x]`     | `{k1: v1, "extra": x}`                  |

use serde_json::{Map, Value};

/// Key holding the raw list when fewer than two values are given
pub const DATA_KEY: &str = "data";

/// Key holding the trailing unpaired value of an odd-length list
pub const EXTRA_KEY: &str = "extra";

/// Build the field map for a list of extra log values
pub fn fields(keyvals: &[Value]) -> Map<String, Value> {
    let mut map = Map::new();

    if keyvals.len() <= 1 {
        map.insert(DATA_KEY.to_string(), Value::Array(keyvals.to_vec()));
        return map;
    }

    let mut pairs = keyvals.chunks_exact(2);
    for pair in &mut pairs {
        map.insert(key_string(&pair[0]), pair[1].clone());
    }
    if let [last] = pairs.remainder() {
        map.insert(EXTRA_KEY.to_string(), last.clone());
    }

    map
}

/// Render a key the way it would be printed: strings bare, everything else as JSON text
fn key_string(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_odd_count_puts_trailing_value_under_extra() {
        let out = fields(&["a".into(), "b".into(), "c".into()]);
        assert_eq!(Value::Object(out), json!({"a": "b", "extra": "c"}));
    }

    #[test]
    fn test_even_count_pairs_everything() {
        let out = fields(&["a".into(), "b".into(), "c".into(), "d".into()]);
        assert_eq!(Value::Object(out), json!({"a": "b", "c": "d"}));
    }

    #[test]
    fn test_zero_and_one_value_go_under_data() {
        assert_eq!(Value::Object(fields(&[])), json!({"data": []}));
        assert_eq!(
            Value::Object(fields(&[json!({"id": 7})])),
            json!({"data": [{"id": 7}]})
        );
    }

    #[test]
    fn test_non_string_keys_use_json_text() {
        let out = fields(&[json!(42), json!(true), json!(null), json!("x")]);
        assert_eq!(Value::Object(out), json!({"42": true, "null": "x"}));
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let out = fields(&["k".into(), 1.into(), "k".into(), 2.into()]);
        assert_eq!(Value::Object(out), json!({"k": 2}));
    }
}
