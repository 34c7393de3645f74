//! Value classification.

use ryvr_types::JsonKind;
use serde_json::Value;

/// Maps a JSON value to its [`JsonKind`].
///
/// `None` stands for an absent value and classifies as `Undefined`. Null is
/// matched before the container arms and arrays before objects, so the
/// result never depends on arm order for those shapes.
pub fn classify(value: Option<&Value>) -> JsonKind {
    let Some(value) = value else {
        return JsonKind::Undefined;
    };
    match value {
        Value::Null => JsonKind::Null,
        Value::Array(_) => JsonKind::Array,
        Value::Object(_) => JsonKind::Object,
        Value::Bool(_) => JsonKind::Boolean,
        Value::Number(_) => JsonKind::Number,
        Value::String(_) => JsonKind::String,
    }
}

/// Returns true when the value renders as a selectable leaf.
pub fn is_leaf(value: Option<&Value>) -> bool {
    !classify(value).is_expandable()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_is_not_an_object() {
        assert_eq!(classify(Some(&Value::Null)), JsonKind::Null);
        assert_eq!(classify(Some(&json!({}))), JsonKind::Object);
    }

    #[test]
    fn classifies_every_shape() {
        let cases = [
            (json!(true), JsonKind::Boolean),
            (json!(1.5), JsonKind::Number),
            (json!(-3), JsonKind::Number),
            (json!("text"), JsonKind::String),
            (json!([]), JsonKind::Array),
            (json!([{ "a": 1 }]), JsonKind::Array),
            (json!({ "a": [] }), JsonKind::Object),
        ];
        for (value, expected) in cases {
            assert_eq!(classify(Some(&value)), expected, "value {value}");
        }
        assert_eq!(classify(None), JsonKind::Undefined);
    }

    #[test]
    fn leaves_are_scalars_and_absent_values() {
        assert!(is_leaf(Some(&json!("x"))));
        assert!(is_leaf(Some(&Value::Null)));
        assert!(is_leaf(None));
        assert!(!is_leaf(Some(&json!([]))));
    }
}
