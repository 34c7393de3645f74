//! Bounded, human-readable value previews.

use ryvr_types::JsonKind;
use serde_json::Value;

const STRING_PREVIEW_MAX: usize = 50;
const STRING_PREVIEW_KEEP: usize = 47;
const ARRAY_ITEM_STRING_MAX: usize = 20;
const INLINE_ARRAY_MAX_ITEMS: usize = 3;

/// Produces the one-line preview shown next to a node.
///
/// `kind` is normally `classify(value)`. When the two disagree, or the kind
/// is `Unknown`, the compact JSON text of the value is used instead.
pub fn preview(value: Option<&Value>, kind: JsonKind) -> String {
    match (kind, value) {
        (JsonKind::String, Some(Value::String(text))) => quoted_string(text),
        (JsonKind::Number, Some(Value::Number(number))) => number.to_string(),
        (JsonKind::Boolean, Some(Value::Bool(flag))) => flag.to_string(),
        (JsonKind::Null, Some(Value::Null)) => "null".to_string(),
        (JsonKind::Undefined, None) => "undefined".to_string(),
        (JsonKind::Array, Some(Value::Array(items))) => array_preview(items),
        (JsonKind::Object, Some(Value::Object(map))) => format!("{{{} keys}}", map.len()),
        (_, value) => fallback(value),
    }
}

fn quoted_string(text: &str) -> String {
    if text.is_empty() {
        return "\"\"".to_string();
    }
    if text.chars().count() > STRING_PREVIEW_MAX {
        let kept: String = text.chars().take(STRING_PREVIEW_KEEP).collect();
        format!("\"{kept}...\"")
    } else {
        format!("\"{text}\"")
    }
}

fn array_preview(items: &[Value]) -> String {
    if items.is_empty() {
        return "Array(0)".to_string();
    }
    if items.len() > INLINE_ARRAY_MAX_ITEMS {
        return format!("Array({})", items.len());
    }
    let parts: Vec<String> = items.iter().map(array_item_preview).collect();
    format!("[{}]", parts.join(", "))
}

fn array_item_preview(item: &Value) -> String {
    match item {
        Value::String(text) if text.chars().count() > ARRAY_ITEM_STRING_MAX => {
            let kept: String = text.chars().take(ARRAY_ITEM_STRING_MAX).collect();
            format!("\"{kept}...\"")
        }
        Value::String(text) => format!("\"{text}\""),
        Value::Array(_) | Value::Object(_) => "{...}".to_string(),
        other => other.to_string(),
    }
}

fn fallback(value: Option<&Value>) -> String {
    let text = value.map(Value::to_string).unwrap_or_default();
    if text.is_empty() { "(empty)".to_string() } else { text }
}
