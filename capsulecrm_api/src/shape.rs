//! Normalization of the API's cardinality-dependent collection shapes.
//!
//! Capsule encodes a collection as nothing at all when it is empty, as a bare
//! object when it holds one element, and as an array otherwise. Everything in
//! this module folds those three shapes into a plain `Vec`.

use serde_json::Value;

use crate::Error;

/// Folds an absent, single-object, or array value into a list.
///
/// Absent and falsy values (`null`, `false`, `0`, `""`, `{}`, `[]`) give an
/// empty list, an array is returned unchanged, and anything else becomes a
/// one-element list.
pub fn to_list(value: Option<Value>) -> Vec<Value> {
    match value {
        None => Vec::new(),
        Some(value) if is_falsy(&value) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => vec![other],
    }
}

/// Unwraps a `{"<outer>": {"<inner>": ...}}` list envelope and normalizes
/// the inner value with [`to_list`].
///
/// A missing outer key means the response is not the expected resource and
/// is an error; an empty outer value or a missing inner key is an empty list.
pub fn envelope_list(mut resp: Value, outer: &str, inner: &str) -> Result<Vec<Value>, Error> {
    let envelope = resp
        .get_mut(outer)
        .map(Value::take)
        .ok_or_else(|| Error::InvalidJson(format!("missing `{}` envelope", outer)))?;
    Ok(match envelope {
        Value::Object(mut map) => to_list(map.remove(inner)),
        _ => Vec::new(),
    })
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}
