use serde_json::Value;
use tracing::debug;

use crate::types::AttrError;

pub type AttrResult = std::result::Result<Option<Value>, AttrError>;

/// Read access to an upstream object by attribute name.
///
/// `Ok(None)` means the attribute does not exist; `Err` means the upstream
/// accessor itself failed. Callers in this crate never propagate either.
pub trait Attributes {
    fn attr(&self, name: &str) -> AttrResult;
}

impl Attributes for Value {
    fn attr(&self, name: &str) -> AttrResult {
        Ok(self.as_object().and_then(|map| map.get(name)).cloned())
    }
}

impl<T: Attributes + ?Sized> Attributes for &T {
    fn attr(&self, name: &str) -> AttrResult {
        (**self).attr(name)
    }
}

impl<T: Attributes + ?Sized> Attributes for Box<T> {
    fn attr(&self, name: &str) -> AttrResult {
        (**self).attr(name)
    }
}

/// Walks a dotted path (`token_counts.input_tokens`) and returns `default` on
/// the first missing segment, null, non-object intermediate or accessor error.
pub fn resolve<A: Attributes + ?Sized>(object: Option<&A>, path: &str, default: Value) -> Value {
    let Some(object) = object else {
        return default;
    };
    let mut segments = path.split('.');
    let Some(first) = segments.next().filter(|segment| !segment.is_empty()) else {
        return default;
    };
    let head = match object.attr(first) {
        Ok(Some(value)) => value,
        Ok(None) => {
            debug!(path, segment = first, "attribute missing");
            return default;
        }
        Err(err) => {
            debug!(path, error = %err, "attribute read failed");
            return default;
        }
    };

    let mut current = &head;
    for segment in segments {
        match current.as_object().and_then(|map| map.get(segment)) {
            Some(next) => current = next,
            None => {
                debug!(path, segment, "attribute missing");
                return default;
            }
        }
    }
    if current.is_null() {
        return default;
    }
    current.clone()
}

pub fn resolve_single<A: Attributes + ?Sized>(
    object: Option<&A>,
    name: &str,
    default: Value,
) -> Value {
    if name.contains('.') {
        debug!(name, "dotted name passed to single-segment lookup");
        return default;
    }
    resolve(object, name, default)
}

pub fn resolve_u64<A: Attributes + ?Sized>(object: Option<&A>, path: &str, default: u64) -> u64 {
    value_as_u64(&resolve(object, path, Value::Null)).unwrap_or(default)
}

pub fn resolve_f64<A: Attributes + ?Sized>(object: Option<&A>, path: &str, default: f64) -> f64 {
    resolve(object, path, Value::Null)
        .as_f64()
        .unwrap_or(default)
}

pub fn resolve_bool<A: Attributes + ?Sized>(object: Option<&A>, path: &str, default: bool) -> bool {
    resolve(object, path, Value::Null)
        .as_bool()
        .unwrap_or(default)
}

pub fn resolve_str<A: Attributes + ?Sized>(object: Option<&A>, path: &str, default: &str) -> String {
    match resolve(object, path, Value::Null) {
        Value::String(text) => text,
        _ => default.to_string(),
    }
}

/// Integral JSON numbers, including floats such as `10.0`.
pub(crate) fn value_as_u64(value: &Value) -> Option<u64> {
    if let Some(number) = value.as_u64() {
        return Some(number);
    }
    let float = value.as_f64()?;
    if float.is_finite() && float >= 0.0 && float.fract() == 0.0 && float <= u64::MAX as f64 {
        return Some(float as u64);
    }
    None
}
