use std::collections::BTreeMap;

use serde_json::Value;

use crate::attrs::{Attributes, resolve, value_as_u64};

/// Flat view of resolved fields. Unresolved fields hold `Value::Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct Properties<'a> {
    values: BTreeMap<&'a str, Value>,
}

impl<'a> Properties<'a> {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field).filter(|value| !value.is_null())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.values.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn u64(&self, field: &str) -> Option<u64> {
        self.get(field).and_then(value_as_u64)
    }

    pub fn f64(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    pub fn bool(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }

    pub fn into_map(self) -> BTreeMap<&'a str, Value> {
        self.values
    }
}

/// Resolves every `(field, dotted_path)` pair independently; one failed path
/// never blanks another field, and every declared field is present in the result.
pub fn extract<'a, A: Attributes + ?Sized>(object: &A, fields: &[(&'a str, &str)]) -> Properties<'a> {
    let values = fields
        .iter()
        .map(|(field, path)| (*field, resolve(Some(object), path, Value::Null)))
        .collect();
    Properties { values }
}
