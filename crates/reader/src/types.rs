use thiserror::Error;

/// An upstream accessor failed instead of returning a value.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("reading `{name}` failed: {message}")]
pub struct AttrError {
    pub name: String,
    pub message: String,
}

impl AttrError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Errors raised while shaping an upstream object into the output schema.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvertError {
    #[error("field `{field}` has an unexpected value: {found}")]
    InvalidField { field: &'static str, found: String },
}

impl ConvertError {
    pub(crate) fn invalid(field: &'static str, found: &serde_json::Value) -> Self {
        let mut found = found.to_string();
        if found.len() > 64 {
            let mut cut = 64;
            while !found.is_char_boundary(cut) {
                cut -= 1;
            }
            found.truncate(cut);
            found.push_str("...");
        }
        Self::InvalidField { field, found }
    }
}
