use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AppError, Res};

/// Field-level validation messages, serialized as `{"field": ["msg", ...]}`.
#[derive(Debug, Default, Clone, Serialize, PartialEq)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// `Ok(())` when nothing was collected, otherwise a 400 carrying every message.
    pub fn into_result(self) -> Res<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Deserializes a present-but-null string as `Some("")` while a missing key stays `None`.
/// Use together with `#[serde(default)]`.
pub fn null_as_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(|value| Some(value.unwrap_or_default()))
}

/// Keeps `null` apart from a missing key for nullable columns: missing is `None`,
/// `null` is `Some(None)`. Use together with `#[serde(default)]`.
pub fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Rejects any key of a JSON object body outside `allowed`.
pub fn only_fields(body: &serde_json::Value, allowed: &[&str]) -> Res<()> {
    let Some(object) = body.as_object() else {
        return Err(AppError::BadRequest("Expected a JSON object.".to_string()));
    };
    let mut extra: Vec<&str> = object
        .keys()
        .map(String::as_str)
        .filter(|key| !allowed.contains(key))
        .collect();
    if extra.is_empty() {
        return Ok(());
    }
    extra.sort_unstable();
    Err(AppError::BadRequest(format!(
        "Only {} may be updated. Invalid fields: {}.",
        allowed
            .iter()
            .map(|f| format!("'{}'", f))
            .collect::<Vec<_>>()
            .join(" and "),
        extra.join(", ")
    )))
}
