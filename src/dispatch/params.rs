use std::collections::BTreeMap;

use crate::error::{OpsError, Result};
use crate::model::Visibility;

/// Named string parameters for one operation.
///
/// Values are stored as given; lookups treat blank values as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    pub fn new() -> Self {
        Params::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.0.insert(key.to_string(), value.to_string());
    }

    /// Trimmed value of `key`, `None` when missing or blank.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// # Errors
    /// [`OpsError::Validation`] naming `key` when it is missing or blank.
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key).ok_or_else(|| OpsError::missing(key))
    }

    /// `private`/`public` under `key`, or `default` when absent.
    pub fn visibility(&self, key: &str, default: Visibility) -> Result<Visibility> {
        match self.get(key) {
            Some(v) => v.parse().map_err(|_| {
                OpsError::validation(key, format!("expected `private` or `public`, got `{}`", v))
            }),
            None => Ok(default),
        }
    }

    /// Boolean flag under `key`. Accepts true/false, yes/no, on/off, 1/0.
    pub fn flag(&self, key: &str) -> Result<bool> {
        let raw = self.require(key)?;
        match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(OpsError::validation(
                key,
                format!("expected a boolean (true/false), got `{}`", raw),
            )),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Params(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Parse one `key=value` CLI argument. The value may itself contain `=`.
pub fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    let (k, v) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{}`", s))?;
    let k = k.trim();
    if k.is_empty() {
        return Err(format!("empty key in `{}`", s));
    }
    Ok((k.to_string(), v.to_string()))
}
