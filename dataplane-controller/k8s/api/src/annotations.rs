//! Typed access to object annotations.

use crate::ObjectMeta;
use std::{collections::BTreeMap, num::NonZeroU16};

/// A read-only view over an object's annotations.
#[derive(Copy, Clone, Debug)]
pub struct Annotations<'a>(&'a BTreeMap<String, String>);

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("annotation {key:?} has an invalid value {value:?}: {reason}")]
pub struct InvalidAnnotation {
    pub key: String,
    pub value: String,
    pub reason: String,
}

static EMPTY: BTreeMap<String, String> = BTreeMap::new();

// === impl Annotations ===

impl<'a> Annotations<'a> {
    pub fn new(meta: &'a ObjectMeta) -> Self {
        Self(meta.annotations.as_ref().unwrap_or(&EMPTY))
    }

    pub fn from_map(annotations: &'a BTreeMap<String, String>) -> Self {
        Self(annotations)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.0.get(key).map(String::as_str)
    }

    /// Reads a boolean annotation. `enabled`, `true`, and `yes` are truthy; `disabled`, `false`,
    /// and `no` are falsy. Any other value is an error.
    pub fn get_enabled(&self, key: &str) -> Result<Option<bool>, InvalidAnnotation> {
        self.parse(key, |v| match v {
            "enabled" | "true" | "yes" => Ok(true),
            "disabled" | "false" | "no" => Ok(false),
            _ => Err("expected one of enabled, disabled, true, false, yes, no".to_string()),
        })
    }

    pub fn get_port(&self, key: &str) -> Result<Option<u16>, InvalidAnnotation> {
        self.parse(key, |v| {
            v.trim()
                .parse::<NonZeroU16>()
                .map(u16::from)
                .map_err(|e| e.to_string())
        })
    }

    /// Reads a comma-separated list, skipping empty items.
    pub fn get_list(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect()
        })
    }

    fn parse<T>(
        &self,
        key: &str,
        parse: impl FnOnce(&str) -> Result<T, String>,
    ) -> Result<Option<T>, InvalidAnnotation> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => parse(value)
                .map(Some)
                .map_err(|reason| InvalidAnnotation {
                    key: key.to_string(),
                    value: value.to_string(),
                    reason,
                }),
        }
    }
}
