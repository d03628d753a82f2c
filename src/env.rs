//! Environment variable abstraction for testability.
//!
//! Production code uses [`Env::real()`] which delegates to [`std::env::var`].
//! Tests use [`Env::mock()`] backed by a `HashMap`, so configuration can be
//! exercised without mutating the process environment.

use std::collections::HashMap;

/// Environment variable reader.
///
/// Pipe variables arrive as environment variables. Bitbucket passes unset
/// optional variables through as empty strings, so most callers want
/// [`Env::non_empty`] rather than [`Env::var`].
#[derive(Clone, Debug)]
pub struct Env {
    overrides: Option<HashMap<String, String>>,
}

impl Env {
    /// Create an `Env` that reads from the real process environment.
    pub fn real() -> Self {
        Self { overrides: None }
    }

    /// Create an `Env` backed by explicit key-value pairs.
    #[cfg(test)]
    pub fn mock(vars: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        Self {
            overrides: Some(
                vars.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Look up an environment variable by name.
    pub fn var(&self, name: &str) -> Result<String, std::env::VarError> {
        match &self.overrides {
            Some(map) => map.get(name).cloned().ok_or(std::env::VarError::NotPresent),
            None => std::env::var(name),
        }
    }

    /// Look up a variable, treating blank values as unset.
    ///
    /// Surrounding whitespace is trimmed from the returned value.
    pub fn non_empty(&self, name: &str) -> Option<String> {
        self.var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Returns `true` if the variable is present and non-blank.
    pub fn is_set(&self, name: &str) -> bool {
        self.non_empty(name).is_some()
    }

    /// Interpret a variable as a boolean flag.
    ///
    /// `true`, `1`, `yes` and `on` (any case) are truthy; anything else,
    /// including an unset variable, is `false`.
    pub fn flag(&self, name: &str) -> bool {
        self.non_empty(name).is_some_and(|v| {
            matches!(v.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
        })
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::real()
    }
}
