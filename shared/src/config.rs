//! Environment variable helpers shared by the stack CLI and the triggers.

use std::env;

use crate::{Error, Result};

/// Name of the variable carrying the pre sign-up allow-list.
pub const ALLOW_EMAILS_VAR: &str = "ALLOW_EMAILS";

/// Read a required environment variable.
pub fn require_var(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("{} not set", name)))
}

/// Split a comma-separated list, trimming whitespace and dropping empty entries.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Split a comma-joined list exactly the way the pre sign-up gate reads it back.
///
/// Entries keep surrounding whitespace; an empty value yields no entries.
pub fn split_verbatim(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    value.split(',').map(String::from).collect()
}

/// Join a list the way it is read back by [`split_list`] and the pre sign-up gate.
pub fn join_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list(" https://a.example , https://b.example,,"),
            vec!["https://a.example", "https://b.example"]
        );
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_split_verbatim_round_trips_join() {
        let emails = split_verbatim("a@x.com, b@y.com,");
        assert_eq!(emails, vec!["a@x.com", " b@y.com", ""]);
        assert_eq!(join_list(&emails), "a@x.com, b@y.com,");
        assert!(split_verbatim("").is_empty());
    }

    #[test]
    fn test_join_list() {
        assert_eq!(join_list(&["a@x.com", "b@y.com"]), "a@x.com,b@y.com");
        assert_eq!(join_list::<&str>(&[]), "");
    }

    #[test]
    fn test_require_var_missing() {
        let err = require_var("COGNITO_STACK_TEST_DEFINITELY_UNSET").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
