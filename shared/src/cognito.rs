//! Cognito user pool trigger events and the pre sign-up allow-list.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

use crate::config::ALLOW_EMAILS_VAR;
use crate::{Error, Result};

/// Trigger source prefix for every pre sign-up invocation
/// (`PreSignUp_SignUp`, `PreSignUp_ExternalProvider`, `PreSignUp_AdminCreateUser`).
pub const PRE_SIGN_UP_PREFIX: &str = "PreSignUp_";

/// Cognito pre sign-up trigger event.
///
/// Cognito expects the event back as the response, so unknown fields are kept
/// in `extra` and serialized again untouched.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreSignUpEvent {
    pub version: String,
    pub trigger_source: String,
    pub region: String,
    pub user_pool_id: String,
    pub user_name: String,
    #[serde(default)]
    pub caller_context: Value,
    pub request: PreSignUpRequest,
    #[serde(default)]
    pub response: PreSignUpResponse,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreSignUpRequest {
    #[serde(default)]
    pub user_attributes: HashMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreSignUpResponse {
    #[serde(default)]
    pub auto_confirm_user: bool,
    #[serde(default)]
    pub auto_verify_email: bool,
    #[serde(default)]
    pub auto_verify_phone: bool,
}

impl PreSignUpEvent {
    /// Whether this invocation is a pre sign-up trigger at all.
    pub fn is_pre_sign_up(&self) -> bool {
        self.trigger_source.starts_with(PRE_SIGN_UP_PREFIX)
    }

    /// The e-mail attribute of the user being registered.
    pub fn email(&self) -> Option<&str> {
        self.request
            .user_attributes
            .get("email")
            .map(String::as_str)
            .filter(|email| !email.is_empty())
    }
}

/// Set of e-mail addresses allowed to register.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    emails: HashSet<String>,
}

impl AllowList {
    /// Parse the comma-joined value of `ALLOW_EMAILS`. Entries are kept verbatim.
    pub fn from_env_value(value: &str) -> Self {
        Self {
            emails: value.split(',').map(String::from).collect(),
        }
    }

    /// Load the allow-list from `ALLOW_EMAILS`; an unset variable admits nobody.
    pub fn from_env() -> Self {
        Self::from_env_value(&std::env::var(ALLOW_EMAILS_VAR).unwrap_or_default())
    }

    pub fn contains(&self, email: &str) -> bool {
        !email.is_empty() && self.emails.contains(email)
    }

    pub fn len(&self) -> usize {
        self.emails.iter().filter(|e| !e.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Accept or reject a sign-up.
    pub fn admit(&self, event: &PreSignUpEvent) -> Result<()> {
        match event.email() {
            Some(email) if self.contains(email) => Ok(()),
            _ => Err(Error::Forbidden),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(trigger_source: &str, email: Option<&str>) -> PreSignUpEvent {
        let mut attributes = json!({ "name": "Test User" });
        if let Some(email) = email {
            attributes["email"] = json!(email);
        }
        serde_json::from_value(json!({
            "version": "1",
            "triggerSource": trigger_source,
            "region": "us-east-1",
            "userPoolId": "us-east-1_abc123",
            "userName": "Google_1234567890",
            "callerContext": {
                "awsSdkVersion": "aws-sdk-unknown-unknown",
                "clientId": "abc123"
            },
            "request": {
                "userAttributes": attributes,
                "validationData": null
            },
            "response": {
                "autoConfirmUser": false,
                "autoVerifyEmail": false,
                "autoVerifyPhone": false
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_admits_listed_email() {
        let allow = AllowList::from_env_value("a@x.com,b@y.com");
        assert_eq!(allow.len(), 2);
        assert!(allow
            .admit(&event("PreSignUp_ExternalProvider", Some("b@y.com")))
            .is_ok());
    }

    #[test]
    fn test_rejects_unlisted_email() {
        let allow = AllowList::from_env_value("a@x.com");
        let err = allow
            .admit(&event("PreSignUp_SignUp", Some("mallory@evil.com")))
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden));
    }

    #[test]
    fn test_rejects_missing_email_even_with_empty_list() {
        let allow = AllowList::from_env_value("");
        assert!(allow.is_empty());
        assert!(allow.admit(&event("PreSignUp_SignUp", None)).is_err());
        assert!(allow.admit(&event("PreSignUp_SignUp", Some(""))).is_err());
    }

    #[test]
    fn test_entries_are_verbatim() {
        let allow = AllowList::from_env_value("a@x.com, b@y.com");
        assert!(allow.contains("a@x.com"));
        assert!(allow.contains(" b@y.com"));
        assert!(!allow.contains("b@y.com"));
        assert!(!allow.contains("A@X.COM"));
    }

    #[test]
    fn test_event_round_trips_unknown_fields() {
        let original = event("PreSignUp_SignUp", Some("a@x.com"));
        assert!(original.is_pre_sign_up());
        let value = serde_json::to_value(&original).unwrap();
        assert_eq!(value["triggerSource"], "PreSignUp_SignUp");
        assert_eq!(value["callerContext"]["clientId"], "abc123");
        assert_eq!(value["request"]["validationData"], Value::Null);
        assert_eq!(value["response"]["autoConfirmUser"], false);
    }

    #[test]
    fn test_other_triggers_are_not_pre_sign_up() {
        assert!(!event("PostConfirmation_ConfirmSignUp", Some("a@x.com")).is_pre_sign_up());
    }
}
