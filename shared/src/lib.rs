//! Shared library for the Cognito Google sign-in stack.
//!
//! This crate provides the error type, environment helpers, Secrets Manager access
//! and the Cognito trigger models used by the stack CLI and the Lambda triggers.

pub mod cognito;
pub mod config;
pub mod error;
pub mod secrets;

pub use cognito::{AllowList, PreSignUpEvent, PreSignUpRequest, PreSignUpResponse};
pub use error::{Error, Result};
pub use secrets::{get_google_oauth_credentials, get_secret, GoogleOAuthCredentials};
