//! CloudFormation definition of a Cognito user pool that signs in through Google.
//!
//! The stack is built as a typed template and serialized to CloudFormation JSON;
//! provisioning itself is left to CloudFormation.

pub mod commands;
pub mod config;
pub mod graph;
pub mod resources;
pub mod stack;
pub mod template;

pub use config::StackConfig;
pub use stack::{authorize_url, hosted_domain, CognitoStack};
pub use template::{Bindings, Expr, Pseudo, Template};
