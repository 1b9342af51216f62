//! Error types for the Cognito stack and its Lambda triggers.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while synthesizing the stack or running a trigger.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// AWS SDK error
    #[error("AWS error: {0}")]
    Aws(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An expression referenced a value that has no binding
    #[error("Unresolved reference: {0}")]
    Unresolved(String),

    /// A resource referenced a logical ID that is not in the template
    #[error("Resource {from} references unknown resource {to}")]
    UnknownResource { from: String, to: String },

    /// The resource graph has a cycle
    #[error("Dependency cycle between resources: {}", .0.join(", "))]
    DependencyCycle(Vec<String>),

    /// A sign-up was refused by the pre sign-up gate
    #[error("Forbidden")]
    Forbidden,
}
