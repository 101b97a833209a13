//! Error types shared by the ghostlog crates.
//!
//! Formatting itself never fails; these cover the operational edges around
//! it: routing scopes, the global facade and output streams.

use thiserror::Error;

/// Errors raised by ghostlog operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A custom routing strategy returned without running the scoped body.
    #[error("context strategy did not run the scoped body")]
    ScopeNotEntered,

    /// An extension property would shadow a console method or router operation.
    #[error("extension name '{0}' is reserved")]
    ReservedExtension(String),

    /// An unknown console method name.
    #[error("unknown console method '{0}'")]
    UnknownMethod(String),

    /// Writing to an output stream failed.
    #[error("output stream error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for ghostlog operations.
pub type Result<T> = std::result::Result<T, Error>;
