//! The unified error handling system for the broker.

// 1. Core Types
pub use auth::{AuthError, AuthResult};
pub use provider::ProviderError;
pub use types::BrokerError;

/// A unified `Result` type for startup and infrastructure code.
pub type Result<T> = std::result::Result<T, BrokerError>;

// 2. Module declarations
pub mod auth;
pub mod macros;
pub mod provider;
pub mod types;

// 3. Context Trait for adding context to errors.
pub trait Context<T, E> {
    #[track_caller]
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display;

    #[track_caller]
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display;
}

impl<T, E> Context<T, E> for std::result::Result<T, E>
where
    E: Into<BrokerError>,
{
    #[track_caller]
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display,
    {
        self.with_context(|| context)
    }

    #[track_caller]
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display,
    {
        match self {
            Ok(value) => Ok(value),
            Err(error) => Err(BrokerError::Context {
                context: context().to_string(),
                source: Box::new(error.into()),
            }),
        }
    }
}
