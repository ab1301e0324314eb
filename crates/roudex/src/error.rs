//! Error types shared by the factory, the adapters and the hosts.
//!
//! Three families are kept apart on purpose:
//! - [`ConfigError`]: raised while the factory or a pipeline is being assembled
//! - [`ParamError`]: the request does not carry the route parameter a middleware was bound to
//! - [`Failure`]: a recoverable extraction failure, always handed to a failure responder

use http::StatusCode;
use std::error::Error;
use thiserror::Error;

use crate::config::FrameworkKind;

/// Boxed error produced by a storage engine
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Message used for both "no such collection" and "no such document"
pub const DATA_NOT_FOUND: &str = "data not found";

/// Message substituted for engine errors when they must not reach the client
pub const DATA_EXTRACTION_ERROR: &str = "data extraction error";

/// A classified, recoverable extraction failure.
///
/// `code` is an HTTP status code. A failure is created where the problem is detected and
/// consumed exactly once by a classifier and a responder.
///
/// ```
/// use http::StatusCode;
/// use roudex::Failure;
///
/// let failure = Failure::new("connection reset", 503).with_message("data extraction error");
/// assert_eq!(failure.message(), "data extraction error");
/// assert_eq!(failure.code(), 503);
/// assert_eq!(failure.status(), StatusCode::SERVICE_UNAVAILABLE);
/// assert!(failure.is_server_error());
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct Failure {
    message: String,
    code: u16,
}

impl Failure {
    /// Creates a failure with a message and an HTTP status code
    pub fn new<S: ToString>(message: S, code: u16) -> Self {
        Self { message: message.to_string(), code }
    }

    /// The collection is not registered in the store, reported as a server error
    pub fn missing_collection() -> Self {
        Self::new(DATA_NOT_FOUND, 500)
    }

    /// The lookup completed but found nothing
    pub fn not_found() -> Self {
        Self::new(DATA_NOT_FOUND, 404)
    }

    /// The storage engine reported an error
    pub fn storage<E: ToString>(e: E) -> Self {
        Self::new(e, 500)
    }

    /// Returns the message sent to the client
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the raw status code
    pub fn code(&self) -> u16 {
        self.code
    }

    /// The code as a [`StatusCode`], falling back to 500 for codes outside the valid range
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Returns true for 5xx codes
    pub fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }

    /// Replaces the message, keeping the code
    pub fn with_message<S: ToString>(self, message: S) -> Self {
        Self { message: message.to_string(), ..self }
    }
}

/// Fatal errors raised while building the factory or a pipeline
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("application server is not defined")]
    MissingApp,

    #[error("storage db is not defined")]
    MissingDb,

    #[error("application `{0}` is not supported")]
    UnsupportedFramework(String),

    #[error("storage engine `{0}` is not supported")]
    UnsupportedStorage(String),

    #[error("invalid settings: {source}")]
    InvalidSettings {
        #[from]
        source: serde_json::Error,
    },

    #[error("middleware built for {actual} can not be mounted on a {expected} pipeline")]
    FrameworkMismatch { expected: FrameworkKind, actual: FrameworkKind },

    #[error("invalid route `{path}`: {source}")]
    InvalidRoute {
        path: String,
        #[source]
        source: matchit::InsertError,
    },
}

impl ConfigError {
    pub fn unsupported_framework<S: ToString>(name: S) -> Self {
        Self::UnsupportedFramework(name.to_string())
    }

    pub fn unsupported_storage<S: ToString>(name: S) -> Self {
        Self::UnsupportedStorage(name.to_string())
    }

    pub fn framework_mismatch(expected: FrameworkKind, actual: FrameworkKind) -> Self {
        Self::FrameworkMismatch { expected, actual }
    }
}

/// The request does not have the shape a middleware was bound to
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("route parameters are required")]
    MissingParams,

    #[error("parameter `{0}` does not exist in request")]
    MissingParam(String),
}

impl ParamError {
    pub fn missing_param<S: ToString>(name: S) -> Self {
        Self::MissingParam(name.to_string())
    }
}

/// Errors a middleware hands back to its host
#[derive(Error, Debug)]
pub enum MiddlewareError {
    #[error("bad request shape: {source}")]
    Param {
        #[from]
        source: ParamError,
    },

    /// A failure raised through the throw-based response mechanism
    #[error("thrown: {source}")]
    Thrown {
        #[from]
        source: Failure,
    },

    #[error("middleware error: {source}")]
    Other { source: BoxError },
}

impl MiddlewareError {
    pub fn other<E: Into<BoxError>>(e: E) -> Self {
        Self::Other { source: e.into() }
    }

    /// Returns the failure if this error was thrown by a responder
    pub fn as_thrown(&self) -> Option<&Failure> {
        match self {
            Self::Thrown { source } => Some(source),
            _ => None,
        }
    }

    pub fn is_param(&self) -> bool {
        matches!(self, Self::Param { .. })
    }
}
