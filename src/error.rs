use http::Method;
use thiserror::Error as ThisError;

/// The error type used by the router internals.
///
/// Route handlers and middleware may use any error type convertible into [`RouteError`];
/// this enum covers the failures the router itself can produce while building routes,
/// generating URLs and rendering templates.
#[derive(Debug, ThisError)]
pub enum Error {
    /// A route pattern could not be inserted into the route tree.
    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The same method and pattern were registered twice.
    #[error("route {method} {pattern} is already registered")]
    DuplicateRoute { method: Method, pattern: String },

    /// No route was registered under the given name.
    #[error("no route named `{0}`")]
    UnknownRouteName(String),

    /// The number of positional arguments does not match the wildcard count of a named route.
    #[error("route `{name}` expects {expected} argument(s), got {given}")]
    ReverseArgs { name: String, expected: usize, given: usize },

    #[error("can't find template `{0}`")]
    TemplateNotFound(String),

    #[error("failed to render template `{name}`: {reason}")]
    TemplateRender { name: String, reason: String },

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Message(String),
}

impl Error {
    /// Creates a new error from a plain message.
    pub fn new<M: Into<String>>(msg: M) -> Self {
        Error::Message(msg.into())
    }
}

/// The boxed error type which flows through the middleware chain and into the error handler.
///
/// The original error is accessible after downcasting.
pub type RouteError = Box<dyn std::error::Error + Send + Sync + 'static>;
