use std::fmt;

/// The dashboard's result type.
pub type Result<T> = std::result::Result<T, DashboardError>;

/// All errors that can occur while loading or editing dashboard state.
#[derive(Debug)]
pub enum DashboardError {
    /// Invalid configuration, caught before any request is made.
    InvalidConfig(String),
    /// The serving process answered with a non-success status.
    Http { path: &'static str, status: u16 },
    /// The request never got a response (connection refused, reset, ...).
    Transport { path: &'static str, msg: String },
    /// The response body did not have the expected shape.
    Malformed { path: &'static str, msg: String },
    /// A form edit could not be coerced to the feature's type.
    InvalidInput { feature: String, msg: String },
    /// A form edit named a feature the form does not have.
    UnknownFeature(String),
    /// A local file, such as a config file, could not be read.
    Io(std::io::Error),
}

impl fmt::Display for DashboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::Http { path, status } => write!(f, "GET {path} answered HTTP {status}"),
            Self::Transport { path, msg } => write!(f, "GET {path} failed: {msg}"),
            Self::Malformed { path, msg } => write!(f, "malformed {path} response: {msg}"),
            Self::InvalidInput { feature, msg } => write!(f, "invalid value for {feature}: {msg}"),
            Self::UnknownFeature(name) => write!(f, "unknown feature: {name}"),
            Self::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl std::error::Error for DashboardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DashboardError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
