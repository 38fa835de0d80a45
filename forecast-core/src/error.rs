use thiserror::Error;

/// A fatal failure raised while executing an immediate directive.
///
/// Every variant carries exactly one failure kind. The kind token, resource
/// line and optional detail line are what the failure report prints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The file could not be opened or read.
    #[error("resource is missing: {resource}")]
    Missing { resource: String },

    /// The content was read but is malformed, empty, or lacks required fields.
    #[error("resource has an unusable format: {resource}")]
    Format { resource: String },

    /// The remote service could not be reached.
    #[error("network failure while requesting {resource}")]
    Network { resource: String },

    /// The remote service answered with a status other than 200.
    #[error("request to {url} returned status {status}")]
    NotOk { status: u16, url: String },

    /// A directive that depends on a resolved coordinate ran before any was resolved.
    #[error("no coordinates available for {directive}")]
    NoCoordinates { directive: &'static str },
}

impl ResolveError {
    pub fn missing(resource: impl Into<String>) -> Self {
        Self::Missing { resource: resource.into() }
    }

    pub fn format(resource: impl Into<String>) -> Self {
        Self::Format { resource: resource.into() }
    }

    pub fn network(resource: impl Into<String>) -> Self {
        Self::Network { resource: resource.into() }
    }

    pub fn not_ok(status: u16, url: impl Into<String>) -> Self {
        Self::NotOk { status, url: url.into() }
    }

    /// Token printed on the last line of the failure report.
    pub fn kind_token(&self) -> &'static str {
        match self {
            ResolveError::Missing { .. } => "MISSING",
            ResolveError::Format { .. } => "FORMAT",
            ResolveError::Network { .. } => "NETWORK",
            ResolveError::NotOk { .. } => "NOT 200",
            ResolveError::NoCoordinates { .. } => "NO COORDINATES",
        }
    }

    /// The path or URL that was being processed when the failure happened.
    pub fn resource(&self) -> &str {
        match self {
            ResolveError::Missing { resource }
            | ResolveError::Format { resource }
            | ResolveError::Network { resource } => resource,
            ResolveError::NotOk { url, .. } => url,
            ResolveError::NoCoordinates { directive } => directive,
        }
    }

    /// Extra report line, present only for non-200 responses.
    pub fn detail(&self) -> Option<String> {
        match self {
            ResolveError::NotOk { status, url } => Some(format!("{status} {url}")),
            _ => None,
        }
    }
}

/// Failure at the transport layer, before any HTTP status is available.
#[derive(Debug, Error)]
#[error("transport error for {url}: {message}")]
pub struct TransportError {
    pub url: String,
    pub message: String,
}

/// Anything that stops a run early.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("failed to write output")]
    Output(#[from] std::io::Error),
}
