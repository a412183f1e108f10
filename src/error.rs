use crate::{response::Builder, router::RouterError};
use http::{header::InvalidHeaderValue, Error as HttpCrateError, StatusCode};
use hyper::Error as HyperError;
use std::error::Error as StdError;

/// Error type throughout the helpers
#[derive(Debug, thiserror::Error)]
pub enum HelperError {
    /// No route name was given and no route result was bound to the helper
    #[error("Attempting to use matched result when none was injected; aborting")]
    NoMatchedRoute,
    /// No route name was given and the bound route result is a routing failure
    #[error("Attempting to use matched result when routing failed; aborting")]
    RoutingFailed,
    /// The fragment identifier does not match the RFC 3986 fragment grammar
    #[error("Fragment identifier must conform to RFC 3986: {0:?}")]
    InvalidFragment(String),
    /// The request body could not be decoded
    #[error("Error when parsing JSON request body: {0}")]
    MalformedRequestBody(String),
    /// A helper was wired without one of its collaborators
    #[error("{helper} requires a {dependency} implementation; none was provided")]
    MissingDependency { helper: &'static str, dependency: &'static str },
    /// Error returned by the router, left untouched
    #[error(transparent)]
    Router(RouterError),
    ///
    #[error("http error: {0}")]
    Http(#[from] HttpCrateError),
    ///
    #[error("hyper error: {0}")]
    Hyper(#[from] HyperError),
    /// Custom error type to map any other error
    #[error("{0}")]
    Custom(Box<dyn StdError + Send + Sync + 'static>),
}

impl From<InvalidHeaderValue> for HelperError {
    fn from(e: InvalidHeaderValue) -> Self {
        HelperError::Http(HttpCrateError::from(e))
    }
}

#[cfg(feature = "json")]
impl From<serde_json::Error> for HelperError {
    fn from(e: serde_json::Error) -> Self {
        HelperError::MalformedRequestBody(e.to_string())
    }
}

impl HelperError {
    /// Status code a response should carry when this error ends a request
    pub fn status(&self) -> StatusCode {
        match self {
            HelperError::InvalidFragment(_) | HelperError::MalformedRequestBody(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn respond_with_builder(self, builder: Builder) -> Builder {
        match &self {
            HelperError::InvalidFragment(fragment) => {
                debug!("Rejected fragment identifier {:?}", fragment);
            }
            HelperError::MalformedRequestBody(e) => {
                debug!("Unable to parse request body: {}", e);
            }
            HelperError::MissingDependency { .. } => {
                warn!("A helper was used without being fully configured: {}", self);
            }
            HelperError::Router(e) => {
                warn!("The router was unable to generate an uri: {}", e);
            }
            e => {
                warn!("A helper encountered an error that was returned as a response: {:?}", e);
            }
        }

        builder.status(self.status())
    }
}
