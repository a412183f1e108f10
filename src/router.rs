use indexmap::IndexMap;
use serde::Serialize;
use std::error::Error as StdError;

/// Named parameters, kept in their insertion order
pub type Params = IndexMap<String, String>;

/// Options forwarded verbatim to the router when generating an uri
pub type RouterOptions = IndexMap<String, String>;

/// Error raised by a router implementation. It is handed back to the caller as
/// is, wrapped in [`HelperError::Router`](crate::error::HelperError::Router).
pub type RouterError = Box<dyn StdError + Send + Sync + 'static>;

/// Uri generation side of a router.
///
/// Route matching stays with the host framework; the helpers only need to turn
/// a route name and its parameters back into a path.
pub trait Router: Send + Sync {
    fn generate_uri(&self, route_name: &str, params: &Params, options: &RouterOptions) -> Result<String, RouterError>;
}

/// Outcome of matching the incoming request against the routes.
///
/// The host framework attaches it to the request as an attribute; helpers only
/// ever read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteResult {
    success: bool,
    matched_route_name: Option<String>,
    matched_params: Params,
}

impl RouteResult {
    /// A successful match of `route_name`, with the params extracted from the path
    pub fn success<N: Into<String>>(route_name: N, matched_params: Params) -> Self {
        RouteResult {
            success: true,
            matched_route_name: Some(route_name.into()),
            matched_params,
        }
    }

    /// No route matched the request
    pub fn failure() -> Self {
        RouteResult {
            success: false,
            matched_route_name: None,
            matched_params: Params::new(),
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.success
    }

    #[inline]
    pub fn is_failure(&self) -> bool {
        !self.success
    }

    #[inline]
    pub fn matched_route_name(&self) -> Option<&str> {
        self.matched_route_name.as_deref()
    }

    #[inline]
    pub fn matched_params(&self) -> &Params {
        &self.matched_params
    }

    /// Whether this is a successful match of `route_name`
    #[inline]
    pub fn is_match_of(&self, route_name: &str) -> bool {
        self.success && self.matched_route_name() == Some(route_name)
    }
}
