//! Request body parsing.
//!
//! [`BodyParamsMiddleware`] holds an ordered list of [`Strategy`]. The first
//! strategy matching the request content type parses the body and stores the
//! result as the request's parsed body; the other strategies are not consulted.

use crate::{
    error::HelperError,
    middleware::{Middleware, Next},
    request::Request,
    response::Response,
    router::Params,
};
use futures::{future::BoxFuture, FutureExt};
use http::Method;
use serde::de::DeserializeOwned;

#[cfg(feature = "form")]
mod form;
#[cfg(feature = "json")]
mod json;

#[cfg(feature = "form")]
pub use form::FormUrlEncodedStrategy;
#[cfg(feature = "json")]
pub use json::JsonStrategy;

/// Structured value decoded from a request body
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    /// A json object or array
    #[cfg(feature = "json")]
    Json(serde_json::Value),
    /// Flat key/value pairs from an urlencoded form
    Form(Params),
}

impl ParsedBody {
    pub fn is_empty(&self) -> bool {
        match self {
            #[cfg(feature = "json")]
            ParsedBody::Json(serde_json::Value::Object(o)) => o.is_empty(),
            #[cfg(feature = "json")]
            ParsedBody::Json(serde_json::Value::Array(a)) => a.is_empty(),
            #[cfg(feature = "json")]
            ParsedBody::Json(v) => v.is_null(),
            ParsedBody::Form(params) => params.is_empty(),
        }
    }

    /// Deserialize the parsed body into `T`
    ///
    /// ```rust
    ///# use saphir_helpers::prelude::*;
    /// #[derive(serde_derive::Deserialize)]
    /// struct Login {
    ///     user: String,
    ///     remember: bool,
    /// }
    ///
    /// let mut params = Params::new();
    /// params.insert("user".to_string(), "jdoe".to_string());
    /// params.insert("remember".to_string(), "true".to_string());
    ///
    /// let login: Login = ParsedBody::Form(params).deserialize().unwrap();
    /// assert_eq!(login.user, "jdoe");
    /// assert!(login.remember);
    /// ```
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, HelperError> {
        match self {
            #[cfg(feature = "json")]
            ParsedBody::Json(v) => Ok(serde_json::from_value(v.clone())?),
            ParsedBody::Form(params) => {
                let encoded = serde_urlencoded::to_string(params).map_err(|e| HelperError::Custom(Box::new(e)))?;
                serde_urlencoded::from_str(&encoded).map_err(|e| HelperError::Custom(Box::new(e)))
            }
        }
    }
}

/// Body of the request as it was read, before any decoding. Attached as a
/// request attribute by the json strategy.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawBody(pub String);

/// A way to parse a request body, chosen by the request content type
pub trait Strategy: Send + Sync {
    /// Whether this strategy handles `content_type`
    fn matches(&self, content_type: &str) -> bool;

    /// Parse the body of `req` and return the request carrying the result
    fn parse<'a>(&'a self, req: Request) -> BoxFuture<'a, Result<Request, HelperError>>;
}

/// Middleware parsing request bodies with the first matching [`Strategy`].
///
/// `GET`, `HEAD` and `OPTIONS` requests, and requests without a content type,
/// are passed on untouched.
pub struct BodyParamsMiddleware {
    strategies: Vec<Box<dyn Strategy>>,
}

impl Default for BodyParamsMiddleware {
    fn default() -> Self {
        let mut middleware = BodyParamsMiddleware { strategies: Vec::new() };

        #[cfg(feature = "json")]
        {
            middleware = middleware.add_strategy(JsonStrategy);
        }

        #[cfg(feature = "form")]
        {
            middleware = middleware.add_strategy(FormUrlEncodedStrategy);
        }

        middleware
    }
}

impl BodyParamsMiddleware {
    /// Middleware with the built-in strategies, json first
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a strategy, consulted after the ones already registered
    pub fn add_strategy<S: 'static + Strategy>(mut self, strategy: S) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Remove every strategy, built-in ones included
    pub fn clear_strategies(mut self) -> Self {
        self.strategies.clear();
        self
    }

    #[inline]
    pub fn strategies(&self) -> &[Box<dyn Strategy>] {
        &self.strategies
    }

    /// Parse the body of `req` with the first strategy matching its content type
    pub async fn parse(&self, req: Request) -> Result<Request, HelperError> {
        if [Method::GET, Method::HEAD, Method::OPTIONS].contains(req.method()) {
            trace!("Skipping body parsing of a {} request", req.method());
            return Ok(req);
        }

        let content_type = match req.content_type() {
            Some(content_type) => content_type.to_string(),
            None => return Ok(req),
        };

        match self.strategies.iter().find(|s| s.matches(&content_type)) {
            Some(strategy) => {
                debug!("Parsing request body of type {}", content_type);
                strategy.parse(req).await
            }
            None => {
                trace!("No body parsing strategy for {}", content_type);
                Ok(req)
            }
        }
    }
}

impl Middleware for BodyParamsMiddleware {
    fn next<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a, Result<Response, HelperError>> {
        async move {
            let req = self.parse(req).await?;
            next.run(req).await
        }
        .boxed()
    }
}
