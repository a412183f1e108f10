use std::ops::{Deref, DerefMut};

use http::{header::CONTENT_TYPE, Request as RawRequest};

use crate::{body::Body, body_params::ParsedBody, router::Params};

/// Struct that wraps a http request + the parsed body
///
/// Mutators consume the request and hand back the modified one, so a
/// middleware always passes on the request value it was given or a new one.
pub struct Request {
    #[doc(hidden)]
    inner: RawRequest<Body>,
    #[doc(hidden)]
    parsed_body: Option<ParsedBody>,
}

impl Request {
    #[doc(hidden)]
    pub fn new(raw: RawRequest<Body>) -> Self {
        Request { inner: raw, parsed_body: None }
    }

    /// The body once parsed by a body params strategy
    #[inline]
    pub fn parsed_body(&self) -> Option<&ParsedBody> {
        self.parsed_body.as_ref()
    }

    /// Return the same request with `parsed_body` set as its parsed body
    ///
    /// ```rust
    ///# use saphir_helpers::prelude::*;
    ///# use http::Request as RawRequest;
    ///# let req = Request::new(RawRequest::builder().method("POST").uri("/").body(Body::empty()).unwrap());
    /// let req = req.with_parsed_body(None);
    /// assert!(req.parsed_body().is_none());
    /// ```
    #[inline]
    pub fn with_parsed_body(mut self, parsed_body: Option<ParsedBody>) -> Self {
        self.parsed_body = parsed_body;
        self
    }

    /// Access a typed attribute attached to the request by a middleware.
    ///
    /// ```rust
    ///# use saphir_helpers::prelude::*;
    ///# use http::Request as RawRequest;
    ///# let req = Request::new(RawRequest::builder().method("GET").uri("/").body(Body::empty()).unwrap());
    /// let req = req.with_attribute(RouteResult::failure());
    /// assert!(req.attribute::<RouteResult>().unwrap().is_failure());
    /// ```
    #[inline]
    pub fn attribute<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.inner.extensions().get::<T>()
    }

    /// Return the same request with `value` attached as an attribute,
    /// replacing any previous attribute of the same type
    #[inline]
    pub fn with_attribute<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.inner.extensions_mut().insert(value);
        self
    }

    /// Detach an attribute from the request
    #[inline]
    pub fn take_attribute<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.inner.extensions_mut().remove::<T>()
    }

    /// Value of the `Content-Type` header, if present and valid
    #[inline]
    pub fn content_type(&self) -> Option<&str> {
        self.inner.headers().get(CONTENT_TYPE).and_then(|h| h.to_str().ok())
    }

    /// Parameters decoded from the query string, in their order of appearance.
    /// A repeated key keeps its last value.
    pub fn query_params(&self) -> Params {
        self.inner
            .uri()
            .query()
            .and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
            .map(|pairs| pairs.into_iter().collect())
            .unwrap_or_default()
    }

    /// Split the request into the http request and its parsed body
    pub fn into_parts(self) -> (RawRequest<Body>, Option<ParsedBody>) {
        let Request { inner, parsed_body } = self;
        (inner, parsed_body)
    }
}

impl From<RawRequest<Body>> for Request {
    fn from(raw: RawRequest<Body>) -> Self {
        Request::new(raw)
    }
}

impl From<RawRequest<hyper::Body>> for Request {
    fn from(raw: RawRequest<hyper::Body>) -> Self {
        Request::new(raw.map(Body::from_raw))
    }
}

impl Deref for Request {
    type Target = RawRequest<Body>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for Request {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}
