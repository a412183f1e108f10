use std::{
    convert::TryFrom,
    ops::{Deref, DerefMut},
};

use http::{header::HeaderName, response::Builder as RawBuilder, HeaderMap, HeaderValue, Response as RawResponse, StatusCode};

use crate::{body::Body, error::HelperError};

/// Struct that wraps a http response
pub struct Response {
    #[doc(hidden)]
    inner: RawResponse<Body>,
}

impl Response {
    /// Creates an instance of a response builder
    pub fn builder() -> Builder {
        Builder::new()
    }

    /// Create a new response with `body` as body
    pub fn new(body: Body) -> Self {
        Response {
            inner: RawResponse::new(body),
        }
    }

    /// Whether a header with this name is present, names are case insensitive
    #[inline]
    pub fn has_header<K: AsRef<str>>(&self, name: K) -> bool {
        self.inner.headers().contains_key(name.as_ref())
    }

    /// Return the same response with the header `key` set to `value`,
    /// replacing any previous value
    ///
    /// ```
    /// # use saphir_helpers::prelude::*;
    /// let response = Builder::new().status(200).build().unwrap();
    /// let response = response.with_header("X-Custom-Foo", "bar").unwrap();
    /// assert!(response.has_header("x-custom-foo"));
    /// ```
    pub fn with_header<K, V>(mut self, key: K, value: V) -> Result<Self, HelperError>
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        let name = HeaderName::try_from(key).map_err(Into::<http::Error>::into)?;
        let value = HeaderValue::try_from(value).map_err(Into::<http::Error>::into)?;
        self.inner.headers_mut().insert(name, value);
        Ok(self)
    }

    /// Convert into a hyper response the host server can write
    pub fn into_raw(self) -> RawResponse<hyper::Body> {
        self.inner.map(Body::into_raw)
    }
}

impl From<RawResponse<Body>> for Response {
    fn from(inner: RawResponse<Body>) -> Self {
        Response { inner }
    }
}

impl Deref for Response {
    type Target = RawResponse<Body>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for Response {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

/// Struct used to conveniently build a response
pub struct Builder {
    #[doc(hidden)]
    inner: RawBuilder,
    #[doc(hidden)]
    body: Body,
}

impl Builder {
    /// Creates a new default instance of `Builder`
    /// ```
    /// # use saphir_helpers::prelude::*;
    ///
    /// let response = Builder::new()
    ///     .status(200)
    ///     .build()
    ///     .unwrap();
    /// ```
    #[inline]
    pub fn new() -> Self {
        Builder {
            inner: RawBuilder::new(),
            body: Body::empty(),
        }
    }

    /// Set the HTTP status for this response.
    ///
    /// By default this is `200`.
    #[inline]
    pub fn status<T>(mut self, status: T) -> Builder
    where
        StatusCode: TryFrom<T>,
        <StatusCode as TryFrom<T>>::Error: Into<http::Error>,
    {
        self.inner = self.inner.status(status);
        self
    }

    /// Appends a header to this response builder.
    ///
    /// ```
    /// # use saphir_helpers::prelude::*;
    ///
    /// let response = Builder::new()
    ///     .header("Content-Type", "text/html")
    ///     .header("X-Custom-Foo", "bar")
    ///     .build()
    ///     .unwrap();
    /// ```
    #[inline]
    pub fn header<K, V>(mut self, key: K, value: V) -> Builder
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        self.inner = self.inner.header(key, value);
        self
    }

    /// Get headers on this response builder, `None` when the builder has an
    /// error
    #[inline]
    pub fn headers_ref(&self) -> Option<&HeaderMap<HeaderValue>> {
        self.inner.headers_ref()
    }

    #[inline]
    pub fn body<B: Into<Body>>(mut self, body: B) -> Builder {
        self.body = body.into();
        self
    }

    /// Finish the builder into a Response
    #[inline]
    pub fn build(self) -> Result<Response, HelperError> {
        let Builder { inner, body } = self;
        Ok(Response { inner: inner.body(body)? })
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}
