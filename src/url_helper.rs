use crate::{
    error::HelperError,
    middleware::{Middleware, Next},
    request::Request,
    response::Response,
    router::{Params, RouteResult, Router, RouterOptions},
};
use futures::future::BoxFuture;
use regex::Regex;
use std::{borrow::Cow, sync::Arc, sync::OnceLock};

/// Fragment identifier grammar from RFC 3986 section 3.5
pub const FRAGMENT_IDENTIFIER_REGEX: &str = r"^([!$&'()*+,;=._~:@/?-]|%[0-9a-fA-F]{2}|[a-zA-Z0-9])+$";

fn fragment_identifier() -> &'static Regex {
    static FRAGMENT_IDENTIFIER: OnceLock<Regex> = OnceLock::new();
    FRAGMENT_IDENTIFIER.get_or_init(|| Regex::new(FRAGMENT_IDENTIFIER_REGEX).expect("This is a valid regex"))
}

/// Options of a single url generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    /// Passed as is to the router
    pub router: RouterOptions,
    /// Seed the params with the matched ones when generating the matched route
    pub reuse_result_params: bool,
    /// Seed the query with the current request's one when generating the
    /// matched route
    pub reuse_query_params: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        GenerationOptions {
            router: RouterOptions::new(),
            reuse_result_params: true,
            reuse_query_params: false,
        }
    }
}

/// Generate urls from route names.
///
/// The helper is bound to the current request by the [`UrlHelperMiddleware`]:
/// it then knows the matched route and the request query, and reuses them when
/// asked to generate the matched route again.
///
/// Binding mutates the helper, so every request must work on its own copy. The
/// middleware clones its prototype per request and hands the copy down as a
/// request attribute; cloning is cheap since the router is shared.
#[derive(Clone)]
pub struct UrlHelper {
    router: Arc<dyn Router>,
    base_path: String,
    route_result: Option<RouteResult>,
    request_query_params: Option<Params>,
}

impl UrlHelper {
    pub fn new<R: 'static + Router>(router: R) -> Self {
        Self::from_arc(Arc::new(router))
    }

    pub fn from_arc(router: Arc<dyn Router>) -> Self {
        UrlHelper {
            router,
            base_path: "/".to_string(),
            route_result: None,
            request_query_params: None,
        }
    }

    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Generate an url.
    ///
    /// With a `route_name`, the router generates that route. The matched params
    /// are merged under `route_params` when the name is the one of a successful
    /// match and `options.reuse_result_params` is set; the request query is
    /// merged under `query_params` in the same case when
    /// `options.reuse_query_params` is set.
    ///
    /// Without a `route_name`, the matched route is generated again from the
    /// matched params merged under `route_params`.
    ///
    /// The base path is prepended unless it is `/`, then the query string and
    /// the fragment are appended.
    pub fn generate(
        &self,
        route_name: Option<&str>,
        route_params: &Params,
        query_params: &Params,
        fragment: Option<&str>,
        options: &GenerationOptions,
    ) -> Result<String, HelperError> {
        let result = self.route_result.as_ref();

        let (path, query_params) = match route_name {
            None => {
                let result = result.ok_or(HelperError::NoMatchedRoute)?;
                (self.generate_from_result(route_params, result, &options.router)?, Cow::Borrowed(query_params))
            }
            Some(route_name) => {
                let route_params = match result {
                    Some(result) if options.reuse_result_params => merge_params(route_name, result, route_params),
                    _ => Cow::Borrowed(route_params),
                };

                let query_params = match result {
                    Some(result) if options.reuse_query_params => self.merge_query_params(route_name, result, query_params),
                    _ => Cow::Borrowed(query_params),
                };

                let path = self
                    .router
                    .generate_uri(route_name, &route_params, &options.router)
                    .map_err(HelperError::Router)?;
                (path, query_params)
            }
        };

        let mut url = String::with_capacity(self.base_path.len() + path.len());
        if self.base_path != "/" {
            url.push_str(&self.base_path);
        }
        url.push_str(&path);
        append_query_string(&mut url, &query_params)?;
        append_fragment(&mut url, fragment)?;

        trace!("Generated url {} for route {:?}", url, route_name);
        Ok(url)
    }

    /// Start a fluent url generation for `route_name`
    ///
    /// ```rust,ignore
    /// let url = helper.url("user.show").param("id", "42").query("tab", "posts").build()?;
    /// ```
    pub fn url<N: Into<String>>(&self, route_name: N) -> UrlBuilder<'_> {
        UrlBuilder::new(self, Some(route_name.into()))
    }

    /// Start a fluent url generation for the matched route
    pub fn current(&self) -> UrlBuilder<'_> {
        UrlBuilder::new(self, None)
    }

    /// Set the base path prepended to generated urls, it always starts with a
    /// single `/`
    pub fn set_base_path(&mut self, path: &str) {
        self.base_path = format!("/{}", path.trim_start_matches('/'));
    }

    #[inline]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Bind the route result of the current request
    pub fn set_route_result(&mut self, result: RouteResult) {
        self.route_result = Some(result);
    }

    #[inline]
    pub fn route_result(&self) -> Option<&RouteResult> {
        self.route_result.as_ref()
    }

    /// Bind the current request, only its query params are kept
    pub fn set_request(&mut self, req: &Request) {
        self.request_query_params = Some(req.query_params());
    }

    #[inline]
    pub fn request_query_params(&self) -> Option<&Params> {
        self.request_query_params.as_ref()
    }

    fn generate_from_result(&self, params: &Params, result: &RouteResult, options: &RouterOptions) -> Result<String, HelperError> {
        let route_name = match result.matched_route_name() {
            Some(name) if result.is_success() => name,
            _ => return Err(HelperError::RoutingFailed),
        };

        let params = merged(result.matched_params(), params);
        self.router.generate_uri(route_name, &params, options).map_err(HelperError::Router)
    }

    fn merge_query_params<'a>(&self, route_name: &str, result: &RouteResult, params: &'a Params) -> Cow<'a, Params> {
        match &self.request_query_params {
            Some(request_params) if result.is_match_of(route_name) => Cow::Owned(merged(request_params, params)),
            _ => Cow::Borrowed(params),
        }
    }
}

fn merge_params<'a>(route_name: &str, result: &RouteResult, params: &'a Params) -> Cow<'a, Params> {
    if result.is_match_of(route_name) {
        Cow::Owned(merged(result.matched_params(), params))
    } else {
        Cow::Borrowed(params)
    }
}

/// `base` overridden by `overrides`, keys of `base` keep their position
fn merged(base: &Params, overrides: &Params) -> Params {
    let mut params = base.clone();
    params.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    params
}

fn append_query_string(url: &mut String, query_params: &Params) -> Result<(), HelperError> {
    if !query_params.is_empty() {
        let query = serde_urlencoded::to_string(query_params).map_err(|e| HelperError::Custom(Box::new(e)))?;
        url.push('?');
        url.push_str(&query);
    }

    Ok(())
}

fn append_fragment(url: &mut String, fragment: Option<&str>) -> Result<(), HelperError> {
    if let Some(fragment) = fragment {
        if !fragment_identifier().is_match(fragment) {
            return Err(HelperError::InvalidFragment(fragment.to_string()));
        }

        url.push('#');
        url.push_str(fragment);
    }

    Ok(())
}

/// Builder for a [`UrlHelper`], the router is mandatory
#[derive(Default)]
pub struct Builder {
    router: Option<Arc<dyn Router>>,
    base_path: Option<String>,
}

impl Builder {
    pub fn router<R: 'static + Router>(self, router: R) -> Self {
        self.shared_router(Arc::new(router))
    }

    pub fn shared_router(mut self, router: Arc<dyn Router>) -> Self {
        self.router = Some(router);
        self
    }

    pub fn base_path<P: Into<String>>(mut self, base_path: P) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    pub fn build(self) -> Result<UrlHelper, HelperError> {
        let router = self.router.ok_or(HelperError::MissingDependency {
            helper: "UrlHelper",
            dependency: "Router",
        })?;

        let mut helper = UrlHelper::from_arc(router);
        if let Some(base_path) = self.base_path {
            helper.set_base_path(&base_path);
        }

        Ok(helper)
    }
}

/// Fluent front of [`UrlHelper::generate`]
pub struct UrlBuilder<'a> {
    helper: &'a UrlHelper,
    route_name: Option<String>,
    params: Params,
    query: Params,
    fragment: Option<String>,
    options: GenerationOptions,
}

impl<'a> UrlBuilder<'a> {
    fn new(helper: &'a UrlHelper, route_name: Option<String>) -> Self {
        UrlBuilder {
            helper,
            route_name,
            params: Params::new(),
            query: Params::new(),
            fragment: None,
            options: GenerationOptions::default(),
        }
    }

    #[inline]
    pub fn param<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    #[inline]
    pub fn query<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    #[inline]
    pub fn fragment<F: Into<String>>(mut self, fragment: F) -> Self {
        self.fragment = Some(fragment.into());
        self
    }

    #[inline]
    pub fn router_option<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.options.router.insert(key.into(), value.into());
        self
    }

    #[inline]
    pub fn reuse_result_params(mut self, reuse: bool) -> Self {
        self.options.reuse_result_params = reuse;
        self
    }

    #[inline]
    pub fn reuse_query_params(mut self, reuse: bool) -> Self {
        self.options.reuse_query_params = reuse;
        self
    }

    pub fn build(self) -> Result<String, HelperError> {
        self.helper.generate(
            self.route_name.as_deref(),
            &self.params,
            &self.query,
            self.fragment.as_deref(),
            &self.options,
        )
    }
}

/// Bind a copy of the [`UrlHelper`] to each request.
///
/// The copy knows the request's `RouteResult` attribute, if any, and its query
/// params. It is attached to the request as an attribute for the handlers
/// further down the pipeline.
pub struct UrlHelperMiddleware {
    helper: UrlHelper,
}

impl UrlHelperMiddleware {
    pub fn new(helper: UrlHelper) -> Self {
        UrlHelperMiddleware { helper }
    }
}

impl Middleware for UrlHelperMiddleware {
    fn next<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a, Result<Response, HelperError>> {
        let mut helper = self.helper.clone();
        if let Some(result) = req.attribute::<RouteResult>() {
            debug!("Binding route result {:?} to the url helper", result.matched_route_name());
            helper.set_route_result(result.clone());
        }
        helper.set_request(&req);

        next.run(req.with_attribute(helper))
    }
}
