use crate::{
    error::HelperError,
    middleware::{Middleware, Next},
    request::Request,
    response::Response,
};
use futures::future::BoxFuture;
use http::{header::HOST, Uri};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;
use std::{borrow::Cow, sync::OnceLock};

/// Characters escaped in a query or a fragment, RFC 3986 section 3.4 and 3.5
const QUERY: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Characters escaped in a path, RFC 3986 section 3.3
const PATH: &AsciiSet = &QUERY.add(b'?');

fn url_components() -> &'static Regex {
    static URL_COMPONENTS: OnceLock<Regex> = OnceLock::new();
    URL_COMPONENTS.get_or_init(|| Regex::new(r"^(?P<path>[^?#]*)(?:\?(?P<query>[^#]*))?(?:#(?P<fragment>.*))?$").expect("This is a valid regex"))
}

/// Compose urls against the uri of the current request.
///
/// Without a bound uri, only root relative paths are produced. Once a uri is
/// bound (see [`ServerUrlMiddleware`]), the result is an absolute url on the
/// same scheme and authority.
///
/// ```rust
///# use saphir_helpers::prelude::*;
/// let mut helper = ServerUrlHelper::new();
/// assert_eq!(helper.generate(Some("foo/bar")), "/foo/bar");
///
/// helper.set_uri("https://example.com/resource?bar=baz".parse().unwrap());
/// assert_eq!(helper.generate(Some("foo?page=2")), "https://example.com/resource/foo?page=2");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ServerUrlHelper {
    uri: Option<Uri>,
}

impl ServerUrlHelper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compose an url from `path`, which may carry a query and a fragment.
    ///
    /// With a bound uri, a path not starting with `/` is relative to the bound
    /// uri's path, and an empty path keeps it. The bound uri's own query and
    /// fragment are never kept.
    pub fn generate(&self, path: Option<&str>) -> String {
        let path = path.unwrap_or_default();

        match &self.uri {
            Some(uri) => url_from_uri(uri, path),
            None if path.is_empty() => "/".to_string(),
            None if path.starts_with('/') => path.to_string(),
            None => format!("/{}", path),
        }
    }

    pub fn set_uri(&mut self, uri: Uri) {
        self.uri = Some(uri);
    }

    #[inline]
    pub fn uri(&self) -> Option<&Uri> {
        self.uri.as_ref()
    }
}

fn url_from_uri(uri: &Uri, specification: &str) -> String {
    let (path, query, fragment) = match url_components().captures(specification) {
        Some(caps) => (
            caps.name("path").map_or("", |m| m.as_str()),
            caps.name("query").map_or("", |m| m.as_str()),
            caps.name("fragment").map_or("", |m| m.as_str()),
        ),
        None => (specification, "", ""),
    };

    let path = if path.is_empty() {
        Cow::Borrowed(uri.path())
    } else if !path.starts_with('/') {
        Cow::Owned(format!("{}/{}", uri.path().trim_end_matches('/'), encode(path, PATH)))
    } else {
        Cow::Owned(encode(path, PATH))
    };
    let query = encode(query, QUERY);
    let fragment = encode(fragment, QUERY);

    let mut url = String::new();
    if let (Some(scheme), Some(authority)) = (uri.scheme_str(), uri.authority()) {
        url.push_str(scheme);
        url.push_str("://");
        url.push_str(authority.as_str());
    }
    url.push_str(&path);

    if !query.is_empty() {
        url.push('?');
        url.push_str(&query);
    }

    if !fragment.is_empty() {
        url.push('#');
        url.push_str(&fragment);
    }

    url
}

/// Percent encode the characters of `set` in `component`, leaving valid `%XX`
/// escapes as they are
fn encode(component: &str, set: &'static AsciiSet) -> String {
    let mut encoded = String::with_capacity(component.len());
    let mut rest = component;

    while let Some(i) = rest.find('%') {
        encoded.extend(utf8_percent_encode(&rest[..i], set));
        match rest.get(i..i + 3) {
            Some(escape) if escape[1..].bytes().all(|b| b.is_ascii_hexdigit()) => {
                encoded.push_str(escape);
                rest = &rest[i + 3..];
            }
            _ => {
                encoded.push_str("%25");
                rest = &rest[i + 1..];
            }
        }
    }

    encoded.extend(utf8_percent_encode(rest, set));
    encoded
}

/// Absolute uri of `req`. An origin form request target is completed with the
/// `Host` header, assuming `http`.
fn absolute_uri(req: &Request) -> Uri {
    let uri = req.uri();
    if uri.scheme().is_some() && uri.authority().is_some() {
        return uri.clone();
    }

    let host = match req.headers().get(HOST).and_then(|h| h.to_str().ok()) {
        Some(host) => host,
        None => return uri.clone(),
    };

    let path_and_query = uri.path_and_query().map_or("/", |p| p.as_str());
    Uri::builder()
        .scheme("http")
        .authority(host)
        .path_and_query(path_and_query)
        .build()
        .unwrap_or_else(|e| {
            debug!("Unable to build an absolute uri from host {}: {}", host, e);
            uri.clone()
        })
}

/// Bind a copy of the [`ServerUrlHelper`] to the uri of each request, and
/// attach it to the request as an attribute
pub struct ServerUrlMiddleware {
    helper: ServerUrlHelper,
}

impl ServerUrlMiddleware {
    pub fn new(helper: ServerUrlHelper) -> Self {
        ServerUrlMiddleware { helper }
    }
}

impl Default for ServerUrlMiddleware {
    fn default() -> Self {
        Self::new(ServerUrlHelper::new())
    }
}

impl Middleware for ServerUrlMiddleware {
    fn next<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a, Result<Response, HelperError>> {
        let mut helper = self.helper.clone();
        let uri = absolute_uri(&req);
        trace!("Binding {} to the server url helper", uri);
        helper.set_uri(uri);

        next.run(req.with_attribute(helper))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{body::Body, middleware::Pipeline, response::Builder};
    use http::Request as RawRequest;

    fn bound(uri: &str) -> ServerUrlHelper {
        let mut helper = ServerUrlHelper::new();
        helper.set_uri(uri.parse().unwrap());
        helper
    }

    #[test]
    fn plain_paths_without_uri() {
        let helper = ServerUrlHelper::new();
        for (path, expected) in [(None, "/"), (Some(""), "/"), (Some("/"), "/"), (Some("foo/bar"), "/foo/bar"), (Some("/foo/bar"), "/foo/bar")] {
            assert_eq!(helper.generate(path), expected, "path {:?}", path);
        }
    }

    #[test]
    fn paths_are_composed_with_bound_uri() {
        // The bound uri's query and fragment are dropped in every case
        for uri in ["https://example.com/resource", "https://example.com/resource?bar=baz", "https://example.com/resource#bar"] {
            let helper = bound(uri);
            for (path, expected) in [
                (None, "https://example.com/resource"),
                (Some(""), "https://example.com/resource"),
                (Some("/"), "https://example.com/"),
                (Some("foo/bar"), "https://example.com/resource/foo/bar"),
                (Some("/foo/bar"), "https://example.com/foo/bar"),
            ] {
                assert_eq!(helper.generate(path), expected, "uri {} path {:?}", uri, path);
            }
        }
    }

    #[test]
    fn query_and_fragment_come_from_path() {
        let helper = bound("https://example.com/resource");
        for (path, expected) in [
            ("?foo=bar", "https://example.com/resource?foo=bar"),
            ("/?foo=bar", "https://example.com/?foo=bar"),
            ("foo/bar?foo=bar", "https://example.com/resource/foo/bar?foo=bar"),
            ("/foo/bar?foo=bar", "https://example.com/foo/bar?foo=bar"),
            ("#bar", "https://example.com/resource#bar"),
            ("/#bar", "https://example.com/#bar"),
            ("foo/bar#bar", "https://example.com/resource/foo/bar#bar"),
            ("/foo/bar?foo=bar#bar", "https://example.com/foo/bar?foo=bar#bar"),
        ] {
            assert_eq!(helper.generate(Some(path)), expected, "path {}", path);
        }
    }

    #[test]
    fn trailing_slash_of_bound_path_is_not_doubled() {
        let helper = bound("https://example.com/resource/");
        assert_eq!(helper.generate(Some("foo")), "https://example.com/resource/foo");
    }

    #[test]
    fn components_are_percent_encoded() {
        let helper = bound("https://example.com/resource");
        let url = helper.generate(Some("foo bar?q=a b#frag ment"));
        assert_eq!(url, "https://example.com/resource/foo%20bar?q=a%20b#frag%20ment");
        assert!(url.parse::<Uri>().is_ok());

        assert_eq!(helper.generate(Some("/caf\u{e9}?q=\"x\"")), "https://example.com/caf%C3%A9?q=%22x%22");
        assert_eq!(helper.generate(Some("/a?b#c#d")), "https://example.com/a?b#c%23d");
    }

    #[test]
    fn existing_escapes_are_kept() {
        let helper = bound("https://example.com/resource");
        assert_eq!(helper.generate(Some("/a%2Fb?q=%20x")), "https://example.com/a%2Fb?q=%20x");
        assert_eq!(helper.generate(Some("/100%?q=%zz&r=%")), "https://example.com/100%25?q=%25zz&r=%25");
    }

    #[tokio::test]
    async fn middleware_binds_request_uri() {
        let pipeline = Pipeline::builder()
            .apply(ServerUrlMiddleware::default())
            .build(|req: Request| async move {
                let helper = req.attribute::<ServerUrlHelper>().cloned().unwrap_or_default();
                Builder::new().body(helper.generate(Some("next?page=2"))).build()
            });

        let req = Request::new(
            RawRequest::builder()
                .method("GET")
                .uri("/items/")
                .header("Host", "example.com:8080")
                .body(Body::empty())
                .unwrap(),
        );
        let mut res = pipeline.dispatch(req).await.unwrap();
        assert_eq!(res.body_mut().string().await.unwrap(), "http://example.com:8080/items/next?page=2");

        let req = Request::new(RawRequest::builder().uri("https://example.org/a?x=1").body(Body::empty()).unwrap());
        let mut res = pipeline.dispatch(req).await.unwrap();
        assert_eq!(res.body_mut().string().await.unwrap(), "https://example.org/a/next?page=2");
    }
}
