use super::{ParsedBody, Strategy};
use crate::{error::HelperError, request::Request, router::Params};
use futures::{future::BoxFuture, FutureExt};
use regex::Regex;
use std::sync::OnceLock;

fn form_mime() -> &'static Regex {
    static FORM_MIME: OnceLock<Regex> = OnceLock::new();
    FORM_MIME.get_or_init(|| Regex::new(r"(?i)^application/x-www-form-urlencoded($|[ ;])").expect("This is a valid regex"))
}

/// Parse `application/x-www-form-urlencoded` bodies into flat [`Params`].
///
/// Leaves the request alone when it already has a non-empty parsed body, or
/// when its body is empty. A repeated key keeps its last value.
pub struct FormUrlEncodedStrategy;

impl Strategy for FormUrlEncodedStrategy {
    fn matches(&self, content_type: &str) -> bool {
        form_mime().is_match(content_type)
    }

    fn parse<'a>(&'a self, mut req: Request) -> BoxFuture<'a, Result<Request, HelperError>> {
        async move {
            if req.parsed_body().map_or(false, |b| !b.is_empty()) {
                trace!("Request body already parsed, skipping form decoding");
                return Ok(req);
            }

            let bytes = req.body_mut().bytes().await?;
            if bytes.is_empty() {
                return Ok(req);
            }

            let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(&bytes).map_err(|e| HelperError::Custom(Box::new(e)))?;
            let params: Params = pairs.into_iter().collect();
            Ok(req.with_parsed_body(Some(ParsedBody::Form(params))))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Body;
    use http::Request as RawRequest;

    fn request(body: &'static str) -> Request {
        Request::new(
            RawRequest::builder()
                .method("POST")
                .uri("/")
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
    }

    fn pairs(params: &Params) -> Vec<(&str, &str)> {
        params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }

    #[test]
    fn matches_form_content_types() {
        assert!(FormUrlEncodedStrategy.matches("application/x-www-form-urlencoded"));
        assert!(FormUrlEncodedStrategy.matches("application/x-www-form-urlencoded; charset=utf-8"));
        assert!(FormUrlEncodedStrategy.matches("application/x-www-form-urlencoded;charset=utf-8"));
        assert!(!FormUrlEncodedStrategy.matches("application/x-www-form-urlencodedx"));
        assert!(!FormUrlEncodedStrategy.matches("multipart/form-data"));
    }

    #[tokio::test]
    async fn decodes_pairs() {
        let req = FormUrlEncodedStrategy.parse(request("foo=bar&bar=foo")).await.unwrap();
        match req.parsed_body() {
            Some(ParsedBody::Form(params)) => assert_eq!(pairs(params), vec![("foo", "bar"), ("bar", "foo")]),
            _ => panic!("expected a form body"),
        }
    }

    #[tokio::test]
    async fn decodes_escapes_and_repeated_keys() {
        let req = FormUrlEncodedStrategy.parse(request("name=John+Doe&city=Qu%C3%A9bec&name=Jane")).await.unwrap();
        match req.parsed_body() {
            Some(ParsedBody::Form(params)) => assert_eq!(pairs(params), vec![("name", "Jane"), ("city", "Québec")]),
            _ => panic!("expected a form body"),
        }
    }

    #[tokio::test]
    async fn already_parsed_body_is_kept() {
        let mut existing = Params::new();
        existing.insert("foo".to_string(), "bar".to_string());
        let req = request("bar=baz").with_parsed_body(Some(ParsedBody::Form(existing.clone())));

        let req = FormUrlEncodedStrategy.parse(req).await.unwrap();
        assert_eq!(req.parsed_body(), Some(&ParsedBody::Form(existing)));
    }

    #[tokio::test]
    async fn empty_parsed_body_is_replaced() {
        let req = request("bar=baz").with_parsed_body(Some(ParsedBody::Form(Params::new())));
        let req = FormUrlEncodedStrategy.parse(req).await.unwrap();
        assert!(matches!(req.parsed_body(), Some(ParsedBody::Form(p)) if p["bar"] == "baz"));
    }

    #[tokio::test]
    async fn empty_body_is_left_alone() {
        let req = FormUrlEncodedStrategy.parse(request("")).await.unwrap();
        assert!(req.parsed_body().is_none());
    }
}
