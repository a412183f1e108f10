use super::{ParsedBody, RawBody, Strategy};
use crate::{error::HelperError, request::Request};
use futures::{future::BoxFuture, FutureExt};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn json_mime() -> &'static Regex {
    static JSON_MIME: OnceLock<Regex> = OnceLock::new();
    JSON_MIME.get_or_init(|| Regex::new(r"(?i)^application/([^;/\s]+\+)?json$").expect("This is a valid regex"))
}

/// Parse `application/json` bodies, and `application/*+json` ones.
///
/// The body as read is always attached as a [`RawBody`] attribute. An empty
/// body gives no parsed body; only objects and arrays are kept as parsed body,
/// any other json value gives none.
pub struct JsonStrategy;

impl Strategy for JsonStrategy {
    fn matches(&self, content_type: &str) -> bool {
        let mime = content_type.split(';').next().unwrap_or_default().trim();
        json_mime().is_match(mime)
    }

    fn parse<'a>(&'a self, mut req: Request) -> BoxFuture<'a, Result<Request, HelperError>> {
        async move {
            let bytes = req.body_mut().bytes().await?;
            let raw = RawBody(String::from_utf8_lossy(&bytes).into_owned());

            if bytes.is_empty() {
                return Ok(req.with_attribute(raw).with_parsed_body(None));
            }

            let parsed = match serde_json::from_slice::<Value>(&bytes)? {
                v @ Value::Object(_) | v @ Value::Array(_) => Some(ParsedBody::Json(v)),
                _ => None,
            };

            Ok(req.with_attribute(raw).with_parsed_body(parsed))
        }
        .boxed()
    }
}
