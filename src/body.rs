use crate::error::HelperError;
use hyper::body::{Body as RawBody, HttpBody};

pub use hyper::body::Bytes;

pub(crate) enum BodyInner {
    Raw(RawBody),
    Memory(Bytes),
}

impl BodyInner {
    pub fn empty() -> Self {
        BodyInner::Memory(Bytes::new())
    }

    pub async fn load(self) -> Result<Bytes, HelperError> {
        match self {
            BodyInner::Raw(r) => Ok(hyper::body::to_bytes(r).await?),
            BodyInner::Memory(b) => Ok(b),
        }
    }

    #[inline]
    fn size(&self) -> Option<u64> {
        match self {
            BodyInner::Raw(r) => r.size_hint().exact(),
            BodyInner::Memory(b) => Some(b.len() as u64),
        }
    }

    #[inline]
    fn into_raw(self) -> RawBody {
        match self {
            BodyInner::Raw(r) => r,
            BodyInner::Memory(b) => RawBody::from(b),
        }
    }
}

/// Body of a request or a response.
///
/// The body is either still streamed from the connection or already loaded in
/// memory. Loading it through [`bytes`](#method.bytes) keeps the loaded copy,
/// so a body can be read by a middleware and read again by the handler.
pub struct Body {
    inner: BodyInner,
}

impl Body {
    pub fn empty() -> Self {
        Body { inner: BodyInner::empty() }
    }

    /// Wrap a streamed body, the size is only known if the stream reports it
    #[inline]
    pub fn from_raw(raw: RawBody) -> Self {
        Body { inner: BodyInner::Raw(raw) }
    }

    #[inline]
    pub fn into_raw(self) -> RawBody {
        self.inner.into_raw()
    }

    /// Size of the body in bytes, `None` when it cannot be known without
    /// consuming the stream
    #[inline]
    pub fn size(&self) -> Option<u64> {
        self.inner.size()
    }

    /// Whether the body is already held in memory
    #[inline]
    pub fn is_loaded(&self) -> bool {
        matches!(self.inner, BodyInner::Memory(_))
    }

    /// Load the whole body, leaving it in memory for later reads
    ///
    /// ```rust
    ///# use saphir_helpers::prelude::*;
    ///# async {
    /// let mut body = Body::from("hello");
    /// assert_eq!(body.bytes().await.unwrap(), "hello");
    /// // still readable
    /// assert_eq!(body.bytes().await.unwrap(), "hello");
    ///# };
    /// ```
    pub async fn bytes(&mut self) -> Result<Bytes, HelperError> {
        let inner = std::mem::replace(&mut self.inner, BodyInner::empty());
        let bytes = inner.load().await?;
        self.inner = BodyInner::Memory(bytes.clone());
        Ok(bytes)
    }

    /// Load the whole body as an utf-8 string
    pub async fn string(&mut self) -> Result<String, HelperError> {
        let bytes = self.bytes().await?;
        String::from_utf8(bytes.to_vec()).map_err(|e| HelperError::Custom(Box::new(e)))
    }
}

impl Default for Body {
    fn default() -> Self {
        Body::empty()
    }
}

impl From<RawBody> for Body {
    fn from(raw: RawBody) -> Self {
        Body::from_raw(raw)
    }
}

macro_rules! impl_memory_body_from {
    ( $( $x:ty ),+ ) => {
        $(
            impl From<$x> for Body {
                fn from(b: $x) -> Self {
                    Body { inner: BodyInner::Memory(Bytes::from(b)) }
                }
            }
        )+
    }
}

impl_memory_body_from!(String, &'static str, Vec<u8>, &'static [u8], Bytes);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_body_has_known_size() {
        assert_eq!(Body::from("hello world").size(), Some(11));
        assert_eq!(Body::empty().size(), Some(0));
    }

    #[test]
    fn streamed_body_has_unknown_size() {
        let (_sender, raw) = RawBody::channel();
        assert_eq!(Body::from_raw(raw).size(), None);
    }

    #[tokio::test]
    async fn loading_keeps_body_in_memory() {
        let mut body = Body::from_raw(RawBody::from("{\"foo\":\"bar\"}"));
        assert!(!body.is_loaded());
        assert_eq!(body.string().await.unwrap(), "{\"foo\":\"bar\"}");
        assert!(body.is_loaded());
        assert_eq!(body.bytes().await.unwrap(), Bytes::from_static(b"{\"foo\":\"bar\"}"));
    }

    #[tokio::test]
    async fn streamed_body_is_loaded_entirely() {
        let (mut sender, raw) = RawBody::channel();
        tokio::spawn(async move {
            sender.send_data(Bytes::from_static(b"foo=bar")).await.unwrap();
            sender.send_data(Bytes::from_static(b"&bar=foo")).await.unwrap();
        });
        let mut body = Body::from_raw(raw);
        assert_eq!(body.string().await.unwrap(), "foo=bar&bar=foo");
        assert_eq!(body.size(), Some(15));
    }
}
