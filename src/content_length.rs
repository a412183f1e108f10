use crate::{
    error::HelperError,
    middleware::{Middleware, Next},
    request::Request,
    response::Response,
};
use futures::{future::BoxFuture, FutureExt};
use http::header::CONTENT_LENGTH;

/// Set the `Content-Length` header of responses whose body size is known.
///
/// A header set further down the pipeline is kept as is.
#[derive(Default)]
pub struct ContentLengthMiddleware;

impl ContentLengthMiddleware {
    pub fn new() -> Self {
        ContentLengthMiddleware
    }

    /// Add the header to `res` if missing and if the body size is known
    pub fn apply(res: Response) -> Result<Response, HelperError> {
        if res.has_header(CONTENT_LENGTH) {
            return Ok(res);
        }

        let size = res.body().size();
        match size {
            Some(size) => res.with_header(CONTENT_LENGTH, size),
            None => {
                trace!("Response body size is unknown, no Content-Length set");
                Ok(res)
            }
        }
    }
}

impl Middleware for ContentLengthMiddleware {
    fn next<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a, Result<Response, HelperError>> {
        next.run(req).map(|res| res.and_then(Self::apply)).boxed()
    }
}
