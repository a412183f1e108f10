//! A middleware is called with the request and the rest of the pipeline. It
//! can modify the request before passing it on, modify the response coming
//! back, or stop the processing by returning a response (or an error) without
//! calling the rest of the pipeline.

use crate::{
    error::HelperError,
    request::Request,
    response::{Builder as ResponseBuilder, Response},
};
use futures::{future::BoxFuture, FutureExt};
use std::future::Future;

/// Type which can turn a request into a response, at the end of a pipeline.
///
/// Auto implemented for every async function taking a `Request` and returning
/// a `Result<Response, HelperError>`.
pub trait Handler: Send + Sync {
    fn handle(&self, req: Request) -> BoxFuture<'_, Result<Response, HelperError>>;
}

impl<Fun, Fut> Handler for Fun
where
    Fun: Fn(Request) -> Fut + Send + Sync,
    Fut: 'static + Future<Output = Result<Response, HelperError>> + Send,
{
    #[inline]
    fn handle(&self, req: Request) -> BoxFuture<'_, Result<Response, HelperError>> {
        (*self)(req).boxed()
    }
}

/// The trait a struct need to `impl` to be part of a pipeline
pub trait Middleware: Send + Sync {
    /// Process `req`; call `next.run(..)` to hand the request to the rest of
    /// the pipeline and get its response back
    fn next<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a, Result<Response, HelperError>>;
}

/// Remaining part of a pipeline, from a middleware point of view
pub struct Next<'a> {
    middlewares: &'a [Box<dyn Middleware>],
    handler: &'a dyn Handler,
}

impl<'a> Next<'a> {
    /// Create the rest of a pipeline made of `middlewares` followed by `handler`
    pub fn new(middlewares: &'a [Box<dyn Middleware>], handler: &'a dyn Handler) -> Self {
        Next { middlewares, handler }
    }

    /// Run the rest of the pipeline with `req`
    pub fn run(self, req: Request) -> BoxFuture<'a, Result<Response, HelperError>> {
        match self.middlewares.split_first() {
            Some((middleware, rest)) => middleware.next(req, Next::new(rest, self.handler)),
            None => self.handler.handle(req),
        }
    }
}

/// Builder to stack middlewares in front of a handler
pub struct Builder {
    middlewares: Vec<Box<dyn Middleware>>,
}

impl Default for Builder {
    fn default() -> Self {
        Builder { middlewares: Vec::new() }
    }
}

impl Builder {
    /// Add a middleware to the pipeline. Middlewares see the request in the
    /// order they were applied, and the response in the reverse order.
    pub fn apply<M>(mut self, middleware: M) -> Self
    where
        M: 'static + Middleware,
    {
        self.middlewares.push(Box::new(middleware));
        self
    }

    pub fn build<H>(self, handler: H) -> Pipeline
    where
        H: 'static + Handler,
    {
        Pipeline {
            middlewares: self.middlewares,
            handler: Box::new(handler),
        }
    }
}

/// Middlewares followed by a handler
pub struct Pipeline {
    middlewares: Vec<Box<dyn Middleware>>,
    handler: Box<dyn Handler>,
}

impl Pipeline {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Run `req` through the pipeline
    pub async fn dispatch(&self, req: Request) -> Result<Response, HelperError> {
        Next::new(&self.middlewares, self.handler.as_ref()).run(req).await
    }

    /// Run `req` through the pipeline, turning an error into an error response
    pub async fn respond(&self, req: Request) -> Result<Response, HelperError> {
        match self.dispatch(req).await {
            Ok(res) => Ok(res),
            Err(e) => e.respond_with_builder(ResponseBuilder::new()).build(),
        }
    }
}
