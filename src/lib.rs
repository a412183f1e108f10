//! ### Saphir helpers: small middlewares and helpers for an http pipeline
//! Each helper does one transformation on a request or a response: parsing the
//! request body, injecting a `Content-Length` header, generating urls from
//! named routes, composing absolute urls and carrying template variables.
//!
//! The host server, the router and the template engine are not part of this
//! crate; they plug in through the [`Handler`](middleware::Handler),
//! [`Router`](router::Router) and [`Middleware`](middleware::Middleware)
//! traits.
//!
//! ## Quick pipeline setup
//! ```ignore
//! use saphir_helpers::prelude::*;
//!
//! async fn show(req: Request) -> Result<Response, HelperError> {
//!     let url = req.attribute::<UrlHelper>().expect("bound by UrlHelperMiddleware");
//!     let location = url.url("user.show").param("id", "42").build()?;
//!     Builder::new().status(200).body(location).build()
//! }
//!
//! let helpers = Helpers::builder().router(MyRouter::default()).base_path("/api").build()?;
//!
//! let pipeline = Pipeline::builder()
//!     .apply(Helpers::content_length_middleware())
//!     .apply(Helpers::body_params_middleware())
//!     .apply(helpers.url_helper_middleware())
//!     .build(show);
//!
//! let response = pipeline.respond(request).await?;
//! ```

#[macro_use]
extern crate log;

/// Request and response bodies
pub mod body;
/// Body parsing middleware and its strategies
pub mod body_params;
/// Explicit wiring of the helpers and their middlewares
pub mod config;
/// Middleware injecting the `Content-Length` header
pub mod content_length;
/// Error definitions
pub mod error;
/// Middleware chain and pipeline
pub mod middleware;
/// The Http Request type
pub mod request;
/// The Http Response type
pub mod response;
/// Route results and the router seam
pub mod router;
/// Absolute url composition from the current request uri
pub mod server_url;
///
#[cfg(feature = "template")]
pub mod template;
/// Url generation from named routes
pub mod url_helper;

///
pub use http;
///
pub use hyper;

/// Contains everything you need to assemble a pipeline
pub mod prelude {
    ///
    pub use crate::body::Body;
    ///
    pub use crate::body::Bytes;
    ///
    pub use crate::body_params::BodyParamsMiddleware;
    ///
    #[cfg(feature = "form")]
    pub use crate::body_params::FormUrlEncodedStrategy;
    ///
    #[cfg(feature = "json")]
    pub use crate::body_params::JsonStrategy;
    ///
    pub use crate::body_params::ParsedBody;
    ///
    pub use crate::body_params::RawBody;
    ///
    pub use crate::body_params::Strategy;
    ///
    pub use crate::config::Config;
    ///
    pub use crate::config::Helpers;
    ///
    pub use crate::content_length::ContentLengthMiddleware;
    ///
    pub use crate::error::HelperError;
    ///
    pub use crate::middleware::Handler;
    ///
    pub use crate::middleware::Middleware;
    ///
    pub use crate::middleware::Next;
    ///
    pub use crate::middleware::Pipeline;
    ///
    pub use crate::request::Request;
    ///
    pub use crate::response::Builder;
    ///
    pub use crate::response::Response;
    ///
    pub use crate::router::Params;
    ///
    pub use crate::router::RouteResult;
    ///
    pub use crate::router::Router;
    ///
    pub use crate::router::RouterError;
    ///
    pub use crate::router::RouterOptions;
    ///
    pub use crate::server_url::ServerUrlHelper;
    ///
    pub use crate::server_url::ServerUrlMiddleware;
    ///
    #[cfg(feature = "template")]
    pub use crate::template::RouteTemplateVariableMiddleware;
    ///
    #[cfg(feature = "template")]
    pub use crate::template::TemplateVariableContainer;
    ///
    #[cfg(feature = "template")]
    pub use crate::template::TemplateVariableContainerMiddleware;
    ///
    pub use crate::url_helper::GenerationOptions;
    ///
    pub use crate::url_helper::UrlHelper;
    ///
    pub use crate::url_helper::UrlHelperMiddleware;
    ///
    pub use http::header;
    ///
    pub use http::Method;
    ///
    pub use http::StatusCode;
    ///
    pub use http::Uri;
}
