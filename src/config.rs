use crate::{
    body_params::BodyParamsMiddleware,
    content_length::ContentLengthMiddleware,
    error::HelperError,
    router::Router,
    server_url::{ServerUrlHelper, ServerUrlMiddleware},
    url_helper::{UrlHelper, UrlHelperMiddleware},
};
use serde::Deserialize;
use std::sync::Arc;

#[cfg(feature = "template")]
use crate::template::{RouteTemplateVariableMiddleware, TemplateVariableContainerMiddleware};

fn default_base_path() -> String {
    "/".to_string()
}

/// Settings of the helpers, usually read from the application configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Path prepended to every generated url
    #[serde(default = "default_base_path")]
    pub base_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_path: default_base_path(),
        }
    }
}

/// The helpers wired together, and a factory for their middlewares.
///
/// Each middleware holds its own copy of the prototype helpers and binds a
/// fresh copy to every request.
pub struct Helpers {
    url_helper: UrlHelper,
    server_url_helper: ServerUrlHelper,
}

impl Helpers {
    pub fn builder() -> Builder {
        Builder::default()
    }

    #[inline]
    pub fn url_helper(&self) -> &UrlHelper {
        &self.url_helper
    }

    #[inline]
    pub fn server_url_helper(&self) -> &ServerUrlHelper {
        &self.server_url_helper
    }

    pub fn url_helper_middleware(&self) -> UrlHelperMiddleware {
        UrlHelperMiddleware::new(self.url_helper.clone())
    }

    pub fn server_url_middleware(&self) -> ServerUrlMiddleware {
        ServerUrlMiddleware::new(self.server_url_helper.clone())
    }

    /// The stateless middlewares are built from scratch, they have no helper to
    /// share
    pub fn body_params_middleware() -> BodyParamsMiddleware {
        BodyParamsMiddleware::new()
    }

    pub fn content_length_middleware() -> ContentLengthMiddleware {
        ContentLengthMiddleware::new()
    }

    #[cfg(feature = "template")]
    pub fn template_variable_container_middleware() -> TemplateVariableContainerMiddleware {
        TemplateVariableContainerMiddleware::new()
    }

    #[cfg(feature = "template")]
    pub fn route_template_variable_middleware() -> RouteTemplateVariableMiddleware {
        RouteTemplateVariableMiddleware::new()
    }
}

/// Builder for [`Helpers`], a router must be provided
#[derive(Default)]
pub struct Builder {
    config: Config,
    router: Option<Arc<dyn Router>>,
}

impl Builder {
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Override the base path of the config
    pub fn base_path<P: Into<String>>(mut self, base_path: P) -> Self {
        self.config.base_path = base_path.into();
        self
    }

    pub fn router<R: 'static + Router>(self, router: R) -> Self {
        self.shared_router(Arc::new(router))
    }

    pub fn shared_router(mut self, router: Arc<dyn Router>) -> Self {
        self.router = Some(router);
        self
    }

    pub fn build(self) -> Result<Helpers, HelperError> {
        let Builder { config, router } = self;
        let router = router.ok_or(HelperError::MissingDependency {
            helper: "UrlHelper",
            dependency: "Router",
        })?;

        let url_helper = UrlHelper::builder().shared_router(router).base_path(config.base_path).build()?;
        debug!("Url helper configured with base path {}", url_helper.base_path());

        Ok(Helpers {
            url_helper,
            server_url_helper: ServerUrlHelper::new(),
        })
    }
}
