//! Variables gathered along the pipeline for the template engine.
//!
//! Middlewares add variables to the [`TemplateVariableContainer`] request
//! attribute; the handler merges them with its own before rendering.

use crate::{
    error::HelperError,
    middleware::{Middleware, Next},
    request::Request,
    response::Response,
    router::RouteResult,
};
use futures::{
    future::{self, BoxFuture},
    FutureExt,
};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// Template variables by name, in insertion order
pub type Variables = IndexMap<String, Value>;

/// Immutable bag of template variables.
///
/// Every mutator returns a new container and leaves `self` untouched. Clones
/// share the variables until one of them is modified.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateVariableContainer {
    variables: Arc<Variables>,
}

impl TemplateVariableContainer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.variables.len()
    }

    #[inline]
    pub fn has(&self, key: &str) -> bool {
        self.variables.contains_key(key)
    }

    /// Value of `key`, `None` when unset
    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.variables.get(key)
    }

    /// Return a container with `key` set to `value`
    pub fn with<K: Into<String>, V: Into<Value>>(&self, key: K, value: V) -> Self {
        let mut variables = Variables::clone(&self.variables);
        variables.insert(key.into(), value.into());
        Self::from(variables)
    }

    /// Return a container without `key`
    pub fn without(&self, key: &str) -> Self {
        let mut variables = Variables::clone(&self.variables);
        variables.shift_remove(key);
        Self::from(variables)
    }

    /// Return a container with `values` set, overriding the existing values
    /// of the same keys
    pub fn merge<I, K, V>(&self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut variables = Variables::clone(&self.variables);
        variables.extend(values.into_iter().map(|(k, v)| (k.into(), v.into())));
        Self::from(variables)
    }

    /// Variables to hand to the template engine: the container's ones with
    /// `local` laid over them
    pub fn merge_for_template<I, K, V>(&self, local: I) -> Variables
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut variables = Variables::clone(&self.variables);
        variables.extend(local.into_iter().map(|(k, v)| (k.into(), v.into())));
        variables
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.variables.iter()
    }
}

impl From<Variables> for TemplateVariableContainer {
    fn from(variables: Variables) -> Self {
        TemplateVariableContainer {
            variables: Arc::new(variables),
        }
    }
}

/// Make sure every request carries a [`TemplateVariableContainer`] attribute
#[derive(Default)]
pub struct TemplateVariableContainerMiddleware;

impl TemplateVariableContainerMiddleware {
    pub fn new() -> Self {
        TemplateVariableContainerMiddleware
    }
}

impl Middleware for TemplateVariableContainerMiddleware {
    fn next<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a, Result<Response, HelperError>> {
        if req.attribute::<TemplateVariableContainer>().is_some() {
            return next.run(req);
        }

        next.run(req.with_attribute(TemplateVariableContainer::new()))
    }
}

/// Expose the request's [`RouteResult`] to templates as the `route` variable,
/// `null` when the request was not routed
#[derive(Default)]
pub struct RouteTemplateVariableMiddleware;

impl RouteTemplateVariableMiddleware {
    pub fn new() -> Self {
        RouteTemplateVariableMiddleware
    }

    fn route_variable(req: &Request) -> Result<Value, HelperError> {
        match req.attribute::<RouteResult>() {
            Some(result) => serde_json::to_value(result).map_err(|e| HelperError::Custom(Box::new(e))),
            None => Ok(Value::Null),
        }
    }
}

impl Middleware for RouteTemplateVariableMiddleware {
    fn next<'a>(&'a self, mut req: Request, next: Next<'a>) -> BoxFuture<'a, Result<Response, HelperError>> {
        let route = match Self::route_variable(&req) {
            Ok(route) => route,
            Err(e) => return future::err(e).boxed(),
        };

        let container = req.take_attribute::<TemplateVariableContainer>().unwrap_or_default();
        next.run(req.with_attribute(container.with("route", route)))
    }
}
