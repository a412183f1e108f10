#![cfg(all(feature = "json", feature = "form", feature = "template"))]

use futures::future::BoxFuture;
use saphir_helpers::prelude::*;
use serde_derive::Deserialize;
use std::collections::HashMap;

/// Matches `/users/{id}` and generates the two named routes below
struct UserRouter {
    routes: HashMap<&'static str, &'static str>,
}

impl Default for UserRouter {
    fn default() -> Self {
        let mut routes = HashMap::new();
        routes.insert("user.list", "/users");
        routes.insert("user.show", "/users/{id}");
        UserRouter { routes }
    }
}

impl Router for UserRouter {
    fn generate_uri(&self, route_name: &str, params: &Params, _options: &RouterOptions) -> Result<String, RouterError> {
        let pattern = self.routes.get(route_name).ok_or_else(|| format!("unknown route {}", route_name))?;
        Ok(params.iter().fold(pattern.to_string(), |path, (k, v)| path.replace(&format!("{{{}}}", k), v)))
    }
}

/// Stands for the host framework's routing step
struct Routing;

impl Middleware for Routing {
    fn next<'a>(&'a self, req: Request, next: Next<'a>) -> BoxFuture<'a, Result<Response, HelperError>> {
        let result = match req.uri().path().strip_prefix("/users/") {
            Some(id) if !id.is_empty() => {
                let mut params = Params::new();
                params.insert("id".to_string(), id.to_string());
                RouteResult::success("user.show", params)
            }
            _ if req.uri().path() == "/users" => RouteResult::success("user.list", Params::new()),
            _ => RouteResult::failure(),
        };

        next.run(req.with_attribute(result))
    }
}

#[derive(Deserialize)]
struct Rename {
    name: String,
}

async fn update_user(req: Request) -> Result<Response, HelperError> {
    let urls = req.attribute::<UrlHelper>().expect("url helper bound");
    let server = req.attribute::<ServerUrlHelper>().expect("server url helper bound");
    let variables = req.attribute::<TemplateVariableContainer>().expect("container bound");

    let name = match req.parsed_body() {
        Some(body) => body.deserialize::<Rename>()?.name,
        None => "anonymous".to_string(),
    };

    let self_url = urls.current().query("tab", "profile").build()?;
    let list_url = urls.url("user.list").reuse_query_params(true).build()?;
    let absolute = server.generate(Some(&self_url));
    let route = variables.get("route").and_then(|r| r.get("matched_route_name")).and_then(|n| n.as_str()).unwrap_or("none");

    Builder::new()
        .status(200)
        .body(format!("{}|{}|{}|{}|{}", name, self_url, list_url, absolute, route))
        .build()
}

fn pipeline() -> Pipeline {
    let _ = env_logger::builder().is_test(true).try_init();

    let helpers = Helpers::builder()
        .config(Config { base_path: "/api".to_string() })
        .router(UserRouter::default())
        .build()
        .unwrap();

    Pipeline::builder()
        .apply(Helpers::content_length_middleware())
        .apply(Routing)
        .apply(helpers.server_url_middleware())
        .apply(helpers.url_helper_middleware())
        .apply(Helpers::body_params_middleware())
        .apply(Helpers::template_variable_container_middleware())
        .apply(Helpers::route_template_variable_middleware())
        .build(update_user)
}

fn request(method: &str, uri: &str, content_type: &str, body: &'static str) -> Request {
    let raw = http::Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, "example.com")
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap();
    Request::new(raw)
}

async fn body_of(mut res: Response) -> String {
    res.body_mut().string().await.unwrap()
}

#[tokio::test]
async fn json_request_goes_through_every_helper() {
    let res = pipeline()
        .respond(request("PUT", "/users/42?page=3", "application/json", r#"{"name":"Ada"}"#))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let expected = "Ada|/api/users/42?tab=profile|/api/users|http://example.com/api/users/42?tab=profile|user.show";
    assert_eq!(res.headers()[header::CONTENT_LENGTH], expected.len().to_string().as_str());
    assert_eq!(body_of(res).await, expected);
}

#[tokio::test]
async fn form_request_is_decoded() {
    let res = pipeline()
        .respond(request("POST", "/users/7", "application/x-www-form-urlencoded", "name=Grace+Hopper"))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_of(res).await.starts_with("Grace Hopper|/api/users/7?tab=profile|"));
}

#[tokio::test]
async fn query_params_are_reused_for_the_matched_route() {
    let res = pipeline()
        .respond(request("GET", "/users?page=3", "text/plain", ""))
        .await
        .unwrap();

    assert_eq!(body_of(res).await, "anonymous|/api/users?tab=profile|/api/users?page=3|http://example.com/api/users?tab=profile|user.list");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let res = pipeline()
        .respond(request("PATCH", "/users/42", "application/json", "{foobar}"))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unrouted_request_is_a_server_error() {
    let res = pipeline().respond(request("GET", "/nowhere", "text/plain", "")).await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
