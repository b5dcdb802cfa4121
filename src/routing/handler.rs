//! Route handler descriptors.
//!
//! # Responsibilities
//! - Describe a handler target: paths, methods, callable
//! - Validate descriptors eagerly at construction
//! - Provide shorthand constructors for the common verbs
//!
//! # Design Decisions
//! - Builders replace decorator-style registration; an incomplete
//!   descriptor is a configuration error at build time, not at dispatch
//! - Handler callables are reference-counted so one descriptor can back
//!   several methods and merged routes

use std::sync::Arc;

use futures_util::future::BoxFuture;
use http::Method;

use crate::connection::websocket::WebSocket;
use crate::connection::Connection;
use crate::error::{ConfigError, HttpError, WsError};
use crate::http::Response;
use crate::routing::path::normalize_path;

/// Callable target of an HTTP handler.
pub type HttpHandlerFn =
    Arc<dyn Fn(Connection) -> BoxFuture<'static, Result<Response, HttpError>> + Send + Sync>;

/// Callable target of a WebSocket handler. Receives the connection after
/// the routing layer has built the state machine around the transport.
pub type WsHandlerFn =
    Arc<dyn Fn(WebSocket) -> BoxFuture<'static, Result<(), WsError>> + Send + Sync>;

/// Callable target of a mounted sub-application.
pub type MountHandlerFn =
    Arc<dyn Fn(Connection) -> BoxFuture<'static, Result<(), HttpError>> + Send + Sync>;

/// Authorization guard run before a handler.
pub type Guard =
    Arc<dyn for<'a> Fn(&'a Connection) -> BoxFuture<'a, Result<(), HttpError>> + Send + Sync>;

/// Dependency provider resolved into handler kwargs.
pub type Provider = Arc<
    dyn for<'a> Fn(&'a Connection) -> BoxFuture<'a, Result<serde_json::Value, HttpError>>
        + Send
        + Sync,
>;

/// An HTTP route handler bound to one or more methods and paths.
#[derive(Clone)]
pub struct HttpHandler {
    pub name: Option<String>,
    pub paths: Vec<String>,
    pub methods: Vec<Method>,
    handler: HttpHandlerFn,
}

impl HttpHandler {
    pub fn builder() -> HttpHandlerBuilder {
        HttpHandlerBuilder::default()
    }

    pub fn handler_fn(&self) -> &HttpHandlerFn {
        &self.handler
    }

    /// Whether two descriptors share the same callable target.
    pub fn same_target(&self, other: &HttpHandler) -> bool {
        Arc::ptr_eq(&self.handler, &other.handler)
    }
}

impl std::fmt::Debug for HttpHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpHandler")
            .field("name", &self.name)
            .field("paths", &self.paths)
            .field("methods", &self.methods)
            .finish()
    }
}

/// Builder for [`HttpHandler`].
#[derive(Default)]
pub struct HttpHandlerBuilder {
    name: Option<String>,
    paths: Vec<String>,
    methods: Vec<Method>,
    handler: Option<HttpHandlerFn>,
}

impl HttpHandlerBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.paths.push(path.into());
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        if !self.methods.contains(&method) {
            self.methods.push(method);
        }
        self
    }

    pub fn handler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Connection) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<Response, HttpError>> + Send + 'static,
    {
        self.handler = Some(Arc::new(move |connection| Box::pin(handler(connection))));
        self
    }

    /// Validate and build the descriptor. Paths default to `/`.
    pub fn build(self) -> Result<HttpHandler, ConfigError> {
        let handler = self.handler.ok_or(ConfigError::MissingHandlerFn)?;
        if self.methods.is_empty() {
            return Err(ConfigError::MissingMethods);
        }
        let paths = if self.paths.is_empty() {
            vec!["/".to_string()]
        } else {
            self.paths.iter().map(|path| normalize_path(path)).collect()
        };
        Ok(HttpHandler {
            name: self.name,
            paths,
            methods: self.methods,
            handler,
        })
    }
}

/// A WebSocket route handler.
#[derive(Clone)]
pub struct WsHandler {
    pub name: Option<String>,
    pub paths: Vec<String>,
    handler: WsHandlerFn,
}

impl WsHandler {
    pub fn builder() -> WsHandlerBuilder {
        WsHandlerBuilder::default()
    }

    pub fn handler_fn(&self) -> &WsHandlerFn {
        &self.handler
    }
}

impl std::fmt::Debug for WsHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsHandler")
            .field("name", &self.name)
            .field("paths", &self.paths)
            .finish()
    }
}

/// Builder for [`WsHandler`].
#[derive(Default)]
pub struct WsHandlerBuilder {
    name: Option<String>,
    paths: Vec<String>,
    handler: Option<WsHandlerFn>,
}

impl WsHandlerBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.paths.push(path.into());
        self
    }

    pub fn handler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(WebSocket) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), WsError>> + Send + 'static,
    {
        self.handler = Some(Arc::new(move |socket| Box::pin(handler(socket))));
        self
    }

    pub fn build(self) -> Result<WsHandler, ConfigError> {
        let handler = self.handler.ok_or(ConfigError::MissingHandlerFn)?;
        let paths = if self.paths.is_empty() {
            vec!["/".to_string()]
        } else {
            self.paths.iter().map(|path| normalize_path(path)).collect()
        };
        Ok(WsHandler {
            name: self.name,
            paths,
            handler,
        })
    }
}

/// A mounted sub-application handler. Accepts any path below its own.
#[derive(Clone)]
pub struct MountHandler {
    pub name: Option<String>,
    pub paths: Vec<String>,
    handler: MountHandlerFn,
}

impl MountHandler {
    pub fn builder() -> MountHandlerBuilder {
        MountHandlerBuilder::default()
    }

    pub fn handler_fn(&self) -> &MountHandlerFn {
        &self.handler
    }
}

impl std::fmt::Debug for MountHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountHandler")
            .field("name", &self.name)
            .field("paths", &self.paths)
            .finish()
    }
}

/// Builder for [`MountHandler`].
#[derive(Default)]
pub struct MountHandlerBuilder {
    name: Option<String>,
    paths: Vec<String>,
    handler: Option<MountHandlerFn>,
}

impl MountHandlerBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.paths.push(path.into());
        self
    }

    pub fn handler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Connection) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), HttpError>> + Send + 'static,
    {
        self.handler = Some(Arc::new(move |connection| Box::pin(handler(connection))));
        self
    }

    pub fn build(self) -> Result<MountHandler, ConfigError> {
        let handler = self.handler.ok_or(ConfigError::MissingHandlerFn)?;
        let paths = if self.paths.is_empty() {
            vec!["/".to_string()]
        } else {
            self.paths.iter().map(|path| normalize_path(path)).collect()
        };
        Ok(MountHandler {
            name: self.name,
            paths,
            handler,
        })
    }
}

/// Any registrable handler.
#[derive(Debug, Clone)]
pub enum RouteHandler {
    Http(HttpHandler),
    Websocket(WsHandler),
    Mount(MountHandler),
}

impl RouteHandler {
    pub fn paths(&self) -> &[String] {
        match self {
            RouteHandler::Http(handler) => &handler.paths,
            RouteHandler::Websocket(handler) => &handler.paths,
            RouteHandler::Mount(handler) => &handler.paths,
        }
    }
}

/// Shorthand for a single-method GET handler.
pub fn get<F, Fut>(path: &str, handler: F) -> Result<HttpHandler, ConfigError>
where
    F: Fn(Connection) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<Response, HttpError>> + Send + 'static,
{
    HttpHandler::builder()
        .path(path)
        .method(Method::GET)
        .handler(handler)
        .build()
}

/// Shorthand for a single-method POST handler.
pub fn post<F, Fut>(path: &str, handler: F) -> Result<HttpHandler, ConfigError>
where
    F: Fn(Connection) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<Response, HttpError>> + Send + 'static,
{
    HttpHandler::builder()
        .path(path)
        .method(Method::POST)
        .handler(handler)
        .build()
}

/// Shorthand for a WebSocket handler.
pub fn websocket<F, Fut>(path: &str, handler: F) -> Result<WsHandler, ConfigError>
where
    F: Fn(WebSocket) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<(), WsError>> + Send + 'static,
{
    WsHandler::builder().path(path).handler(handler).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn builder_requires_callable_target() {
        let err = HttpHandler::builder()
            .path("/x")
            .method(Method::GET)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingHandlerFn));
    }

    #[test]
    fn builder_requires_methods() {
        let err = HttpHandler::builder()
            .path("/x")
            .handler(|_conn| async { Ok(Response::new(StatusCode::OK)) })
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingMethods));
    }

    #[test]
    fn paths_default_to_root_and_are_normalized() {
        let handler = HttpHandler::builder()
            .method(Method::GET)
            .handler(|_conn| async { Ok(Response::new(StatusCode::OK)) })
            .build()
            .unwrap();
        assert_eq!(handler.paths, vec!["/".to_string()]);

        let handler = HttpHandler::builder()
            .path("users//profile/")
            .method(Method::GET)
            .handler(|_conn| async { Ok(Response::new(StatusCode::OK)) })
            .build()
            .unwrap();
        assert_eq!(handler.paths, vec!["/users/profile".to_string()]);
    }

    #[test]
    fn duplicate_methods_collapse() {
        let handler = HttpHandler::builder()
            .path("/x")
            .method(Method::GET)
            .method(Method::GET)
            .method(Method::POST)
            .handler(|_conn| async { Ok(Response::new(StatusCode::OK)) })
            .build()
            .unwrap();
        assert_eq!(handler.methods, vec![Method::GET, Method::POST]);
    }

    #[test]
    fn clones_share_the_callable_target() {
        let handler = get("/x", |_conn| async { Ok(Response::new(StatusCode::OK)) }).unwrap();
        let clone = handler.clone();
        assert!(handler.same_target(&clone));
    }
}
