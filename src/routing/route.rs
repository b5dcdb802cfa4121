//! Route table entries.
//!
//! # Responsibilities
//! - Bind one normalized path to its handlers
//! - Keep the per-method handler map for HTTP routes
//! - Reject duplicate method registrations on one path
//!
//! # Design Decisions
//! - One `Route` per path; HTTP methods share the route, non-HTTP
//!   handlers get a dedicated route
//! - The method map is built once at construction; dispatch reads it
//!   without locking

use std::collections::BTreeMap;

use http::Method;

use crate::error::ConfigError;
use crate::routing::handler::{HttpHandler, MountHandler, RouteHandler, WsHandler};

/// Key of one entry in a route-handler map: an HTTP verb or one of the
/// non-HTTP sentinels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerKey {
    Method(Method),
    Websocket,
    Mount,
}

impl HandlerKey {
    fn rank(&self) -> u8 {
        match self {
            HandlerKey::Method(_) => 0,
            HandlerKey::Websocket => 1,
            HandlerKey::Mount => 2,
        }
    }

    fn method_str(&self) -> &str {
        match self {
            HandlerKey::Method(method) => method.as_str(),
            _ => "",
        }
    }
}

impl Ord for HandlerKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank()
            .cmp(&other.rank())
            .then_with(|| self.method_str().cmp(other.method_str()))
    }
}

impl PartialOrd for HandlerKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Mapping from verb (or sentinel) to handler for one path.
pub type RouteHandlerMap = BTreeMap<HandlerKey, RouteHandler>;

/// An HTTP route holding the merged handlers for one path.
#[derive(Debug, Clone)]
pub struct HttpRoute {
    path: String,
    handlers: Vec<HttpHandler>,
}

impl HttpRoute {
    /// Build a route from its handlers, rejecting duplicate methods.
    pub fn new(path: impl Into<String>, handlers: Vec<HttpHandler>) -> Result<Self, ConfigError> {
        let path = path.into();
        let mut seen: BTreeMap<&str, ()> = BTreeMap::new();
        for handler in &handlers {
            for method in &handler.methods {
                if seen.insert(method.as_str(), ()).is_some() {
                    return Err(ConfigError::DuplicateHandler {
                        path,
                        method: method.to_string(),
                    });
                }
            }
        }
        Ok(Self { path, handlers })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn handlers(&self) -> &[HttpHandler] {
        &self.handlers
    }

    /// Methods exposed by this route, in registration order.
    pub fn methods(&self) -> Vec<Method> {
        let mut methods = Vec::new();
        for handler in &self.handlers {
            for method in &handler.methods {
                if !methods.contains(method) {
                    methods.push(method.clone());
                }
            }
        }
        methods
    }

    /// Resolve the handler serving `method`, if registered.
    pub fn handler_for(&self, method: &Method) -> Option<&HttpHandler> {
        self.handlers
            .iter()
            .find(|handler| handler.methods.contains(method))
    }
}

/// A WebSocket route: exactly one handler per path.
#[derive(Debug, Clone)]
pub struct WsRoute {
    path: String,
    handler: WsHandler,
}

impl WsRoute {
    pub fn new(path: impl Into<String>, handler: WsHandler) -> Self {
        Self {
            path: path.into(),
            handler,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn handler(&self) -> &WsHandler {
        &self.handler
    }
}

/// A mounted sub-application route: exactly one handler per path.
#[derive(Debug, Clone)]
pub struct MountRoute {
    path: String,
    handler: MountHandler,
}

impl MountRoute {
    pub fn new(path: impl Into<String>, handler: MountHandler) -> Self {
        Self {
            path: path.into(),
            handler,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn handler(&self) -> &MountHandler {
        &self.handler
    }
}

/// One entry in the route table.
#[derive(Debug, Clone)]
pub enum Route {
    Http(HttpRoute),
    Websocket(WsRoute),
    Mount(MountRoute),
}

impl Route {
    pub fn path(&self) -> &str {
        match self {
            Route::Http(route) => route.path(),
            Route::Websocket(route) => route.path(),
            Route::Mount(route) => route.path(),
        }
    }

    /// The per-verb handler view of this route.
    pub fn handler_map(&self) -> RouteHandlerMap {
        let mut map = RouteHandlerMap::new();
        match self {
            Route::Http(route) => {
                for handler in route.handlers() {
                    for method in &handler.methods {
                        map.insert(
                            HandlerKey::Method(method.clone()),
                            RouteHandler::Http(handler.clone()),
                        );
                    }
                }
            }
            Route::Websocket(route) => {
                map.insert(
                    HandlerKey::Websocket,
                    RouteHandler::Websocket(route.handler().clone()),
                );
            }
            Route::Mount(route) => {
                map.insert(HandlerKey::Mount, RouteHandler::Mount(route.handler().clone()));
            }
        }
        map
    }
}
