//! Controller: a named group of handlers under a shared path fragment.

use crate::routing::handler::{HttpHandler, MountHandler, RouteHandler, WsHandler};
use crate::routing::path::normalize_path;

/// Groups handlers under one path fragment. Registered as a unit; its
/// handlers are flattened relative to the registering router's prefix.
#[derive(Debug, Clone)]
pub struct Controller {
    pub path: String,
    pub name: Option<String>,
    handlers: Vec<RouteHandler>,
}

impl Controller {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: normalize_path(&path.into()),
            name: None,
            handlers: Vec::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn http(mut self, handler: HttpHandler) -> Self {
        self.handlers.push(RouteHandler::Http(handler));
        self
    }

    pub fn websocket(mut self, handler: WsHandler) -> Self {
        self.handlers.push(RouteHandler::Websocket(handler));
        self
    }

    pub fn mount(mut self, handler: MountHandler) -> Self {
        self.handlers.push(RouteHandler::Mount(handler));
        self
    }

    pub fn handlers(&self) -> &[RouteHandler] {
        &self.handlers
    }
}
