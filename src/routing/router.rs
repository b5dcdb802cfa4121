//! Router table: registration, merging and flattening.
//!
//! # Responsibilities
//! - Store routers in a flat arena, parent/child relations as indices
//! - Register controllers, nested routers and single handlers
//! - Merge HTTP handlers registered for the same path across calls
//! - Resolve inherited cross-cutting options (guards, middleware,
//!   dependencies) along the parent chain
//!
//! # Design Decisions
//! - Arena indices instead of owner back-pointers: "already registered"
//!   is simply `parent.is_some()`, and re-parenting checks cannot dangle
//! - The table is mutated during startup only; request-time reads take
//!   no locks
//! - Merge replaces the existing route with a new one built from the
//!   union of handlers, new handlers first

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::middleware::Middleware;
use crate::routing::controller::Controller;
use crate::routing::handler::{Guard, HttpHandler, MountHandler, Provider, RouteHandler, WsHandler};
use crate::routing::path::{join_paths, normalize_path};
use crate::routing::route::{HandlerKey, HttpRoute, MountRoute, Route, RouteHandlerMap, WsRoute};

/// Index of a router in the [`RouterTable`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouterId(usize);

/// Cross-cutting configuration inherited by child routers.
#[derive(Default, Clone)]
pub struct RouterOptions {
    pub guards: Vec<Guard>,
    pub middleware: Vec<Arc<dyn Middleware>>,
    pub dependencies: BTreeMap<String, Provider>,
}

/// Anything that can be passed to [`RouterTable::register`].
pub enum RouteTarget {
    Controller(Controller),
    Router(RouterId),
    Handler(RouteHandler),
}

impl From<Controller> for RouteTarget {
    fn from(controller: Controller) -> Self {
        RouteTarget::Controller(controller)
    }
}

impl From<RouterId> for RouteTarget {
    fn from(id: RouterId) -> Self {
        RouteTarget::Router(id)
    }
}

impl From<RouteHandler> for RouteTarget {
    fn from(handler: RouteHandler) -> Self {
        RouteTarget::Handler(handler)
    }
}

impl From<HttpHandler> for RouteTarget {
    fn from(handler: HttpHandler) -> Self {
        RouteTarget::Handler(RouteHandler::Http(handler))
    }
}

impl From<WsHandler> for RouteTarget {
    fn from(handler: WsHandler) -> Self {
        RouteTarget::Handler(RouteHandler::Websocket(handler))
    }
}

impl From<MountHandler> for RouteTarget {
    fn from(handler: MountHandler) -> Self {
        RouteTarget::Handler(RouteHandler::Mount(handler))
    }
}

struct RouterNode {
    path: String,
    parent: Option<RouterId>,
    children: Vec<RouterId>,
    routes: Vec<Route>,
    options: RouterOptions,
}

/// Arena of routers. Created with a root router at `/`.
pub struct RouterTable {
    nodes: Vec<RouterNode>,
}

impl RouterTable {
    pub fn new() -> Self {
        Self {
            nodes: vec![RouterNode {
                path: "/".to_string(),
                parent: None,
                children: Vec::new(),
                routes: Vec::new(),
                options: RouterOptions::default(),
            }],
        }
    }

    /// The root router.
    pub fn root(&self) -> RouterId {
        RouterId(0)
    }

    /// Create a new, unattached router with the given path prefix.
    pub fn router(&mut self, path: impl Into<String>) -> RouterId {
        self.router_with_options(path, RouterOptions::default())
    }

    /// Create a new, unattached router with options.
    pub fn router_with_options(
        &mut self,
        path: impl Into<String>,
        options: RouterOptions,
    ) -> RouterId {
        let id = RouterId(self.nodes.len());
        self.nodes.push(RouterNode {
            path: normalize_path(&path.into()),
            parent: None,
            children: Vec::new(),
            routes: Vec::new(),
            options,
        });
        id
    }

    pub fn path(&self, id: RouterId) -> &str {
        &self.nodes[id.0].path
    }

    pub fn routes(&self, id: RouterId) -> &[Route] {
        &self.nodes[id.0].routes
    }

    pub fn parent(&self, id: RouterId) -> Option<RouterId> {
        self.nodes[id.0].parent
    }

    /// Register a controller, a nested router or a single handler.
    ///
    /// Returns the indices of the routes affected, in `routes(router)`.
    pub fn register(
        &mut self,
        router: RouterId,
        target: impl Into<RouteTarget>,
    ) -> Result<Vec<usize>, ConfigError> {
        let flattened = self.flatten_target(router, target.into())?;
        let prefix = self.nodes[router.0].path.clone();

        let mut affected = Vec::new();
        for (relative_path, handler_map) in flattened {
            let path = join_paths([prefix.as_str(), relative_path.as_str()]);

            let new_http = unique_http_handlers(
                handler_map.values().filter_map(|handler| match handler {
                    RouteHandler::Http(http_handler) => Some(http_handler.clone()),
                    _ => None,
                }),
            );
            if !new_http.is_empty() {
                affected.push(self.upsert_http_route(router, &path, new_http)?);
            }

            if let Some(RouteHandler::Websocket(ws_handler)) =
                handler_map.get(&HandlerKey::Websocket)
            {
                affected.push(self.push_ws_route(router, &path, ws_handler.clone())?);
            }

            if let Some(RouteHandler::Mount(mount_handler)) = handler_map.get(&HandlerKey::Mount) {
                affected.push(self.push_mount_route(router, &path, mount_handler.clone())?);
            }
        }

        tracing::debug!(
            router = %prefix,
            routes = affected.len(),
            "registered route handlers"
        );
        Ok(affected)
    }

    /// Map the router's routes to their per-verb handler views.
    pub fn route_handler_map(&self, id: RouterId) -> BTreeMap<String, RouteHandlerMap> {
        let mut map: BTreeMap<String, RouteHandlerMap> = BTreeMap::new();
        for route in &self.nodes[id.0].routes {
            map.entry(route.path().to_string())
                .or_default()
                .extend(route.handler_map());
        }
        map
    }

    /// Guards along the parent chain, ancestors first.
    pub fn resolve_guards(&self, id: RouterId) -> Vec<Guard> {
        let mut guards = Vec::new();
        for node_id in self.ancestry(id) {
            guards.extend(self.nodes[node_id.0].options.guards.iter().cloned());
        }
        guards
    }

    /// Middleware along the parent chain, ancestors first.
    pub fn resolve_middleware(&self, id: RouterId) -> Vec<Arc<dyn Middleware>> {
        let mut middleware = Vec::new();
        for node_id in self.ancestry(id) {
            middleware.extend(self.nodes[node_id.0].options.middleware.iter().cloned());
        }
        middleware
    }

    /// Dependencies along the parent chain; child definitions override
    /// ancestors registered under the same key.
    pub fn resolve_dependencies(&self, id: RouterId) -> BTreeMap<String, Provider> {
        let mut dependencies = BTreeMap::new();
        for node_id in self.ancestry(id) {
            for (key, provider) in &self.nodes[node_id.0].options.dependencies {
                dependencies.insert(key.clone(), provider.clone());
            }
        }
        dependencies
    }

    /// Parent chain from the root down to (and including) `id`.
    fn ancestry(&self, id: RouterId) -> Vec<RouterId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        chain
    }

    /// Validate the target and flatten it to relative-path → handler-map.
    fn flatten_target(
        &mut self,
        router: RouterId,
        target: RouteTarget,
    ) -> Result<BTreeMap<String, RouteHandlerMap>, ConfigError> {
        match target {
            RouteTarget::Router(child) => {
                if child == router {
                    return Err(ConfigError::RouterOnItself);
                }
                if self.nodes[child.0].parent.is_some() {
                    return Err(ConfigError::RouterAlreadyRegistered {
                        path: self.nodes[child.0].path.clone(),
                    });
                }
                self.nodes[child.0].parent = Some(router);
                self.nodes[router.0].children.push(child);
                // The child's route paths already carry its own prefix.
                Ok(self.route_handler_map(child))
            }
            RouteTarget::Controller(controller) => {
                let mut map: BTreeMap<String, RouteHandlerMap> = BTreeMap::new();
                for handler in controller.handlers() {
                    for handler_path in handler.paths() {
                        let path = join_paths([controller.path.as_str(), handler_path.as_str()]);
                        insert_handler(map.entry(path).or_default(), handler.clone());
                    }
                }
                Ok(map)
            }
            RouteTarget::Handler(handler) => {
                let mut map: BTreeMap<String, RouteHandlerMap> = BTreeMap::new();
                for handler_path in handler.paths() {
                    insert_handler(map.entry(handler_path.clone()).or_default(), handler.clone());
                }
                Ok(map)
            }
        }
    }

    /// Create or merge the HTTP route at `path`.
    ///
    /// When a route already exists it is replaced by a new route built
    /// from the union of handlers: new handlers first, existing handlers
    /// retained after them.
    fn upsert_http_route(
        &mut self,
        router: RouterId,
        path: &str,
        mut handlers: Vec<HttpHandler>,
    ) -> Result<usize, ConfigError> {
        let existing = unique_http_handlers(
            self.route_handler_map(router)
                .get(path)
                .into_iter()
                .flat_map(|map| map.values())
                .filter_map(|handler| match handler {
                    RouteHandler::Http(http_handler) => Some(http_handler.clone()),
                    _ => None,
                }),
        );

        let node = &mut self.nodes[router.0];
        if existing.is_empty() {
            node.routes
                .push(Route::Http(HttpRoute::new(path, handlers)?));
            return Ok(node.routes.len() - 1);
        }

        handlers.extend(existing);
        let index = node
            .routes
            .iter()
            .position(|route| matches!(route, Route::Http(_)) && route.path() == path)
            .ok_or_else(|| ConfigError::MissingMergeRoute {
                path: path.to_string(),
            })?;
        node.routes[index] = Route::Http(HttpRoute::new(path, handlers)?);
        Ok(index)
    }

    fn push_ws_route(
        &mut self,
        router: RouterId,
        path: &str,
        handler: WsHandler,
    ) -> Result<usize, ConfigError> {
        let node = &mut self.nodes[router.0];
        if node
            .routes
            .iter()
            .any(|route| matches!(route, Route::Websocket(_)) && route.path() == path)
        {
            return Err(ConfigError::DuplicateHandler {
                path: path.to_string(),
                method: "websocket".to_string(),
            });
        }
        node.routes.push(Route::Websocket(WsRoute::new(path, handler)));
        Ok(node.routes.len() - 1)
    }

    fn push_mount_route(
        &mut self,
        router: RouterId,
        path: &str,
        handler: MountHandler,
    ) -> Result<usize, ConfigError> {
        let node = &mut self.nodes[router.0];
        if node
            .routes
            .iter()
            .any(|route| matches!(route, Route::Mount(_)) && route.path() == path)
        {
            return Err(ConfigError::DuplicateHandler {
                path: path.to_string(),
                method: "asgi".to_string(),
            });
        }
        node.routes.push(Route::Mount(MountRoute::new(path, handler)));
        Ok(node.routes.len() - 1)
    }
}

impl Default for RouterTable {
    fn default() -> Self {
        Self::new()
    }
}

fn insert_handler(map: &mut RouteHandlerMap, handler: RouteHandler) {
    match &handler {
        RouteHandler::Http(http_handler) => {
            for method in &http_handler.methods {
                map.insert(HandlerKey::Method(method.clone()), handler.clone());
            }
        }
        RouteHandler::Websocket(_) => {
            map.insert(HandlerKey::Websocket, handler);
        }
        RouteHandler::Mount(_) => {
            map.insert(HandlerKey::Mount, handler);
        }
    }
}

/// Deduplicate handlers by callable target, preserving order. One handler
/// registered for several methods appears once.
fn unique_http_handlers(handlers: impl Iterator<Item = HttpHandler>) -> Vec<HttpHandler> {
    let mut unique: Vec<HttpHandler> = Vec::new();
    for handler in handlers {
        if !unique.iter().any(|seen| seen.same_target(&handler)) {
            unique.push(handler);
        }
    }
    unique
}
