//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (at startup):
//!     Controller / Router / handler descriptor
//!         → router.rs (validate target, flatten to path → handler-map)
//!         → path.rs (join prefix, normalize separators)
//!         → route.rs (merge into the per-path Route, reject duplicates)
//!
//! Dispatch (at request time):
//!     route table is read-only; the transport looks up the Route for a
//!     path and picks the handler by method (or the ws/mount sentinel)
//! ```
//!
//! # Design Decisions
//! - Routes are mutated only during registration, never during requests
//! - One Route per path; HTTP methods merge, non-HTTP handlers stay
//!   exclusive per path
//! - Handler descriptors are validated eagerly by their builders

pub mod controller;
pub mod handler;
pub mod path;
pub mod route;
pub mod router;

pub use controller::Controller;
pub use handler::{HttpHandler, MountHandler, RouteHandler, WsHandler};
pub use path::{join_paths, normalize_path};
pub use route::{HandlerKey, HttpRoute, MountRoute, Route, RouteHandlerMap, WsRoute};
pub use router::{RouteTarget, RouterId, RouterOptions, RouterTable};
