//! Async web-framework core: routing, sessions, storage, websockets.

pub mod connection;
pub mod error;
pub mod http;
pub mod middleware;
pub mod observability;
pub mod routing;
pub mod storage;

pub use connection::{Connection, ScopeKind, SessionMap};
pub use error::{ConfigError, Error, ExceptionHandlers, HttpError, WsError};
pub use http::{Cookie, Response, SameSite};
pub use middleware::session::{
    ClientSideSessionBackend, ClientSideSessionConfig, ServerSideSessionBackend,
    ServerSideSessionConfig, SessionBackend, SessionCookieConfig, SessionMiddleware,
};
pub use middleware::Middleware;
pub use routing::{Controller, RouterId, RouterTable};
pub use storage::{FileStorage, MemoryStorage, Storage};
