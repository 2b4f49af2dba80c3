//! HTTP server: routes, middleware, state, and the error envelope

/// Error envelope
pub mod error;
/// Middleware
pub mod middleware;
/// Route handlers
pub mod routes;
/// Server assembly
pub mod server;
/// Shared application state
pub mod state;

pub use server::{run_server, HttpServer};
pub use state::AppState;
