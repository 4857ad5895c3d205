//! Inmo API server library.
//!
//! Exposes the building blocks (config, state, error handling, routes,
//! storage, WebSocket infrastructure) so integration tests and the binary
//! entrypoint can both reach them.

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod query;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod storage;
pub mod ws;
