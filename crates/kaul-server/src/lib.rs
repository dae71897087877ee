//! # kaul-server
//!
//! HTTP API for the Kaul vote service, built on axum.
//!
//! ## API Endpoints
//!
//! | Endpoint | Method | Description |
//! |----------|--------|-------------|
//! | `/subjects` | GET | Subjects, point accounts and profiles |
//! | `/vote` | POST | Cast a vote: `{ id, voteType, userId }` |
//! | `/health` | GET | Liveness and uptime |
//!
//! Every route answers CORS preflight for any origin with methods
//! `GET,POST,OPTIONS` and header `Content-Type`.
//!
//! Validation failures return 400 with `{ "success": false, "error": msg }`;
//! store failures return 500 with a generic message.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use server::KaulServer;
pub use state::{AppState, SharedStore};
