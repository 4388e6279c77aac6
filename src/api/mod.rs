//! API module
//!
//! HTTP surface over the command handlers and the read model.

mod routes;

pub use routes::create_router;
