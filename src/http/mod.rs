//! HTTP surface: router, CORS and health

pub mod routes;

pub use routes::build_router;
