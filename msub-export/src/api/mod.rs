//! HTTP API handlers for msub-export

pub mod callback;
pub mod export;
pub mod health;

pub use callback::callback_routes;
pub use export::export_routes;
pub use health::health_routes;
