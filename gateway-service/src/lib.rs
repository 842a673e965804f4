//! gateway-service: public entry point that validates a postal code and
//! relays the weather lookup to lookup-service.
pub mod config;
pub mod handlers;
pub mod services;
pub mod startup;

pub use startup::{AppState, Application};
