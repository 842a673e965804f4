//! lookup-service: resolves a postal code to its locality and current
//! temperature through two external providers.
pub mod config;
pub mod handlers;
pub mod services;
pub mod startup;

pub use startup::{AppState, Application};
