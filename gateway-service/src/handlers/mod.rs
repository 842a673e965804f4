pub mod health;
pub mod temperature;

pub use health::health_check;
pub use temperature::post_temperature;
