pub mod providers;

pub use providers::{
    HttpWeatherProvider, MockWeatherProvider, ProviderError, ViaCepClient, WeatherApiClient,
    WeatherProvider,
};
