//! `GET /weather?cep=<code>`: validate, resolve locality, resolve temperature.
//!
//! Each step runs under its own span and must finish before the next starts.
//! Any provider failure ends the request with 404.

use crate::startup::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use service_core::error::AppError;
use service_core::models::{LookupQuery, WeatherRecord};
use service_core::observability::TraceContext;
use tracing::Instrument;
use validator::Validate;

const ZIPCODE_NOT_FOUND: &str = "can not find zipcode";
const TEMPERATURE_NOT_FOUND: &str = "can not find temperature";

pub async fn get_weather(
    State(state): State<AppState>,
    trace: TraceContext,
    query: Result<Query<LookupQuery>, QueryRejection>,
) -> Result<Json<WeatherRecord>, AppError> {
    // An unparseable query string is treated like a missing code
    let query = query.map(|Query(q)| q).unwrap_or(LookupQuery {
        cep: String::new(),
    });

    let step = trace.step("validate");
    if let Err(errors) = query.validate() {
        step.fail("invalid zipcode", &errors);
        return Err(AppError::from(errors));
    }
    step.succeed();

    let step = trace.step("resolve-locality");
    let city = match state
        .provider
        .resolve_locality(&query.cep, &step.context())
        .instrument(step.span().clone())
        .await
    {
        Ok(city) => {
            step.succeed();
            city
        }
        Err(e) => {
            step.fail(ZIPCODE_NOT_FOUND, &e);
            return Err(AppError::NotFound(ZIPCODE_NOT_FOUND.to_string()));
        }
    };

    let step = trace.step("resolve-temperature");
    let temp_c = match state
        .provider
        .resolve_temperature(&city, &step.context())
        .instrument(step.span().clone())
        .await
    {
        Ok(temp_c) => {
            step.succeed();
            temp_c
        }
        Err(e) => {
            step.fail(TEMPERATURE_NOT_FOUND, &e);
            return Err(AppError::NotFound(TEMPERATURE_NOT_FOUND.to_string()));
        }
    };

    Ok(Json(WeatherRecord::from_celsius(city, temp_c)))
}
