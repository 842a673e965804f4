//! `POST /` with `{"cep": "<code>"}`: validate, then relay to lookup-service.

use crate::startup::AppState;
use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use service_core::error::AppError;
use service_core::models::{LookupRequest, WeatherRecord};
use service_core::observability::{extract_request_id, TraceContext};
use tracing::Instrument;
use validator::Validate;

const DOWNSTREAM_FAILED: &str = "weather lookup failed";

pub async fn post_temperature(
    State(state): State<AppState>,
    trace: TraceContext,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WeatherRecord>, AppError> {
    // Decoding counts as part of validation: a body that is not a JSON object
    // fails here with 400, before any downstream call.
    let step = trace.step("validate");
    let request = match LookupRequest::from_json(&body) {
        Ok(request) => request,
        Err(e) => {
            step.fail("invalid payload", &e);
            return Err(AppError::BadRequest(anyhow::Error::new(e)));
        }
    };
    if let Err(errors) = request.validate() {
        step.fail("invalid zipcode", &errors);
        return Err(AppError::from(errors));
    }
    step.succeed();

    let request_id = extract_request_id(&headers);
    let step = trace.step("call-downstream");
    match state
        .lookup
        .fetch_weather(&request.cep, &step.context(), request_id.as_deref())
        .instrument(step.span().clone())
        .await
    {
        Ok(record) => {
            step.succeed();
            Ok(Json(record))
        }
        Err(e) => {
            step.fail(DOWNSTREAM_FAILED, &e);
            Err(AppError::InternalError(anyhow::Error::new(e)))
        }
    }
}
