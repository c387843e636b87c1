use crate::errors::{AppError, PollError};
use crate::models::{ConfigureRequest, TrackerView};
use crate::state::AppState;
use crate::ui::render_index;
use axum::{
    extract::State,
    response::{Html, Redirect},
    Form, Json,
};
use serde_json::{json, Value};
use tracing::debug;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(&state.controller.view()))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn get_state(State(state): State<AppState>) -> Json<TrackerView> {
    Json(state.controller.view())
}

pub async fn configure(
    State(state): State<AppState>,
    Json(payload): Json<ConfigureRequest>,
) -> Result<Json<TrackerView>, AppError> {
    apply_configure(&state, &payload.backend_url).await?;
    Ok(Json(state.controller.view()))
}

pub async fn refresh(State(state): State<AppState>) -> Result<Json<TrackerView>, AppError> {
    apply_refresh(&state).await?;
    Ok(Json(state.controller.view()))
}

pub async fn reconfigure(State(state): State<AppState>) -> Json<TrackerView> {
    state.controller.show_setup();
    Json(state.controller.view())
}

pub async fn setup_form(
    State(state): State<AppState>,
    Form(payload): Form<ConfigureRequest>,
) -> Result<Redirect, AppError> {
    apply_configure(&state, &payload.backend_url).await?;
    Ok(Redirect::to("/"))
}

pub async fn refresh_form(State(state): State<AppState>) -> Result<Redirect, AppError> {
    apply_refresh(&state).await?;
    Ok(Redirect::to("/"))
}

pub async fn reconfigure_form(State(state): State<AppState>) -> Redirect {
    state.controller.show_setup();
    Redirect::to("/")
}

/// Configures the controller. Poll failures after a valid address are reported
/// through the request state, so only a blank address is an error here.
async fn apply_configure(state: &AppState, backend_url: &str) -> Result<(), AppError> {
    match state.controller.configure(backend_url).await {
        Ok(_) => Ok(()),
        Err(PollError::ConfigurationMissing) => {
            debug!("rejected blank backend address");
            Err(AppError::bad_request("backend_url must not be empty"))
        }
        Err(_) => Ok(()),
    }
}

async fn apply_refresh(state: &AppState) -> Result<(), AppError> {
    match state.controller.poll().await {
        Ok(_) => Ok(()),
        Err(err @ PollError::ConfigurationMissing) => Err(err.into()),
        Err(_) => Ok(()),
    }
}
