use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::models::{slugify, Event, NewEvent};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{
    create_failure, create_rejected, create_success, list_failure, list_success, lookup_success,
};

pub mod form;

use form::CreateEventForm;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "devevent-api",
    };

    (StatusCode::OK, Json(payload)).into_response()
}

/// GET /events/:slug
pub async fn get_event_by_slug(
    State(state): State<AppState>,
    Path(raw_slug): Path<String>,
) -> Result<Response, AppError> {
    let slug = raw_slug.trim().to_lowercase();
    if slug.is_empty() {
        return Err(AppError::Validation(
            "Invalid or missing slug parameter".to_string(),
        ));
    }

    let event = state
        .store
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    Ok(lookup_success(event))
}

/// GET /events
pub async fn list_events(State(state): State<AppState>) -> Response {
    match state.store.list_recent().await {
        Ok(events) => list_success(events),
        Err(err) => {
            err.log();
            list_failure(err.public_message())
        }
    }
}

/// POST /events
///
/// The submission is validated in full before the image leaves the process;
/// only then is the asset uploaded and the record inserted.
pub async fn create_event(State(state): State<AppState>, multipart: Multipart) -> Response {
    let submission = match CreateEventForm::from_multipart(multipart).await {
        Ok(submission) => submission,
        Err(err) => {
            err.log();
            return create_rejected(err.public_message());
        }
    };

    match persist_event(&state, submission).await {
        Ok(event) => create_success(event),
        Err(err) => {
            err.log();
            if err.status_code() == StatusCode::BAD_REQUEST {
                create_rejected(err.public_message())
            } else {
                create_failure(err.public_message())
            }
        }
    }
}

async fn persist_event(state: &AppState, submission: CreateEventForm) -> Result<Event, AppError> {
    let CreateEventForm {
        title,
        description,
        overview,
        date,
        time,
        venue,
        location,
        mode,
        audience,
        organizer,
        tags,
        agenda,
        image,
    } = submission;

    let slug = slugify(&title);
    if slug.is_empty() {
        return Err(AppError::Validation(
            "Title must contain at least one alphanumeric character".to_string(),
        ));
    }

    let image_url = state.assets.upload_image(image).await?;

    let record = NewEvent {
        slug,
        title,
        description,
        overview,
        date,
        time,
        location,
        venue,
        mode,
        audience,
        organizer,
        agenda,
        tags,
        image: image_url,
    };

    state.store.insert(record).await
}
