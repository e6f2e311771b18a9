//! JSON bodies of the public API.
//!
//! The lookup endpoint reports `{success, ...}` while the list and create
//! endpoints report `{message, ...}`. Both shapes are part of the public
//! contract and are kept distinct here on purpose.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::models::Event;

#[derive(Serialize)]
struct LookupSuccess {
    success: bool,
    event: Event,
}

#[derive(Serialize)]
struct LookupFailure {
    success: bool,
    error: String,
}

#[derive(Serialize)]
struct EventList {
    message: String,
    events: Vec<Event>,
}

#[derive(Serialize)]
struct ListFailure {
    message: String,
    error: String,
}

#[derive(Serialize)]
struct EventCreated {
    message: String,
    event: Event,
}

#[derive(Serialize)]
struct CreateRejected {
    message: String,
}

#[derive(Serialize)]
struct CreateFailure {
    message: String,
    error: String,
}

pub fn lookup_success(event: Event) -> Response {
    let body = LookupSuccess {
        success: true,
        event,
    };
    (StatusCode::OK, Json(body)).into_response()
}

pub fn lookup_failure(status: StatusCode, error: impl Into<String>) -> Response {
    let body = LookupFailure {
        success: false,
        error: error.into(),
    };
    (status, Json(body)).into_response()
}

pub fn list_success(events: Vec<Event>) -> Response {
    let body = EventList {
        message: "Events Fetched Successfully".to_string(),
        events,
    };
    (StatusCode::OK, Json(body)).into_response()
}

pub fn list_failure(error: impl Into<String>) -> Response {
    let body = ListFailure {
        message: "Event Fetching Failed".to_string(),
        error: error.into(),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

pub fn create_success(event: Event) -> Response {
    let body = EventCreated {
        message: "Event Created Successfully".to_string(),
        event,
    };
    (StatusCode::CREATED, Json(body)).into_response()
}

pub fn create_rejected(message: impl Into<String>) -> Response {
    let body = CreateRejected {
        message: message.into(),
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

pub fn create_failure(error: impl Into<String>) -> Response {
    let body = CreateFailure {
        message: "Event Creation Failed".to_string(),
        error: error.into(),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
