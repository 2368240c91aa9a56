use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::engine::EnrollmentEngine;
use super::outcome::{EnrollmentError, Rejection};
use crate::academics::{CourseId, EnrollmentId, StudentId};
use crate::storage::StorageError;

/// Router builder exposing registration, drop, and availability endpoints.
pub fn enrollment_router(engine: Arc<EnrollmentEngine>) -> Router {
    Router::new()
        .route("/api/v1/enrollments", post(register_handler))
        .route(
            "/api/v1/enrollments/:enrollment_id",
            delete(drop_enrollment_handler),
        )
        .route(
            "/api/v1/students/:student_id/courses/:course_id",
            get(registration_status_handler).delete(drop_course_handler),
        )
        .route(
            "/api/v1/students/:student_id/schedule",
            get(schedule_handler),
        )
        .route(
            "/api/v1/courses/:course_id/availability",
            get(availability_handler),
        )
        .with_state(engine)
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterRequest {
    pub(crate) student_id: StudentId,
    pub(crate) course_id: CourseId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DropEnrollmentQuery {
    pub(crate) student_id: String,
}

pub(crate) async fn register_handler(
    State(engine): State<Arc<EnrollmentEngine>>,
    Json(request): Json<RegisterRequest>,
) -> Response {
    let outcome = run_blocking(engine, move |engine| {
        engine.register_for_course(&request.student_id, request.course_id)
    })
    .await;

    match outcome {
        Ok(Ok(registration)) => (StatusCode::CREATED, Json(registration)).into_response(),
        Ok(Err(err)) => enrollment_error_response(err),
        Err(response) => response,
    }
}

pub(crate) async fn drop_enrollment_handler(
    State(engine): State<Arc<EnrollmentEngine>>,
    Path(enrollment_id): Path<i64>,
    Query(query): Query<DropEnrollmentQuery>,
) -> Response {
    let outcome = run_blocking(engine, move |engine| {
        engine.drop_enrollment(EnrollmentId(enrollment_id), &StudentId(query.student_id))
    })
    .await;

    match outcome {
        Ok(Ok(receipt)) => (StatusCode::OK, Json(receipt)).into_response(),
        Ok(Err(err)) => enrollment_error_response(err),
        Err(response) => response,
    }
}

pub(crate) async fn drop_course_handler(
    State(engine): State<Arc<EnrollmentEngine>>,
    Path((student_id, course_id)): Path<(String, i64)>,
) -> Response {
    let outcome = run_blocking(engine, move |engine| {
        engine.drop_course(&StudentId(student_id), CourseId(course_id))
    })
    .await;

    match outcome {
        Ok(Ok(receipt)) => (StatusCode::OK, Json(receipt)).into_response(),
        Ok(Err(err)) => enrollment_error_response(err),
        Err(response) => response,
    }
}

pub(crate) async fn registration_status_handler(
    State(engine): State<Arc<EnrollmentEngine>>,
    Path((student_id, course_id)): Path<(String, i64)>,
) -> Response {
    let outcome = run_blocking(engine, move |engine| {
        engine.registration_status(&StudentId(student_id), CourseId(course_id))
    })
    .await;

    match outcome {
        Ok(Ok(status)) => (StatusCode::OK, Json(status)).into_response(),
        Ok(Err(err)) => storage_error_response(&err),
        Err(response) => response,
    }
}

pub(crate) async fn schedule_handler(
    State(engine): State<Arc<EnrollmentEngine>>,
    Path(student_id): Path<String>,
) -> Response {
    let outcome = run_blocking(engine, move |engine| {
        engine.student_schedule(&StudentId(student_id))
    })
    .await;

    match outcome {
        Ok(Ok(entries)) => (StatusCode::OK, Json(entries)).into_response(),
        Ok(Err(err)) => storage_error_response(&err),
        Err(response) => response,
    }
}

pub(crate) async fn availability_handler(
    State(engine): State<Arc<EnrollmentEngine>>,
    Path(course_id): Path<i64>,
) -> Response {
    let outcome = run_blocking(engine, move |engine| {
        engine.course_availability(CourseId(course_id))
    })
    .await;

    match outcome {
        Ok(Ok(availability)) => (StatusCode::OK, Json(availability)).into_response(),
        Ok(Err(err)) => storage_error_response(&err),
        Err(response) => response,
    }
}

/// Engine calls block on SQLite, so they run on the blocking pool.
async fn run_blocking<T, F>(engine: Arc<EnrollmentEngine>, f: F) -> Result<T, Response>
where
    F: FnOnce(&EnrollmentEngine) -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&engine))
        .await
        .map_err(|err| {
            tracing::error!(%err, "enrollment task failed");
            internal_error(err.to_string())
        })
}

pub(crate) fn rejection_status(rejection: &Rejection) -> StatusCode {
    match rejection {
        Rejection::MissingStudentId => StatusCode::UNPROCESSABLE_ENTITY,
        Rejection::NoActiveEnrollment | Rejection::NotEnrolled => StatusCode::NOT_FOUND,
        Rejection::AlreadyRegistered
        | Rejection::CourseFull
        | Rejection::AllSectionsFull
        | Rejection::DropDeadlinePassed { .. } => StatusCode::CONFLICT,
    }
}

pub(crate) fn enrollment_error_response(err: EnrollmentError) -> Response {
    match err {
        EnrollmentError::Rejected(rejection) => {
            let payload = json!({
                "error": rejection.to_string(),
                "reason": rejection.code(),
            });
            (rejection_status(&rejection), Json(payload)).into_response()
        }
        EnrollmentError::Storage(err) => storage_error_response(&err),
    }
}

fn storage_error_response(err: &StorageError) -> Response {
    internal_error(err.to_string())
}

fn internal_error(detail: String) -> Response {
    let payload = json!({ "error": detail });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}
