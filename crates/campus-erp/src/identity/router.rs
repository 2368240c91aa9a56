use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::users::{IdentityError, UserDirectory};

pub fn identity_router(directory: Arc<UserDirectory>) -> Router {
    Router::new()
        .route("/api/v1/auth/login", post(login_handler))
        .with_state(directory)
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    pub(crate) username: String,
    pub(crate) password: String,
}

pub(crate) async fn login_handler(
    State(directory): State<Arc<UserDirectory>>,
    Json(request): Json<LoginRequest>,
) -> Response {
    // Verification is CPU-bound at the configured cost.
    let outcome = tokio::task::spawn_blocking(move || {
        directory.authenticate(&request.username, &request.password)
    })
    .await;

    match outcome {
        Ok(Ok(session)) => (StatusCode::OK, Json(session)).into_response(),
        Ok(Err(err)) => identity_error_response(&err),
        Err(err) => {
            tracing::error!(%err, "login task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    }
}

pub(crate) fn identity_status(err: &IdentityError) -> StatusCode {
    match err {
        IdentityError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        IdentityError::Locked(_) => StatusCode::LOCKED,
        IdentityError::BlankUsername => StatusCode::UNPROCESSABLE_ENTITY,
        IdentityError::DuplicateUser(_) => StatusCode::CONFLICT,
        IdentityError::UnknownUser(_) => StatusCode::NOT_FOUND,
        IdentityError::Password(_) | IdentityError::Storage(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn identity_error_response(err: &IdentityError) -> Response {
    (identity_status(err), Json(json!({ "error": err.to_string() }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{PasswordHasher, Role};
    use crate::storage::Database;
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    fn router_with_user() -> Router {
        let db = Arc::new(Database::open_in_memory().expect("database opens"));
        let directory = UserDirectory::new(
            db,
            PasswordHasher::new(4),
            Arc::new(mockable::DefaultClock),
        );
        directory
            .create_user("stu1", Role::Student, "pass123")
            .expect("user created");
        identity_router(Arc::new(directory))
    }

    fn login(username: &str, password: &str) -> Request<Body> {
        Request::post("/api/v1/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::to_vec(&json!({ "username": username, "password": password }))
                    .expect("serialize"),
            ))
            .expect("request builds")
    }

    #[tokio::test]
    async fn login_returns_session_view() {
        let response = router_with_user()
            .oneshot(login("stu1", "pass123"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
            .await
            .expect("body");
        let session: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(session["username"], json!("stu1"));
        assert_eq!(session["role"], json!("STUDENT"));
    }

    #[tokio::test]
    async fn bad_password_is_unauthorized() {
        let response = router_with_user()
            .oneshot(login("stu1", "guess"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
