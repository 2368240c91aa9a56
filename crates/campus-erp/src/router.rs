use std::sync::Arc;

use axum::Router;

use crate::campus::Campus;
use crate::enrollment::enrollment_router;
use crate::identity::identity_router;

/// All JSON endpoints of the library: registration, drops, schedules, and login.
pub fn api_router(campus: &Campus) -> Router {
    enrollment_router(Arc::clone(&campus.engine))
        .merge(identity_router(Arc::clone(&campus.directory)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnrollmentConfig;
    use crate::identity::{PasswordHasher, Role};
    use crate::storage::Database;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    fn campus() -> Campus {
        Campus::new(
            Arc::new(Database::open_in_memory().expect("database opens")),
            EnrollmentConfig::default(),
            PasswordHasher::new(4),
            Arc::new(mockable::DefaultClock),
        )
    }

    #[tokio::test]
    async fn merged_router_serves_login_and_enrollment_routes() {
        let campus = campus();
        campus
            .directory
            .create_user("admin1", Role::Admin, "pw")
            .expect("user");
        let router = api_router(&campus);

        let login = router
            .clone()
            .oneshot(
                Request::post("/api/v1/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"username":"admin1","password":"pw"}"#))
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(login.status(), StatusCode::OK);

        let schedule = router
            .oneshot(
                Request::get("/api/v1/students/nobody/schedule")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(schedule.status(), StatusCode::OK);
    }
}
