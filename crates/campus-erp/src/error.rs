use crate::academics::CatalogError;
use crate::config::ConfigError;
use crate::enrollment::router::rejection_status;
use crate::enrollment::EnrollmentError;
use crate::grading::GradingError;
use crate::identity::router::identity_status;
use crate::identity::IdentityError;
use crate::storage::StorageError;
use crate::telemetry::TelemetryError;
use crate::transfer::TransferError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Storage(StorageError),
    Catalog(CatalogError),
    Enrollment(EnrollmentError),
    Identity(IdentityError),
    Grading(GradingError),
    Transfer(TransferError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Storage(err) => write!(f, "storage error: {}", err),
            AppError::Catalog(err) => write!(f, "catalog error: {}", err),
            AppError::Enrollment(err) => write!(f, "{}", err),
            AppError::Identity(err) => write!(f, "identity error: {}", err),
            AppError::Grading(err) => write!(f, "grading error: {}", err),
            AppError::Transfer(err) => write!(f, "transfer error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Storage(err) => Some(err),
            AppError::Catalog(err) => Some(err),
            AppError::Enrollment(err) => Some(err),
            AppError::Identity(err) => Some(err),
            AppError::Grading(err) => Some(err),
            AppError::Transfer(err) => Some(err),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Enrollment(EnrollmentError::Rejected(rejection)) => {
                rejection_status(rejection)
            }
            AppError::Identity(err) => identity_status(err),
            AppError::Catalog(CatalogError::Duplicate(_)) => StatusCode::CONFLICT,
            AppError::Catalog(
                CatalogError::UnknownCourse(_)
                | CatalogError::UnknownSection(_)
                | CatalogError::UnknownInstructor(_),
            ) => StatusCode::NOT_FOUND,
            AppError::Catalog(CatalogError::InvalidCapacity | CatalogError::BlankStudentId) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Grading(GradingError::NotInstructor | GradingError::NotAssigned(_)) => {
                StatusCode::FORBIDDEN
            }
            AppError::Grading(
                GradingError::UnknownSection(_) | GradingError::NotEnrolled { .. },
            ) => StatusCode::NOT_FOUND,
            AppError::Grading(GradingError::InvalidScore(_) | GradingError::NoComponents(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Transfer(
                TransferError::Csv(_) | TransferError::InvalidRow { .. },
            ) => StatusCode::BAD_REQUEST,
            AppError::Transfer(
                TransferError::UnknownSection(_) | TransferError::UnknownStudent(_),
            ) => StatusCode::NOT_FOUND,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Storage(_)
            | AppError::Catalog(CatalogError::Storage(_))
            | AppError::Enrollment(EnrollmentError::Storage(_))
            | AppError::Grading(GradingError::Storage(_))
            | AppError::Transfer(
                TransferError::Io(_) | TransferError::Password(_) | TransferError::Storage(_),
            ) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<StorageError> for AppError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<CatalogError> for AppError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

impl From<EnrollmentError> for AppError {
    fn from(value: EnrollmentError) -> Self {
        Self::Enrollment(value)
    }
}

impl From<IdentityError> for AppError {
    fn from(value: IdentityError) -> Self {
        Self::Identity(value)
    }
}

impl From<GradingError> for AppError {
    fn from(value: GradingError) -> Self {
        Self::Grading(value)
    }
}

impl From<TransferError> for AppError {
    fn from(value: TransferError) -> Self {
        Self::Transfer(value)
    }
}
