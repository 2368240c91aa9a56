mod admin;
mod cli;
mod infra;
mod routes;
mod server;

use campus_erp::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
