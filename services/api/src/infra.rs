use campus_erp::identity::Role;
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_role(raw: &str) -> Result<Role, String> {
    Role::parse(raw).ok_or_else(|| format!("unknown role '{raw}' (student, instructor, admin)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_must_be_iso_formatted() {
        assert_eq!(
            parse_date(" 2025-10-15 "),
            Ok(NaiveDate::from_ymd_opt(2025, 10, 15).expect("valid date"))
        );
        assert!(parse_date("15/10/2025").is_err());
    }

    #[test]
    fn roles_accept_any_case() {
        assert_eq!(parse_role("Instructor"), Ok(Role::Instructor));
        assert!(parse_role("dean").is_err());
    }
}
