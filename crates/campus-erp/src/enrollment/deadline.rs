use chrono::NaiveDate;

/// Per-enrollment drops are accepted only strictly before the cutoff.
pub fn enrollment_drop_open(today: NaiveDate, cutoff: NaiveDate) -> bool {
    today < cutoff
}

/// Course-level drops stay open through the deadline day itself; no deadline means open.
pub fn course_drop_open(today: NaiveDate, deadline: Option<NaiveDate>) -> bool {
    match deadline {
        Some(deadline) => today <= deadline,
        None => true,
    }
}
