use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use mockable::Clock;
use serde_json::Value;

use crate::academics::{
    CatalogRepository, Course, NewSection, Schedule, Section, SettingsStore, Student, StudentId,
};
use crate::config::{CourseDropMode, EnrollmentConfig};
use crate::enrollment::EnrollmentEngine;
use crate::storage::Database;

/// Clock pinned to a calendar date that tests can move.
pub(crate) struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
    pub(crate) fn on(date: NaiveDate) -> Self {
        Self(Mutex::new(noon_utc(date)))
    }

    pub(crate) fn set(&self, date: NaiveDate) {
        *self.0.lock().expect("clock mutex poisoned") = noon_utc(date);
    }
}

fn noon_utc(date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_hms_opt(12, 0, 0).expect("valid time");
    Utc.from_utc_datetime(&naive)
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        // Keep the calendar date stable regardless of the host timezone.
        let naive = self.utc().date_naive().and_hms_opt(12, 0, 0).expect("valid time");
        Local
            .from_local_datetime(&naive)
            .single()
            .expect("unambiguous local noon")
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.0.lock().expect("clock mutex poisoned")
    }
}

pub(crate) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(crate) fn cutoff() -> NaiveDate {
    date(2025, 11, 30)
}

pub(crate) struct Fixture {
    pub(crate) db: Arc<Database>,
    pub(crate) clock: Arc<FixedClock>,
    pub(crate) catalog: CatalogRepository,
    pub(crate) settings: SettingsStore,
    pub(crate) engine: Arc<EnrollmentEngine>,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self::with_mode(CourseDropMode::Delete)
    }

    pub(crate) fn with_mode(course_drop_mode: CourseDropMode) -> Self {
        let db = Arc::new(Database::open_in_memory().expect("database opens"));
        let clock = Arc::new(FixedClock::on(date(2025, 9, 1)));
        let engine = Arc::new(EnrollmentEngine::new(
            db.clone(),
            clock.clone(),
            EnrollmentConfig {
                drop_cutoff: cutoff(),
                course_drop_mode,
            },
        ));
        Self {
            catalog: CatalogRepository::new(db.clone()),
            settings: SettingsStore::new(db.clone()),
            db,
            clock,
            engine,
        }
    }

    pub(crate) fn course(&self, code: &str) -> Course {
        self.catalog
            .add_course(code, &format!("{code} lecture"), 4)
            .expect("course created")
    }

    pub(crate) fn section(&self, course: &Course, capacity: u32) -> Section {
        self.catalog
            .add_section(&NewSection {
                course_id: course.course_id,
                instructor_id: None,
                capacity,
                schedule: Schedule {
                    days: "TTh".to_string(),
                    start_time: "11:00".to_string(),
                    end_time: "12:30".to_string(),
                },
                room: "C-201".to_string(),
                semester: "Monsoon".to_string(),
                year: 2025,
            })
            .expect("section created")
    }

    pub(crate) fn student(&self, roll: &str) -> StudentId {
        let student_id = StudentId::new(roll);
        self.catalog
            .add_student(&Student {
                student_id: student_id.clone(),
                user_id: None,
                name: format!("Student {roll}"),
                program: "BTech CSE".to_string(),
                year: 2,
            })
            .expect("student created");
        student_id
    }

    pub(crate) fn enrollment_rows(&self) -> i64 {
        self.db
            .with_conn(|conn| {
                Ok::<_, crate::storage::StorageError>(conn.query_row(
                    "SELECT COUNT(*) FROM enrollments",
                    [],
                    |row| row.get(0),
                )?)
            })
            .expect("count enrollments")
    }

    pub(crate) fn enrollment_status(&self, enrollment_id: i64) -> Option<String> {
        self.db
            .with_conn(|conn| {
                use rusqlite::OptionalExtension;
                Ok::<_, crate::storage::StorageError>(
                    conn.query_row(
                        "SELECT status FROM enrollments WHERE enrollment_id = ?1",
                        [enrollment_id],
                        |row| row.get(0),
                    )
                    .optional()?,
                )
            })
            .expect("read status")
    }
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
