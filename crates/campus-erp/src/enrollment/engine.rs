use std::sync::Arc;

use chrono::NaiveDate;
use mockable::Clock;
use rusqlite::{params, Connection, TransactionBehavior};
use tracing::{debug, info, warn};

use super::deadline::{course_drop_open, enrollment_drop_open};
use super::outcome::{DropReceipt, EnrollmentError, Registration, Rejection};
use super::placement::choose_section;
use super::queries;
use super::views::{CourseAvailability, RegistrationStatus, RosterEntry, ScheduleEntry};
use crate::academics::settings::course_drop_deadline;
use crate::academics::{CourseId, EnrollmentId, Schedule, SectionId, StudentId};
use crate::config::{CourseDropMode, EnrollmentConfig};
use crate::storage::{Database, StorageError};

/// Decides registrations and drops against the academic schema.
///
/// Every write runs in its own transaction; registration opens it with
/// `BEGIN IMMEDIATE` so the capacity checks and the insert see a stable view even
/// when several processes share the database file.
pub struct EnrollmentEngine {
    db: Arc<Database>,
    clock: Arc<dyn Clock + Send + Sync>,
    config: EnrollmentConfig,
}

impl std::fmt::Debug for EnrollmentEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrollmentEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl EnrollmentEngine {
    pub fn new(
        db: Arc<Database>,
        clock: Arc<dyn Clock + Send + Sync>,
        config: EnrollmentConfig,
    ) -> Self {
        Self { db, clock, config }
    }

    pub fn config(&self) -> &EnrollmentConfig {
        &self.config
    }

    fn today(&self) -> NaiveDate {
        self.clock.local().date_naive()
    }

    /// Register `student_id` in the least-loaded section of `course_id` that has room.
    pub fn register_for_course(
        &self,
        student_id: &StudentId,
        course_id: CourseId,
    ) -> Result<Registration, EnrollmentError> {
        if student_id.is_blank() {
            debug!("registration refused: blank student id");
            return Err(Rejection::MissingStudentId.into());
        }

        let result: Result<Registration, EnrollmentError> = self.db.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let registration = place_registration(&tx, student_id, course_id)?;
            tx.commit()?;
            Ok(registration)
        });

        match &result {
            Ok(registration) => info!(
                student_id = %student_id,
                course_id = %course_id,
                section_id = %registration.section_id,
                enrollment_id = %registration.enrollment_id,
                "student registered"
            ),
            Err(err) => log_failure("register", student_id, err),
        }
        result
    }

    /// Flip a single REGISTERED enrollment to DROPPED before the configured cutoff.
    pub fn drop_enrollment(
        &self,
        enrollment_id: EnrollmentId,
        student_id: &StudentId,
    ) -> Result<DropReceipt, EnrollmentError> {
        let cutoff = self.config.drop_cutoff;
        if !enrollment_drop_open(self.today(), cutoff) {
            debug!(%enrollment_id, %cutoff, "drop refused after cutoff");
            return Err(Rejection::DropDeadlinePassed { deadline: cutoff }.into());
        }

        let result: Result<DropReceipt, EnrollmentError> = self.db.with_conn(|conn| {
            let affected = queries::mark_enrollment_dropped(conn, enrollment_id, student_id)?;
            if affected == 0 {
                return Err(EnrollmentError::from(Rejection::NoActiveEnrollment));
            }
            Ok(DropReceipt { affected })
        });

        match &result {
            Ok(_) => info!(student_id = %student_id, %enrollment_id, "enrollment dropped"),
            Err(err) => log_failure("drop_enrollment", student_id, err),
        }
        result
    }

    /// Remove every REGISTERED enrollment the student holds in `course_id`.
    ///
    /// The deadline comes from the `COURSE_DROP_DEADLINE` setting; the configured
    /// [`CourseDropMode`] decides whether rows are deleted or flipped to DROPPED.
    pub fn drop_course(
        &self,
        student_id: &StudentId,
        course_id: CourseId,
    ) -> Result<DropReceipt, EnrollmentError> {
        if student_id.is_blank() {
            return Err(Rejection::MissingStudentId.into());
        }

        let today = self.today();
        let mode = self.config.course_drop_mode;
        let result: Result<DropReceipt, EnrollmentError> = self.db.with_conn(|conn| {
            let tx = conn.transaction()?;
            if let Some(deadline) = course_drop_deadline(&tx)? {
                if !course_drop_open(today, Some(deadline)) {
                    return Err(Rejection::DropDeadlinePassed { deadline }.into());
                }
            }

            let affected = match mode {
                CourseDropMode::Delete => {
                    queries::delete_course_registrations(&tx, student_id, course_id)?
                }
                CourseDropMode::Status => {
                    queries::mark_course_registrations_dropped(&tx, student_id, course_id)?
                }
            };
            if affected == 0 {
                return Err(Rejection::NotEnrolled.into());
            }
            tx.commit()?;
            Ok(DropReceipt { affected })
        });

        match &result {
            Ok(receipt) => info!(
                student_id = %student_id,
                course_id = %course_id,
                affected = receipt.affected,
                ?mode,
                "course dropped"
            ),
            Err(err) => log_failure("drop_course", student_id, err),
        }
        result
    }

    pub fn is_registered_for_course(
        &self,
        student_id: &StudentId,
        course_id: CourseId,
    ) -> Result<bool, StorageError> {
        self.db
            .with_conn(|conn| queries::has_registration(conn, student_id, course_id))
    }

    /// True when the student is registered and the course drop window is open today.
    pub fn can_drop_course(
        &self,
        student_id: &StudentId,
        course_id: CourseId,
    ) -> Result<bool, StorageError> {
        Ok(self.registration_status(student_id, course_id)?.can_drop)
    }

    pub fn registration_status(
        &self,
        student_id: &StudentId,
        course_id: CourseId,
    ) -> Result<RegistrationStatus, StorageError> {
        let today = self.today();
        self.db.with_conn(|conn| {
            let registered = queries::has_registration(conn, student_id, course_id)?;
            let window_open = course_drop_open(today, course_drop_deadline(conn)?);
            Ok(RegistrationStatus {
                registered,
                can_drop: registered && window_open,
            })
        })
    }

    pub fn course_availability(
        &self,
        course_id: CourseId,
    ) -> Result<CourseAvailability, StorageError> {
        self.db.with_conn(|conn| {
            let load = queries::course_load(conn, course_id)?;
            let sections = queries::section_loads(conn, course_id)?;
            Ok(CourseAvailability::new(course_id, load, sections))
        })
    }

    /// REGISTERED courses of a student, ordered by course code.
    pub fn student_schedule(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<ScheduleEntry>, StorageError> {
        self.db.with_conn(|conn| student_schedule(conn, student_id))
    }

    /// REGISTERED students of a section, ordered by student id.
    pub fn section_roster(&self, section_id: SectionId) -> Result<Vec<RosterEntry>, StorageError> {
        self.db.with_conn(|conn| section_roster(conn, section_id))
    }
}

fn place_registration(
    conn: &Connection,
    student_id: &StudentId,
    course_id: CourseId,
) -> Result<Registration, EnrollmentError> {
    if queries::has_registration(conn, student_id, course_id)? {
        return Err(Rejection::AlreadyRegistered.into());
    }

    let load = queries::course_load(conn, course_id)?;
    if load.is_full() {
        return Err(Rejection::CourseFull.into());
    }

    let sections = queries::section_loads(conn, course_id)?;
    let section_id = choose_section(&sections).ok_or(Rejection::AllSectionsFull)?;

    let enrollment_id = queries::insert_registration(conn, student_id, section_id)?;
    Ok(Registration {
        enrollment_id,
        section_id,
    })
}

fn log_failure(operation: &'static str, student_id: &StudentId, err: &EnrollmentError) {
    match err {
        EnrollmentError::Rejected(rejection) => {
            debug!(operation, student_id = %student_id, reason = rejection.code(), "request rejected")
        }
        EnrollmentError::Storage(source) => {
            warn!(operation, student_id = %student_id, error = %source, "rolled back after storage failure")
        }
    }
}

pub(crate) fn student_schedule(
    conn: &Connection,
    student_id: &StudentId,
) -> Result<Vec<ScheduleEntry>, StorageError> {
    let mut stmt = conn.prepare(
        "SELECT e.enrollment_id, c.course_id, c.code, c.title, c.credits,
                s.section_id, s.days, s.start_time, s.end_time, s.room,
                COALESCE(i.name, 'TBA')
         FROM enrollments e
         JOIN sections s ON s.section_id = e.section_id
         JOIN courses c ON c.course_id = s.course_id
         LEFT JOIN instructors i ON i.instructor_id = s.instructor_id
         WHERE e.student_id = ?1 AND e.status = 'REGISTERED'
         ORDER BY c.code, s.section_id",
    )?;
    let rows = stmt.query_map(params![student_id.as_str()], |row| {
        Ok(ScheduleEntry {
            enrollment_id: EnrollmentId(row.get(0)?),
            course_id: CourseId(row.get(1)?),
            course_code: row.get(2)?,
            course_title: row.get(3)?,
            credits: row.get(4)?,
            section_id: SectionId(row.get(5)?),
            schedule: Schedule {
                days: row.get(6)?,
                start_time: row.get(7)?,
                end_time: row.get(8)?,
            },
            room: row.get(9)?,
            instructor: row.get(10)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub(crate) fn section_roster(
    conn: &Connection,
    section_id: SectionId,
) -> Result<Vec<RosterEntry>, StorageError> {
    let mut stmt = conn.prepare(
        "SELECT e.enrollment_id, st.student_id, st.name, st.program, st.year
         FROM enrollments e
         JOIN students st ON st.student_id = e.student_id
         WHERE e.section_id = ?1 AND e.status = 'REGISTERED'
         ORDER BY st.student_id",
    )?;
    let rows = stmt.query_map([section_id.0], |row| {
        Ok(RosterEntry {
            enrollment_id: EnrollmentId(row.get(0)?),
            student_id: StudentId(row.get(1)?),
            name: row.get(2)?,
            program: row.get(3)?,
            year: row.get(4)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
