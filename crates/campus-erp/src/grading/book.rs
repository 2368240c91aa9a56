use std::sync::Arc;

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info};

use super::scale::{letter_for, weighted_percentage, ComponentScore};
use crate::academics::{EnrollmentId, SectionId, StudentId};
use crate::enrollment::{registration_in_section, section_roster};
use crate::identity::{Role, Session};
use crate::storage::{Database, StorageError};

/// Computed result for one enrollment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalGrade {
    pub enrollment_id: EnrollmentId,
    pub student_id: StudentId,
    pub percentage: f64,
    pub letter: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GradingError {
    #[error("only instructors may record grades")]
    NotInstructor,
    #[error("section {0} does not exist")]
    UnknownSection(SectionId),
    #[error("section {0} is not taught by the signed-in instructor")]
    NotAssigned(SectionId),
    #[error("student {student_id} is not registered in section {section_id}")]
    NotEnrolled {
        student_id: StudentId,
        section_id: SectionId,
    },
    #[error("invalid score: {0}")]
    InvalidScore(String),
    #[error("no weighted components recorded for student {0}")]
    NoComponents(StudentId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<rusqlite::Error> for GradingError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(StorageError::from(err))
    }
}

/// Score entry and final-grade computation for the sections an instructor teaches.
#[derive(Debug, Clone)]
pub struct GradeBook {
    db: Arc<Database>,
}

impl GradeBook {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert or replace one component score for a registered student.
    pub fn record_score(
        &self,
        session: &Session,
        section_id: SectionId,
        student_id: &StudentId,
        entry: &ComponentScore,
    ) -> Result<(), GradingError> {
        entry.validate().map_err(GradingError::InvalidScore)?;
        self.db.with_conn(|conn| {
            authorize(conn, session, section_id)?;
            let enrollment_id = enrollment_for(conn, student_id, section_id)?;
            conn.execute(
                "INSERT INTO grades (enrollment_id, component, score, max_score, weight)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(enrollment_id, component) DO UPDATE SET
                     score = excluded.score,
                     max_score = excluded.max_score,
                     weight = excluded.weight",
                params![
                    enrollment_id.0,
                    entry.component.trim(),
                    entry.score,
                    entry.max_score,
                    entry.weight,
                ],
            )?;
            info!(
                user_id = session.user_id,
                %section_id,
                student_id = %student_id,
                component = entry.component.trim(),
                "score recorded"
            );
            Ok(())
        })
    }

    pub fn scores(
        &self,
        session: &Session,
        section_id: SectionId,
        student_id: &StudentId,
    ) -> Result<Vec<ComponentScore>, GradingError> {
        self.db.with_conn(|conn| {
            authorize(conn, session, section_id)?;
            let enrollment_id = enrollment_for(conn, student_id, section_id)?;
            Ok(component_scores(conn, enrollment_id)?)
        })
    }

    /// Compute and store the final grade of one student in a section.
    pub fn finalize(
        &self,
        session: &Session,
        section_id: SectionId,
        student_id: &StudentId,
    ) -> Result<FinalGrade, GradingError> {
        self.db.with_conn(|conn| {
            authorize(conn, session, section_id)?;
            let enrollment_id = enrollment_for(conn, student_id, section_id)?;
            finalize_enrollment(conn, enrollment_id, student_id)
        })
    }

    /// Finalize every registered student of the section that has weighted scores.
    /// Students with nothing recorded yet are skipped.
    pub fn finalize_section(
        &self,
        session: &Session,
        section_id: SectionId,
    ) -> Result<Vec<FinalGrade>, GradingError> {
        let result: Result<Vec<FinalGrade>, GradingError> = self.db.with_conn(|conn| {
            authorize(conn, session, section_id)?;
            let tx = conn.transaction()?;
            let mut grades = Vec::new();
            for entry in section_roster(&tx, section_id)? {
                match finalize_enrollment(&tx, entry.enrollment_id, &entry.student_id) {
                    Ok(grade) => grades.push(grade),
                    Err(GradingError::NoComponents(student_id)) => {
                        debug!(%section_id, student_id = %student_id, "no scores yet")
                    }
                    Err(err) => return Err(err),
                }
            }
            tx.commit()?;
            Ok(grades)
        });
        if let Ok(grades) = &result {
            info!(%section_id, finalized = grades.len(), "section finalized");
        }
        result
    }
}

/// Stored final grade of an enrollment, if one has been computed.
pub(crate) fn stored_final_grade(
    conn: &Connection,
    enrollment_id: EnrollmentId,
) -> Result<Option<(f64, String)>, StorageError> {
    Ok(conn
        .query_row(
            "SELECT percentage, letter FROM final_grades WHERE enrollment_id = ?1",
            [enrollment_id.0],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?)
}

fn authorize(conn: &Connection, session: &Session, section_id: SectionId) -> Result<(), GradingError> {
    if session.role != Role::Instructor {
        return Err(GradingError::NotInstructor);
    }
    let assigned_user: Option<Option<i64>> = conn
        .query_row(
            "SELECT i.user_id FROM sections s
             LEFT JOIN instructors i ON i.instructor_id = s.instructor_id
             WHERE s.section_id = ?1",
            [section_id.0],
            |row| row.get(0),
        )
        .optional()?;
    match assigned_user {
        None => Err(GradingError::UnknownSection(section_id)),
        Some(Some(user_id)) if user_id == session.user_id => Ok(()),
        Some(_) => {
            debug!(user_id = session.user_id, %section_id, "grading refused for unassigned section");
            Err(GradingError::NotAssigned(section_id))
        }
    }
}

fn enrollment_for(
    conn: &Connection,
    student_id: &StudentId,
    section_id: SectionId,
) -> Result<EnrollmentId, GradingError> {
    registration_in_section(conn, student_id, section_id)?.ok_or_else(|| {
        GradingError::NotEnrolled {
            student_id: student_id.clone(),
            section_id,
        }
    })
}

fn component_scores(
    conn: &Connection,
    enrollment_id: EnrollmentId,
) -> Result<Vec<ComponentScore>, StorageError> {
    let mut stmt = conn.prepare(
        "SELECT component, score, max_score, weight FROM grades
         WHERE enrollment_id = ?1 ORDER BY component",
    )?;
    let rows = stmt.query_map([enrollment_id.0], |row| {
        Ok(ComponentScore {
            component: row.get(0)?,
            score: row.get(1)?,
            max_score: row.get(2)?,
            weight: row.get(3)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

fn finalize_enrollment(
    conn: &Connection,
    enrollment_id: EnrollmentId,
    student_id: &StudentId,
) -> Result<FinalGrade, GradingError> {
    let components = component_scores(conn, enrollment_id)?;
    let percentage = weighted_percentage(&components)
        .ok_or_else(|| GradingError::NoComponents(student_id.clone()))?;
    let letter = letter_for(percentage);
    conn.execute(
        "INSERT INTO final_grades (enrollment_id, percentage, letter) VALUES (?1, ?2, ?3)
         ON CONFLICT(enrollment_id) DO UPDATE SET
             percentage = excluded.percentage,
             letter = excluded.letter",
        params![enrollment_id.0, percentage, letter],
    )?;
    Ok(FinalGrade {
        enrollment_id,
        student_id: student_id.clone(),
        percentage,
        letter: letter.to_string(),
    })
}
