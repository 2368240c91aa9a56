//! SQL shared by the engine's write paths and its read models. Every "registered in this
//! course" check goes through [`has_registration`] so reads and writes agree.

use rusqlite::{params, Connection, OptionalExtension};

use super::placement::{CourseLoad, SectionLoad};
use crate::academics::{CourseId, EnrollmentId, SectionId, StudentId};
use crate::storage::StorageError;

pub(crate) fn has_registration(
    conn: &Connection,
    student_id: &StudentId,
    course_id: CourseId,
) -> Result<bool, StorageError> {
    Ok(conn.query_row(
        "SELECT EXISTS(
             SELECT 1 FROM enrollments e
             JOIN sections s ON s.section_id = e.section_id
             WHERE e.student_id = ?1 AND s.course_id = ?2 AND e.status = 'REGISTERED'
         )",
        params![student_id.as_str(), course_id.0],
        |row| row.get(0),
    )?)
}

pub(crate) fn course_load(conn: &Connection, course_id: CourseId) -> Result<CourseLoad, StorageError> {
    let capacity: i64 = conn.query_row(
        "SELECT COALESCE(SUM(capacity), 0) FROM sections WHERE course_id = ?1",
        [course_id.0],
        |row| row.get(0),
    )?;
    let enrolled: i64 = conn.query_row(
        "SELECT COUNT(*) FROM enrollments e
         JOIN sections s ON s.section_id = e.section_id
         WHERE s.course_id = ?1 AND e.status = 'REGISTERED'",
        [course_id.0],
        |row| row.get(0),
    )?;
    Ok(CourseLoad { capacity, enrolled })
}

/// Sections of a course ordered by (load, section id), the placement order.
pub(crate) fn section_loads(
    conn: &Connection,
    course_id: CourseId,
) -> Result<Vec<SectionLoad>, StorageError> {
    let mut stmt = conn.prepare(
        "SELECT s.section_id, s.capacity, COUNT(e.enrollment_id) AS section_load
         FROM sections s
         LEFT JOIN enrollments e
                ON e.section_id = s.section_id AND e.status = 'REGISTERED'
         WHERE s.course_id = ?1
         GROUP BY s.section_id, s.capacity
         ORDER BY section_load ASC, s.section_id ASC",
    )?;
    let rows = stmt.query_map([course_id.0], |row| {
        Ok(SectionLoad {
            section_id: SectionId(row.get(0)?),
            capacity: row.get(1)?,
            load: row.get(2)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub(crate) fn insert_registration(
    conn: &Connection,
    student_id: &StudentId,
    section_id: SectionId,
) -> Result<EnrollmentId, StorageError> {
    conn.execute(
        "INSERT INTO enrollments (student_id, section_id, status) VALUES (?1, ?2, 'REGISTERED')",
        params![student_id.as_str(), section_id.0],
    )?;
    Ok(EnrollmentId(conn.last_insert_rowid()))
}

/// Flip one REGISTERED enrollment owned by `student_id` to DROPPED.
pub(crate) fn mark_enrollment_dropped(
    conn: &Connection,
    enrollment_id: EnrollmentId,
    student_id: &StudentId,
) -> Result<usize, StorageError> {
    Ok(conn.execute(
        "UPDATE enrollments SET status = 'DROPPED'
         WHERE enrollment_id = ?1 AND student_id = ?2 AND status = 'REGISTERED'",
        params![enrollment_id.0, student_id.as_str()],
    )?)
}

pub(crate) fn delete_course_registrations(
    conn: &Connection,
    student_id: &StudentId,
    course_id: CourseId,
) -> Result<usize, StorageError> {
    Ok(conn.execute(
        "DELETE FROM enrollments
         WHERE student_id = ?1 AND status = 'REGISTERED'
           AND section_id IN (SELECT section_id FROM sections WHERE course_id = ?2)",
        params![student_id.as_str(), course_id.0],
    )?)
}

pub(crate) fn mark_course_registrations_dropped(
    conn: &Connection,
    student_id: &StudentId,
    course_id: CourseId,
) -> Result<usize, StorageError> {
    Ok(conn.execute(
        "UPDATE enrollments SET status = 'DROPPED'
         WHERE student_id = ?1 AND status = 'REGISTERED'
           AND section_id IN (SELECT section_id FROM sections WHERE course_id = ?2)",
        params![student_id.as_str(), course_id.0],
    )?)
}

/// The REGISTERED enrollment of a student in a section, if any.
pub(crate) fn registration_in_section(
    conn: &Connection,
    student_id: &StudentId,
    section_id: SectionId,
) -> Result<Option<EnrollmentId>, StorageError> {
    Ok(conn
        .query_row(
            "SELECT enrollment_id FROM enrollments
             WHERE student_id = ?1 AND section_id = ?2 AND status = 'REGISTERED'",
            params![student_id.as_str(), section_id.0],
            |row| row.get(0).map(EnrollmentId),
        )
        .optional()?)
}
