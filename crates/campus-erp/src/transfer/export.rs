use std::io::Write;

use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use tracing::info;

use super::TransferError;
use crate::academics::{SectionId, StudentId};
use crate::enrollment::{section_roster, student_schedule};
use crate::grading::stored_final_grade;
use crate::storage::Database;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterRecord {
    pub student_id: String,
    pub name: String,
    pub program: String,
    pub year: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptRecord {
    pub course_code: String,
    pub course_title: String,
    pub credits: u8,
    pub section_id: i64,
    pub percentage: Option<String>,
    pub letter: Option<String>,
}

/// Write the REGISTERED students of a section as CSV. Returns the number of rows.
pub fn export_roster<W: Write>(
    db: &Database,
    section_id: SectionId,
    writer: W,
) -> Result<usize, TransferError> {
    let records = db.with_conn(|conn| {
        if !exists(conn, "SELECT 1 FROM sections WHERE section_id = ?1", section_id.0)? {
            return Err(TransferError::UnknownSection(section_id));
        }
        let roster = section_roster(conn, section_id)?;
        Ok(roster
            .into_iter()
            .map(|entry| RosterRecord {
                student_id: entry.student_id.0,
                name: entry.name,
                program: entry.program,
                year: entry.year,
            })
            .collect::<Vec<_>>())
    })?;

    let written = write_records(writer, &records)?;
    info!(%section_id, rows = written, "roster exported");
    Ok(written)
}

/// Write a student's REGISTERED courses with any final grades as CSV.
pub fn export_transcript<W: Write>(
    db: &Database,
    student_id: &StudentId,
    writer: W,
) -> Result<usize, TransferError> {
    let records = db.with_conn(|conn| {
        let known = conn
            .query_row(
                "SELECT 1 FROM students WHERE student_id = ?1",
                [student_id.as_str()],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !known {
            return Err(TransferError::UnknownStudent(student_id.clone()));
        }

        let mut records = Vec::new();
        for entry in student_schedule(conn, student_id)? {
            let grade = stored_final_grade(conn, entry.enrollment_id)?;
            records.push(TranscriptRecord {
                course_code: entry.course_code,
                course_title: entry.course_title,
                credits: entry.credits,
                section_id: entry.section_id.0,
                percentage: grade.as_ref().map(|(percentage, _)| format!("{percentage:.2}")),
                letter: grade.map(|(_, letter)| letter),
            });
        }
        Ok(records)
    })?;

    let written = write_records(writer, &records)?;
    info!(student_id = %student_id, rows = written, "transcript exported");
    Ok(written)
}

fn exists(conn: &Connection, sql: &str, id: i64) -> Result<bool, TransferError> {
    Ok(conn.query_row(sql, [id], |_| Ok(())).optional()?.is_some())
}

fn write_records<W: Write, T: Serialize>(writer: W, records: &[T]) -> Result<usize, TransferError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(records.len())
}
