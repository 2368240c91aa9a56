use std::sync::Arc;

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::domain::{
    Course, CourseId, Instructor, InstructorId, Schedule, Section, SectionId, Student, StudentId,
};
use crate::storage::{is_constraint_violation, Database, StorageError};

/// Admin-facing catalog maintenance: students, instructors, courses, and sections.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    db: Arc<Database>,
}

/// Payload for creating a section; the id is assigned by the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSection {
    pub course_id: CourseId,
    pub instructor_id: Option<InstructorId>,
    pub capacity: u32,
    pub schedule: Schedule,
    pub room: String,
    pub semester: String,
    pub year: u16,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("course {0} does not exist")]
    UnknownCourse(CourseId),
    #[error("section {0} does not exist")]
    UnknownSection(SectionId),
    #[error("instructor {0} does not exist")]
    UnknownInstructor(InstructorId),
    #[error("{0} already exists")]
    Duplicate(String),
    #[error("section capacity must be positive")]
    InvalidCapacity,
    #[error("student id must not be blank")]
    BlankStudentId,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<rusqlite::Error> for CatalogError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(StorageError::from(err))
    }
}

const SECTION_COLUMNS: &str = "section_id, course_id, instructor_id, capacity, days, start_time, \
                               end_time, room, semester, year";

impl CatalogRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn add_student(&self, student: &Student) -> Result<(), CatalogError> {
        self.db.with_conn(|conn| insert_student(conn, student))
    }

    pub fn student(&self, student_id: &StudentId) -> Result<Option<Student>, CatalogError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT student_id, user_id, name, program, year FROM students
                 WHERE student_id = ?1",
                [student_id.as_str()],
                student_from_row,
            )
            .optional()
            .map_err(CatalogError::from)
        })
    }

    pub fn students(&self) -> Result<Vec<Student>, CatalogError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT student_id, user_id, name, program, year FROM students
                 ORDER BY student_id",
            )?;
            let rows = stmt.query_map([], student_from_row)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
    }

    pub fn add_instructor(
        &self,
        user_id: Option<i64>,
        name: &str,
        department: &str,
    ) -> Result<Instructor, CatalogError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO instructors (user_id, name, department) VALUES (?1, ?2, ?3)",
                params![user_id, name, department],
            )?;
            Ok(Instructor {
                instructor_id: InstructorId(conn.last_insert_rowid()),
                user_id,
                name: name.to_string(),
                department: department.to_string(),
            })
        })
    }

    /// Resolve the instructor record linked to an auth user.
    pub fn instructor_for_user(&self, user_id: i64) -> Result<Option<Instructor>, CatalogError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT instructor_id, user_id, name, department FROM instructors
                 WHERE user_id = ?1",
                [user_id],
                |row| {
                    Ok(Instructor {
                        instructor_id: InstructorId(row.get(0)?),
                        user_id: row.get(1)?,
                        name: row.get(2)?,
                        department: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(CatalogError::from)
        })
    }

    pub fn add_course(&self, code: &str, title: &str, credits: u8) -> Result<Course, CatalogError> {
        self.db.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO courses (code, title, credits) VALUES (?1, ?2, ?3)",
                params![code, title, credits],
            );
            match inserted {
                Ok(_) => Ok(Course {
                    course_id: CourseId(conn.last_insert_rowid()),
                    code: code.to_string(),
                    title: title.to_string(),
                    credits,
                }),
                Err(err) if is_constraint_violation(&err) => {
                    Err(CatalogError::Duplicate(format!("course code {code}")))
                }
                Err(err) => Err(err.into()),
            }
        })
    }

    pub fn course(&self, course_id: CourseId) -> Result<Option<Course>, CatalogError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT course_id, code, title, credits FROM courses WHERE course_id = ?1",
                [course_id.0],
                course_from_row,
            )
            .optional()
            .map_err(CatalogError::from)
        })
    }

    pub fn courses(&self) -> Result<Vec<Course>, CatalogError> {
        self.db.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT course_id, code, title, credits FROM courses ORDER BY code")?;
            let rows = stmt.query_map([], course_from_row)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
    }

    pub fn add_section(&self, section: &NewSection) -> Result<Section, CatalogError> {
        if section.capacity == 0 {
            return Err(CatalogError::InvalidCapacity);
        }
        self.db.with_conn(|conn| {
            let course_exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM courses WHERE course_id = ?1)",
                [section.course_id.0],
                |row| row.get(0),
            )?;
            if !course_exists {
                return Err(CatalogError::UnknownCourse(section.course_id));
            }
            if let Some(instructor_id) = section.instructor_id {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM instructors WHERE instructor_id = ?1)",
                    [instructor_id.0],
                    |row| row.get(0),
                )?;
                if !exists {
                    return Err(CatalogError::UnknownInstructor(instructor_id));
                }
            }

            conn.execute(
                "INSERT INTO sections (course_id, instructor_id, capacity, days, start_time,
                                       end_time, room, semester, year)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    section.course_id.0,
                    section.instructor_id.map(|id| id.0),
                    section.capacity,
                    section.schedule.days,
                    section.schedule.start_time,
                    section.schedule.end_time,
                    section.room,
                    section.semester,
                    section.year,
                ],
            )?;

            Ok(Section {
                section_id: SectionId(conn.last_insert_rowid()),
                course_id: section.course_id,
                instructor_id: section.instructor_id,
                capacity: section.capacity,
                schedule: section.schedule.clone(),
                room: section.room.clone(),
                semester: section.semester.clone(),
                year: section.year,
            })
        })
    }

    /// Set or clear (`None` = "TBA") the instructor of a section.
    pub fn assign_instructor(
        &self,
        section_id: SectionId,
        instructor_id: Option<InstructorId>,
    ) -> Result<(), CatalogError> {
        self.db.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE sections SET instructor_id = ?1 WHERE section_id = ?2",
                params![instructor_id.map(|id| id.0), section_id.0],
            );
            match updated {
                Ok(0) => Err(CatalogError::UnknownSection(section_id)),
                Ok(_) => Ok(()),
                Err(err) if is_constraint_violation(&err) => match instructor_id {
                    Some(id) => Err(CatalogError::UnknownInstructor(id)),
                    None => Err(err.into()),
                },
                Err(err) => Err(err.into()),
            }
        })
    }

    pub fn section(&self, section_id: SectionId) -> Result<Option<Section>, CatalogError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {SECTION_COLUMNS} FROM sections WHERE section_id = ?1"),
                [section_id.0],
                section_from_row,
            )
            .optional()
            .map_err(CatalogError::from)
        })
    }

    pub fn sections_for_course(&self, course_id: CourseId) -> Result<Vec<Section>, CatalogError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SECTION_COLUMNS} FROM sections WHERE course_id = ?1 ORDER BY section_id"
            ))?;
            let rows = stmt.query_map([course_id.0], section_from_row)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
    }

    pub fn sections_for_instructor(
        &self,
        instructor_id: InstructorId,
    ) -> Result<Vec<Section>, CatalogError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SECTION_COLUMNS} FROM sections WHERE instructor_id = ?1
                 ORDER BY section_id"
            ))?;
            let rows = stmt.query_map([instructor_id.0], section_from_row)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
    }
}

/// Insert a student row on an existing connection or transaction.
pub(crate) fn insert_student(conn: &Connection, student: &Student) -> Result<(), CatalogError> {
    if student.student_id.is_blank() {
        return Err(CatalogError::BlankStudentId);
    }
    let inserted = conn.execute(
        "INSERT INTO students (student_id, user_id, name, program, year)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            student.student_id.as_str(),
            student.user_id,
            student.name,
            student.program,
            student.year,
        ],
    );
    match inserted {
        Ok(_) => Ok(()),
        Err(err) if is_constraint_violation(&err) => Err(CatalogError::Duplicate(format!(
            "student {}",
            student.student_id
        ))),
        Err(err) => Err(err.into()),
    }
}

fn student_from_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        student_id: StudentId(row.get(0)?),
        user_id: row.get(1)?,
        name: row.get(2)?,
        program: row.get(3)?,
        year: row.get(4)?,
    })
}

fn course_from_row(row: &Row<'_>) -> rusqlite::Result<Course> {
    Ok(Course {
        course_id: CourseId(row.get(0)?),
        code: row.get(1)?,
        title: row.get(2)?,
        credits: row.get(3)?,
    })
}

pub(crate) fn section_from_row(row: &Row<'_>) -> rusqlite::Result<Section> {
    Ok(Section {
        section_id: SectionId(row.get(0)?),
        course_id: CourseId(row.get(1)?),
        instructor_id: row.get::<_, Option<i64>>(2)?.map(InstructorId),
        capacity: row.get(3)?,
        schedule: Schedule {
            days: row.get(4)?,
            start_time: row.get(5)?,
            end_time: row.get(6)?,
        },
        room: row.get(7)?,
        semester: row.get(8)?,
        year: row.get(9)?,
    })
}
