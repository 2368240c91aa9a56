use std::fmt;

use serde::{Deserialize, Serialize};

/// Roll number identifying a student, e.g. `2023101`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StudentId(pub String);

impl StudentId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Blank identifiers are rejected before any query runs.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! integer_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

integer_id!(
    /// Row id of a course in the catalog.
    CourseId
);
integer_id!(
    /// Row id of a section; ascending order breaks placement ties.
    SectionId
);
integer_id!(EnrollmentId);
integer_id!(InstructorId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub student_id: StudentId,
    pub user_id: Option<i64>,
    pub name: String,
    pub program: String,
    pub year: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instructor {
    pub instructor_id: InstructorId,
    pub user_id: Option<i64>,
    pub name: String,
    pub department: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub course_id: CourseId,
    pub code: String,
    pub title: String,
    pub credits: u8,
}

/// Meeting pattern of a section: a day-set such as `MWF` and a time range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub days: String,
    pub start_time: String,
    pub end_time: String,
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}-{}", self.days, self.start_time, self.end_time)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub section_id: SectionId,
    pub course_id: CourseId,
    /// `None` is shown as "TBA".
    pub instructor_id: Option<InstructorId>,
    pub capacity: u32,
    pub schedule: Schedule,
    pub room: String,
    pub semester: String,
    pub year: u16,
}

/// The two enrollment states recognized by the registration rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    Registered,
    Dropped,
}

impl EnrollmentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            EnrollmentStatus::Registered => "REGISTERED",
            EnrollmentStatus::Dropped => "DROPPED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "REGISTERED" => Some(Self::Registered),
            "DROPPED" => Some(Self::Dropped),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub enrollment_id: EnrollmentId,
    pub student_id: StudentId,
    pub section_id: SectionId,
    pub status: EnrollmentStatus,
}

/// Keys of the global settings table that the crate reads.
pub mod setting_keys {
    /// ISO date after which course-level drops are refused.
    pub const COURSE_DROP_DEADLINE: &str = "COURSE_DROP_DEADLINE";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_student_ids_are_detected() {
        assert!(StudentId::new("").is_blank());
        assert!(StudentId::new("   ").is_blank());
        assert!(!StudentId::new("2023101").is_blank());
    }

    #[test]
    fn status_labels_match_stored_values() {
        for status in [EnrollmentStatus::Registered, EnrollmentStatus::Dropped] {
            assert_eq!(EnrollmentStatus::parse(status.label()), Some(status));
        }
        assert_eq!(EnrollmentStatus::parse("registered"), None);
    }

    #[test]
    fn integer_ids_serialize_transparently() {
        let value = serde_json::to_value(SectionId(7)).expect("serialize");
        assert_eq!(value, serde_json::json!(7));
    }
}
