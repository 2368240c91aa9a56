//! CSV import of accounts and students, and CSV export of rosters and transcripts.

mod export;
mod import;
mod parser;

pub use export::{export_roster, export_transcript, RosterRecord, TranscriptRecord};
pub use import::{ImportReport, Importer};

use crate::academics::{SectionId, StudentId};
use crate::identity::PasswordError;
use crate::storage::StorageError;

#[derive(Debug)]
pub enum TransferError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { line: u64, reason: String },
    UnknownSection(SectionId),
    UnknownStudent(StudentId),
    Password(PasswordError),
    Storage(StorageError),
}

impl std::fmt::Display for TransferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferError::Io(err) => write!(f, "failed to access CSV file: {}", err),
            TransferError::Csv(err) => write!(f, "invalid CSV data: {}", err),
            TransferError::InvalidRow { line, reason } => {
                write!(f, "line {}: {}", line, reason)
            }
            TransferError::UnknownSection(section_id) => {
                write!(f, "section {} does not exist", section_id)
            }
            TransferError::UnknownStudent(student_id) => {
                write!(f, "student {} does not exist", student_id)
            }
            TransferError::Password(err) => write!(f, "{}", err),
            TransferError::Storage(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for TransferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransferError::Io(err) => Some(err),
            TransferError::Csv(err) => Some(err),
            TransferError::Password(err) => Some(err),
            TransferError::Storage(err) => Some(err),
            TransferError::InvalidRow { .. }
            | TransferError::UnknownSection(_)
            | TransferError::UnknownStudent(_) => None,
        }
    }
}

impl From<std::io::Error> for TransferError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for TransferError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<PasswordError> for TransferError {
    fn from(err: PasswordError) -> Self {
        Self::Password(err)
    }
}

impl From<StorageError> for TransferError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

impl From<rusqlite::Error> for TransferError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(StorageError::from(err))
    }
}
