use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::parser::{parse_rows, StudentRow, UserRow};
use super::TransferError;
use crate::academics::catalog::insert_student;
use crate::academics::{CatalogError, Student, StudentId};
use crate::identity::{insert_user, IdentityError, PasswordHasher, Role};
use crate::storage::Database;

/// Counts of rows written by one import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub accounts: usize,
    pub students: usize,
}

/// Loads CSV files into the catalog and the auth schema. Each file is applied in one
/// transaction: a bad line leaves the database untouched.
#[derive(Debug, Clone)]
pub struct Importer {
    db: Arc<Database>,
    hasher: PasswordHasher,
}

struct PreparedStudent {
    line: u64,
    student: Student,
    login: Option<(String, String)>,
}

impl Importer {
    pub fn new(db: Arc<Database>, hasher: PasswordHasher) -> Self {
        Self { db, hasher }
    }

    pub fn students_from_path<P: AsRef<Path>>(&self, path: P) -> Result<ImportReport, TransferError> {
        let file = std::fs::File::open(path)?;
        self.students_from_reader(file)
    }

    /// Columns: `student_id,username,password,name,program,year`. Rows without a
    /// username create a student with no login.
    pub fn students_from_reader<R: Read>(&self, reader: R) -> Result<ImportReport, TransferError> {
        let rows: Vec<(u64, StudentRow)> = parse_rows(reader)?;
        let mut prepared = Vec::with_capacity(rows.len());
        for (line, row) in rows {
            prepared.push(self.prepare_student(line, row)?);
        }

        let report = self.db.with_conn(|conn| {
            let tx = conn.transaction()?;
            let mut report = ImportReport::default();
            for entry in prepared {
                let mut student = entry.student;
                if let Some((username, password_hash)) = &entry.login {
                    let account = insert_user(&tx, username, Role::Student, password_hash)
                        .map_err(|err| identity_row_error(entry.line, err))?;
                    student.user_id = Some(account.user_id);
                    report.accounts += 1;
                }
                insert_student(&tx, &student).map_err(|err| catalog_row_error(entry.line, err))?;
                report.students += 1;
            }
            tx.commit()?;
            Ok::<_, TransferError>(report)
        })?;

        info!(
            students = report.students,
            accounts = report.accounts,
            "students imported"
        );
        Ok(report)
    }

    pub fn users_from_path<P: AsRef<Path>>(&self, path: P) -> Result<ImportReport, TransferError> {
        let file = std::fs::File::open(path)?;
        self.users_from_reader(file)
    }

    /// Columns: `username,role,password`.
    pub fn users_from_reader<R: Read>(&self, reader: R) -> Result<ImportReport, TransferError> {
        let rows: Vec<(u64, UserRow)> = parse_rows(reader)?;
        let mut prepared = Vec::with_capacity(rows.len());
        for (line, row) in rows {
            let role = Role::parse(&row.role).ok_or_else(|| TransferError::InvalidRow {
                line,
                reason: format!("unknown role '{}'", row.role),
            })?;
            prepared.push((line, row.username, role, self.hasher.hash(&row.password)?));
        }

        let report = self.db.with_conn(|conn| {
            let tx = conn.transaction()?;
            let mut report = ImportReport::default();
            for (line, username, role, password_hash) in &prepared {
                insert_user(&tx, username, *role, password_hash)
                    .map_err(|err| identity_row_error(*line, err))?;
                report.accounts += 1;
            }
            tx.commit()?;
            Ok::<_, TransferError>(report)
        })?;

        info!(accounts = report.accounts, "users imported");
        Ok(report)
    }

    fn prepare_student(&self, line: u64, row: StudentRow) -> Result<PreparedStudent, TransferError> {
        let login = match (row.username, row.password) {
            (Some(username), Some(password)) => Some((username, self.hasher.hash(&password)?)),
            (None, None) => None,
            (Some(_), None) => {
                return Err(TransferError::InvalidRow {
                    line,
                    reason: "a password is required when a username is given".to_string(),
                })
            }
            (None, Some(_)) => {
                return Err(TransferError::InvalidRow {
                    line,
                    reason: "a password was given without a username".to_string(),
                })
            }
        };
        Ok(PreparedStudent {
            line,
            student: Student {
                student_id: StudentId::new(row.student_id),
                user_id: None,
                name: row.name,
                program: row.program,
                year: row.year,
            },
            login,
        })
    }
}

fn identity_row_error(line: u64, err: IdentityError) -> TransferError {
    match err {
        IdentityError::Storage(err) => TransferError::Storage(err),
        IdentityError::Password(err) => TransferError::Password(err),
        other => TransferError::InvalidRow {
            line,
            reason: other.to_string(),
        },
    }
}

fn catalog_row_error(line: u64, err: CatalogError) -> TransferError {
    match err {
        CatalogError::Storage(err) => TransferError::Storage(err),
        other => TransferError::InvalidRow {
            line,
            reason: other.to_string(),
        },
    }
}
