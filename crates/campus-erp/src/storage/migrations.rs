use rusqlite::Connection;

use super::StorageError;

/// Highest schema version this build knows how to create.
pub const SCHEMA_VERSION: i64 = 1;

pub(super) fn run(conn: &Connection) -> Result<(), StorageError> {
    // The two files are versioned separately; a fresh auth file next to an existing
    // academic file still needs its tables.
    let erp: i64 = conn.query_row("PRAGMA main.user_version", [], |row| row.get(0))?;
    let auth: i64 = conn.query_row("PRAGMA auth_db.user_version", [], |row| row.get(0))?;
    let current = erp.min(auth);
    if current >= SCHEMA_VERSION {
        return Ok(());
    }

    if current < 1 {
        v001_initial(conn)?;
    }

    conn.execute_batch(&format!(
        "PRAGMA main.user_version = {SCHEMA_VERSION}; PRAGMA auth_db.user_version = {SCHEMA_VERSION};"
    ))?;
    tracing::info!(from = current, to = SCHEMA_VERSION, "schema migrated");
    Ok(())
}

fn v001_initial(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS auth_db.users_auth (
            user_id       INTEGER PRIMARY KEY AUTOINCREMENT,
            username      TEXT NOT NULL UNIQUE,
            role          TEXT NOT NULL CHECK (role IN ('STUDENT', 'INSTRUCTOR', 'ADMIN')),
            password_hash TEXT NOT NULL,
            status        TEXT NOT NULL DEFAULT 'ACTIVE' CHECK (status IN ('ACTIVE', 'LOCKED')),
            last_login    TEXT
        );

        CREATE TABLE IF NOT EXISTS students (
            student_id TEXT PRIMARY KEY CHECK (length(trim(student_id)) > 0),
            user_id    INTEGER,
            name       TEXT NOT NULL,
            program    TEXT NOT NULL,
            year       INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS instructors (
            instructor_id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id       INTEGER,
            name          TEXT NOT NULL,
            department    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS courses (
            course_id INTEGER PRIMARY KEY AUTOINCREMENT,
            code      TEXT NOT NULL UNIQUE,
            title     TEXT NOT NULL,
            credits   INTEGER NOT NULL CHECK (credits >= 0)
        );

        CREATE TABLE IF NOT EXISTS sections (
            section_id    INTEGER PRIMARY KEY AUTOINCREMENT,
            course_id     INTEGER NOT NULL REFERENCES courses(course_id),
            instructor_id INTEGER REFERENCES instructors(instructor_id),
            capacity      INTEGER NOT NULL CHECK (capacity > 0),
            days          TEXT NOT NULL,
            start_time    TEXT NOT NULL,
            end_time      TEXT NOT NULL,
            room          TEXT NOT NULL,
            semester      TEXT NOT NULL,
            year          INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_sections_course ON sections(course_id);

        CREATE TABLE IF NOT EXISTS enrollments (
            enrollment_id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id    TEXT NOT NULL REFERENCES students(student_id),
            section_id    INTEGER NOT NULL REFERENCES sections(section_id),
            status        TEXT NOT NULL CHECK (status IN ('REGISTERED', 'DROPPED')),
            enrolled_at   TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        );
        CREATE INDEX IF NOT EXISTS idx_enrollments_section ON enrollments(section_id, status);
        CREATE INDEX IF NOT EXISTS idx_enrollments_student ON enrollments(student_id, status);

        CREATE TABLE IF NOT EXISTS grades (
            enrollment_id INTEGER NOT NULL REFERENCES enrollments(enrollment_id) ON DELETE CASCADE,
            component     TEXT NOT NULL,
            score         REAL NOT NULL CHECK (score >= 0),
            max_score     REAL NOT NULL CHECK (max_score > 0),
            weight        REAL NOT NULL CHECK (weight >= 0),
            PRIMARY KEY (enrollment_id, component)
        );

        CREATE TABLE IF NOT EXISTS final_grades (
            enrollment_id INTEGER PRIMARY KEY REFERENCES enrollments(enrollment_id) ON DELETE CASCADE,
            percentage    REAL NOT NULL,
            letter        TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS settings (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        ",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rerunning_migrations_is_a_no_op() {
        let conn = Connection::open_in_memory().expect("open");
        conn.execute("ATTACH DATABASE ':memory:' AS auth_db", [])
            .expect("attach");
        run(&conn).expect("first run");
        run(&conn).expect("second run");
        let version: i64 = conn
            .query_row("PRAGMA auth_db.user_version", [], |row| row.get(0))
            .expect("read version");
        assert_eq!(version, SCHEMA_VERSION);
    }
}
