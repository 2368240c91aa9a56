use std::sync::Arc;

use campus_erp::academics::{NewSection, Schedule, StudentId};
use campus_erp::config::EnrollmentConfig;
use campus_erp::grading::ComponentScore;
use campus_erp::identity::{PasswordHasher, Role};
use campus_erp::storage::Database;
use campus_erp::transfer::{export_roster, export_transcript, TransferError};
use campus_erp::Campus;

fn campus() -> Campus {
    Campus::new(
        Arc::new(Database::open_in_memory().expect("database opens")),
        EnrollmentConfig::default(),
        PasswordHasher::new(4),
        Arc::new(mockable::DefaultClock),
    )
}

const STUDENTS: &str = "student_id,username,password,name,program,year
2023101,asha,asha-pw,Asha Verma,BTech CSE,3
2023102,ravi,ravi-pw,Ravi Kumar,BTech CSE,3
";

#[test]
fn imported_students_can_sign_in_register_and_receive_grades() {
    let campus = campus();
    let report = campus
        .importer
        .students_from_reader(STUDENTS.as_bytes())
        .expect("import succeeds");
    assert_eq!(report.students, 2);
    assert_eq!(report.accounts, 2);

    let session = campus
        .directory
        .authenticate("asha", "asha-pw")
        .expect("imported password verifies");
    assert_eq!(session.role, Role::Student);

    let lecturer_account = campus
        .directory
        .create_user("dr.mehta", Role::Instructor, "teach")
        .expect("instructor account");
    let instructor = campus
        .catalog
        .add_instructor(Some(lecturer_account.user_id), "Dr. Mehta", "CSE")
        .expect("instructor");
    let course = campus
        .catalog
        .add_course("CSE340", "Compilers", 4)
        .expect("course");
    let section = campus
        .catalog
        .add_section(&NewSection {
            course_id: course.course_id,
            instructor_id: Some(instructor.instructor_id),
            capacity: 40,
            schedule: Schedule {
                days: "TTh".to_string(),
                start_time: "09:30".to_string(),
                end_time: "11:00".to_string(),
            },
            room: "C-101".to_string(),
            semester: "Winter".to_string(),
            year: 2026,
        })
        .expect("section");

    for roll in ["2023101", "2023102"] {
        campus
            .engine
            .register_for_course(&StudentId::new(roll), course.course_id)
            .expect("registered");
    }

    let mut roster = Vec::new();
    assert_eq!(
        export_roster(&campus.db, section.section_id, &mut roster).expect("roster"),
        2
    );
    let roster = String::from_utf8(roster).expect("utf8");
    assert!(roster.contains("2023101,Asha Verma,BTech CSE,3"));
    assert!(roster.contains("2023102,Ravi Kumar,BTech CSE,3"));

    let lecturer = campus
        .directory
        .authenticate("dr.mehta", "teach")
        .expect("instructor signs in");
    let asha = StudentId::new("2023101");
    campus
        .grades
        .record_score(
            &lecturer,
            section.section_id,
            &asha,
            &ComponentScore {
                component: "project".to_string(),
                score: 34.0,
                max_score: 40.0,
                weight: 100.0,
            },
        )
        .expect("score recorded");
    let grade = campus
        .grades
        .finalize(&lecturer, section.section_id, &asha)
        .expect("finalized");
    assert_eq!(grade.letter, "A-");

    let mut transcript = Vec::new();
    export_transcript(&campus.db, &asha, &mut transcript).expect("transcript");
    let transcript = String::from_utf8(transcript).expect("utf8");
    assert!(
        transcript.contains("CSE340,Compilers,4,1,85.00,A-"),
        "{transcript}"
    );
}

#[test]
fn malformed_students_file_changes_nothing() {
    let campus = campus();
    let data = "student_id,username,password,name,program,year\n\
                2023201,neha,pw,Neha Singh,BDes,2\n\
                2023202,omar,pw,Omar Ali,BDes,sophomore\n";

    match campus.importer.students_from_reader(data.as_bytes()) {
        Err(TransferError::Csv(_)) => {}
        other => panic!("expected CSV error, got {other:?}"),
    }
    assert!(campus.catalog.students().expect("list").is_empty());
    assert!(campus.directory.users().expect("list").is_empty());
}
