use super::common::*;
use crate::academics::{CourseId, SectionId, StudentId};
use crate::enrollment::{EnrollmentError, Rejection};

#[test]
fn blank_student_id_is_rejected_without_touching_storage() {
    let fixture = Fixture::new();
    let course = fixture.course("CSE101");
    fixture.section(&course, 10);

    match fixture
        .engine
        .register_for_course(&StudentId::new("  "), course.course_id)
    {
        Err(EnrollmentError::Rejected(Rejection::MissingStudentId)) => {}
        other => panic!("expected missing student id, got {other:?}"),
    }
    assert_eq!(fixture.enrollment_rows(), 0);
}

#[test]
fn second_registration_for_same_course_is_rejected() {
    let fixture = Fixture::new();
    let course = fixture.course("CSE101");
    fixture.section(&course, 1);
    fixture.section(&course, 5);
    let student = fixture.student("2023001");

    let first = fixture
        .engine
        .register_for_course(&student, course.course_id)
        .expect("first registration succeeds");
    assert!(fixture
        .engine
        .is_registered_for_course(&student, course.course_id)
        .expect("query"));

    match fixture.engine.register_for_course(&student, course.course_id) {
        Err(EnrollmentError::Rejected(Rejection::AlreadyRegistered)) => {}
        other => panic!("expected already registered, got {other:?}"),
    }
    assert_eq!(fixture.enrollment_rows(), 1);

    let schedule = fixture.engine.student_schedule(&student).expect("schedule");
    assert_eq!(schedule.len(), 1);
    assert_eq!(schedule[0].section_id, first.section_id);
    assert_eq!(schedule[0].instructor, "TBA");
}

#[test]
fn capacity_is_enforced_across_all_sections() {
    let fixture = Fixture::new();
    let course = fixture.course("MTH201");
    let small = fixture.section(&course, 2);
    let large = fixture.section(&course, 3);

    let mut placements = Vec::new();
    for roll in ["S1", "S2", "S3", "S4", "S5"] {
        let student = fixture.student(roll);
        let registration = fixture
            .engine
            .register_for_course(&student, course.course_id)
            .expect("seat available");
        placements.push(registration.section_id);
    }

    // Ties at equal load go to the lower id; afterwards the emptier section fills first.
    assert_eq!(
        placements,
        vec![
            small.section_id,
            large.section_id,
            small.section_id,
            large.section_id,
            large.section_id,
        ]
    );

    let sixth = fixture.student("S6");
    match fixture.engine.register_for_course(&sixth, course.course_id) {
        Err(EnrollmentError::Rejected(Rejection::CourseFull)) => {}
        other => panic!("expected course full, got {other:?}"),
    }
    assert_eq!(fixture.enrollment_rows(), 5);

    let availability = fixture
        .engine
        .course_availability(course.course_id)
        .expect("availability");
    assert_eq!(availability.capacity, 5);
    assert_eq!(availability.enrolled, 5);
    assert_eq!(availability.seats_remaining, Some(0));
}

#[test]
fn less_occupied_section_is_chosen_over_lower_id() {
    let fixture = Fixture::new();
    let course = fixture.course("PHY110");
    let first = fixture.section(&course, 4);
    let second = fixture.section(&course, 4);

    let a = fixture.student("A1");
    let b = fixture.student("B1");
    assert_eq!(
        fixture
            .engine
            .register_for_course(&a, course.course_id)
            .expect("register a")
            .section_id,
        first.section_id
    );
    assert_eq!(
        fixture
            .engine
            .register_for_course(&b, course.course_id)
            .expect("register b")
            .section_id,
        second.section_id
    );

    // Dropping frees a seat in the first section, which becomes the emptier one.
    fixture.engine.drop_course(&a, course.course_id).expect("drop");
    let c = fixture.student("C1");
    assert_eq!(
        fixture
            .engine
            .register_for_course(&c, course.course_id)
            .expect("register c")
            .section_id,
        first.section_id
    );
}

#[test]
fn course_without_sections_reports_all_sections_full() {
    let fixture = Fixture::new();
    let course = fixture.course("HSS999");
    let student = fixture.student("2023002");

    match fixture.engine.register_for_course(&student, course.course_id) {
        Err(EnrollmentError::Rejected(Rejection::AllSectionsFull)) => {}
        other => panic!("expected all sections full, got {other:?}"),
    }

    let availability = fixture
        .engine
        .course_availability(course.course_id)
        .expect("availability");
    assert_eq!(availability.seats_remaining, None);
    assert!(availability.sections.is_empty());
}

#[test]
fn overfilled_section_is_skipped_when_course_still_has_room() {
    let fixture = Fixture::new();
    let course = fixture.course("DES101");
    let tight = fixture.section(&course, 1);
    let roomy = fixture.section(&course, 3);

    // The smaller section ends up least loaded yet already full.
    fixture
        .db
        .with_conn(|conn| {
            for roll in ["X1", "X2"] {
                conn.execute(
                    "INSERT INTO students (student_id, name, program, year) VALUES (?1, ?1, 'BDes', 1)",
                    [roll],
                )?;
                conn.execute(
                    "INSERT INTO enrollments (student_id, section_id, status) VALUES (?1, ?2, 'REGISTERED')",
                    rusqlite::params![roll, roomy.section_id.0],
                )?;
            }
            conn.execute(
                "INSERT INTO students (student_id, name, program, year) VALUES ('X3', 'X3', 'BDes', 1)",
                [],
            )?;
            conn.execute(
                "INSERT INTO enrollments (student_id, section_id, status) VALUES ('X3', ?1, 'REGISTERED')",
                [tight.section_id.0],
            )?;
            Ok::<_, crate::storage::StorageError>(())
        })
        .expect("seed enrollments");

    let student = fixture.student("Y1");
    let registration = fixture
        .engine
        .register_for_course(&student, course.course_id)
        .expect("room remains in the larger section");
    assert_eq!(registration.section_id, roomy.section_id);

    let late = fixture.student("Y2");
    match fixture.engine.register_for_course(&late, course.course_id) {
        Err(EnrollmentError::Rejected(Rejection::CourseFull)) => {}
        other => panic!("expected course full, got {other:?}"),
    }
}

#[test]
fn unknown_student_surfaces_as_storage_error_and_rolls_back() {
    let fixture = Fixture::new();
    let course = fixture.course("CSE102");
    fixture.section(&course, 10);

    match fixture
        .engine
        .register_for_course(&StudentId::new("ghost"), course.course_id)
    {
        Err(EnrollmentError::Storage(err)) => {
            assert!(err.to_string().contains("FOREIGN KEY"), "{err}")
        }
        other => panic!("expected storage error, got {other:?}"),
    }
    assert_eq!(fixture.enrollment_rows(), 0);
}

#[test]
fn registrations_in_other_courses_do_not_interfere() {
    let fixture = Fixture::new();
    let algebra = fixture.course("MTH100");
    let biology = fixture.course("BIO100");
    fixture.section(&algebra, 1);
    let bio_section = fixture.section(&biology, 1);
    let student = fixture.student("2023003");

    fixture
        .engine
        .register_for_course(&student, algebra.course_id)
        .expect("algebra");
    let registration = fixture
        .engine
        .register_for_course(&student, biology.course_id)
        .expect("biology");
    assert_eq!(registration.section_id, bio_section.section_id);
    assert!(!fixture
        .engine
        .is_registered_for_course(&student, CourseId(999))
        .expect("query"));
    assert_ne!(registration.section_id, SectionId(0));
}
