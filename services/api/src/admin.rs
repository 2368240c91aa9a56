use crate::infra::{parse_date, parse_role};
use campus_erp::academics::{setting_keys, NewSection, Schedule, SectionId, StudentId};
use campus_erp::config::AppConfig;
use campus_erp::error::AppError;
use campus_erp::identity::{PasswordHasher, Role};
use campus_erp::storage::SCHEMA_VERSION;
use campus_erp::transfer::{export_roster, export_transcript};
use campus_erp::Campus;
use clap::Args;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct UserAddArgs {
    pub(crate) username: String,
    /// student, instructor, or admin
    #[arg(long, value_parser = parse_role)]
    pub(crate) role: Role,
    #[arg(long)]
    pub(crate) password: String,
}

#[derive(Args, Debug)]
pub(crate) struct InstructorAddArgs {
    #[arg(long)]
    pub(crate) name: String,
    #[arg(long)]
    pub(crate) department: String,
    /// Link to an existing INSTRUCTOR account
    #[arg(long)]
    pub(crate) username: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct CourseAddArgs {
    #[arg(long)]
    pub(crate) code: String,
    #[arg(long)]
    pub(crate) title: String,
    #[arg(long)]
    pub(crate) credits: u8,
}

#[derive(Args, Debug)]
pub(crate) struct SectionAddArgs {
    #[arg(long)]
    pub(crate) course_id: i64,
    #[arg(long)]
    pub(crate) capacity: u32,
    /// Day set such as MWF or TTh
    #[arg(long)]
    pub(crate) days: String,
    #[arg(long)]
    pub(crate) start: String,
    #[arg(long)]
    pub(crate) end: String,
    #[arg(long)]
    pub(crate) room: String,
    #[arg(long)]
    pub(crate) semester: String,
    #[arg(long)]
    pub(crate) year: u16,
    #[arg(long)]
    pub(crate) instructor_id: Option<i64>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct OutputArgs {
    /// Write to this file instead of stdout
    #[arg(long, short)]
    pub(crate) output: Option<PathBuf>,
}

fn open_campus() -> Result<(AppConfig, Campus), AppError> {
    let config = AppConfig::load()?;
    let campus = Campus::open(&config, Arc::new(mockable::DefaultClock))?;
    Ok((config, campus))
}

pub(crate) fn db_init() -> Result<(), AppError> {
    let (config, _campus) = open_campus()?;
    println!(
        "Schema version {} ready (erp: {}, auth: {})",
        SCHEMA_VERSION,
        config.database.erp_path.display(),
        config.database.auth_path.display()
    );
    Ok(())
}

pub(crate) fn users_add(args: UserAddArgs) -> Result<(), AppError> {
    let (_, campus) = open_campus()?;
    let account = campus
        .directory
        .create_user(&args.username, args.role, &args.password)?;
    println!(
        "Created {} account '{}' (user id {})",
        account.role, account.username, account.user_id
    );
    Ok(())
}

pub(crate) fn users_import(path: &Path) -> Result<(), AppError> {
    let (_, campus) = open_campus()?;
    let report = campus.importer.users_from_path(path)?;
    println!("Imported {} accounts from {}", report.accounts, path.display());
    Ok(())
}

pub(crate) fn hash_password(password: &str, cost: Option<u32>) -> Result<(), AppError> {
    let hasher = match cost {
        Some(cost) => PasswordHasher::new(cost),
        None => PasswordHasher::from_config(&AppConfig::load()?.security),
    };
    let hash = hasher
        .hash(password)
        .map_err(campus_erp::identity::IdentityError::from)?;
    println!("{hash}");
    Ok(())
}

pub(crate) fn students_import(path: &Path) -> Result<(), AppError> {
    let (_, campus) = open_campus()?;
    let report = campus.importer.students_from_path(path)?;
    println!(
        "Imported {} students ({} with login accounts) from {}",
        report.students,
        report.accounts,
        path.display()
    );
    Ok(())
}

pub(crate) fn instructors_add(args: InstructorAddArgs) -> Result<(), AppError> {
    let (_, campus) = open_campus()?;
    let user_id = match &args.username {
        Some(username) => {
            let account = campus.directory.user(username)?.ok_or_else(|| {
                campus_erp::identity::IdentityError::UnknownUser(username.clone())
            })?;
            Some(account.user_id)
        }
        None => None,
    };
    let instructor = campus
        .catalog
        .add_instructor(user_id, &args.name, &args.department)?;
    println!(
        "Created instructor {} ({}, {})",
        instructor.instructor_id, instructor.name, instructor.department
    );
    Ok(())
}

pub(crate) fn courses_add(args: CourseAddArgs) -> Result<(), AppError> {
    let (_, campus) = open_campus()?;
    let course = campus
        .catalog
        .add_course(&args.code, &args.title, args.credits)?;
    println!(
        "Created course {} {} ({} credits)",
        course.course_id, course.code, course.credits
    );
    Ok(())
}

pub(crate) fn sections_add(args: SectionAddArgs) -> Result<(), AppError> {
    let (_, campus) = open_campus()?;
    let section = campus.catalog.add_section(&NewSection {
        course_id: campus_erp::academics::CourseId(args.course_id),
        instructor_id: args.instructor_id.map(campus_erp::academics::InstructorId),
        capacity: args.capacity,
        schedule: Schedule {
            days: args.days,
            start_time: args.start,
            end_time: args.end,
        },
        room: args.room,
        semester: args.semester,
        year: args.year,
    })?;
    println!(
        "Created section {} of course {}: {} in {}, capacity {}",
        section.section_id, section.course_id, section.schedule, section.room, section.capacity
    );
    Ok(())
}

pub(crate) fn roster_export(section_id: i64, output: OutputArgs) -> Result<(), AppError> {
    let (_, campus) = open_campus()?;
    let rows = export_roster(&campus.db, SectionId(section_id), sink(&output)?)?;
    report_export("roster", rows, &output);
    Ok(())
}

pub(crate) fn transcript(student_id: &str, output: OutputArgs) -> Result<(), AppError> {
    let (_, campus) = open_campus()?;
    let rows = export_transcript(&campus.db, &StudentId::new(student_id), sink(&output)?)?;
    report_export("transcript", rows, &output);
    Ok(())
}

pub(crate) fn settings_set(key: &str, value: &str) -> Result<(), AppError> {
    let (_, campus) = open_campus()?;
    if key == setting_keys::COURSE_DROP_DEADLINE {
        let deadline = parse_date(value).map_err(|reason| {
            AppError::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, reason))
        })?;
        campus.settings.set_course_drop_deadline(deadline)?;
    } else {
        campus.settings.set(key, value)?;
    }
    println!("{key} updated");
    Ok(())
}

pub(crate) fn settings_get(key: &str) -> Result<(), AppError> {
    let (_, campus) = open_campus()?;
    match campus.settings.get(key)? {
        Some(value) => println!("{key}={value}"),
        None => println!("{key} is not set"),
    }
    Ok(())
}

fn sink(output: &OutputArgs) -> Result<Box<dyn Write>, AppError> {
    Ok(match &output.output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(std::io::stdout().lock()),
    })
}

fn report_export(kind: &str, rows: usize, output: &OutputArgs) {
    if let Some(path) = &output.output {
        println!("Wrote {rows} {kind} rows to {}", path.display());
    }
}
