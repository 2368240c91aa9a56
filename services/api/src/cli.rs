use crate::admin::{self, CourseAddArgs, InstructorAddArgs, OutputArgs, SectionAddArgs, UserAddArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use campus_erp::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "campus-erp",
    about = "Run the campus ERP registration API and its administrative tasks",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommand,
    },
    /// Manage login accounts
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },
    /// Print a bcrypt hash for a password
    HashPassword {
        password: String,
        /// Work factor; defaults to APP_BCRYPT_COST
        #[arg(long)]
        cost: Option<u32>,
    },
    /// Manage student records
    Students {
        #[command(subcommand)]
        command: StudentsCommand,
    },
    /// Manage instructor records
    Instructors {
        #[command(subcommand)]
        command: InstructorsCommand,
    },
    /// Manage the course catalog
    Courses {
        #[command(subcommand)]
        command: CoursesCommand,
    },
    /// Manage course sections
    Sections {
        #[command(subcommand)]
        command: SectionsCommand,
    },
    /// Export section rosters
    Roster {
        #[command(subcommand)]
        command: RosterCommand,
    },
    /// Export a student's transcript as CSV
    Transcript {
        student_id: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Read and write global settings such as COURSE_DROP_DEADLINE
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum DbCommand {
    /// Create or migrate both databases
    Init,
}

#[derive(Subcommand, Debug)]
enum UsersCommand {
    /// Create a single account
    Add(UserAddArgs),
    /// Import accounts from a CSV file (username,role,password)
    Import { path: PathBuf },
}

#[derive(Subcommand, Debug)]
enum StudentsCommand {
    /// Import students from a CSV file (student_id,username,password,name,program,year)
    Import { path: PathBuf },
}

#[derive(Subcommand, Debug)]
enum InstructorsCommand {
    Add(InstructorAddArgs),
}

#[derive(Subcommand, Debug)]
enum CoursesCommand {
    Add(CourseAddArgs),
}

#[derive(Subcommand, Debug)]
enum SectionsCommand {
    Add(SectionAddArgs),
}

#[derive(Subcommand, Debug)]
enum RosterCommand {
    /// Write the registered students of a section as CSV
    Export {
        section_id: i64,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    Set { key: String, value: String },
    Get { key: String },
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Db {
            command: DbCommand::Init,
        } => admin::db_init(),
        Command::Users { command } => match command {
            UsersCommand::Add(args) => admin::users_add(args),
            UsersCommand::Import { path } => admin::users_import(&path),
        },
        Command::HashPassword { password, cost } => admin::hash_password(&password, cost),
        Command::Students {
            command: StudentsCommand::Import { path },
        } => admin::students_import(&path),
        Command::Instructors {
            command: InstructorsCommand::Add(args),
        } => admin::instructors_add(args),
        Command::Courses {
            command: CoursesCommand::Add(args),
        } => admin::courses_add(args),
        Command::Sections {
            command: SectionsCommand::Add(args),
        } => admin::sections_add(args),
        Command::Roster {
            command: RosterCommand::Export { section_id, output },
        } => admin::roster_export(section_id, output),
        Command::Transcript { student_id, output } => admin::transcript(&student_id, output),
        Command::Settings { command } => match command {
            SettingsCommand::Set { key, value } => admin::settings_set(&key, &value),
            SettingsCommand::Get { key } => admin::settings_get(&key),
        },
    }
}
