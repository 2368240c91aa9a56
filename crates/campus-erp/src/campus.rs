use std::sync::Arc;

use mockable::Clock;

use crate::academics::{CatalogRepository, SettingsStore};
use crate::config::{AppConfig, EnrollmentConfig};
use crate::enrollment::EnrollmentEngine;
use crate::grading::GradeBook;
use crate::identity::{PasswordHasher, UserDirectory};
use crate::storage::{Database, StorageError};
use crate::transfer::Importer;

/// Every service of the ERP wired to one shared database.
#[derive(Debug, Clone)]
pub struct Campus {
    pub db: Arc<Database>,
    pub catalog: CatalogRepository,
    pub settings: SettingsStore,
    pub engine: Arc<EnrollmentEngine>,
    pub directory: Arc<UserDirectory>,
    pub grades: GradeBook,
    pub importer: Importer,
}

impl Campus {
    /// Open the configured databases, running migrations as needed.
    pub fn open(config: &AppConfig, clock: Arc<dyn Clock + Send + Sync>) -> Result<Self, StorageError> {
        let db = Arc::new(Database::open(&config.database)?);
        Ok(Self::new(
            db,
            config.enrollment,
            PasswordHasher::from_config(&config.security),
            clock,
        ))
    }

    pub fn new(
        db: Arc<Database>,
        enrollment: EnrollmentConfig,
        hasher: PasswordHasher,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            catalog: CatalogRepository::new(db.clone()),
            settings: SettingsStore::new(db.clone()),
            engine: Arc::new(EnrollmentEngine::new(db.clone(), clock.clone(), enrollment)),
            directory: Arc::new(UserDirectory::new(db.clone(), hasher, clock)),
            grades: GradeBook::new(db.clone()),
            importer: Importer::new(db.clone(), hasher),
            db,
        }
    }
}
