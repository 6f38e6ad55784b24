//! PostgreSQL implementation of the `PatientStore` trait.

use async_trait::async_trait;
use sqlx_core::query::{Query, query};
use sqlx_postgres::{PgArguments, PgPool, Postgres};
use tracing::{debug, instrument, warn};

use medlink_core::{Patient, PatientProfile, is_blank};
use medlink_storage::{PatientStore, StorageError};

use crate::config::PostgresConfig;
use crate::error::{is_unique_violation, query_error};
use crate::queries::{
    BuiltQuery, ConflictKey, SqlValue, build_identifier_query, build_search_query,
    row_to_patient, upsert_statement,
};
use crate::{migrations, pool};

/// PostgreSQL storage backend for patients.
#[derive(Debug, Clone)]
pub struct PostgresPatientStore {
    pool: PgPool,
}

impl PostgresPatientStore {
    /// Creates a new `PostgresPatientStore` with the given configuration.
    ///
    /// Opens and pings the pool, then applies migrations when
    /// `run_migrations` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection pool cannot be created, the
    /// database is unreachable or migrations fail.
    pub async fn new(config: PostgresConfig) -> Result<Self, StorageError> {
        let pool = pool::connect(&config).await?;

        if config.run_migrations {
            migrations::run(&pool).await?;
        }

        Ok(Self { pool })
    }

    /// Creates a new `PostgresPatientStore` from an existing connection pool.
    ///
    /// Migrations are not run automatically when using this constructor.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_patients(&self, built: BuiltQuery) -> Result<Vec<Patient>, StorageError> {
        let rows = bind_all(query::<Postgres>(&built.sql), built.params)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;

        rows.iter()
            .map(|row| row_to_patient(row).map_err(query_error))
            .collect()
    }

    async fn try_upsert(
        &self,
        key: ConflictKey,
        hospital: &str,
        profile: &PatientProfile,
    ) -> Result<Option<Patient>, sqlx_core::error::Error> {
        let sql = upsert_statement(key);
        let row = query::<Postgres>(&sql)
            .bind(hospital)
            .bind(profile.first_name_th.as_deref())
            .bind(profile.middle_name_th.as_deref())
            .bind(profile.last_name_th.as_deref())
            .bind(profile.first_name_en.as_deref())
            .bind(profile.middle_name_en.as_deref())
            .bind(profile.last_name_en.as_deref())
            .bind(profile.date_of_birth)
            .bind(profile.patient_hn.as_deref())
            .bind(profile.national_id.as_deref())
            .bind(profile.passport_id.as_deref())
            .bind(profile.phone_number.as_deref())
            .bind(profile.email.as_deref())
            .bind(profile.gender.as_deref())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_patient).transpose()
    }
}

fn bind_all<'q>(
    mut q: Query<'q, Postgres, PgArguments>,
    params: Vec<SqlValue>,
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        q = match param {
            SqlValue::Text(s) => q.bind(s),
            SqlValue::Date(d) => q.bind(d),
        };
    }
    q
}

#[async_trait]
impl PatientStore for PostgresPatientStore {
    #[instrument(skip(self, criteria))]
    async fn search_by_hospital(
        &self,
        hospital: &str,
        criteria: &medlink_core::SearchCriteria,
    ) -> Result<Vec<Patient>, StorageError> {
        let built = build_search_query(hospital, criteria)?;
        let patients = self.fetch_patients(built).await?;
        debug!(count = patients.len(), "patient search completed");
        Ok(patients)
    }

    #[instrument(skip(self))]
    async fn find_by_identifier(
        &self,
        hospital: &str,
        national_id: Option<&str>,
        passport_id: Option<&str>,
    ) -> Result<Option<Patient>, StorageError> {
        let Some(built) = build_identifier_query(hospital, national_id, passport_id) else {
            return Ok(None);
        };
        Ok(self.fetch_patients(built).await?.into_iter().next())
    }

    #[instrument(
        skip(self, profile),
        fields(national_id = ?profile.national_id, passport_id = ?profile.passport_id)
    )]
    async fn upsert_by_national_or_passport(
        &self,
        hospital: &str,
        profile: &PatientProfile,
    ) -> Result<Patient, StorageError> {
        if is_blank(Some(hospital)) {
            return Err(StorageError::query("hospital must not be blank"));
        }

        let national_id_attempt = match self
            .try_upsert(ConflictKey::NationalId, hospital, profile)
            .await
        {
            Ok(Some(patient)) => return Ok(patient),
            Ok(None) => "no row returned".to_string(),
            Err(err) => {
                debug!(error = %err, "upsert on national_id failed, retrying on passport_id");
                err.to_string()
            }
        };

        match self
            .try_upsert(ConflictKey::PassportId, hospital, profile)
            .await
        {
            Ok(Some(patient)) => Ok(patient),
            Ok(None) => Err(StorageError::conflict_resolution_exhausted(
                national_id_attempt,
                "no row returned",
            )),
            Err(err) if is_unique_violation(&err) => {
                warn!(error = %err, "upsert conflicts on both identifiers");
                Err(StorageError::conflict_resolution_exhausted(
                    national_id_attempt,
                    err.to_string(),
                ))
            }
            Err(err) => Err(query_error(err)),
        }
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
