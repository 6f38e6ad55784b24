//! HTTP implementation of [`IdentityResolver`].

use async_trait::async_trait;
use medlink_core::{PatientProfile, normalize_str, parse_iso_date_lenient};
use reqwest::{Client, StatusCode, header};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::config::HisConfig;
use crate::error::ResolverError;
use crate::resolver::IdentityResolver;

/// Patient record as the HIS returns it. Every field is optional and the
/// date of birth is still a string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalPatientRecord {
    pub first_name_th: Option<String>,
    pub middle_name_th: Option<String>,
    pub last_name_th: Option<String>,
    pub first_name_en: Option<String>,
    pub middle_name_en: Option<String>,
    pub last_name_en: Option<String>,
    pub date_of_birth: Option<String>,
    pub patient_hn: Option<String>,
    pub national_id: Option<String>,
    pub passport_id: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
}

impl From<ExternalPatientRecord> for PatientProfile {
    /// A malformed date of birth is dropped; the other fields survive.
    fn from(record: ExternalPatientRecord) -> Self {
        PatientProfile {
            date_of_birth: parse_iso_date_lenient(record.date_of_birth.as_deref()),
            first_name_th: record.first_name_th,
            middle_name_th: record.middle_name_th,
            last_name_th: record.last_name_th,
            first_name_en: record.first_name_en,
            middle_name_en: record.middle_name_en,
            last_name_en: record.last_name_en,
            patient_hn: record.patient_hn,
            national_id: record.national_id,
            passport_id: record.passport_id,
            phone_number: record.phone_number,
            email: record.email,
            gender: record.gender,
        }
        .normalized()
    }
}

/// Client for the HIS patient lookup endpoint.
#[derive(Debug, Clone)]
pub struct HisClient {
    client: Client,
    base_url: String,
}

impl HisClient {
    /// Creates a client with the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the underlying HTTP client cannot be built.
    pub fn new(config: &HisConfig) -> Result<Self, ResolverError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| ResolverError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(&config.base_url, client))
    }

    /// Create with a custom client.
    pub fn with_client(base_url: &str, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base_url}/patient/search/{id}` with `id` path-escaped.
    pub fn lookup_url(&self, id: &str) -> String {
        format!("{}/patient/search/{}", self.base_url, urlencoding::encode(id))
    }
}

#[async_trait]
impl IdentityResolver for HisClient {
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn fetch_by_id(&self, id: &str) -> Result<PatientProfile, ResolverError> {
        let Some(id) = normalize_str(id) else {
            return Err(ResolverError::InvalidArgument("id is required".into()));
        };

        let response = self
            .client
            .get(self.lookup_url(&id))
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "HIS request failed");
                ResolverError::Transport(e.to_string())
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!(status = status.as_u16(), "HIS returned non-success status");
            return Err(ResolverError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ResolverError::Transport(e.to_string()))?;
        let record: ExternalPatientRecord = serde_json::from_slice(&body)
            .map_err(|e| ResolverError::Decode(e.to_string()))?;

        debug!("HIS record fetched");
        Ok(record.into())
    }
}
