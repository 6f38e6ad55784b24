use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate { value: String },
}

impl CoreError {
    pub fn invalid_date(value: impl Into<String>) -> Self {
        Self::InvalidDate {
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
