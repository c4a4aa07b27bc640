use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("User {0} not found")]
    NotFound(i64),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Email {0} is already registered")]
    DuplicateEmail(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegistryError {
    /// Stable machine-readable tag, carried in HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::DuplicateEmail(_) => "DUPLICATE_EMAIL",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Io(_) => "IO_ERROR",
        }
    }
}

#[cfg(feature = "storage")]
impl From<sqlx::Error> for RegistryError {
    fn from(e: sqlx::Error) -> Self {
        RegistryError::Storage(e.to_string())
    }
}
