use uuid::Uuid;

use crate::errors::AppError;

/// Parses a record id. A malformed id is a store-level fault, not a 404.
pub fn valid_uuid(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id)
        .map_err(|_| AppError::StorageError(format!("Cast to UUID failed for value \"{}\"", id)))
}
