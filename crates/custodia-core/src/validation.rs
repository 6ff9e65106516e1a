//! Upload metadata validation.
//!
//! Validates the client-declared filename, MIME type, and size against the
//! configured whitelist before any record is written or credential issued.

use thiserror::Error;

use crate::error::AppError;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes exceeds max {max} bytes")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Invalid content type '{content_type}', allowed: {allowed:?}")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("File is empty")]
    EmptyFile,
}

/// Size limit and MIME whitelist for evidence uploads.
#[derive(Debug, Clone)]
pub struct UploadLimits {
    pub max_size_bytes: usize,
    pub allowed_content_types: Vec<String>,
}

/// Validate declared upload metadata against the configured limits.
pub fn validate_upload(
    original_name: &str,
    mime_type: &str,
    size_bytes: u64,
    limits: &UploadLimits,
) -> Result<(), ValidationError> {
    if original_name.trim().is_empty() {
        return Err(ValidationError::InvalidFilename(
            "Filename must not be blank".to_string(),
        ));
    }
    if original_name.contains('/') || original_name.contains("..") {
        return Err(ValidationError::InvalidFilename(format!(
            "Filename '{}' contains path separators",
            original_name
        )));
    }

    if size_bytes == 0 {
        return Err(ValidationError::EmptyFile);
    }
    if size_bytes > limits.max_size_bytes as u64 {
        return Err(ValidationError::FileTooLarge {
            size: size_bytes,
            max: limits.max_size_bytes as u64,
        });
    }

    let mime = mime_type.to_lowercase();
    if !limits.allowed_content_types.iter().any(|t| t == &mime) {
        return Err(ValidationError::InvalidContentType {
            content_type: mime_type.to_string(),
            allowed: limits.allowed_content_types.clone(),
        });
    }

    Ok(())
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::FileTooLarge { size, max } => {
                AppError::PayloadTooLarge(format!("{} bytes exceeds max {} bytes", size, max))
            }
            other => AppError::Validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> UploadLimits {
        UploadLimits {
            max_size_bytes: 1024,
            allowed_content_types: vec!["image/jpeg".to_string(), "image/png".to_string()],
        }
    }

    #[test]
    fn test_accepts_whitelisted_upload() {
        assert!(validate_upload("foto.jpg", "image/jpeg", 512, &limits()).is_ok());
    }

    #[test]
    fn test_mime_check_is_case_insensitive() {
        assert!(validate_upload("foto.jpg", "IMAGE/JPEG", 512, &limits()).is_ok());
    }

    #[test]
    fn test_rejects_oversize() {
        let err = validate_upload("foto.jpg", "image/jpeg", 4096, &limits()).unwrap_err();
        assert!(matches!(err, ValidationError::FileTooLarge { .. }));
        assert!(matches!(
            AppError::from(err),
            AppError::PayloadTooLarge(_)
        ));
    }

    #[test]
    fn test_rejects_unlisted_mime() {
        let err = validate_upload("clip.mp4", "video/mp4", 512, &limits()).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidContentType { .. }));
    }

    #[test]
    fn test_rejects_traversal_filename() {
        let err = validate_upload("../etc/passwd", "image/jpeg", 10, &limits()).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFilename(_)));
    }

    #[test]
    fn test_rejects_empty_file() {
        let err = validate_upload("foto.jpg", "image/jpeg", 0, &limits()).unwrap_err();
        assert!(matches!(err, ValidationError::EmptyFile));
    }
}
