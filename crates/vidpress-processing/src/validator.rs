use vidpress_core::models::UploadAsset;
use vidpress_core::ValidationError;

/// Upload validator
///
/// Checks the declared metadata of an upload before any byte of the body is read, so a
/// rejected request never touches the scratch directory.
#[derive(Debug, Clone)]
pub struct UploadValidator {
    max_file_size: u64,
    accepted_content_type: String,
}

impl UploadValidator {
    pub fn new(max_file_size: u64, accepted_content_type: impl Into<String>) -> Self {
        Self {
            max_file_size,
            accepted_content_type: accepted_content_type.into(),
        }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Validate the declared size
    pub fn validate_declared_size(&self, size: u64) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate content type
    ///
    /// Comparison is case-insensitive and ignores parameters such as `; codecs=...`.
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        if essence(content_type) != essence(&self.accepted_content_type) {
            return Err(ValidationError::InvalidContentType {
                content_type: content_type.to_string(),
                accepted: self.accepted_content_type.clone(),
            });
        }

        Ok(())
    }

    /// Validate all declared aspects of an upload
    pub fn validate(&self, asset: &UploadAsset) -> Result<(), ValidationError> {
        self.validate_content_type(&asset.content_type)?;
        self.validate_declared_size(asset.declared_size)?;
        Ok(())
    }
}

fn essence(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> UploadValidator {
        UploadValidator::new(1024, "video/mp4")
    }

    #[test]
    fn test_validate_declared_size() {
        let validator = validator();
        assert!(validator.validate_declared_size(1).is_ok());
        assert!(validator.validate_declared_size(1024).is_ok());
        assert_eq!(
            validator.validate_declared_size(0),
            Err(ValidationError::EmptyFile)
        );
        assert_eq!(
            validator.validate_declared_size(1025),
            Err(ValidationError::FileTooLarge {
                size: 1025,
                max: 1024
            })
        );
    }

    #[test]
    fn test_validate_content_type() {
        let validator = validator();
        assert!(validator.validate_content_type("video/mp4").is_ok());
        assert!(validator.validate_content_type("Video/MP4").is_ok());
        assert!(validator
            .validate_content_type("video/mp4; codecs=\"avc1.42E01E\"")
            .is_ok());

        let err = validator.validate_content_type("video/quicktime").unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidContentType {
                content_type: "video/quicktime".to_string(),
                accepted: "video/mp4".to_string(),
            }
        );
        assert!(validator.validate_content_type("").is_err());
    }

    #[test]
    fn test_validate_asset_checks_type_first() {
        let validator = validator();
        let asset = UploadAsset::from_bytes(vec![0u8; 2048], "image/png");
        assert!(matches!(
            validator.validate(&asset),
            Err(ValidationError::InvalidContentType { .. })
        ));

        let asset = UploadAsset::from_bytes(vec![0u8; 16], "video/mp4");
        assert!(validator.validate(&asset).is_ok());
    }
}
