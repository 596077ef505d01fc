use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    /// Hex-encoded MD5 digest as sent by clients and reported by S3 ETags
    /// - Valid: "d41d8cd98f00b204e9800998ecf8427e", "D41D8CD98F00B204E9800998ECF8427E"
    /// - Invalid: "d41d8cd9", "z41d8cd98f00b204e9800998ecf8427e"
    pub static ref MD5_REGEX: Regex = Regex::new(r"^[A-Fa-f0-9]{32}$").unwrap();

    /// File extension without the leading dot
    /// - Valid: "png", "JPG", "mp4", "m4a"
    /// - Invalid: "", "tar.gz", "pn g", "../x"
    pub static ref EXTENSION_REGEX: Regex = Regex::new(r"^[A-Za-z0-9]{1,16}$").unwrap();
}

/// Rejects text made only of whitespace
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be blank".into()));
    }
    Ok(())
}
