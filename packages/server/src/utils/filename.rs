use std::path::Path;

/// Why an uploaded image filename was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilenameError {
    /// Filename is empty or whitespace-only.
    Empty,
    /// Filename contains null bytes or other control characters.
    ControlCharacter,
    /// Extension is missing or not on the allow-list. Holds the lower-cased
    /// extension as found (possibly empty).
    UnsupportedExtension(String),
}

impl FilenameError {
    /// Returns a human-readable error message.
    pub fn message(&self, allowed: &[String]) -> String {
        match self {
            Self::Empty => "File name cannot be empty".into(),
            Self::ControlCharacter => "File name must not contain control characters".into(),
            Self::UnsupportedExtension(ext) if ext.is_empty() => format!(
                "File has no extension. Allowed formats: {}",
                allowed.join(", ")
            ),
            Self::UnsupportedExtension(ext) => format!(
                "File format {ext} is not supported. Allowed formats: {}",
                allowed.join(", ")
            ),
        }
    }
}

/// Lower-cased extension including the leading dot (`"Photo.JPG"` -> `".jpg"`).
///
/// Dot-files such as `.jpg` have no extension, matching how most platforms
/// treat them.
pub fn dotted_extension(filename: &str) -> String {
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!(".{}", ext.to_lowercase()),
        _ => String::new(),
    }
}

/// Validate an uploaded image filename against an extension allow-list.
///
/// Returns the lower-cased dotted extension on success.
pub fn validate_image_filename(filename: &str, allowed: &[String]) -> Result<String, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }

    // Names end up in Content-Disposition style headers and logs.
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(FilenameError::ControlCharacter);
    }

    let ext = dotted_extension(trimmed);
    if ext.is_empty() || !allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext)) {
        return Err(FilenameError::UnsupportedExtension(ext));
    }

    Ok(ext)
}

/// Generate a fresh storage filename that keeps the upload's extension.
pub fn generated_filename(ext: &str) -> String {
    format!("{}{}", uuid::Uuid::now_v7().simple(), ext)
}
