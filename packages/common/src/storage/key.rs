use std::fmt;

use super::error::StorageError;

/// A validated, relative, `/`-separated storage path such as `places/abc.jpg`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    /// Validate and wrap a storage path.
    ///
    /// Rejects absolute paths, empty segments, `.`/`..` segments, backslashes,
    /// and control characters.
    pub fn new(key: impl Into<String>) -> Result<Self, StorageError> {
        let key = key.into();

        if key.is_empty() {
            return Err(StorageError::InvalidKey("key cannot be empty".into()));
        }
        if key.chars().any(|c| c.is_control()) {
            return Err(StorageError::InvalidKey(
                "control characters are not allowed".into(),
            ));
        }
        if key.contains('\\') {
            return Err(StorageError::InvalidKey("backslashes are not allowed".into()));
        }
        if key.starts_with('/') || key.ends_with('/') {
            return Err(StorageError::InvalidKey(
                "leading or trailing '/' is not allowed".into(),
            ));
        }
        for segment in key.split('/') {
            match segment {
                "" => return Err(StorageError::InvalidKey("empty path segment".into())),
                "." | ".." => {
                    return Err(StorageError::InvalidKey(
                        "relative path segments are not allowed".into(),
                    ));
                }
                _ => {}
            }
        }

        Ok(Self(key))
    }

    /// Build `{prefix}/{name}` and validate the result.
    pub fn join(prefix: &str, name: &str) -> Result<Self, StorageError> {
        Self::new(format!("{prefix}/{name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
