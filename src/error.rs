//! Errors for file-facing code (config, textures, snapshots)
//!
//! The rendering core itself never fails; degenerate input just draws nothing.

/// Error type for config and image loading
#[derive(Debug)]
pub enum AssetError {
    Io(std::io::Error),
    Parse(ron::error::SpannedError),
    Serialize(ron::Error),
    Image(image::ImageError),
    Validation(String),
}

impl From<std::io::Error> for AssetError {
    fn from(e: std::io::Error) -> Self {
        AssetError::Io(e)
    }
}

impl From<ron::error::SpannedError> for AssetError {
    fn from(e: ron::error::SpannedError) -> Self {
        AssetError::Parse(e)
    }
}

impl From<ron::Error> for AssetError {
    fn from(e: ron::Error) -> Self {
        AssetError::Serialize(e)
    }
}

impl From<image::ImageError> for AssetError {
    fn from(e: image::ImageError) -> Self {
        AssetError::Image(e)
    }
}

impl std::fmt::Display for AssetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetError::Io(e) => write!(f, "IO error: {}", e),
            AssetError::Parse(e) => write!(f, "Parse error: {}", e),
            AssetError::Serialize(e) => write!(f, "Serialize error: {}", e),
            AssetError::Image(e) => write!(f, "Image error: {}", e),
            AssetError::Validation(e) => write!(f, "Validation error: {}", e),
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssetError::Io(e) => Some(e),
            AssetError::Parse(e) => Some(e),
            AssetError::Serialize(e) => Some(e),
            AssetError::Image(e) => Some(e),
            AssetError::Validation(_) => None,
        }
    }
}
