//! Error type shared by world construction, queries and export.

use thiserror::Error;

/// Everything that can go wrong at the library boundary.
///
/// The noise, classification and rasterisation code is total over finite
/// input, so these only surface from configuration, world creation,
/// pointer queries and file export.
#[derive(Debug, Error)]
pub enum WorldError {
    #[error("non-finite coordinate ({x}, {y})")]
    NonFiniteCoordinate { x: f64, y: f64 },

    #[error("config field `{0}` is not finite")]
    NonFiniteConfig(&'static str),

    #[error("unknown landmark id `{0}`")]
    UnknownLandmark(String),

    #[error("duplicate landmark id `{0}`")]
    DuplicateLandmark(String),

    #[error("world needs exactly one base landmark, found {0}")]
    BaseCount(usize),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("window error: {0}")]
    Window(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Reject NaN and infinities before they reach the noise functions.
pub fn ensure_finite(x: f64, y: f64) -> Result<(), WorldError> {
    if x.is_finite() && y.is_finite() {
        Ok(())
    } else {
        Err(WorldError::NonFiniteCoordinate { x, y })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_finite() {
        assert!(ensure_finite(1.0, -3.5).is_ok());
        assert!(matches!(
            ensure_finite(f64::NAN, 0.0),
            Err(WorldError::NonFiniteCoordinate { .. })
        ));
        assert!(ensure_finite(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_error_messages() {
        let err = WorldError::UnknownLandmark("tower".into());
        assert_eq!(err.to_string(), "unknown landmark id `tower`");
        assert_eq!(
            WorldError::BaseCount(2).to_string(),
            "world needs exactly one base landmark, found 2"
        );
    }
}
