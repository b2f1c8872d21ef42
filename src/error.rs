use thiserror::Error;

/// Reasons a raw image cannot be turned into a canonical buffer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Unsupported channel count: {0} (expected 1, 3 or 4)")]
    UnsupportedChannels(u8),

    #[error("Truncated buffer: expected at least {expected} bytes, got {actual}")]
    TruncatedBuffer { expected: usize, actual: usize },

    #[error("Row stride {stride} is smaller than one row of {row_bytes} bytes")]
    InvalidStride { stride: usize, row_bytes: usize },

    #[error("Unsupported pixel format: {0}")]
    UnsupportedFormat(String),
}

#[derive(Error, Debug)]
pub enum EnhanceError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Empty image: {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("No image loaded")]
    NoImage,

    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

pub type Result<T> = std::result::Result<T, EnhanceError>;

// Front ends receive errors as plain messages
impl serde::Serialize for EnhanceError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_converts() {
        let err: EnhanceError = DecodeError::UnsupportedChannels(2).into();
        assert!(matches!(err, EnhanceError::Decode(DecodeError::UnsupportedChannels(2))));
        assert_eq!(
            err.to_string(),
            "Decode error: Unsupported channel count: 2 (expected 1, 3 or 4)"
        );
    }

    #[test]
    fn test_serializes_as_message() {
        let err = EnhanceError::EmptyImage { width: 0, height: 4 };
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"Empty image: 0x4\"");
    }
}
