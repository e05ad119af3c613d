/// Main error type for the library.
#[derive(Debug)]
pub enum DcapError {
    /// Used when the user passes a logically invalid parameter to a function.
    InvalidParameter(String),
    /// Paired color/depth arrays do not share the expected pixel dimensions.
    DimensionMismatch(String),
    Io(std::io::Error),
}

impl std::fmt::Display for DcapError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DcapError::InvalidParameter(err) => write!(f, "Parameter error: {}", err),
            DcapError::DimensionMismatch(err) => write!(f, "Dimension mismatch: {}", err),
            DcapError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl DcapError {
    /// Create an error with the kind `InvalidParameter`.
    /// # Arguments
    /// * `msg` - The error message.
    pub fn invalid_parameter<T: ToString>(msg: T) -> Self {
        DcapError::InvalidParameter(msg.to_string())
    }

    /// Create an error with the kind `DimensionMismatch`.
    pub fn dimension_mismatch<T: ToString>(msg: T) -> Self {
        DcapError::DimensionMismatch(msg.to_string())
    }
}

impl std::error::Error for DcapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DcapError::Io(err) => Some(err),
            DcapError::InvalidParameter(_) => None,
            DcapError::DimensionMismatch(_) => None,
        }
    }
}

impl From<std::io::Error> for DcapError {
    fn from(err: std::io::Error) -> Self {
        DcapError::Io(err)
    }
}
