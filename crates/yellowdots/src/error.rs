use crate::core::MatrixError;
use crate::mask::MaskError;
use crate::patterns::CodecError;

/// Errors returned by the scanner and the JSON front-end.
///
/// A pattern that simply does not match is not an error; it is reported as
/// [`PatternOutcome::NoMatch`](crate::PatternOutcome::NoMatch).
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error("no pattern accepts a {rows}x{cols} grid")]
    UnsupportedDimensions { rows: usize, cols: usize },

    #[error(transparent)]
    Matrix(#[from] MatrixError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Mask(#[from] MaskError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
