// ========================= Errors =========================
//
// Error kinds surfaced by the encode and decode pipelines. Every variant is
// terminal for the current invocation; the binary maps each one to a distinct
// process exit code through `PaperError::exit_code`.

use std::path::PathBuf;

use thiserror::Error;

use crate::exit_codes;

#[derive(Debug, Error)]
pub enum PaperError {
    /// Input file exists but holds no bytes
    #[error("input file {0:?} does not contain any data")]
    EmptyInput(PathBuf),

    /// Input directory holds no regular file
    #[error("no input file found in {0:?}")]
    NoInput(PathBuf),

    /// Input directory holds more than one regular file
    #[error("input directory {dir:?} should contain exactly one file, found {count}")]
    AmbiguousInput { dir: PathBuf, count: usize },

    /// File name contains the frame separator or cannot be written safely
    #[error("invalid file name {0:?}")]
    InvalidFileName(String),

    /// External frame does not fit the grid
    #[error("data overflow: {needed} blocks needed, grid holds {capacity}")]
    Overflow { needed: usize, capacity: usize },

    /// Degenerate canvas / margin / block size combination
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Digit outside 0..=7, triplet above 255, or ragged digit count
    #[error("malformed symbol stream: {0}")]
    MalformedSymbolStream(String),

    /// Missing separator, or not enough digits for marker and payload
    #[error("frame too short: {0}")]
    FrameTooShort(String),

    /// Decompressor rejected the byte stream
    #[error("corrupt payload: {0}")]
    CorruptPayload(String),

    /// Corner selection was not completed
    #[error("cancelled by user")]
    UserCancelled,

    #[error("image I/O failed for {path:?}: {reason}")]
    ImageIo { path: PathBuf, reason: String },

    /// Rendered page did not decode back to the input
    #[error("verification failed: {0}")]
    VerificationFailed(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PaperError {
    pub(crate) fn image_io(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PaperError::ImageIo { path: path.into(), reason: reason.to_string() }
    }

    /// Process exit status for this error class.
    pub fn exit_code(&self) -> i32 {
        match self {
            PaperError::EmptyInput(_)
            | PaperError::NoInput(_)
            | PaperError::AmbiguousInput { .. }
            | PaperError::InvalidFileName(_) => exit_codes::EXIT_INPUT_ERROR,
            PaperError::Overflow { .. } | PaperError::InvalidGeometry(_) => exit_codes::EXIT_CAPACITY_ERROR,
            PaperError::MalformedSymbolStream(_)
            | PaperError::FrameTooShort(_)
            | PaperError::CorruptPayload(_)
            | PaperError::VerificationFailed(_) => exit_codes::EXIT_FORMAT_ERROR,
            PaperError::UserCancelled => exit_codes::EXIT_CANCELLED,
            PaperError::ImageIo { .. } => exit_codes::EXIT_IMAGE_ERROR,
            PaperError::Config(_) => exit_codes::EXIT_INVALID_ARGS,
            PaperError::Io(_) => exit_codes::EXIT_IO_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, PaperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classes_have_distinct_exit_codes() {
        let input = PaperError::EmptyInput(PathBuf::from("x")).exit_code();
        let capacity = PaperError::Overflow { needed: 10, capacity: 9 }.exit_code();
        let format = PaperError::CorruptPayload("bad".into()).exit_code();
        let cancelled = PaperError::UserCancelled.exit_code();
        let image = PaperError::image_io("a.png", "nope").exit_code();
        let codes = [input, capacity, format, cancelled, image];
        for (i, a) in codes.iter().enumerate() {
            assert_ne!(*a, exit_codes::EXIT_SUCCESS);
            for b in &codes[i + 1..] { assert_ne!(a, b); }
        }
    }

    #[test]
    fn overflow_message_names_both_sizes() {
        let msg = PaperError::Overflow { needed: 2026, capacity: 2025 }.to_string();
        assert!(msg.contains("2026") && msg.contains("2025"), "{msg}");
    }
}
