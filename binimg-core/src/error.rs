use thiserror::Error;

/// Failures raised while decoding a header or walking its load commands.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("region truncated at offset {offset:#x}: needed {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("load command {index} at offset {offset:#x} has size {size}, smaller than its {minimum}-byte layout")]
    CorruptCommand {
        index: u32,
        offset: usize,
        size: u32,
        minimum: usize,
    },

    #[error("load command {index} at offset {offset:#x} with size {size} runs past the table end {limit:#x}")]
    Overrun {
        index: u32,
        offset: usize,
        size: u32,
        limit: usize,
    },
}

/// Failures raised while parsing the textual form of a [`BuildId`](crate::BuildId).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseBuildIdError {
    #[error("expected 36 characters, got {0}")]
    Length(usize),

    #[error("expected '-' at position {0}")]
    MissingDash(usize),

    #[error("invalid hex digit at position {0}")]
    InvalidDigit(usize),
}
