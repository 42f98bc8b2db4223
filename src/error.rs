//! Error taxonomy shared by every decode and encode path.
//!
//! All errors are fatal: a failed decode leaves no usable model and a failed
//! encode leaves the output stream in an unspecified, possibly truncated
//! state.

use std::io;
use thiserror::Error;

use crate::chunk::FourCC;

#[derive(Error, Debug)]
pub enum SfError {
    /// Bad signature, table length not a multiple of its record size,
    /// table too short, missing or duplicate table.
    #[error("Structural error: {0}")]
    Structural(String),

    /// An index sequence decreased somewhere.
    #[error("Index ordering error in '{section}': record {record} starts at {index}, below its predecessor {previous}")]
    Ordering {
        section:  FourCC,
        record:   usize,
        index:    u16,
        previous: u16,
    },

    /// Consumed bytes do not match the declared table length.
    #[error("Size mismatch in '{section}': expected {expected} bytes, found {actual}")]
    SizeMismatch {
        section:  FourCC,
        expected: u64,
        actual:   u64,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Unknown section '{0}'")]
    UnknownSection(FourCC),
}

impl SfError {
    pub(crate) fn structural(msg: impl Into<String>) -> Self {
        SfError::Structural(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, SfError>;
