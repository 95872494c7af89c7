//! Error types for dpicker

use thiserror::Error;

/// Errors that can occur while constructing a date picker
///
/// Once mounted, a picker never fails: unparseable input and out-of-range
/// dates only flip the `valid` flag.
#[derive(Error, Debug)]
pub enum DatePickerError {
    /// The target node does not exist in the document
    #[error("cannot initialize a date picker without a container")]
    MissingContainer,

    /// The target is an `input` that is not attached to a parent
    #[error("cannot initialize a date picker on an input without parent node")]
    InputWithoutParent,

    /// The target is a text node
    #[error("date picker target must be an element")]
    NotAnElement,

    /// `min` is after `max`
    #[error("invalid date range: min {min} is after max {max}")]
    InvertedRange { min: String, max: String },

    /// Options could not be read
    #[error("failed to read options: {0}")]
    Io(#[from] std::io::Error),

    /// Options could not be parsed
    #[error("failed to parse options: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result type for dpicker operations
pub type Result<T> = std::result::Result<T, DatePickerError>;
