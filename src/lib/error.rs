use std::fmt;

// Numeric values are what the error callback prints
#[repr(u32)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Debug)]
pub enum ErrorCode {
    Unknown = 0,
    InvalidArgument = 1,
    InvalidOperation = 2,
    OutOfMemory = 3,
    UnsupportedCpu = 4,
    Cancelled = 5,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u32)
    }
}

#[derive(thiserror::Error)]
#[derive(Clone, Debug)]
#[error("error {code}: {message}")]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidOperation, message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
