use std::{error::Error, fmt};

pub type GenericError = Box<dyn Error + Send + Sync + 'static>;

pub type SortResult<T> = std::result::Result<T, GenericError>;

#[derive(Debug)]
pub struct SortError {
    pub message: String,
}

impl SortError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        SortError { message: message.into() }
    }
}

impl fmt::Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "SortError")?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

impl Error for SortError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

impl From<std::io::Error> for SortError {
    fn from(error: std::io::Error) -> SortError {
        SortError { message: error.to_string() }
    }
}
