use thiserror::Error;

/// Faults raised by the page controller. Each one leaves the view state untouched.
#[derive(Debug, Error, PartialEq)]
pub enum ControllerError {
    #[error("unknown boundary dataset: {0}")]
    UnknownDataset(String),

    #[error("boundary dataset {0} is configured more than once")]
    DuplicateDataset(String),

    #[error("invalid coordinate {value:?} for {axis}")]
    InvalidCoordinate { axis: &'static str, value: String },
}
