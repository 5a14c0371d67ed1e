use thiserror::Error;

pub type Result<T> = std::result::Result<T, SurvError>;

#[derive(Error, Debug)]
pub enum SurvError {
    #[error("dimensions don't match: {message}")]
    InvalidDimensions { message: String },

    #[error("bad parameter: {parameter} = {value}")]
    InvalidParameter { parameter: String, value: String },

    #[error("numerical issues: {message}")]
    NumericalError { message: String },

    #[error("survival data is broken: {message}")]
    InvalidSurvivalData { message: String },

    #[error("no column named '{column}'")]
    ColumnNotFound { column: String },

    #[error("table is malformed: {message}")]
    InvalidTable { message: String },

    #[error("rendering failed: {message}")]
    Render { message: String },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SurvError {
    pub fn invalid_dimensions(message: impl Into<String>) -> Self {
        Self::InvalidDimensions { message: message.into() }
    }

    pub fn invalid_parameter(parameter: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.into()
        }
    }

    pub fn numerical_error(message: impl Into<String>) -> Self {
        Self::NumericalError { message: message.into() }
    }

    pub fn invalid_survival_data(message: impl Into<String>) -> Self {
        Self::InvalidSurvivalData { message: message.into() }
    }

    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound { column: column.into() }
    }

    pub fn invalid_table(message: impl Into<String>) -> Self {
        Self::InvalidTable { message: message.into() }
    }

    /// plotters errors are generic over the backend, so keep only the message
    pub fn render(err: impl std::fmt::Display) -> Self {
        Self::Render { message: err.to_string() }
    }
}
