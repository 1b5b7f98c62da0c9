use std::borrow::Borrow;
use std::fmt::{self, Display};

use log::error;
use thiserror::Error;

use crate::schema::Category;

pub type ConfigResult<T> = Result<T, String>;
pub type VoidResult = ConfigResult<()>;

pub trait ErrorExt<G, E> {
    fn as_err(self) -> ConfigResult<G>;

    fn prefix<P: Borrow<str>>(self, prefix: P) -> ConfigResult<G>;

    fn log(self) -> Self;
}

impl<G, E> ErrorExt<G, E> for Result<G, E>
where
    E: Display,
{
    fn as_err(self) -> Result<G, String> {
        self.map_err(|e| e.to_string())
    }

    fn prefix<P>(self, prefix: P) -> ConfigResult<G>
    where
        P: Borrow<str>,
    {
        self.map_err(|e| format!("{}: {}", prefix.borrow(), e))
    }

    fn log(self) -> Self {
        self.map_err(|e| {
            error!("{}", e);
            e
        })
    }
}

/// What is wrong with a single key in the document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    #[error("missing required field")]
    MissingField,

    #[error("{category} '{name}' is not defined")]
    UndefinedReference { category: Category, name: String },

    #[error("pulse_pwm_mask is {pulse} bits wide but hold_pwm_mask is {hold} bits wide")]
    MaskWidthMismatch { pulse: usize, hold: usize },

    #[error("'{0}' is not an 8 or 32 bit mask")]
    MalformedMask(String),

    #[error("'{0}' is not a valid address for this device")]
    MalformedNumber(String),

    #[error("expected {expected}, found {found}")]
    InvalidValue { expected: String, found: String },

    #[error("'{value}' is not one of {}", .allowed.join(", "))]
    InvalidChoice {
        value: String,
        allowed: Vec<&'static str>,
    },

    #[error("{value} is outside {min}..={max}")]
    OutOfRange { value: f64, min: f64, max: f64 },

    #[error("name is defined more than once")]
    DuplicateName,

    #[error("unknown top-level key")]
    UnknownCategory,

    #[error("unknown field")]
    UnknownField,
}

/// A problem found in the document, anchored to the key path that caused it.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub path: String,
    pub kind: ErrorKind,
}

impl ValidationError {
    pub fn new<P: Into<String>>(path: P, kind: ErrorKind) -> ValidationError {
        ValidationError {
            path: path.into(),
            kind,
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind)
    }
}

impl std::error::Error for ValidationError {}

/// Every problem found while validating one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn push<P: Into<String>>(&mut self, path: P, kind: ErrorKind) {
        self.0.push(ValidationError::new(path, kind));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<ValidationError> {
        self.0.iter()
    }

    /// The first error reported for `path`, if any.
    pub fn at(&self, path: &str) -> Option<&ErrorKind> {
        self.0.iter().find(|e| e.path == path).map(|e| &e.kind)
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("config file is version {found}, version {required} is required")]
    Version { found: u32, required: u32 },

    #[error("YAML error at line {line}, position {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("malformed document: {0}")]
    Structure(String),

    #[error("{0}")]
    Invalid(ValidationErrors),

    #[error("unable to read {path}: {message}")]
    Io { path: String, message: String },
}

impl LoadError {
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            LoadError::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<serde_yaml::Error> for LoadError {
    fn from(error: serde_yaml::Error) -> LoadError {
        match error.location() {
            Some(location) => LoadError::Syntax {
                line: location.line(),
                column: location.column(),
                message: error.to_string(),
            },
            None => LoadError::Structure(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_wraps_message() {
        let result: Result<(), &str> = Err("boom");
        assert_eq!(result.prefix("Failed to load"), Err("Failed to load: boom".to_owned()));
    }

    #[test]
    fn errors_display_with_path() {
        let mut errors = ValidationErrors::default();
        errors.push("coils.c_test", ErrorKind::MissingField);
        errors.push(
            "autofire_coils.ac_test.coil",
            ErrorKind::UndefinedReference {
                category: Category::Coils,
                name: "c_missing".into(),
            },
        );

        assert_eq!(
            errors.to_string(),
            "coils.c_test: missing required field\n\
             autofire_coils.ac_test.coil: coils 'c_missing' is not defined"
        );
        assert_eq!(errors.at("coils.c_test"), Some(&ErrorKind::MissingField));
    }
}
