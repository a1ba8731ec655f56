//! Engine error types.
//!
//! Uses `thiserror` for structured, matchable variants. Graph
//! construction accumulates every unsatisfied requirement into a single
//! [`UnsatisfiedError`] before returning; once converters start
//! executing, the first failure aborts the call.

use std::fmt;

use thiserror::Error;

/// Errors produced by the argflow engine or returned from user function
/// bodies through the error slot.
#[derive(Debug, Error)]
pub enum Error {
    /// Attempting to register a type name that already exists.
    #[error("duplicate type name: '{name}'")]
    DuplicateType { name: String },

    /// The supplied callable's input or output shape is unrepresentable.
    #[error("function is not valid: {reason}")]
    InvalidFunction { reason: String },

    /// One or more required inputs could not be satisfied by the direct
    /// inputs or any converter chain.
    #[error(transparent)]
    Unsatisfied(Box<UnsatisfiedError>),

    /// A converter on a chosen path returned an error.
    #[error("converter {name} failed: {source}")]
    Converter {
        name: String,
        #[source]
        source: Box<Error>,
    },

    /// A value did not pass an output filter during redefinition.
    #[error("output {value} does not satisfy output filter")]
    Filter { value: String },

    /// Malformed argument application.
    #[error("invalid argument: {reason}")]
    Builder { reason: String },

    /// Several independent errors.
    #[error("{}", join_errors(.0))]
    Multi(Vec<Error>),

    /// A plain-text error from a user function body.
    #[error("{0}")]
    Message(String),

    /// An arbitrary error from a user function body.
    #[error("{0}")]
    User(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Convenience constructor for plain-text errors from function
    /// bodies.
    pub fn msg(message: impl Into<String>) -> Error {
        Error::Message(message.into())
    }

    /// Collapses a non-empty error list into one error.
    pub(crate) fn aggregate(mut errors: Vec<Error>) -> Error {
        if errors.len() == 1 {
            errors.pop().expect("non-empty error list")
        } else {
            Error::Multi(errors)
        }
    }
}

fn join_errors(errors: &[Error]) -> String {
    let parts: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    format!("{} errors occurred: {}", errors.len(), parts.join("; "))
}

/// Diagnostic report for requirements that cannot be satisfied.
///
/// All fields are pre-rendered descriptions so the report can be
/// displayed without access to the type registry.
#[derive(Debug)]
pub struct UnsatisfiedError {
    /// Name of the target function.
    pub func: String,
    /// The requirements no value could be found for.
    pub missing: Vec<String>,
    /// Every argument the function declares.
    pub declared: Vec<String>,
    /// The direct inputs that were available.
    pub inputs: Vec<String>,
    /// The converters that were available. Each entry is the converter
    /// name followed by its inputs (`>`) and outputs (`<`).
    pub converters: Vec<String>,
}

impl fmt::Display for UnsatisfiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for arg in &self.missing {
            writeln!(f, "argument cannot be satisfied: {}", arg)?;
        }
        writeln!(f)?;
        writeln!(f, "function {:?} declares:", self.func)?;
        for arg in &self.declared {
            writeln!(f, "    - {}", arg)?;
        }
        writeln!(f, "direct inputs:")?;
        if self.inputs.is_empty() {
            writeln!(f, "    none")?;
        }
        for input in &self.inputs {
            writeln!(f, "    - {}", input)?;
        }
        writeln!(f, "converters:")?;
        if self.converters.is_empty() {
            writeln!(f, "    none")?;
        }
        for conv in &self.converters {
            writeln!(f, "{}", conv)?;
        }
        Ok(())
    }
}

impl std::error::Error for UnsatisfiedError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsatisfied_display_names_each_missing_argument() {
        let err = UnsatisfiedError {
            func: "target".to_string(),
            missing: vec!["\"a\" of type int".to_string(), "type string".to_string()],
            declared: vec!["\"a\" of type int".to_string()],
            inputs: vec![],
            converters: vec![],
        };

        let text = err.to_string();
        assert!(text.contains("argument cannot be satisfied: \"a\" of type int"));
        assert!(text.contains("argument cannot be satisfied: type string"));
        assert!(text.contains("direct inputs:\n    none"));
    }

    #[test]
    fn multi_joins_messages() {
        let err = Error::Multi(vec![Error::msg("first"), Error::msg("second")]);
        let text = err.to_string();
        assert!(text.contains("first"));
        assert!(text.contains("second"));
    }

    #[test]
    fn user_errors_pass_through() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err = Error::from(Box::new(io) as Box<dyn std::error::Error + Send + Sync>);
        assert!(err.to_string().contains("boom"));
    }
}
