//! Per-command argument validation.

use std::fmt;
use std::sync::Arc;

use crate::domain::models::Command;
use crate::domain::ValidationError;

/// Checks a command before its handler runs.
pub trait Validator: Send + Sync {
    fn validate(&self, command: &Command) -> Result<(), ValidationError>;
}

/// Validation attached to a handler descriptor.
#[derive(Clone, Default)]
pub enum Validation {
    #[default]
    None,
    Custom(Arc<dyn Validator>),
}

impl Validation {
    pub fn custom(validator: impl Validator + 'static) -> Self {
        Self::Custom(Arc::new(validator))
    }

    pub fn validate(&self, command: &Command) -> Result<(), ValidationError> {
        match self {
            Self::None => Ok(()),
            Self::Custom(validator) => validator.validate(command),
        }
    }
}

impl fmt::Debug for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("Validation::None"),
            Self::Custom(_) => f.write_str("Validation::Custom(..)"),
        }
    }
}

/// Accepts commands whose argument count lies in `min..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgumentCount {
    pub min: usize,
    pub max: usize,
}

impl ArgumentCount {
    pub const fn none() -> Self {
        Self { min: 0, max: 0 }
    }

    pub const fn at_most(max: usize) -> Self {
        Self { min: 0, max }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        "argument"
    } else {
        "arguments"
    }
}

impl Validator for ArgumentCount {
    fn validate(&self, command: &Command) -> Result<(), ValidationError> {
        let count = command.raw_args.len();
        if count > self.max {
            let message = if self.max == 0 {
                format!("Command /{} takes no arguments.", command.name)
            } else {
                format!(
                    "Command /{} takes at most {} {}.",
                    command.name,
                    self.max,
                    plural(self.max)
                )
            };
            return Err(ValidationError::new(message));
        }
        if count < self.min {
            return Err(ValidationError::new(format!(
                "Command /{} needs at least {} {}.",
                command.name,
                self.min,
                plural(self.min)
            )));
        }
        Ok(())
    }
}
