use std::fmt;
use thiserror::Error;

/// A request was re-entered while it was still being evaluated.
///
/// `chain` lists the requests of the cycle in stack order, starting and
/// ending with the re-entered request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("circular dependency detected: {}", .chain.join(" -> "))]
pub struct CycleError {
    pub request: String,
    pub chain: Vec<String>,
}

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Cycle(#[from] CycleError),

    /// The request's own computation failed
    #[error(transparent)]
    Computation(#[from] anyhow::Error),
}

impl EvaluationError {
    /// A computation failure carrying just a message
    pub fn computation<M>(message: M) -> Self
    where
        M: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        EvaluationError::Computation(anyhow::Error::msg(message))
    }

    pub fn is_cycle(&self) -> bool {
        matches!(self, EvaluationError::Cycle(_))
    }

    pub fn as_cycle(&self) -> Option<&CycleError> {
        match self {
            EvaluationError::Cycle(cycle) => Some(cycle),
            EvaluationError::Computation(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, EvaluationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_error_display() {
        let error = CycleError {
            request: "A(1)".to_string(),
            chain: vec!["A(1)".to_string(), "B(1)".to_string(), "A(1)".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "circular dependency detected: A(1) -> B(1) -> A(1)"
        );
    }

    #[test]
    fn test_computation_error() {
        let error = EvaluationError::computation("no such declaration");
        assert!(!error.is_cycle());
        assert!(error.as_cycle().is_none());
        assert_eq!(error.to_string(), "no such declaration");
    }

    #[test]
    fn test_anyhow_converts() {
        fn parse(text: &str) -> Result<i32> {
            let value: i32 = text.parse().map_err(anyhow::Error::from)?;
            Ok(value)
        }

        assert_eq!(parse("12").ok(), Some(12));
        assert!(matches!(parse("x"), Err(EvaluationError::Computation(_))));
    }
}
