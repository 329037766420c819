use std::fmt;

/// Result of a best-effort step. Absence is an expected steady state, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Present(T),
    Absent(AbsentReason),
}

/// Why a best-effort field was left empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbsentReason {
    /// The service call exceeded its timeout
    TimedOut,
    /// The service answered with nothing usable
    EmptyResponse,
    /// The service call failed
    Failed(String),
}

impl<T> Outcome<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent(_) => None,
        }
    }
}

impl fmt::Display for AbsentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimedOut => f.write_str("timed out"),
            Self::EmptyResponse => f.write_str("empty response"),
            Self::Failed(message) => write!(f, "failed: {}", message),
        }
    }
}
