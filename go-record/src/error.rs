use std::fmt;

use crate::Point;
use crate::sgf::SgfError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoError {
    NotOnBoard(Point),
    Overwrite(Point),
    InvalidGtp(String),
    InvalidProperty {
        property: String,
        value: String,
        reason: String,
    },
    Inconsistent(String),
    Sgf(SgfError),
}

impl GoError {
    /// True for the errors a host should surface as "illegal move".
    pub fn is_illegal_move(&self) -> bool {
        matches!(self, GoError::NotOnBoard(_) | GoError::Overwrite(_))
    }
}

impl fmt::Display for GoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GoError::NotOnBoard((x, y)) => write!(f, "position ({x}, {y}) is not on the board"),
            GoError::Overwrite((x, y)) => write!(f, "position ({x}, {y}) is already occupied"),
            GoError::InvalidGtp(s) => write!(f, "invalid GTP move: {s:?}"),
            GoError::InvalidProperty {
                property,
                value,
                reason,
            } => write!(
                f,
                "invalid value '{value}' for property {property}: {reason}"
            ),
            GoError::Inconsistent(msg) => write!(f, "inconsistent board: {msg}"),
            GoError::Sgf(e) => write!(f, "sgf: {e}"),
        }
    }
}

impl std::error::Error for GoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GoError::Sgf(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SgfError> for GoError {
    fn from(e: SgfError) -> Self {
        GoError::Sgf(e)
    }
}
