use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SgfError {
    TreeMissing,
    LowercaseProperty {
        pos: usize,
    },
    MissingDelimiter {
        property: String,
        pos: usize,
    },
    EmptyTree {
        pos: usize,
    },
    UnexpectedChar {
        expected: &'static str,
        found: char,
        pos: usize,
    },
    UnexpectedEof,
    InvalidCoordinate(String),
    NotFound(PathBuf),
    Io(String),
}

impl fmt::Display for SgfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SgfError::TreeMissing => write!(f, "tree missing"),
            SgfError::LowercaseProperty { pos } => {
                write!(f, "property must be in uppercase (at position {pos})")
            }
            SgfError::MissingDelimiter { property, pos } => write!(
                f,
                "properties without delimiter: {property} at position {pos}"
            ),
            SgfError::EmptyTree { pos } => write!(f, "tree with no nodes at position {pos}"),
            SgfError::UnexpectedChar {
                expected,
                found,
                pos,
            } => write!(f, "expected {expected}, found '{found}' at position {pos}"),
            SgfError::UnexpectedEof => write!(f, "unexpected end of input"),
            SgfError::InvalidCoordinate(s) => write!(f, "invalid coordinate: {s:?}"),
            SgfError::NotFound(path) => {
                write!(f, "SGF file not found: '{}'", path.display())
            }
            SgfError::Io(msg) => write!(f, "io error: {msg}"),
        }
    }
}

impl std::error::Error for SgfError {}

impl From<std::io::Error> for SgfError {
    fn from(e: std::io::Error) -> Self {
        SgfError::Io(e.to_string())
    }
}
