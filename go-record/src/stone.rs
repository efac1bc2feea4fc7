use serde_repr::{Deserialize_repr, Serialize_repr};
use std::fmt;
use std::ops::Neg;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(i8)]
pub enum Stone {
    Black = 1,
    White = -1,
}

impl Stone {
    pub fn from_int(v: i8) -> Option<Self> {
        match v.signum() {
            1 => Some(Stone::Black),
            -1 => Some(Stone::White),
            _ => None,
        }
    }

    pub fn to_int(self) -> i8 {
        self as i8
    }

    pub fn opp(self) -> Self {
        match self {
            Stone::Black => Stone::White,
            Stone::White => Stone::Black,
        }
    }

    /// SGF property key for a move of this color.
    pub fn letter(self) -> &'static str {
        match self {
            Stone::Black => "B",
            Stone::White => "W",
        }
    }

    /// Color token used in GTP move strings.
    pub fn gtp_letter(self) -> &'static str {
        match self {
            Stone::Black => "b",
            Stone::White => "w",
        }
    }

    /// Accepts `b`, `B`, `w` or `W`.
    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "b" | "B" => Some(Stone::Black),
            "w" | "W" => Some(Stone::White),
            _ => None,
        }
    }
}

impl FromStr for Stone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stone::from_token(s).ok_or_else(|| format!("invalid color: {s}"))
    }
}

impl Neg for Stone {
    type Output = Self;

    fn neg(self) -> Self {
        self.opp()
    }
}

impl fmt::Display for Stone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stone::Black => write!(f, "Black"),
            Stone::White => write!(f, "White"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_int_normalizes() {
        assert_eq!(Stone::from_int(1), Some(Stone::Black));
        assert_eq!(Stone::from_int(-5), Some(Stone::White));
        assert_eq!(Stone::from_int(0), None);
    }

    #[test]
    fn opponent() {
        assert_eq!(Stone::Black.opp(), Stone::White);
        assert_eq!(-Stone::White, Stone::Black);
    }

    #[test]
    fn parses_color_tokens_case_insensitively() {
        assert_eq!("b".parse::<Stone>(), Ok(Stone::Black));
        assert_eq!("B".parse::<Stone>(), Ok(Stone::Black));
        assert_eq!("w".parse::<Stone>(), Ok(Stone::White));
        assert_eq!("W".parse::<Stone>(), Ok(Stone::White));
        assert!("x".parse::<Stone>().is_err());
        assert!("black".parse::<Stone>().is_err());
    }

    #[test]
    fn letters() {
        assert_eq!(Stone::Black.letter(), "B");
        assert_eq!(Stone::White.gtp_letter(), "w");
    }

    #[test]
    fn serializes_as_signed_int() {
        assert_eq!(serde_json::to_string(&Stone::White).unwrap(), "-1");
        let s: Stone = serde_json::from_str("1").unwrap();
        assert_eq!(s, Stone::Black);
    }
}
