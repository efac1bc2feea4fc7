//! Conversions between the three coordinate spaces a game record uses.
//!
//! - internal: zero-based `(x, y)`, origin top-left, `y` growing downward
//! - GTP: column letter (no `I`) and a 1-based row counted from the bottom
//! - SGF: two lowercase letters, column then row, both counted from the top-left

use crate::Point;
use crate::error::GoError;
use crate::sgf::SgfError;

/// GTP column letters. `I` is skipped to avoid confusion with `J`.
pub const GTP_COLUMNS: &[u8; 25] = b"ABCDEFGHJKLMNOPQRSTUVWXYZ";

/// SGF coordinate letters.
pub const SGF_COLUMNS: &[u8; 26] = b"abcdefghijklmnopqrstuvwxyz";

/// The GTP token for a pass.
pub const PASS: &str = "pass";

fn sgf_letter_to_index(ch: char) -> Option<u8> {
    match ch {
        'a'..='z' => Some(ch as u8 - b'a'),
        _ => None,
    }
}

/// Decode a two-letter SGF coordinate. The empty string is a pass.
pub fn sgf_to_coord(sgf: &str) -> Result<Option<Point>, SgfError> {
    if sgf.is_empty() {
        return Ok(None);
    }
    let invalid = || SgfError::InvalidCoordinate(sgf.to_string());
    let mut chars = sgf.chars();
    let (Some(col), Some(row), None) = (chars.next(), chars.next(), chars.next()) else {
        return Err(invalid());
    };
    let x = sgf_letter_to_index(col).ok_or_else(invalid)?;
    let y = sgf_letter_to_index(row).ok_or_else(invalid)?;
    Ok(Some((x, y)))
}

/// Encode an internal point as a two-letter SGF coordinate.
pub fn coord_to_sgf((x, y): Point) -> Result<String, SgfError> {
    match (SGF_COLUMNS.get(x as usize), SGF_COLUMNS.get(y as usize)) {
        (Some(&c), Some(&r)) => Ok([c as char, r as char].iter().collect()),
        _ => Err(SgfError::InvalidCoordinate(format!("({x}, {y})"))),
    }
}

/// Encode an internal point as a GTP vertex on a board with `rows` rows.
pub fn coord_to_gtp((x, y): Point, rows: u8) -> Result<String, GoError> {
    if y >= rows {
        return Err(GoError::NotOnBoard((x, y)));
    }
    let col = GTP_COLUMNS
        .get(x as usize)
        .ok_or(GoError::NotOnBoard((x, y)))?;
    Ok(format!("{}{}", *col as char, rows - y))
}

/// Decode a GTP vertex (`"D4"`, `"pass"`) on a board with `rows` rows.
pub fn gtp_to_coord(vertex: &str, rows: u8) -> Result<Option<Point>, GoError> {
    if vertex.eq_ignore_ascii_case(PASS) {
        return Ok(None);
    }
    let invalid = || GoError::InvalidGtp(vertex.to_string());

    let mut chars = vertex.chars();
    let col = chars.next().ok_or_else(invalid)?.to_ascii_uppercase();
    let x = GTP_COLUMNS
        .iter()
        .position(|&c| c as char == col)
        .ok_or_else(invalid)?;

    let row_str = chars.as_str();
    if row_str.is_empty() || !row_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let row: u32 = row_str.parse().map_err(|_| invalid())?;
    if row == 0 || row > rows as u32 {
        return Err(invalid());
    }

    Ok(Some((x as u8, (rows as u32 - row) as u8)))
}

/// Translate an SGF coordinate straight to GTP notation for a `(cols, rows)` board.
pub fn sgf_to_gtp(sgf: &str, (_cols, rows): (u8, u8)) -> Result<String, GoError> {
    match sgf_to_coord(sgf)? {
        None => Ok(PASS.to_string()),
        Some(point) => coord_to_gtp(point, rows),
    }
}
