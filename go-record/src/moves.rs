use serde::{Deserialize, Serialize};

use crate::Point;
use crate::coords;
use crate::error::GoError;
use crate::game::Game;
use crate::sgf::SgfError;
use crate::stone::Stone;

/// Where a move goes: a board point, or nowhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vertex {
    Point(Point),
    Pass,
}

impl Vertex {
    pub fn point(self) -> Option<Point> {
        match self {
            Vertex::Point(p) => Some(p),
            Vertex::Pass => None,
        }
    }
}

impl From<Option<Point>> for Vertex {
    fn from(p: Option<Point>) -> Self {
        match p {
            Some(p) => Vertex::Point(p),
            None => Vertex::Pass,
        }
    }
}

/// A single ply.
///
/// The position is validated against the game's board once, when the move
/// is built. `turn` is `None` until the game registers the move, and stays
/// `None` for setup stones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub color: Stone,
    pub vertex: Vertex,
    pub turn: Option<usize>,
}

impl Move {
    /// Build a move for `game`. Without an explicit color the move goes to
    /// whoever plays next.
    pub fn new(game: &Game, color: Option<Stone>, vertex: Vertex) -> Result<Self, GoError> {
        if let Vertex::Point(p) = vertex {
            game.board().check_placement(p)?;
        }
        Ok(Move {
            color: color.unwrap_or_else(|| game.next_color()),
            vertex,
            turn: None,
        })
    }

    /// A stone that does not count as a ply (`AB`/`AW` setup).
    pub(crate) fn setup(color: Stone, point: Point) -> Self {
        Move {
            color,
            vertex: Vertex::Point(point),
            turn: None,
        }
    }

    /// Parse `"<color> <vertex>"`, e.g. `"b D4"` or `"W pass"`.
    pub fn from_gtp(game: &Game, gtp: &str) -> Result<Self, GoError> {
        let invalid = || GoError::InvalidGtp(gtp.to_string());
        let parts: Vec<&str> = gtp.split(' ').collect();
        let [color, vertex] = parts.as_slice() else {
            return Err(invalid());
        };
        let color = Stone::from_token(color).ok_or_else(invalid)?;
        let vertex = coords::gtp_to_coord(vertex, game.rows())
            .map_err(|_| invalid())?
            .into();
        Move::new(game, Some(color), vertex)
    }

    pub fn point(&self) -> Option<Point> {
        self.vertex.point()
    }

    pub fn is_pass(&self) -> bool {
        self.vertex == Vertex::Pass
    }

    /// GTP rendering on a board with `rows` rows, e.g. `"b D16"`.
    pub fn to_gtp(&self, rows: u8) -> Result<String, GoError> {
        let vertex = match self.vertex {
            Vertex::Point(p) => coords::coord_to_gtp(p, rows)?,
            Vertex::Pass => coords::PASS.to_string(),
        };
        Ok(format!("{} {vertex}", self.color.gtp_letter()))
    }

    /// The SGF property for this move: `("B", ["dd"])`, or an empty value for a pass.
    pub fn to_sgf(&self) -> Result<(&'static str, Vec<String>), SgfError> {
        let value = match self.vertex {
            Vertex::Point(p) => coords::coord_to_sgf(p)?,
            Vertex::Pass => String::new(),
        };
        Ok((self.color.letter(), vec![value]))
    }
}
