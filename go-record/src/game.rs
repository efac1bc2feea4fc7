use std::path::Path;

use tracing::{debug, trace, warn};

use crate::Point;
use crate::board::Board;
use crate::coords::{self, PASS};
use crate::error::GoError;
use crate::moves::{Move, Vertex};
use crate::sgf::{self, SgfTree};
use crate::stone::Stone;

pub const MIN_BOARD_SIZE: u8 = 4;
pub const MAX_BOARD_SIZE: u8 = 19;
pub const DEFAULT_BOARD_SIZE: u8 = 19;

/// Identification block written at the root of every exported tree.
const IDENTIFICATION: [(&str, &str); 3] = [("GM", "1"), ("FF", "4"), ("CA", "UTF-8")];

/// A game record: root metadata, setup stones, the ordered plies and the
/// board they produce.
///
/// The board is always the replay of the setup stones followed by every
/// non-pass move, with captures resolved after each placement.
#[derive(Debug, Clone)]
pub struct Game {
    ruleset: String,
    cols: u8,
    rows: u8,
    komi: f64,
    handicap: u8,
    setup: Vec<Move>,
    moves: Vec<Move>,
    board: Board,
}

impl Game {
    pub fn new(ruleset: &str, cols: u8, rows: u8, komi: f64, handicap: u8) -> Result<Self, GoError> {
        let valid = MIN_BOARD_SIZE..=MAX_BOARD_SIZE;
        if !valid.contains(&cols) || !valid.contains(&rows) {
            return Err(GoError::InvalidProperty {
                property: "SZ".to_string(),
                value: format_size(cols, rows),
                reason: format!("board size must be between {MIN_BOARD_SIZE} and {MAX_BOARD_SIZE}"),
            });
        }
        Ok(Game {
            ruleset: ruleset.to_string(),
            cols,
            rows,
            komi,
            handicap,
            setup: Vec::new(),
            moves: Vec::new(),
            board: Board::with_dimensions(cols, rows),
        })
    }

    /// Build an empty game from the root properties `RU`, `SZ`, `KM`, `HA`,
    /// `AB` and `AW`. Missing properties take their defaults.
    pub fn from_properties(root: &SgfTree) -> Result<Self, GoError> {
        let ruleset = root.first("RU").unwrap_or("");
        let (cols, rows) = match root.get("SZ") {
            Some(values) => parse_size(values)?,
            None => (DEFAULT_BOARD_SIZE, DEFAULT_BOARD_SIZE),
        };
        let komi = match root.get("KM") {
            Some(values) => parse_f64(values, "KM")?,
            None => 0.0,
        };
        let handicap = match root.get("HA") {
            Some(values) => parse_u8(values, "HA")?,
            None => 0,
        };

        let mut game = Game::new(ruleset, cols, rows, komi, handicap)?;
        for (color, ident) in [(Stone::Black, "AB"), (Stone::White, "AW")] {
            let Some(values) = root.get(ident) else {
                continue;
            };
            let points = parse_point_list(values)?;
            if !points.is_empty() {
                game.place(color, &points)?;
            }
        }
        Ok(game)
    }

    /// Build a game from a tree: root properties first, then every move on
    /// the main line replayed in order.
    pub fn from_sgftree(tree: &SgfTree) -> Result<Self, GoError> {
        let mut game = Game::from_properties(tree)?;
        for node in tree.main_line() {
            let Some((color, value)) = node.node_move() else {
                continue;
            };
            if node.get("B").is_some() && node.get("W").is_some() {
                warn!("node carries both B and W, keeping B[{value}]");
            }
            // tt is the FF[3] pass on boards up to 19x19
            let vertex = if value == "tt" && game.cols <= 19 && game.rows <= 19 {
                PASS.to_string()
            } else {
                coords::sgf_to_gtp(value, game.size())?
            };
            game.play(&format!("{} {vertex}", color.gtp_letter()))?;
        }
        debug!(
            "loaded {}x{} game, handicap {}, {} moves",
            game.cols,
            game.rows,
            game.handicap,
            game.moves.len()
        );
        Ok(game)
    }

    /// Parse SGF text and load its first game tree.
    pub fn from_sgf(text: &str) -> Result<Self, GoError> {
        Game::from_sgftree(&sgf::parse(text)?)
    }

    pub fn from_sgf_file(path: impl AsRef<Path>) -> Result<Self, GoError> {
        Game::from_sgftree(&SgfTree::from_file(path)?)
    }

    // -- Accessors --

    pub fn ruleset(&self) -> &str {
        &self.ruleset
    }

    pub fn cols(&self) -> u8 {
        self.cols
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn size(&self) -> (u8, u8) {
        (self.cols, self.rows)
    }

    pub fn komi(&self) -> f64 {
        self.komi
    }

    pub fn handicap(&self) -> u8 {
        self.handicap
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Setup stones of one color, in placement order.
    pub fn setup_stones(&self, color: Stone) -> Vec<Point> {
        self.setup
            .iter()
            .filter(|m| m.color == color)
            .filter_map(Move::point)
            .collect()
    }

    /// Whose turn it is. White opens a game with two or more handicap stones.
    pub fn next_color(&self) -> Stone {
        match self.moves.last() {
            Some(m) => m.color.opp(),
            None if self.handicap >= 2 => Stone::White,
            None => Stone::Black,
        }
    }

    pub fn is_valid_pos(&self, point: Point) -> bool {
        self.board.is_valid_pos(point)
    }

    // -- Setup --

    /// Place setup stones. They resolve captures like ordinary stones but
    /// take no turn, and must all be placed before the first move.
    pub fn place(&mut self, color: Stone, points: &[Point]) -> Result<(), GoError> {
        if points.is_empty() {
            return Err(GoError::Inconsistent("setup without a position".to_string()));
        }
        if !self.moves.is_empty() {
            return Err(GoError::Inconsistent(
                "setup stones must precede the first move".to_string(),
            ));
        }

        let mut board = self.board.clone();
        let stones: Vec<Move> = points.iter().map(|&p| Move::setup(color, p)).collect();
        for m in &stones {
            board.add_move(m)?;
            trace!("setup {color} at {:?}", m.vertex);
        }
        self.board = board;
        self.setup.extend(stones);
        Ok(())
    }

    // -- Play --

    /// Play a GTP move such as `"b D4"` or `"w pass"`.
    pub fn play(&mut self, gtp: &str) -> Result<&Move, GoError> {
        let m = Move::from_gtp(self, gtp)?;
        self.play_move(m)
    }

    /// Register a move as the next ply. Its `turn` is assigned here.
    pub fn play_move(&mut self, mut m: Move) -> Result<&Move, GoError> {
        let turn = self.moves.len();
        m.turn = Some(turn);
        if !m.is_pass() {
            self.board.add_move(&m)?;
        }
        trace!("turn {turn}: {} {:?}", m.color, m.vertex);
        self.moves.push(m);
        Ok(&self.moves[turn])
    }

    /// Take back the last ply. The board is rebuilt so captured stones
    /// come back.
    pub fn undo(&mut self) -> Result<Option<Move>, GoError> {
        let Some(m) = self.moves.pop() else {
            return Ok(None);
        };
        self.board = self.replay()?;
        Ok(Some(m))
    }

    fn replay(&self) -> Result<Board, GoError> {
        let mut board = Board::with_dimensions(self.cols, self.rows);
        for m in self.setup.iter().chain(&self.moves) {
            if !m.is_pass() {
                board.add_move(m)?;
            }
        }
        Ok(board)
    }

    // -- Export --

    /// GTP strings of every ply, e.g. `["b D4", "w pass"]`.
    pub fn gtp_moves(&self) -> Result<Vec<String>, GoError> {
        self.moves.iter().map(|m| m.to_gtp(self.rows)).collect()
    }

    /// `(color, vertex)` pairs where the vertex is `"pass"` or a GTP point.
    pub fn move_pairs(&self) -> Result<Vec<(Stone, String)>, GoError> {
        self.moves
            .iter()
            .map(|m| {
                let vertex = match m.vertex {
                    Vertex::Point(p) => coords::coord_to_gtp(p, self.rows)?,
                    Vertex::Pass => PASS.to_string(),
                };
                Ok((m.color, vertex))
            })
            .collect()
    }

    /// The game as a tree: a root with the game properties, then one
    /// single-child node per move.
    pub fn to_sgftree(&self) -> Result<SgfTree, GoError> {
        let mut root = SgfTree::new();
        for (ident, value) in IDENTIFICATION {
            root.set_property(ident, [value]);
        }
        if !self.ruleset.is_empty() {
            root.set_property("RU", [self.ruleset.as_str()]);
        }
        root.set_property("SZ", [format_size(self.cols, self.rows)]);
        root.set_property("KM", [format_real(self.komi)]);
        if self.handicap > 0 {
            root.set_property("HA", [self.handicap.to_string()]);
        }
        for (color, ident) in [(Stone::Black, "AB"), (Stone::White, "AW")] {
            let values = self
                .setup_stones(color)
                .into_iter()
                .map(coords::coord_to_sgf)
                .collect::<Result<Vec<_>, _>>()?;
            if !values.is_empty() {
                root.set_property(ident, values);
            }
        }

        let mut line: Option<SgfTree> = None;
        for m in self.moves.iter().rev() {
            let (ident, values) = m.to_sgf()?;
            let mut node = SgfTree::new().with_property(ident, values);
            if let Some(next) = line.take() {
                node.add_child(next);
            }
            line = Some(node);
        }
        if let Some(first) = line {
            root.add_child(first);
        }
        Ok(root)
    }

    pub fn to_sgf(&self) -> Result<String, GoError> {
        Ok(self.to_sgftree()?.to_sgf())
    }
}

// -- Root property values --

fn first_value(values: &[String]) -> &str {
    values.first().map_or("", |s| s.trim())
}

fn invalid(property: &str, value: &str, reason: &str) -> GoError {
    GoError::InvalidProperty {
        property: property.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// `SZ` is either `"N"` for a square board or `"W:H"`.
fn parse_size(values: &[String]) -> Result<(u8, u8), GoError> {
    let s = first_value(values);
    match s.split_once(':') {
        Some((c, r)) => {
            let cols = c
                .trim()
                .parse::<u8>()
                .map_err(|_| invalid("SZ", s, "invalid board width"))?;
            let rows = r
                .trim()
                .parse::<u8>()
                .map_err(|_| invalid("SZ", s, "invalid board height"))?;
            Ok((cols, rows))
        }
        None => {
            let size = s
                .parse::<u8>()
                .map_err(|_| invalid("SZ", s, "invalid board size"))?;
            Ok((size, size))
        }
    }
}

fn parse_f64(values: &[String], ident: &str) -> Result<f64, GoError> {
    let s = first_value(values);
    if s.is_empty() {
        return Ok(0.0);
    }
    s.parse::<f64>()
        .map_err(|_| invalid(ident, s, "expected number"))
}

fn parse_u8(values: &[String], ident: &str) -> Result<u8, GoError> {
    let s = first_value(values);
    if s.is_empty() {
        return Ok(0);
    }
    s.parse::<u8>()
        .map_err(|_| invalid(ident, s, "expected a small non-negative integer"))
}

/// Setup points, including compressed `"aa:cc"` rectangles. Empty values are skipped.
fn parse_point_list(values: &[String]) -> Result<Vec<Point>, GoError> {
    let mut points = Vec::new();
    for value in values {
        let Some((from, to)) = value.split_once(':') else {
            if let Some(p) = coords::sgf_to_coord(value)? {
                points.push(p);
            }
            continue;
        };
        let corner = |s: &str| -> Result<Point, GoError> {
            coords::sgf_to_coord(s)?
                .ok_or_else(|| GoError::Sgf(sgf::SgfError::InvalidCoordinate(value.clone())))
        };
        let (c1, r1) = corner(from)?;
        let (c2, r2) = corner(to)?;
        for r in r1.min(r2)..=r1.max(r2) {
            for c in c1.min(c2)..=c1.max(c2) {
                points.push((c, r));
            }
        }
    }
    Ok(points)
}

fn format_size(cols: u8, rows: u8) -> String {
    if cols == rows {
        cols.to_string()
    } else {
        format!("{cols}:{rows}")
    }
}

// Integer form when possible (6.0 -> "6", 6.5 -> "6.5")
fn format_real(n: f64) -> String {
    if n.fract() == 0.0 {
        (n as i64).to_string()
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(cols: u8, rows: u8) -> Game {
        Game::new("Japanese", cols, rows, 6.5, 0).unwrap()
    }

    fn root(props: &[(&str, &str)]) -> SgfTree {
        props
            .iter()
            .fold(SgfTree::new(), |t, (k, v)| t.with_property(*k, [*v]))
    }

    #[test]
    fn board_size_limits() {
        assert!(Game::new("", 4, 4, 0.0, 0).is_ok());
        assert!(Game::new("", 19, 19, 0.0, 0).is_ok());
        for (c, r) in [(3, 9), (9, 3), (20, 19), (19, 25)] {
            assert!(
                matches!(
                    Game::new("", c, r, 0.0, 0),
                    Err(GoError::InvalidProperty { ref property, .. }) if property == "SZ"
                ),
                "{c}x{r}"
            );
        }
    }

    #[test]
    fn handicap_two_lets_white_start() {
        let g = Game::from_properties(&root(&[
            ("RU", "Japanese"),
            ("SZ", "19"),
            ("KM", "6.5"),
            ("HA", "2"),
        ]))
        .unwrap();
        assert_eq!(g.next_color(), Stone::White);
        assert_eq!(g.ruleset(), "Japanese");
        assert_eq!(g.komi(), 6.5);
        assert_eq!(g.handicap(), 2);
    }

    #[test]
    fn single_handicap_keeps_black_first() {
        let g = Game::from_properties(&root(&[("HA", "1")])).unwrap();
        assert_eq!(g.next_color(), Stone::Black);
    }

    #[test]
    fn rectangular_board() {
        let mut g = Game::from_properties(&root(&[("SZ", "9:13")])).unwrap();
        assert_eq!(g.size(), (9, 13));
        let m = g.play("b A1").unwrap();
        assert_eq!(m.point(), Some((0, 12)));
        assert_eq!(m.turn, Some(0));
    }

    #[test]
    fn property_defaults() {
        let g = Game::from_properties(&SgfTree::new()).unwrap();
        assert_eq!(g.size(), (DEFAULT_BOARD_SIZE, DEFAULT_BOARD_SIZE));
        assert_eq!(g.komi(), 0.0);
        assert_eq!(g.handicap(), 0);
        assert_eq!(g.ruleset(), "");
        assert!(g.board().is_empty());
    }

    #[test]
    fn rejects_bad_property_values() {
        for (k, v) in [("SZ", "abc"), ("SZ", "9:x"), ("SZ", "25"), ("KM", "six"), ("HA", "-1")] {
            assert!(
                matches!(
                    Game::from_properties(&root(&[(k, v)])),
                    Err(GoError::InvalidProperty { ref property, .. }) if property == k
                ),
                "{k}[{v}]"
            );
        }
        assert!(matches!(
            Game::from_properties(&root(&[("AB", "a1")])),
            Err(GoError::Sgf(sgf::SgfError::InvalidCoordinate(_)))
        ));
    }

    #[test]
    fn turns_alternate_including_passes() {
        let mut g = game(9, 9);
        let plays = ["b E5", "w pass", "b pass", "w C3", "b D4"];
        for (i, gtp) in plays.iter().enumerate() {
            let expected = if i % 2 == 0 { Stone::Black } else { Stone::White };
            assert_eq!(g.next_color(), expected);
            let m = g.play(gtp).unwrap();
            assert_eq!(m.turn, Some(i));
        }
        assert_eq!(g.next_color(), Stone::White);
        assert_eq!(g.moves().len(), 5);
    }

    #[test]
    fn pass_does_not_touch_board() {
        let mut g = game(9, 9);
        g.play("b pass").unwrap();
        assert!(g.board().is_empty());
        assert!(g.moves()[0].is_pass());
    }

    #[test]
    fn failed_play_leaves_game_unchanged() {
        let mut g = game(9, 9);
        g.play("b E5").unwrap();
        let err = g.play("w E5").unwrap_err();
        assert!(err.is_illegal_move());
        assert!(matches!(g.play("w I5"), Err(GoError::InvalidGtp(_))));
        assert_eq!(g.moves().len(), 1);
        assert_eq!(g.next_color(), Stone::White);
    }

    #[test]
    fn setup_stones_take_no_turn() {
        let g = Game::from_properties(&root(&[("SZ", "9"), ("AB", "cc"), ("AW", "dd")])).unwrap();
        assert_eq!(g.board().stone_at((2, 2)), Some(Stone::Black));
        assert_eq!(g.board().stone_at((3, 3)), Some(Stone::White));
        assert_eq!(g.board().cell((2, 2)).map(|p| p.turn), Some(None));
        assert!(g.moves().is_empty());
        assert_eq!(g.next_color(), Stone::Black);
        assert_eq!(g.setup_stones(Stone::Black), vec![(2, 2)]);
    }

    #[test]
    fn compressed_setup_rectangle() {
        let g = Game::from_properties(&root(&[("SZ", "9"), ("AB", "aa:bc")])).unwrap();
        assert_eq!(g.setup_stones(Stone::Black).len(), 6);
        assert_eq!(g.board().stone_at((1, 2)), Some(Stone::Black));
    }

    #[test]
    fn setup_rules() {
        let mut g = game(9, 9);
        assert!(matches!(g.place(Stone::Black, &[]), Err(GoError::Inconsistent(_))));

        g.place(Stone::Black, &[(0, 0), (1, 1)]).unwrap();
        // all or nothing
        assert_eq!(
            g.place(Stone::White, &[(2, 2), (1, 1)]),
            Err(GoError::Overwrite((1, 1)))
        );
        assert_eq!(g.board().stone_at((2, 2)), None);

        g.play("w E5").unwrap();
        assert!(matches!(
            g.place(Stone::Black, &[(8, 8)]),
            Err(GoError::Inconsistent(_))
        ));
    }

    #[test]
    fn replays_tree_with_capture() {
        let tree = sgf::parse("(;SZ[9];B[ab];W[aa];B[ba])").unwrap();
        let g = Game::from_sgftree(&tree).unwrap();
        assert_eq!(g.moves().len(), 3);
        assert_eq!(g.board().stone_at((0, 0)), None);
        assert_eq!(g.board().captures().get(Stone::Black), 1);
    }

    #[test]
    fn tree_passes() {
        let g = Game::from_sgf("(;SZ[19];B[dd];W[tt];B[];W[pp])").unwrap();
        let passes: Vec<bool> = g.moves().iter().map(Move::is_pass).collect();
        assert_eq!(passes, [false, true, true, false]);
        assert_eq!(g.next_color(), Stone::Black);
    }

    #[test]
    fn black_wins_when_node_has_both_colors() {
        let g = Game::from_sgf("(;SZ[9];W[cc]B[dd])").unwrap();
        assert_eq!(g.moves().len(), 1);
        assert_eq!(g.moves()[0].color, Stone::Black);
        assert_eq!(g.moves()[0].point(), Some((3, 3)));
    }

    #[test]
    fn only_main_line_is_replayed() {
        let g = Game::from_sgf("(;SZ[9];B[ee](;W[cc];B[gg])(;W[gc]))").unwrap();
        assert_eq!(g.gtp_moves().unwrap(), ["b E5", "w C7", "b G3"]);
    }

    #[test]
    fn illegal_move_in_tree_fails() {
        assert_eq!(
            Game::from_sgf("(;SZ[9];B[ee];W[ee])").unwrap_err(),
            GoError::Overwrite((4, 4))
        );
        assert!(matches!(
            Game::from_sgf("(;SZ[9];B[E5])"),
            Err(GoError::Sgf(sgf::SgfError::InvalidCoordinate(_)))
        ));
    }

    #[test]
    fn exports_root_and_linear_chain() {
        let mut g = game(9, 9);
        g.play("b E5").unwrap();
        g.play("w pass").unwrap();
        assert_eq!(
            g.to_sgf().unwrap(),
            "(;GM[1]FF[4]CA[UTF-8]RU[Japanese]SZ[9]KM[6.5];B[ee];W[])"
        );
    }

    #[test]
    fn exports_setup_and_handicap() {
        let mut g = Game::new("", 9, 13, 0.0, 2).unwrap();
        g.place(Stone::Black, &[(2, 2), (6, 10)]).unwrap();
        let tree = g.to_sgftree().unwrap();
        assert_eq!(tree.first("SZ"), Some("9:13"));
        assert_eq!(tree.first("KM"), Some("0"));
        assert_eq!(tree.first("HA"), Some("2"));
        assert_eq!(tree.get("RU"), None);
        assert_eq!(tree.get("AB").map(<[String]>::len), Some(2));
        assert_eq!(tree.get("AW"), None);
        assert!(tree.children().is_empty());
    }

    #[test]
    fn tree_round_trip() {
        let mut g = Game::new("Chinese", 9, 9, 7.5, 0).unwrap();
        g.place(Stone::White, &[(4, 4)]).unwrap();
        for gtp in ["b A9", "w B9", "b A8", "w pass", "b C3"] {
            g.play(gtp).unwrap();
        }
        let restored = Game::from_sgftree(&g.to_sgftree().unwrap()).unwrap();
        assert_eq!(restored.moves(), g.moves());
        assert_eq!(restored.board(), g.board());
        assert_eq!(restored.setup_stones(Stone::White), vec![(4, 4)]);
        assert_eq!(restored.komi(), 7.5);
        assert_eq!(restored.ruleset(), "Chinese");
    }

    #[test]
    fn undo_restores_captured_stones() {
        let mut g = Game::from_sgf("(;SZ[9];B[ab];W[aa];B[ba])").unwrap();
        let last = g.undo().unwrap().unwrap();
        assert_eq!(last.point(), Some((1, 0)));
        assert_eq!(g.board().stone_at((0, 0)), Some(Stone::White));
        assert_eq!(g.board().stone_at((1, 0)), None);
        assert_eq!(g.board().captures().get(Stone::Black), 0);
        assert_eq!(g.next_color(), Stone::Black);

        g.undo().unwrap();
        g.undo().unwrap();
        assert_eq!(g.undo().unwrap(), None);
        assert!(g.board().is_empty());
    }

    #[test]
    fn undo_keeps_setup() {
        let mut g = game(9, 9);
        g.place(Stone::Black, &[(0, 0)]).unwrap();
        g.play("w E5").unwrap();
        g.undo().unwrap();
        assert_eq!(g.board().stone_at((0, 0)), Some(Stone::Black));
        assert_eq!(g.board().stone_at((4, 4)), None);
    }

    #[test]
    fn analysis_pairs() {
        let mut g = game(19, 19);
        g.play("b Q16").unwrap();
        g.play("w pass").unwrap();
        assert_eq!(
            g.move_pairs().unwrap(),
            vec![(Stone::Black, "Q16".to_string()), (Stone::White, "pass".to_string())]
        );
        assert_eq!(g.gtp_moves().unwrap(), ["b Q16", "w pass"]);
    }

    #[test]
    fn valid_positions_follow_board() {
        let mut g = game(9, 9);
        assert!(g.is_valid_pos((8, 8)));
        assert!(!g.is_valid_pos((9, 0)));
        g.play("b J1").unwrap();
        assert!(!g.is_valid_pos((8, 8)));
    }
}
