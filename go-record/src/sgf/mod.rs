mod error;
mod parser;
mod serialize;
mod tree;

pub use error::SgfError;
pub use parser::{parse, parse_collection};
pub use serialize::{serialize, to_sgf};
pub use tree::{MainLine, SgfTree};
