use super::error::SgfError;
use super::tree::SgfTree;

/// Parse SGF text into the root node of its first game tree.
pub fn parse(input: &str) -> Result<SgfTree, SgfError> {
    let mut p = Parser::new(input);
    p.skip_whitespace();
    if p.peek() != Some(b'(') {
        return Err(SgfError::TreeMissing);
    }
    p.game_tree()
}

/// Parse every top-level game tree of an SGF collection.
pub fn parse_collection(input: &str) -> Result<Vec<SgfTree>, SgfError> {
    let mut p = Parser::new(input);
    let mut trees = Vec::new();
    loop {
        p.skip_whitespace();
        if p.peek() == Some(b'(') {
            trees.push(p.game_tree()?);
        } else {
            break;
        }
    }
    if trees.is_empty() {
        return Err(SgfError::TreeMissing);
    }
    Ok(trees)
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Parser {
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.bytes.get(self.pos).copied()?;
        self.pos += 1;
        Some(b)
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn unexpected(&self, expected: &'static str) -> SgfError {
        match self.peek() {
            Some(b) => SgfError::UnexpectedChar {
                expected,
                found: b as char,
                pos: self.pos,
            },
            None => SgfError::UnexpectedEof,
        }
    }

    fn expect(&mut self, ch: u8, expected: &'static str) -> Result<(), SgfError> {
        self.skip_whitespace();
        if self.peek() == Some(ch) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    // GameTree = '(' Node+ GameTree* ')'
    //
    // The node sequence becomes a chain of single children; the nested
    // game trees become the children of its last node.
    fn game_tree(&mut self) -> Result<SgfTree, SgfError> {
        let open = self.pos;
        self.expect(b'(', "'('")?;

        self.skip_whitespace();
        match self.peek() {
            Some(b';') => {}
            Some(b'(' | b')') => return Err(SgfError::EmptyTree { pos: open }),
            _ => return Err(self.unexpected("';'")),
        }

        let mut nodes = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some(b';') {
                nodes.push(self.node()?);
            } else {
                break;
            }
        }

        let mut variations = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some(b'(') {
                variations.push(self.game_tree()?);
            } else {
                break;
            }
        }
        self.expect(b')', "')'")?;

        let mut tail = nodes.pop().ok_or(SgfError::EmptyTree { pos: open })?;
        tail.set_children(variations);
        while let Some(mut node) = nodes.pop() {
            node.set_children(vec![tail]);
            tail = node;
        }
        Ok(tail)
    }

    // Node = ';' Property*
    fn node(&mut self) -> Result<SgfTree, SgfError> {
        self.expect(b';', "';'")?;
        let mut node = SgfTree::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b) if b.is_ascii_uppercase() => {
                    let (ident, values) = self.property()?;
                    node.set_property(ident, values);
                }
                Some(b) if b.is_ascii_lowercase() => {
                    return Err(SgfError::LowercaseProperty { pos: self.pos });
                }
                Some(b'(' | b')' | b';') | None => break,
                Some(_) => return Err(self.unexpected("property")),
            }
        }
        Ok(node)
    }

    // Property = UcLetter+ ('[' Value ']')+
    //
    // Whitespace outside values is insignificant, including inside the key.
    fn property(&mut self) -> Result<(String, Vec<String>), SgfError> {
        let mut ident = String::new();
        loop {
            match self.peek() {
                Some(b) if b.is_ascii_uppercase() => {
                    ident.push(b as char);
                    self.pos += 1;
                }
                Some(b) if b.is_ascii_whitespace() => self.pos += 1,
                Some(b) if b.is_ascii_lowercase() => {
                    return Err(SgfError::LowercaseProperty { pos: self.pos });
                }
                _ => break,
            }
        }

        if self.peek() != Some(b'[') {
            return Err(SgfError::MissingDelimiter {
                property: ident,
                pos: self.pos,
            });
        }

        let mut values = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some(b'[') {
                values.push(self.prop_value()?);
            } else {
                break;
            }
        }
        Ok((ident, values))
    }

    fn prop_value(&mut self) -> Result<String, SgfError> {
        self.expect(b'[', "'['")?;
        let mut value = Vec::new();
        loop {
            match self.advance() {
                None => return Err(SgfError::UnexpectedEof),
                Some(b'\\') => match self.advance() {
                    None => return Err(SgfError::UnexpectedEof),
                    // Soft line break: the escaped newline is removed entirely.
                    Some(b'\n') => {
                        if self.peek() == Some(b'\r') {
                            self.pos += 1;
                        }
                    }
                    Some(b'\r') => {
                        if self.peek() == Some(b'\n') {
                            self.pos += 1;
                        }
                    }
                    Some(b'\t') => value.push(b' '),
                    Some(b) => value.push(b),
                },
                Some(b'\t') => value.push(b' '),
                Some(b']') => break,
                Some(b) => value.push(b),
            }
        }
        // Only ASCII bytes were dropped or replaced, so the value stays valid UTF-8.
        Ok(String::from_utf8_lossy(&value).into_owned())
    }
}
