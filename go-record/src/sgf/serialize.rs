use super::tree::SgfTree;

/// Serialize a tree to SGF without the outer parentheses.
///
/// A node with a single child continues inline; several children are each
/// written as a parenthesized variation.
pub fn serialize(tree: &SgfTree) -> String {
    let mut buf = String::new();
    write_node(tree, &mut buf);
    buf
}

/// Serialize a complete game tree, `(` and `)` included.
pub fn to_sgf(tree: &SgfTree) -> String {
    let mut buf = String::from("(");
    write_node(tree, &mut buf);
    buf.push(')');
    buf
}

fn write_node(mut node: &SgfTree, buf: &mut String) {
    loop {
        buf.push(';');
        for (ident, values) in node.properties() {
            write_property(ident, values, buf);
        }
        match node.children() {
            [] => return,
            [only] => node = only,
            variations => {
                for variation in variations {
                    buf.push('(');
                    write_node(variation, buf);
                    buf.push(')');
                }
                return;
            }
        }
    }
}

fn write_property(ident: &str, values: &[String], buf: &mut String) {
    buf.push_str(ident);
    for value in values {
        buf.push('[');
        push_escaped(buf, value);
        buf.push(']');
    }
}

fn push_escaped(buf: &mut String, s: &str) {
    for ch in s.chars() {
        match ch {
            ']' | '\\' => {
                buf.push('\\');
                buf.push(ch);
            }
            _ => buf.push(ch),
        }
    }
}
