//! Workflow document tree.
//!
//! The tree-sitter CST is lowered into an owned tree of mappings,
//! sequences, and scalars. Every node keeps its 1-based line/column and
//! its byte span in the raw source, so rules can report positions inside
//! multi-line scalars without touching tree-sitter again.

use crate::{Position, Span};
use tree_sitter::{Node as TsNode, Tree};

/// A parsed workflow document. Owns the whole node tree top-down;
/// navigation is by recursion, there are no parent pointers.
#[derive(Debug, Clone)]
pub struct Document {
    pub root: Node,
    line_starts: Vec<usize>,
}

impl Document {
    /// Lower a tree-sitter parse tree into a document.
    pub fn from_tree(tree: &Tree, source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }

        Self {
            root: lower(tree.root_node(), source),
            line_starts,
        }
    }

    /// Map a byte offset in the raw source to a 1-based position.
    pub fn position_of(&self, byte: usize) -> Position {
        let line = match self.line_starts.binary_search(&byte) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        Position {
            line: line + 1,
            column: byte - self.line_starts[line] + 1,
        }
    }
}

/// A single node in the document tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub position: Position,
    pub span: Span,
}

/// Shape of a document node.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Ordered key/value entries. Duplicate keys are preserved as parsed.
    Mapping(Vec<(Scalar, Node)>),
    Sequence(Vec<Node>),
    Scalar(String),
    Null,
}

/// A scalar key with its own position, independent of its value.
#[derive(Debug, Clone)]
pub struct Scalar {
    pub value: String,
    pub position: Position,
    pub span: Span,
}

impl Node {
    pub fn as_mapping(&self) -> Option<&[(Scalar, Node)]> {
        match &self.kind {
            NodeKind::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match &self.kind {
            NodeKind::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, NodeKind::Null)
    }

    /// True for null nodes, empty collections, and empty scalars.
    pub fn is_empty(&self) -> bool {
        match &self.kind {
            NodeKind::Null => true,
            NodeKind::Mapping(entries) => entries.is_empty(),
            NodeKind::Sequence(items) => items.is_empty(),
            NodeKind::Scalar(value) => value.trim().is_empty(),
        }
    }

    /// Look up a value by key in a mapping node.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entry(key).map(|(_, value)| value)
    }

    /// Look up a key/value entry by key in a mapping node.
    pub fn entry(&self, key: &str) -> Option<(&Scalar, &Node)> {
        self.as_mapping()?
            .iter()
            .find(|(k, _)| k.value == key)
            .map(|(k, v)| (k, v))
    }

    pub fn has(&self, key: &str) -> bool {
        self.entry(key).is_some()
    }
}

fn position(ts: TsNode) -> Position {
    let point = ts.start_position();
    Position {
        line: point.row + 1,
        column: point.column + 1,
    }
}

fn span(ts: TsNode) -> Span {
    Span {
        start: ts.start_byte(),
        end: ts.end_byte(),
    }
}

fn null_at(ts: TsNode) -> Node {
    Node {
        kind: NodeKind::Null,
        position: position(ts),
        span: span(ts),
    }
}

/// Node kinds in the tree-sitter-yaml grammar that carry content, as
/// opposed to punctuation, anchors, tags, and comments.
fn is_content(kind: &str) -> bool {
    matches!(
        kind,
        "document"
            | "block_node"
            | "flow_node"
            | "block_mapping"
            | "block_sequence"
            | "block_scalar"
            | "flow_mapping"
            | "flow_sequence"
            | "plain_scalar"
            | "single_quote_scalar"
            | "double_quote_scalar"
            | "alias"
    )
}

fn content_child(ts: TsNode) -> Option<TsNode> {
    let mut cursor = ts.walk();
    let found = ts.children(&mut cursor).find(|c| is_content(c.kind()));
    found
}

fn lower(ts: TsNode, source: &str) -> Node {
    match ts.kind() {
        // A stream may hold several documents; workflows only ever use
        // the first one.
        "stream" | "document" | "block_node" | "flow_node" => match content_child(ts) {
            Some(inner) => lower(inner, source),
            None => null_at(ts),
        },
        "block_mapping" | "flow_mapping" => {
            let mut entries = Vec::new();
            let mut cursor = ts.walk();
            for child in ts.children(&mut cursor) {
                if !matches!(child.kind(), "block_mapping_pair" | "flow_pair") {
                    continue;
                }
                let key = match child.child_by_field_name("key") {
                    Some(k) => k,
                    None => continue,
                };
                let key = match lower(key, source).kind {
                    NodeKind::Scalar(value) => Scalar {
                        value,
                        position: position(key),
                        span: span(key),
                    },
                    // Complex keys are legal YAML but meaningless in a
                    // workflow; drop the entry.
                    _ => continue,
                };
                let value = match child.child_by_field_name("value") {
                    Some(v) => lower(v, source),
                    None => null_at(child),
                };
                entries.push((key, value));
            }
            Node {
                kind: NodeKind::Mapping(entries),
                position: position(ts),
                span: span(ts),
            }
        }
        "block_sequence" => {
            let mut items = Vec::new();
            let mut cursor = ts.walk();
            for child in ts.children(&mut cursor) {
                if child.kind() != "block_sequence_item" {
                    continue;
                }
                items.push(match content_child(child) {
                    Some(inner) => lower(inner, source),
                    None => null_at(child),
                });
            }
            Node {
                kind: NodeKind::Sequence(items),
                position: position(ts),
                span: span(ts),
            }
        }
        "flow_sequence" => {
            let mut items = Vec::new();
            let mut cursor = ts.walk();
            for child in ts.children(&mut cursor) {
                if is_content(child.kind()) {
                    items.push(lower(child, source));
                }
            }
            Node {
                kind: NodeKind::Sequence(items),
                position: position(ts),
                span: span(ts),
            }
        }
        "plain_scalar" => Node {
            kind: NodeKind::Scalar(source[ts.byte_range()].trim().to_string()),
            position: position(ts),
            span: span(ts),
        },
        "single_quote_scalar" => Node {
            kind: NodeKind::Scalar(unquote_single(&source[ts.byte_range()])),
            position: position(ts),
            span: span(ts),
        },
        "double_quote_scalar" => Node {
            kind: NodeKind::Scalar(unquote_double(&source[ts.byte_range()])),
            position: position(ts),
            span: span(ts),
        },
        "block_scalar" => Node {
            kind: NodeKind::Scalar(block_scalar_text(&source[ts.byte_range()])),
            position: position(ts),
            span: span(ts),
        },
        // Aliases are not resolved; rules see them as null values.
        _ => null_at(ts),
    }
}

fn unquote_single(raw: &str) -> String {
    let inner = raw
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(raw);
    inner.replace("''", "'")
}

fn unquote_double(raw: &str) -> String {
    let inner = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(escaped) => out.push(escaped),
            None => out.push('\\'),
        }
    }
    out
}

/// Strip the `|`/`>` header line and common indentation from a block
/// scalar. Folding of `>` scalars is not performed; rules only scan the
/// text, they never re-emit it.
fn block_scalar_text(raw: &str) -> String {
    let mut lines = raw.lines();
    lines.next(); // indicator line: |, |-, >, >+ ...

    let body: Vec<&str> = lines.collect();
    let indent = body
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut out = String::new();
    for line in &body {
        if line.len() >= indent {
            out.push_str(&line[indent..]);
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use crate::YamlParser;

    fn load(source: &str) -> crate::Document {
        YamlParser::new().load(source).expect("parse failed")
    }

    #[test]
    fn lowers_nested_mappings() {
        let doc = load("on: push\njobs:\n  build:\n    runs-on: ubuntu-latest\n");

        let runs_on = doc
            .root
            .get("jobs")
            .and_then(|jobs| jobs.get("build"))
            .and_then(|job| job.get("runs-on"))
            .expect("runs-on not found");

        assert_eq!(runs_on.as_str(), Some("ubuntu-latest"));
        assert_eq!(runs_on.position.line, 4);
    }

    #[test]
    fn positions_are_one_based() {
        let doc = load("name: demo\n");
        let (key, value) = doc.root.entry("name").expect("name not found");

        assert_eq!(key.position.line, 1);
        assert_eq!(key.position.column, 1);
        assert_eq!(value.position.column, 7);
    }

    #[test]
    fn lowers_block_sequences() {
        let doc = load("steps:\n  - run: echo one\n  - run: echo two\n");
        let steps = doc
            .root
            .get("steps")
            .and_then(crate::Node::as_sequence)
            .expect("steps not a sequence");

        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].get("run").and_then(|n| n.as_str()), Some("echo two"));
    }

    #[test]
    fn lowers_flow_styles() {
        let doc = load("on: {push: null}\nlabels: [a, b, c]\n");

        assert!(doc.root.get("on").map(|on| on.has("push")).unwrap_or(false));
        let labels = doc
            .root
            .get("labels")
            .and_then(crate::Node::as_sequence)
            .expect("labels not a sequence");
        assert_eq!(labels.len(), 3);
        assert_eq!(labels[0].as_str(), Some("a"));
    }

    #[test]
    fn unquotes_scalars() {
        let doc = load("a: 'it''s'\nb: \"x\\ny\"\n");

        assert_eq!(doc.root.get("a").and_then(|n| n.as_str()), Some("it's"));
        assert_eq!(doc.root.get("b").and_then(|n| n.as_str()), Some("x\ny"));
    }

    #[test]
    fn block_scalar_strips_header_and_indent() {
        let doc = load("run: |\n  echo one\n  echo two\n");

        assert_eq!(
            doc.root.get("run").and_then(|n| n.as_str()),
            Some("echo one\necho two")
        );
    }

    #[test]
    fn empty_document_is_null() {
        let doc = load("");
        assert!(doc.root.is_null());
    }

    #[test]
    fn position_of_maps_offsets() {
        let doc = load("ab\ncd\n");

        assert_eq!(doc.position_of(0).line, 1);
        assert_eq!(doc.position_of(4).line, 2);
        assert_eq!(doc.position_of(4).column, 2);
    }
}
