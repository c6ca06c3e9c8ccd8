//! YAML parsing front end built on tree-sitter.

use crate::document::Document;
use crate::Position;
use tree_sitter::{Node as TsNode, Parser, Tree};
use tree_sitter_yaml as ts_yaml;

/// YAML parser that produces lowered [`Document`] trees.
pub struct YamlParser {
    parser: Parser,
}

impl YamlParser {
    /// Create a new YAML parser.
    ///
    /// # Panics
    ///
    /// Panics if the compiled-in tree-sitter YAML grammar fails to load.
    /// This should never happen in practice since the grammar is statically
    /// linked at compile time.
    pub fn new() -> Self {
        let mut parser = Parser::new();
        let language = ts_yaml::language();
        parser
            .set_language(&language)
            .expect("failed to load tree-sitter YAML grammar");

        Self { parser }
    }

    /// Parse source text into a document tree.
    ///
    /// Malformed YAML is a [`ParseError`] carrying the position of the
    /// first syntax error; it never crashes the process.
    pub fn load(&mut self, source: &str) -> Result<Document, ParseError> {
        let tree = self.parse(source)?;
        let root = tree.root_node();

        if root.has_error() {
            let position = first_error(root)
                .map(|node| {
                    let point = node.start_position();
                    Position {
                        line: point.row + 1,
                        column: point.column + 1,
                    }
                })
                .unwrap_or(Position { line: 1, column: 1 });

            return Err(ParseError {
                line: position.line,
                column: position.column,
                message: "invalid YAML syntax".to_string(),
            });
        }

        Ok(Document::from_tree(&tree, source))
    }

    fn parse(&mut self, source: &str) -> Result<Tree, ParseError> {
        self.parser.parse(source, None).ok_or(ParseError {
            line: 1,
            column: 1,
            message: "YAML parser produced no tree".to_string(),
        })
    }
}

impl Default for YamlParser {
    fn default() -> Self {
        Self::new()
    }
}

fn first_error(node: TsNode) -> Option<TsNode> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    for i in 0..node.child_count() {
        if let Some(found) = node.child(i).and_then(first_error) {
            return Some(found);
        }
    }
    None
}

/// Parse failure with the position of the first syntax error.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_yaml_loads() {
        let mut parser = YamlParser::new();
        assert!(parser.load("on: push\n").is_ok());
    }

    #[test]
    fn malformed_yaml_reports_position() {
        let mut parser = YamlParser::new();
        let err = parser
            .load("on: push\njobs:\n  build: [unclosed\n")
            .expect_err("expected a parse error");

        assert!(err.line >= 1);
        assert!(err.column >= 1);
    }

    #[test]
    fn parser_is_reusable() {
        let mut parser = YamlParser::new();
        assert!(parser.load("a: 1\n").is_ok());
        assert!(parser.load("b: 2\n").is_ok());
    }
}
