//! Recoverable compile anomalies and node paths

use crate::node::SchemaNode;
use std::fmt;

/// Location of a node inside the schema, e.g.
/// `/schema/element[@name='add-header']/complexType[@name='AddHeaderType']`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePath {
    segments: Vec<String>,
}

impl NodePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: &SchemaNode) {
        let segment = match node.attr("name") {
            Some(name) => format!("{}[@name='{}']", node.name, name),
            None => node.name.clone(),
        };
        self.segments.push(segment);
    }

    pub fn pop(&mut self) {
        self.segments.pop();
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Type reference that is neither native nor declared in the document
    UndefinedType(String),
    /// Child tag the enclosing rule does not expand
    UnexpectedChild(String),
    /// Non-element member of an `all`/`sequence`/`choice` group
    NonElementInGroup(String),
    /// Complex-type body entry with no rule
    UnhandledComplexChild(String),
    /// Optional attribute the rule needed to do its job
    MissingAttribute(&'static str),
    /// Named type already being expanded further up the path
    RecursiveType(String),
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::UndefinedType(name) => write!(f, "type '{}' is not defined", name),
            DiagnosticKind::UnexpectedChild(tag) => write!(f, "unexpected child <{}>", tag),
            DiagnosticKind::NonElementInGroup(tag) => {
                write!(f, "group member <{}> is not an element", tag)
            }
            DiagnosticKind::UnhandledComplexChild(tag) => {
                write!(f, "complex type child <{}> is not handled", tag)
            }
            DiagnosticKind::MissingAttribute(attr) => write!(f, "missing attribute '{}'", attr),
            DiagnosticKind::RecursiveType(name) => {
                write!(f, "type '{}' refers back to itself; not expanded again", name)
            }
        }
    }
}

/// A recoverable anomaly encountered while compiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub path: String,
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_rendering() {
        let mut path = NodePath::root();
        assert_eq!(path.to_string(), "/");

        path.push(&SchemaNode::new("xs:schema"));
        path.push(&SchemaNode::new("xs:element").with_attr("name", "add-header"));
        path.push(&SchemaNode::new("xs:sequence"));
        assert_eq!(
            path.to_string(),
            "/schema/element[@name='add-header']/sequence"
        );

        path.pop();
        assert_eq!(path.depth(), 2);
    }

    #[test]
    fn test_diagnostic_display() {
        let diagnostic = Diagnostic {
            path: "/schema/element[@name='x']".to_string(),
            kind: DiagnosticKind::UndefinedType("tns:Missing".to_string()),
        };
        assert_eq!(
            diagnostic.to_string(),
            "/schema/element[@name='x']: type 'tns:Missing' is not defined"
        );
    }
}
