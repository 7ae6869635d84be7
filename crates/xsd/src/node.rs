//! Owned, read-only XSD node tree
//!
//! The compiler works on `SchemaNode`s rather than on a borrowed DOM so that a
//! compiled document can outlive the text it was read from. Namespace prefixes
//! are kept on the side; every comparison the walker makes uses the local name.

use crate::{Result, XsdError};
use roxmltree::{Document, Node, ParsingOptions};
use std::fmt;

/// Classification of a schema node by its local tag name.
///
/// Derived once per visit instead of re-splitting `xs:foo` strings at every
/// dispatch site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    All,
    Sequence,
    Choice,
    Attribute,
    ComplexType,
    SimpleType,
    SimpleContent,
    ComplexContent,
    Restriction,
    Extension,
    List,
    Annotation,
    Documentation,
    Enumeration,
    Assert,
    Text,
    Other(String),
}

impl NodeKind {
    pub fn from_local_name(name: &str) -> Self {
        match name {
            TEXT_NODE_NAME => NodeKind::Text,
            "element" => NodeKind::Element,
            "all" => NodeKind::All,
            "sequence" => NodeKind::Sequence,
            "choice" => NodeKind::Choice,
            "attribute" => NodeKind::Attribute,
            "complexType" => NodeKind::ComplexType,
            "simpleType" => NodeKind::SimpleType,
            "simpleContent" => NodeKind::SimpleContent,
            "complexContent" => NodeKind::ComplexContent,
            "restriction" => NodeKind::Restriction,
            "extension" => NodeKind::Extension,
            "list" => NodeKind::List,
            "annotation" => NodeKind::Annotation,
            "documentation" => NodeKind::Documentation,
            "enumeration" => NodeKind::Enumeration,
            "assert" => NodeKind::Assert,
            other => NodeKind::Other(other.to_string()),
        }
    }
}

/// Tag name given to character-data nodes, as in the DOM.
pub const TEXT_NODE_NAME: &str = "#text";

/// A single node of a parsed schema document.
///
/// Character data is represented as `#text` children so that mixed content
/// (`<p>a <b>b</b> c</p>`) keeps its order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaNode {
    /// Local tag name, prefix stripped (`xs:element` -> `element`)
    pub name: String,
    /// Namespace prefix as written in the source, if any
    pub prefix: Option<String>,
    /// XML attributes in document order
    pub attributes: Vec<(String, String)>,
    /// Child nodes in document order
    pub children: Vec<SchemaNode>,
    /// Character data; only set on `#text` nodes
    pub text: Option<String>,
}

impl SchemaNode {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        match name.split_once(':') {
            Some((prefix, local)) => Self {
                name: local.to_string(),
                prefix: Some(prefix.to_string()),
                ..Default::default()
            },
            None => Self {
                name,
                ..Default::default()
            },
        }
    }

    /// Builder-style attribute setter, mostly for hand-built trees in tests.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: SchemaNode) -> Self {
        self.children.push(child);
        self
    }

    /// A `#text` node.
    pub fn text_node(text: impl Into<String>) -> Self {
        Self {
            name: TEXT_NODE_NAME.to_string(),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Appends a `#text` child.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(Self::text_node(text))
    }

    pub fn is_text(&self) -> bool {
        self.name == TEXT_NODE_NAME
    }

    /// Child nodes that are not character data.
    pub fn elements(&self) -> impl Iterator<Item = &SchemaNode> {
        self.children.iter().filter(|child| !child.is_text())
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::from_local_name(&self.name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Concatenated text of this node and all its descendants, in document order.
    ///
    /// Mirrors DOM `textContent`: no separators are inserted between the
    /// pieces.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }

    /// Pre-order walk over this node and every descendant.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Qualified tag name as it appeared in the source.
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for SchemaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.qualified_name())?;
        if let Some(name) = self.attr("name") {
            write!(f, " name=\"{}\"", name)?;
        }
        f.write_str(">")
    }
}

/// Iterator returned by [`SchemaNode::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a SchemaNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a SchemaNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// One parsed XSD file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDocument {
    root: SchemaNode,
}

impl SchemaDocument {
    /// Read XSD text into an owned node tree.
    pub fn parse(xsd: &str) -> Result<Self> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let document = Document::parse_with_options(xsd, options)?;
        let root = convert(document.root_element(), false);
        tracing::debug!(root = %root, "parsed schema document");
        Ok(Self { root })
    }

    /// Read an XSD file from disk.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&text)
    }

    /// Wrap a tree that was built by other means.
    pub fn from_root(root: SchemaNode) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    pub fn target_namespace(&self) -> Option<&str> {
        self.root.attr("targetNamespace")
    }

    /// The first top-level `element` declaration, i.e. the compile root.
    pub fn root_element(&self) -> Result<&SchemaNode> {
        if self.root.name != "schema" {
            return Err(XsdError::malformed(
                format!("/{}", self.root.name),
                "document root is not a schema",
            ));
        }
        self.root
            .children
            .iter()
            .find(|child| child.kind() == NodeKind::Element)
            .ok_or_else(|| XsdError::malformed("/schema", "schema has no top-level element"))
    }
}

/// `in_documentation` is set below an `xs:documentation`, where every text
/// node is kept, whitespace included, as DOM `textContent` would see it.
fn convert(node: Node<'_, '_>, in_documentation: bool) -> SchemaNode {
    let tag = node.tag_name();
    let prefix = tag
        .namespace()
        .and_then(|ns| node.lookup_prefix(ns))
        .filter(|prefix| !prefix.is_empty())
        .map(str::to_string);

    let attributes = node
        .attributes()
        .map(|attr| (attr.name().to_string(), attr.value().to_string()))
        .collect();

    let nested_in_documentation = in_documentation || tag.name() == "documentation";

    // indentation between schema declarations is dropped unless the node has real mixed content
    let keep_text = in_documentation
        || node
            .children()
            .any(|child| child.is_text() && child.text().is_some_and(|t| !t.trim().is_empty()));

    let children = node
        .children()
        .filter_map(|child| {
            if child.is_element() {
                Some(convert(child, nested_in_documentation))
            } else if keep_text && child.is_text() {
                child.text().map(SchemaNode::text_node)
            } else {
                None
            }
        })
        .collect();

    SchemaNode {
        name: tag.name().to_string(),
        prefix,
        attributes,
        children,
        text: None,
    }
}
