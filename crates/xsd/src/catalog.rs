//! Named type index and type-reference resolution

use crate::node::{SchemaDocument, SchemaNode};
use std::collections::HashMap;
use std::fmt;

/// The primitive XSD types the form layer renders directly.
///
/// Anything else is looked up in the [`TypeCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeType {
    String,
    Double,
    Boolean,
    AnyUri,
}

impl NativeType {
    pub const ALL: [NativeType; 4] = [
        NativeType::String,
        NativeType::Double,
        NativeType::Boolean,
        NativeType::AnyUri,
    ];

    pub fn from_local_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(NativeType::String),
            "double" => Some(NativeType::Double),
            "boolean" => Some(NativeType::Boolean),
            "anyURI" => Some(NativeType::AnyUri),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NativeType::String => "string",
            NativeType::Double => "double",
            NativeType::Boolean => "boolean",
            NativeType::AnyUri => "anyURI",
        }
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `prefix:local` type name as written in a `type`, `base` or `itemType` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeReference<'a> {
    pub prefix: Option<&'a str>,
    pub local: &'a str,
}

impl<'a> TypeReference<'a> {
    pub fn parse(qualified: &'a str) -> Self {
        match qualified.split_once(':') {
            Some((prefix, local)) => Self {
                prefix: Some(prefix),
                local,
            },
            None => Self {
                prefix: None,
                local: qualified,
            },
        }
    }

    pub fn native(&self) -> Option<NativeType> {
        NativeType::from_local_name(self.local)
    }
}

/// Outcome of resolving a type reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedType<'a> {
    Native(NativeType),
    Defined(&'a SchemaNode),
    Undefined,
}

/// Index of every named, non-element declaration in one schema document.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog<'a> {
    definitions: HashMap<&'a str, &'a SchemaNode>,
}

impl<'a> TypeCatalog<'a> {
    /// Scan the document once, in document order.
    ///
    /// Element declarations are skipped since a filter schema carries a single
    /// global element. On duplicate names the first declaration wins.
    pub fn build(document: &'a SchemaDocument) -> Self {
        let mut definitions = HashMap::new();
        for node in document.root().descendants() {
            if node.name.contains("element") {
                continue;
            }
            if let Some(name) = node.attr("name") {
                definitions.entry(name).or_insert(node);
            }
        }
        tracing::debug!(count = definitions.len(), "built type catalog");
        Self { definitions }
    }

    pub fn get(&self, local_name: &str) -> Option<&'a SchemaNode> {
        self.definitions.get(local_name).copied()
    }

    /// Resolve a possibly prefixed type name. Native types win over catalog entries.
    pub fn resolve(&self, qualified: &str) -> ResolvedType<'a> {
        let reference = TypeReference::parse(qualified);
        if let Some(native) = reference.native() {
            return ResolvedType::Native(native);
        }
        match self.get(reference.local) {
            Some(node) => ResolvedType::Defined(node),
            None => ResolvedType::Undefined,
        }
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
