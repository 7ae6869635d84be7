//! # repose-xsd
//!
//! Compiles a Repose filter's XSD into a generic form-descriptor tree.
//!
//! Every Repose filter ships an XML Schema describing its configuration file.
//! This crate reads that schema and produces a nested [`FieldDescriptor`]
//! tree (serialisable as JSON) from which a UI can render an edit form for
//! the filter's configuration.
//!
//! ## Architecture
//!
//! 1. **Read XSD** - [`SchemaDocument`] holds an owned node tree read with `roxmltree`
//! 2. **Index types** - [`TypeCatalog`] maps named type definitions by local name
//! 3. **Walk** - [`SchemaWalker`] folds the root element into descriptors
//! 4. **Compile** - [`FormCompiler`] ties it together and returns a [`Compilation`]
//!
//! ## Usage
//!
//! ```no_run
//! use repose_xsd::{FormCompiler, SchemaDocument};
//!
//! let document = SchemaDocument::from_file("add-header.xsd")?;
//! let compilation = FormCompiler::new().compile(&document)?;
//!
//! println!("{}", serde_json::to_string_pretty(&compilation.descriptor)?);
//! # Ok::<(), repose_xsd::XsdError>(())
//! ```

pub mod catalog;
pub mod compiler;
pub mod descriptor;
pub mod diagnostics;
pub mod node;
pub mod source;
pub mod walker;

use thiserror::Error;

pub use catalog::{NativeType, ResolvedType, TypeCatalog, TypeReference};
pub use compiler::{Compilation, FormCompiler};
pub use descriptor::{Assertion, FieldDescriptor, Requiredness, TypeTag};
pub use diagnostics::{Diagnostic, DiagnosticKind, NodePath};
pub use node::{NodeKind, SchemaDocument, SchemaNode};
pub use source::{DirectorySchemaSource, SchemaSource};
pub use walker::SchemaWalker;

#[derive(Debug, Error)]
pub enum XsdError {
    /// A structurally required attribute is missing; fatal for the compile.
    #[error("malformed schema at {path}: {message}")]
    MalformedSchema { path: String, message: String },

    #[error("XML parsing error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no schema for filter '{component}' in version {version}")]
    SchemaNotFound { version: String, component: String },
}

impl XsdError {
    pub fn malformed(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedSchema {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, XsdError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_message_carries_path() {
        let err = XsdError::malformed("/schema/element", "element has no name");
        assert_eq!(
            err.to_string(),
            "malformed schema at /schema/element: element has no name"
        );
    }
}
