//! Entry point tying the catalog and the walker together

use crate::catalog::TypeCatalog;
use crate::descriptor::FieldDescriptor;
use crate::diagnostics::Diagnostic;
use crate::node::SchemaDocument;
use crate::walker::SchemaWalker;
use crate::Result;
use serde::Serialize;

/// Result of compiling one schema document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Compilation {
    /// Descriptor tree rooted at the schema's top-level element
    pub descriptor: FieldDescriptor,
    /// `targetNamespace` of the schema, needed to write the filter XML back
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_namespace: Option<String>,
    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
}

impl Compilation {
    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Compiles filter configuration schemas into form descriptors.
///
/// Stateless: each call builds its own [`TypeCatalog`], so one compiler can
/// be shared freely between threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormCompiler;

impl FormCompiler {
    pub fn new() -> Self {
        Self
    }

    pub fn compile(&self, document: &SchemaDocument) -> Result<Compilation> {
        let element = document.root_element()?;
        let catalog = TypeCatalog::build(document);

        let mut walker = SchemaWalker::new(catalog);
        let descriptor = walker.walk_root(document.root(), element)?;
        let diagnostics = walker.into_diagnostics();

        tracing::info!(
            element = descriptor.name.as_deref().unwrap_or_default(),
            diagnostics = diagnostics.len(),
            "compiled form descriptor"
        );

        Ok(Compilation {
            descriptor,
            target_namespace: document.target_namespace().map(str::to_string),
            diagnostics,
        })
    }

    /// Parse XSD text and compile it.
    pub fn compile_str(&self, xsd: &str) -> Result<Compilation> {
        let document = SchemaDocument::parse(xsd)?;
        self.compile(&document)
    }
}
