//! Where schema text comes from

use crate::{Result, XsdError};
use std::io::ErrorKind;
use std::path::PathBuf;

/// Supplies the XSD text of a filter's configuration schema.
pub trait SchemaSource {
    /// XSD text for `component` (a filter name such as `add-header`) as
    /// shipped with gateway release `version`.
    fn fetch_schema(&self, version: &str, component: &str) -> Result<String>;
}

/// Schemas laid out on disk as `<root>/<version>/<component>.xsd`.
#[derive(Debug, Clone)]
pub struct DirectorySchemaSource {
    root: PathBuf,
}

impl DirectorySchemaSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn schema_path(&self, version: &str, component: &str) -> PathBuf {
        self.root.join(version).join(format!("{}.xsd", component))
    }
}

impl SchemaSource for DirectorySchemaSource {
    fn fetch_schema(&self, version: &str, component: &str) -> Result<String> {
        let path = self.schema_path(version, component);
        tracing::debug!(path = %path.display(), "reading schema");
        std::fs::read_to_string(&path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => XsdError::SchemaNotFound {
                version: version.to_string(),
                component: component.to_string(),
            },
            _ => XsdError::Io(err),
        })
    }
}
