//! Form descriptor tree produced by the compiler

use crate::catalog::NativeType;
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use std::fmt;

/// Pass-through key marking how a descriptor maps back to XML.
pub const XSD_TYPE_KEY: &str = "xsd-type";

/// Name of the synthetic child carrying an element's text value.
pub const VALUE_FIELD_NAME: &str = "value";

/// What kind of input a descriptor renders as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeTag {
    Native(NativeType),
    /// Restriction base outside the native set (e.g. `int`), kept verbatim
    Base(String),
    Select,
    MultiSelect,
    Radio,
    List,
}

impl TypeTag {
    /// Restriction base name, prefix already stripped.
    pub fn from_base(local: &str) -> Self {
        match NativeType::from_local_name(local) {
            Some(native) => TypeTag::Native(native),
            None => TypeTag::Base(local.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TypeTag::Native(native) => native.as_str(),
            TypeTag::Base(base) => base,
            TypeTag::Select => "select",
            TypeTag::MultiSelect => "multi-select",
            TypeTag::Radio => "radio",
            TypeTag::List => "list",
        }
    }

    /// Kinds assigned by an enclosing group rather than by the member's own type.
    pub fn is_group_kind(&self) -> bool {
        matches!(self, TypeTag::List | TypeTag::Radio)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TypeTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requiredness {
    Required,
    Optional,
    /// Verbatim `use` attribute of an attribute declaration
    Use(String),
}

impl Requiredness {
    /// `minOccurs == "1"` is required, anything else optional.
    pub fn from_min_occurs(min_occurs: &str) -> Self {
        if min_occurs == "1" {
            Requiredness::Required
        } else {
            Requiredness::Optional
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Requiredness::Required => "required",
            Requiredness::Optional => "optional",
            Requiredness::Use(value) => value,
        }
    }
}

impl Serialize for Requiredness {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// An `xs:assert` rule attached to a complex type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assertion {
    pub message: Option<String>,
    pub formula: Option<String>,
}

impl Serialize for Assertion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.message.is_some() as usize + self.formula.is_some() as usize;
        let mut state = serializer.serialize_struct("Assertion", len)?;
        if let Some(message) = &self.message {
            state.serialize_field("message", message)?;
        }
        if let Some(formula) = &self.formula {
            state.serialize_field("formula", formula)?;
        }
        state.end()
    }
}

/// One form field or field group.
///
/// Serialises to a JSON object with a fixed key order: `name`, `type`,
/// `required`, `minOccurs`, `items`, `enumeration`, `doc`, `assert`, then the
/// pass-through pairs in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: Option<String>,
    pub kind: Option<TypeTag>,
    pub required: Option<Requiredness>,
    pub min_occurs: Option<String>,
    pub items: Option<Vec<FieldDescriptor>>,
    pub enumeration: Option<Vec<String>>,
    pub doc: Option<String>,
    pub assertions: Vec<Assertion>,
    extra: Vec<(String, String)>,
}

impl FieldDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// The synthetic `value` child standing for an element's text content.
    pub fn value_field() -> Self {
        Self::named(VALUE_FIELD_NAME).with_extra(XSD_TYPE_KEY, "text")
    }

    /// Descriptor for an `xs:attribute`.
    pub fn attribute() -> Self {
        Self::new().with_extra(XSD_TYPE_KEY, "attribute")
    }

    pub fn with_kind(mut self, kind: TypeTag) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_extra(key, value);
        self
    }

    /// Set a pass-through pair; an existing key keeps its position and takes the new value.
    pub fn set_extra(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.extra.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.extra.push((key, value)),
        }
    }

    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extra
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn extras(&self) -> impl Iterator<Item = (&str, &str)> {
        self.extra.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The `items` sequence, allocated empty on first use.
    pub fn items_mut(&mut self) -> &mut Vec<FieldDescriptor> {
        self.items.get_or_insert_with(Vec::new)
    }

    pub fn push_item(&mut self, item: FieldDescriptor) {
        self.items_mut().push(item);
    }

    pub fn push_enumeration(&mut self, value: impl Into<String>) {
        self.enumeration
            .get_or_insert_with(Vec::new)
            .push(value.into());
    }

    /// Append documentation text to whatever was collected before.
    pub fn merge_doc(&mut self, doc: Option<String>) {
        let Some(doc) = doc else { return };
        match &mut self.doc {
            Some(existing) => existing.push_str(&doc),
            None => self.doc = Some(doc),
        }
    }

    /// Find a direct child by name.
    pub fn item(&self, name: &str) -> Option<&FieldDescriptor> {
        self.items
            .as_ref()?
            .iter()
            .find(|item| item.name.as_deref() == Some(name))
    }

    pub fn to_json(&self) -> crate::Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl Serialize for FieldDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(name) = &self.name {
            map.serialize_entry("name", name)?;
        }
        if let Some(kind) = &self.kind {
            map.serialize_entry("type", kind)?;
        }
        if let Some(required) = &self.required {
            map.serialize_entry("required", required)?;
        }
        if let Some(min_occurs) = &self.min_occurs {
            map.serialize_entry("minOccurs", min_occurs)?;
        }
        if let Some(items) = &self.items {
            map.serialize_entry("items", items)?;
        }
        if let Some(enumeration) = &self.enumeration {
            map.serialize_entry("enumeration", enumeration)?;
        }
        if let Some(doc) = &self.doc {
            map.serialize_entry("doc", doc)?;
        }
        if !self.assertions.is_empty() {
            map.serialize_entry("assert", &self.assertions)?;
        }
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_serialize_key_order() {
        let mut field = FieldDescriptor::named("mode").with_kind(TypeTag::Select);
        field.required = Some(Requiredness::Optional);
        field.push_enumeration("A");
        field.push_enumeration("B");
        field.set_extra("default", "A");

        let text = serde_json::to_string(&field).unwrap();
        assert_eq!(
            text,
            r#"{"name":"mode","type":"select","required":"optional","enumeration":["A","B"],"default":"A"}"#
        );
    }

    #[test]
    fn test_empty_items_are_kept() {
        let mut field = FieldDescriptor::named("holder");
        field.items_mut();
        assert_eq!(field.to_json().unwrap(), json!({"name": "holder", "items": []}));
    }

    #[test]
    fn test_extra_overwrites_in_place() {
        let field = FieldDescriptor::value_field()
            .with_extra("pattern", "a*")
            .with_extra(XSD_TYPE_KEY, "attribute");
        let extras: Vec<_> = field.extras().collect();
        assert_eq!(extras, vec![("xsd-type", "attribute"), ("pattern", "a*")]);
    }

    #[test]
    fn test_merge_doc_concatenates() {
        let mut field = FieldDescriptor::new();
        field.merge_doc(None);
        assert_eq!(field.doc, None);
        field.merge_doc(Some("first.".into()));
        field.merge_doc(Some("second.".into()));
        assert_eq!(field.doc.as_deref(), Some("first.second."));
    }

    #[test]
    fn test_use_requiredness_is_verbatim() {
        let mut field = FieldDescriptor::attribute();
        field.required = Some(Requiredness::Use("prohibited".into()));
        field.assertions.push(Assertion {
            message: Some("must be positive".into()),
            formula: Some("@count > 0".into()),
        });
        assert_eq!(
            field.to_json().unwrap(),
            json!({
                "required": "prohibited",
                "assert": [{"message": "must be positive", "formula": "@count > 0"}],
                "xsd-type": "attribute"
            })
        );
    }

    #[test]
    fn test_type_tag_from_base() {
        assert_eq!(TypeTag::from_base("double"), TypeTag::Native(NativeType::Double));
        assert_eq!(TypeTag::from_base("int").to_string(), "int");
        assert!(TypeTag::Radio.is_group_kind());
        assert!(!TypeTag::Select.is_group_kind());
    }
}
