//! Recursive XSD → form descriptor interpreter
//!
//! Every rule takes the schema node it interprets and either returns an owned
//! [`FieldDescriptor`] or fills in the descriptor it was handed. Only a missing
//! `name` on an element declaration aborts the walk; every other anomaly is
//! recorded as a [`Diagnostic`] and the walk continues with what it has.

use crate::catalog::{ResolvedType, TypeCatalog, TypeReference};
use crate::descriptor::{Assertion, FieldDescriptor, Requiredness, TypeTag};
use crate::diagnostics::{Diagnostic, DiagnosticKind, NodePath};
use crate::node::{NodeKind, SchemaNode};
use crate::{Result, XsdError};

/// Element attributes copied straight onto the element's descriptor.
const ELEMENT_PASSTHROUGH: [&str; 3] = ["maxOccurs", "use", "default"];

/// The three model groups. Their members differ in default requiredness
/// and in the kind they force on each member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    All,
    Sequence,
    Choice,
}

impl Group {
    /// Requiredness when the member has no `minOccurs`.
    fn default_requiredness(&self) -> Requiredness {
        match self {
            Group::All | Group::Choice => Requiredness::Required,
            Group::Sequence => Requiredness::Optional,
        }
    }

    fn member_kind(&self, member: &SchemaNode) -> Option<TypeTag> {
        match self {
            Group::All => None,
            Group::Sequence => member
                .attr("maxOccurs")
                .filter(|max| *max != "1")
                .map(|_| TypeTag::List),
            Group::Choice => Some(TypeTag::Radio),
        }
    }
}

pub struct SchemaWalker<'a> {
    catalog: TypeCatalog<'a>,
    path: NodePath,
    /// Named definitions being expanded on the current path
    expanding: Vec<&'a str>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> SchemaWalker<'a> {
    pub fn new(catalog: TypeCatalog<'a>) -> Self {
        Self {
            catalog,
            path: NodePath::root(),
            expanding: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Walk the compile root: `element` is a direct child of `schema`.
    pub fn walk_root(
        &mut self,
        schema: &'a SchemaNode,
        element: &'a SchemaNode,
    ) -> Result<FieldDescriptor> {
        self.path.push(schema);
        let root = self.walk_element(element, FieldDescriptor::new());
        self.path.pop();
        root
    }

    /// Element rule.
    ///
    /// `field` arrives pre-populated by the enclosing group (requiredness,
    /// `minOccurs`, a `list`/`radio` kind) or empty for the root.
    pub fn walk_element(
        &mut self,
        node: &'a SchemaNode,
        mut field: FieldDescriptor,
    ) -> Result<FieldDescriptor> {
        self.path.push(node);

        let name = node.attr("name").ok_or_else(|| {
            XsdError::malformed(
                self.path.to_string(),
                "element declaration has no name attribute",
            )
        })?;
        tracing::debug!(element = name, "walking element");
        field.name = Some(name.to_string());

        if let Some(type_name) = node.attr("type") {
            self.apply_type(type_name, &mut field)?;
        }

        for (key, value) in &node.attributes {
            if key == "minOccurs" {
                field.min_occurs = Some(value.clone());
            } else if ELEMENT_PASSTHROUGH.contains(&key.as_str()) {
                field.set_extra(key, value);
            }
        }

        for child in &node.children {
            match child.kind() {
                NodeKind::Annotation => field.merge_doc(extract_doc(child)),
                NodeKind::Text => {}
                NodeKind::ComplexType => self.expand_complex(child, &mut field)?,
                NodeKind::SimpleType => self.expand_simple(child, &mut field)?,
                _ => self.diagnose(DiagnosticKind::UnexpectedChild(child.name.clone())),
            }
        }

        self.path.pop();
        Ok(field)
    }

    /// Complex-type rule: dispatch the body of a `complexType` (or of a
    /// derivation inside `complexContent`) into `parent`.
    pub fn walk_complex_type(
        &mut self,
        definition: &'a SchemaNode,
        parent: &mut FieldDescriptor,
    ) -> Result<()> {
        self.path.push(definition);

        for child in &definition.children {
            match child.kind() {
                NodeKind::All => {
                    let members = self.walk_group(child, Group::All)?;
                    parent.items_mut().extend(members);
                }
                NodeKind::Sequence => {
                    let members = self.walk_group(child, Group::Sequence)?;
                    parent.items_mut().extend(members);
                }
                NodeKind::Choice => {
                    let members = self.walk_group(child, Group::Choice)?;
                    parent.items_mut().extend(members);
                }
                NodeKind::Annotation => parent.merge_doc(extract_doc(child)),
                NodeKind::Attribute => {
                    let attribute = self.walk_attribute(child)?;
                    parent.push_item(attribute);
                }
                NodeKind::SimpleContent => self.walk_simple_content(child, parent)?,
                NodeKind::ComplexContent => self.walk_complex_content(child, parent)?,
                NodeKind::Assert => parent.assertions.push(assertion(child)),
                NodeKind::Text => {}
                _ => self.diagnose(DiagnosticKind::UnhandledComplexChild(child.name.clone())),
            }
        }

        self.path.pop();
        Ok(())
    }

    /// Simple-type rule.
    pub fn walk_simple_type(
        &mut self,
        definition: &'a SchemaNode,
        field: &mut FieldDescriptor,
    ) -> Result<()> {
        self.path.push(definition);

        for child in &definition.children {
            match child.kind() {
                NodeKind::List => self.walk_list(child, field)?,
                NodeKind::Restriction => self.walk_restriction(child, field),
                NodeKind::Annotation => field.merge_doc(extract_doc(child)),
                NodeKind::Text => {}
                _ => self.diagnose(DiagnosticKind::UnexpectedChild(child.name.clone())),
            }
        }

        self.path.pop();
        Ok(())
    }

    /// Attribute rule.
    pub fn walk_attribute(&mut self, node: &'a SchemaNode) -> Result<FieldDescriptor> {
        self.path.push(node);
        let mut field = FieldDescriptor::attribute();

        for (key, value) in &node.attributes {
            match key.as_str() {
                "name" => field.name = Some(value.clone()),
                "use" => field.required = Some(Requiredness::Use(value.clone())),
                "type" => self.apply_type(value, &mut field)?,
                _ => field.set_extra(key, value),
            }
        }

        for child in &node.children {
            match child.kind() {
                NodeKind::Annotation => field.merge_doc(extract_doc(child)),
                NodeKind::SimpleType => self.expand_simple(child, &mut field)?,
                NodeKind::Text => {}
                _ => self.diagnose(DiagnosticKind::UnexpectedChild(child.name.clone())),
            }
        }

        self.path.pop();
        Ok(field)
    }

    /// Group rule for `all`, `sequence` and `choice`.
    pub fn walk_group(
        &mut self,
        node: &'a SchemaNode,
        group: Group,
    ) -> Result<Vec<FieldDescriptor>> {
        self.path.push(node);
        let mut members = Vec::new();

        for child in &node.children {
            if child.is_text() {
                continue;
            }
            if !child.name.contains("element") {
                self.diagnose(DiagnosticKind::NonElementInGroup(child.name.clone()));
                continue;
            }

            let mut field = FieldDescriptor::new();
            match child.attr("minOccurs") {
                Some(min_occurs) => {
                    field.required = Some(Requiredness::from_min_occurs(min_occurs));
                    field.min_occurs = Some(min_occurs.to_string());
                }
                None => {
                    field.required = Some(group.default_requiredness());
                    if group == Group::All {
                        field.min_occurs = Some("1".to_string());
                    }
                }
            }
            field.kind = group.member_kind(child);

            members.push(self.walk_element(child, field)?);
        }

        self.path.pop();
        Ok(members)
    }

    /// Resolve a `type` attribute and expand it into `field`.
    fn apply_type(&mut self, type_name: &str, field: &mut FieldDescriptor) -> Result<()> {
        match self.catalog.resolve(type_name) {
            ResolvedType::Native(native) => {
                let kind = TypeTag::Native(native);
                if field.kind.as_ref().is_some_and(TypeTag::is_group_kind) {
                    field.push_item(FieldDescriptor::value_field().with_kind(kind));
                } else {
                    field.kind = Some(kind);
                }
            }
            ResolvedType::Defined(definition) => {
                if definition.name.contains("complexType") {
                    self.expand_complex(definition, field)?;
                } else {
                    self.expand_simple(definition, field)?;
                }
            }
            ResolvedType::Undefined => {
                self.diagnose(DiagnosticKind::UndefinedType(type_name.to_string()));
            }
        }
        Ok(())
    }

    /// Give `field` an `items` sequence and fill it from a complex type.
    fn expand_complex(
        &mut self,
        definition: &'a SchemaNode,
        field: &mut FieldDescriptor,
    ) -> Result<()> {
        self.with_definition(definition, |walker| {
            field.items_mut();
            walker.walk_complex_type(definition, field)
        })
    }

    /// Apply a simple type to `field`, or to a `value` child when an
    /// enclosing group already decided the field's kind.
    fn expand_simple(
        &mut self,
        definition: &'a SchemaNode,
        field: &mut FieldDescriptor,
    ) -> Result<()> {
        self.with_definition(definition, |walker| {
            if field.kind.as_ref().is_some_and(TypeTag::is_group_kind) {
                let mut value = FieldDescriptor::value_field();
                walker.walk_simple_type(definition, &mut value)?;
                field.push_item(value);
                Ok(())
            } else {
                walker.walk_simple_type(definition, field)
            }
        })
    }

    /// Run `f` unless `definition` is a named type already open on this path.
    fn with_definition<F>(&mut self, definition: &'a SchemaNode, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let Some(name) = definition.attr("name") else {
            return f(self);
        };
        if self.expanding.contains(&name) {
            self.diagnose(DiagnosticKind::RecursiveType(name.to_string()));
            return Ok(());
        }
        self.expanding.push(name);
        let result = f(self);
        self.expanding.pop();
        result
    }

    fn walk_list(&mut self, node: &'a SchemaNode, field: &mut FieldDescriptor) -> Result<()> {
        self.path.push(node);

        match node.attr("itemType") {
            Some(item_type) => match self.catalog.resolve(item_type) {
                ResolvedType::Native(native) => {
                    field.push_item(FieldDescriptor::value_field().with_kind(TypeTag::Native(native)));
                    field.set_extra("sub-type", native.as_str());
                }
                ResolvedType::Defined(definition) if definition.name.contains("complexType") => {
                    self.expand_complex(definition, field)?;
                }
                ResolvedType::Defined(definition) => {
                    self.value_child(definition, field)?;
                }
                ResolvedType::Undefined => {
                    self.diagnose(DiagnosticKind::UndefinedType(item_type.to_string()));
                }
            },
            None => match node.elements().find(|c| c.kind() == NodeKind::SimpleType) {
                Some(inline) => self.value_child(inline, field)?,
                None => self.diagnose(DiagnosticKind::MissingAttribute("itemType")),
            },
        }
        field.kind = Some(TypeTag::MultiSelect);

        self.path.pop();
        Ok(())
    }

    /// A `value` child carrying a simple type's output.
    fn value_child(&mut self, definition: &'a SchemaNode, field: &mut FieldDescriptor) -> Result<()> {
        self.with_definition(definition, |walker| {
            let mut value = FieldDescriptor::value_field();
            walker.walk_simple_type(definition, &mut value)?;
            field.push_item(value);
            Ok(())
        })
    }

    fn walk_restriction(&mut self, node: &'a SchemaNode, field: &mut FieldDescriptor) {
        self.path.push(node);

        match node.attr("base") {
            Some(base) => field.kind = Some(TypeTag::from_base(TypeReference::parse(base).local)),
            None => self.diagnose(DiagnosticKind::MissingAttribute("base")),
        }

        for facet in &node.children {
            match facet.kind() {
                NodeKind::Text => {}
                NodeKind::Annotation => field.merge_doc(extract_doc(facet)),
                NodeKind::Enumeration => match facet.attr("value") {
                    Some(value) => {
                        field.push_enumeration(value);
                        field.kind = Some(TypeTag::Select);
                    }
                    None => self.diagnose(DiagnosticKind::MissingAttribute("value")),
                },
                _ => match facet.attr("value") {
                    Some(value) => field.set_extra(&facet.name, value),
                    None => self.diagnose(DiagnosticKind::UnexpectedChild(facet.name.clone())),
                },
            }
        }

        self.path.pop();
    }

    fn walk_simple_content(
        &mut self,
        node: &'a SchemaNode,
        parent: &mut FieldDescriptor,
    ) -> Result<()> {
        self.path.push(node);

        for child in &node.children {
            match child.kind() {
                NodeKind::Extension => self.walk_extension(child, parent)?,
                NodeKind::Restriction => {
                    let mut value = FieldDescriptor::value_field();
                    self.walk_restriction(child, &mut value);
                    parent.push_item(value);
                }
                NodeKind::Attribute => {
                    let attribute = self.walk_attribute(child)?;
                    parent.push_item(attribute);
                }
                NodeKind::Annotation => parent.merge_doc(extract_doc(child)),
                NodeKind::Text => {}
                _ => self.diagnose(DiagnosticKind::UnexpectedChild(child.name.clone())),
            }
        }

        self.path.pop();
        Ok(())
    }

    /// `simpleContent/extension`: the element's text value plus extra attributes.
    fn walk_extension(&mut self, node: &'a SchemaNode, parent: &mut FieldDescriptor) -> Result<()> {
        self.path.push(node);

        match node.attr("base") {
            Some(base) => match self.catalog.resolve(base) {
                ResolvedType::Native(native) => {
                    parent.push_item(FieldDescriptor::value_field().with_kind(TypeTag::Native(native)));
                }
                ResolvedType::Defined(definition) if definition.name.contains("complexType") => {
                    self.with_definition(definition, |walker| {
                        walker.walk_complex_type(definition, parent)
                    })?;
                }
                ResolvedType::Defined(definition) => self.value_child(definition, parent)?,
                ResolvedType::Undefined => {
                    self.diagnose(DiagnosticKind::UndefinedType(base.to_string()));
                }
            },
            None => self.diagnose(DiagnosticKind::MissingAttribute("base")),
        }

        for child in &node.children {
            match child.kind() {
                NodeKind::Attribute => {
                    let attribute = self.walk_attribute(child)?;
                    parent.push_item(attribute);
                }
                NodeKind::Annotation => parent.merge_doc(extract_doc(child)),
                NodeKind::Assert => parent.assertions.push(assertion(child)),
                NodeKind::Text => {}
                _ => self.diagnose(DiagnosticKind::UnexpectedChild(child.name.clone())),
            }
        }

        self.path.pop();
        Ok(())
    }

    /// `complexContent`: an extension inherits its base's members ahead of
    /// its own; a restriction restates its content and is walked as-is.
    fn walk_complex_content(
        &mut self,
        node: &'a SchemaNode,
        parent: &mut FieldDescriptor,
    ) -> Result<()> {
        self.path.push(node);

        for child in &node.children {
            match child.kind() {
                NodeKind::Extension => {
                    match child.attr("base") {
                        Some(base) => match self.catalog.resolve(base) {
                            ResolvedType::Defined(definition)
                                if definition.name.contains("complexType") =>
                            {
                                self.with_definition(definition, |walker| {
                                    walker.walk_complex_type(definition, parent)
                                })?;
                            }
                            ResolvedType::Undefined => {
                                self.diagnose(DiagnosticKind::UndefinedType(base.to_string()));
                            }
                            // anyType and simple bases contribute no members
                            _ => {}
                        },
                        None => self.diagnose(DiagnosticKind::MissingAttribute("base")),
                    }
                    self.walk_complex_type(child, parent)?;
                }
                NodeKind::Restriction => self.walk_complex_type(child, parent)?,
                NodeKind::Annotation => parent.merge_doc(extract_doc(child)),
                NodeKind::Text => {}
                _ => self.diagnose(DiagnosticKind::UnhandledComplexChild(child.name.clone())),
            }
        }

        self.path.pop();
        Ok(())
    }

    fn diagnose(&mut self, kind: DiagnosticKind) {
        let diagnostic = Diagnostic {
            path: self.path.to_string(),
            kind,
        };
        tracing::warn!(path = %diagnostic.path, "{}", diagnostic.kind);
        self.diagnostics.push(diagnostic);
    }
}

/// Documentation text of an `annotation`.
///
/// Concatenates the text of every `p` inside each `documentation` child, and
/// renders `ul` blocks as ` - item` lines. `None` when nothing was found.
pub fn extract_doc(annotation: &SchemaNode) -> Option<String> {
    let mut doc = String::new();

    for documentation in annotation
        .elements()
        .filter(|child| child.kind() == NodeKind::Documentation)
    {
        for block in documentation.elements() {
            match block.name.as_str() {
                "p" => doc.push_str(&block.text_content()),
                "ul" => {
                    doc.push('\n');
                    for item in block.elements().filter(|item| item.name == "li") {
                        doc.push_str(" - ");
                        doc.push_str(&item.text_content());
                        doc.push('\n');
                    }
                    doc.push('\n');
                }
                _ => {}
            }
        }
    }

    (!doc.is_empty()).then_some(doc)
}

fn assertion(node: &SchemaNode) -> Assertion {
    Assertion {
        message: node
            .attributes
            .iter()
            .find(|(key, _)| key.contains("message"))
            .map(|(_, value)| value.clone()),
        formula: node.attr("test").map(str::to_string),
    }
}
