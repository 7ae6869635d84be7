//! Compiles of realistic filter schemas
//!
//! Covers the constructs real filter configurations lean on: repeated
//! sequence members, choices, attribute lists of enumerated values,
//! complex-content extension, assertions, simple content and
//! list-formatted documentation. Also checks the structural properties every
//! compiled tree must satisfy.

use pretty_assertions::assert_eq;
use repose_xsd::{
    Diagnostic, DiagnosticKind, FieldDescriptor, FormCompiler, NativeType, SchemaDocument, TypeTag,
};
use serde_json::json;

fn compile(name: &str) -> repose_xsd::Compilation {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    let document = SchemaDocument::from_file(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path, e));
    FormCompiler::new()
        .compile(&document)
        .unwrap_or_else(|e| panic!("Failed to compile {}: {}", path, e))
}

/// Every descriptor in the tree, parents before children.
fn flatten(root: &FieldDescriptor) -> Vec<&FieldDescriptor> {
    let mut out = vec![root];
    let mut i = 0;
    while i < out.len() {
        let field = out[i];
        if let Some(items) = &field.items {
            out.extend(items.iter());
        }
        i += 1;
    }
    out
}

// ============================================================================
// Full trees
// ============================================================================

#[test]
fn test_header_normalization_tree() {
    let compilation = compile("header-normalization.xsd");

    let header_list = json!([
        {
            "name": "header",
            "type": "list",
            "required": "required",
            "minOccurs": "1",
            "items": [
                {"name": "id", "type": "string", "required": "required", "xsd-type": "attribute"}
            ],
            "maxOccurs": "unbounded"
        }
    ]);

    assert_eq!(
        compilation.descriptor.to_json().unwrap(),
        json!({
            "name": "header-normalization",
            "items": [
                {
                    "name": "target",
                    "type": "list",
                    "required": "required",
                    "minOccurs": "1",
                    "items": [
                        {"name": "whitelist", "type": "radio", "required": "required", "items": header_list},
                        {"name": "blacklist", "type": "radio", "required": "required", "items": header_list},
                        {"name": "uri-regex", "type": "string", "required": "optional", "xsd-type": "attribute"},
                        {
                            "name": "http-methods",
                            "type": "multi-select",
                            "required": "optional",
                            "items": [
                                {
                                    "name": "value",
                                    "type": "select",
                                    "enumeration": ["GET", "POST", "ALL"],
                                    "xsd-type": "text"
                                }
                            ],
                            "xsd-type": "attribute",
                            "default": "ALL"
                        }
                    ],
                    "maxOccurs": "unbounded"
                }
            ],
            "doc": "Normalizes request headers."
        })
    );
    assert!(compilation.diagnostics.is_empty());
}

#[test]
fn test_keystone_tree() {
    let compilation = compile("keystone-v2.xsd");

    assert_eq!(
        compilation.descriptor.to_json().unwrap(),
        json!({
            "name": "keystone-v2",
            "items": [
                {
                    "name": "identity-service",
                    "required": "required",
                    "minOccurs": "1",
                    "items": [
                        {"name": "uri", "type": "anyURI", "required": "required", "xsd-type": "attribute"},
                        {"name": "username", "type": "string", "required": "optional", "xsd-type": "attribute"},
                        {"name": "password", "type": "string", "required": "optional", "xsd-type": "attribute"}
                    ],
                    "assert": [
                        {
                            "message": "If username is defined, password must be too",
                            "formula": "if (@username) then @password else true()"
                        }
                    ]
                },
                {
                    "name": "cache",
                    "required": "optional",
                    "minOccurs": "0",
                    "items": [
                        {
                            "name": "timeouts",
                            "required": "optional",
                            "minOccurs": "0",
                            "items": [
                                {
                                    "name": "token",
                                    "required": "optional",
                                    "minOccurs": "0",
                                    "items": [
                                        {"name": "value", "type": "int", "xsd-type": "text", "minInclusive": "0"}
                                    ]
                                },
                                {
                                    "name": "variability",
                                    "type": "int",
                                    "xsd-type": "attribute",
                                    "minInclusive": "0",
                                    "default": "0"
                                }
                            ]
                        }
                    ]
                }
            ],
            "doc": "Authenticates requests against Keystone.\n - tenant handling\n - caching\n\n"
        })
    );
    assert!(compilation.diagnostics.is_empty());
}

#[test]
fn test_degraded_schema_keeps_going() {
    let compilation = compile("degraded.xsd");

    assert_eq!(
        compilation.descriptor.to_json().unwrap(),
        json!({
            "name": "degraded",
            "items": [
                {"name": "known", "type": "boolean", "required": "optional", "minOccurs": "0"},
                {"name": "unknown", "required": "optional"},
                {"name": "either", "required": "optional"}
            ]
        })
    );

    let base = "/schema/element[@name='degraded']/complexType[@name='DegradedType']";
    assert_eq!(
        compilation.diagnostics,
        vec![
            Diagnostic {
                path: format!("{}/sequence", base),
                kind: DiagnosticKind::NonElementInGroup("group".to_string()),
            },
            Diagnostic {
                path: format!("{}/sequence/element[@name='unknown']", base),
                kind: DiagnosticKind::UndefinedType("NoSuchType".to_string()),
            },
            Diagnostic {
                path: format!(
                    "{}/sequence/element[@name='either']/simpleType[@name='UnionType']",
                    base
                ),
                kind: DiagnosticKind::UnexpectedChild("union".to_string()),
            },
            Diagnostic {
                path: base.to_string(),
                kind: DiagnosticKind::UnhandledComplexChild("anyAttribute".to_string()),
            },
        ]
    );
}

// ============================================================================
// Structural properties
// ============================================================================

const ALL_FIXTURES: [&str; 6] = [
    "add-header.xsd",
    "enumeration.xsd",
    "undefined-type.xsd",
    "header-normalization.xsd",
    "keystone-v2.xsd",
    "degraded.xsd",
];

#[test]
fn test_native_descriptors_have_no_items() {
    for fixture in ALL_FIXTURES {
        let compilation = compile(fixture);
        for field in flatten(&compilation.descriptor) {
            if let Some(TypeTag::Native(native)) = &field.kind {
                assert!(
                    field.items.is_none(),
                    "{}: {:?} field {:?} has items",
                    fixture,
                    native,
                    field.name
                );
            }
        }
    }
}

#[test]
fn test_enumerations_are_selects() {
    for fixture in ALL_FIXTURES {
        let compilation = compile(fixture);
        for field in flatten(&compilation.descriptor) {
            if field.enumeration.is_some() {
                assert_eq!(field.kind, Some(TypeTag::Select), "{}: {:?}", fixture, field.name);
            }
        }
    }
}

#[test]
fn test_every_descriptor_below_the_root_is_named() {
    for fixture in ALL_FIXTURES {
        let compilation = compile(fixture);
        for field in flatten(&compilation.descriptor) {
            assert!(field.name.is_some(), "{}: unnamed descriptor {:?}", fixture, field);
        }
    }
}

#[test]
fn test_choice_member_items_are_reachable() {
    let compilation = compile("header-normalization.xsd");
    let target = compilation.descriptor.item("target").unwrap();

    let whitelist = target.item("whitelist").unwrap();
    assert_eq!(whitelist.kind, Some(TypeTag::Radio));
    assert_eq!(
        whitelist.item("header").and_then(|h| h.item("id")).map(|id| id.kind.clone()),
        Some(Some(TypeTag::Native(NativeType::String)))
    );
}

#[test]
fn test_scalar_typed_members_keep_their_group_kind() {
    let compilation = FormCompiler::new()
        .compile_str(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:element name="cfg" type="CfgType"/>
                 <xs:complexType name="CfgType">
                   <xs:sequence>
                     <xs:element name="plain" type="xs:double"/>
                     <xs:element name="repeated" type="xs:anyURI" maxOccurs="unbounded"/>
                     <xs:element name="mode">
                       <xs:complexType>
                         <xs:choice>
                           <xs:element name="fixed" type="xs:boolean"/>
                         </xs:choice>
                       </xs:complexType>
                     </xs:element>
                   </xs:sequence>
                 </xs:complexType>
               </xs:schema>"#,
        )
        .unwrap();
    let root = &compilation.descriptor;

    // outside repeating and choice groups a native type lands on the field itself
    let plain = root.item("plain").unwrap();
    assert_eq!(plain.kind, Some(TypeTag::Native(NativeType::Double)));
    assert!(plain.items.is_none());

    // group kinds win and the scalar typing moves into a `value` child
    let repeated = root.item("repeated").unwrap();
    assert_eq!(repeated.kind, Some(TypeTag::List));
    assert_eq!(
        repeated.item("value").and_then(|v| v.kind.clone()),
        Some(TypeTag::Native(NativeType::AnyUri))
    );

    let fixed = root.item("mode").and_then(|m| m.item("fixed")).unwrap();
    assert_eq!(fixed.kind, Some(TypeTag::Radio));
    assert_eq!(
        fixed.item("value").and_then(|v| v.kind.clone()),
        Some(TypeTag::Native(NativeType::Boolean))
    );
    assert!(!compilation.has_diagnostics());
}
