//! Signature file serializer

use super::model::{ApiElement, Parameter, SignatureFile, MODIFIER_ORDER};
use super::parser::{encode_type, HEADER_PREFIX};

/// Encoding switches for [`serialize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Write `?`/`!` nullability suffixes
    pub kotlin_nulls: bool,
    /// Write `optional` and `= value` parameter defaults
    pub default_values: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            kotlin_nulls: true,
            default_values: true,
        }
    }
}

/// Render `signature` in the signature file grammar
///
/// Types are grouped by package in first-seen order and members are written
/// under their owning type in declaration order. Members whose owner is not
/// declared in `signature` are skipped.
pub fn serialize(signature: &SignatureFile, options: SerializeOptions) -> String {
    let mut out = String::new();
    if let Some(version) = &signature.format_version {
        out.push_str(&format!("{} {}\n", HEADER_PREFIX, version));
    }

    let mut packages: Vec<&str> = Vec::new();
    for element in signature.types() {
        if !packages.contains(&element.package.as_str()) {
            packages.push(&element.package);
        }
    }

    let mut written = 0;
    for package in packages {
        out.push_str(&format!("package {} {{\n\n", package));
        for declared in signature.types().filter(|t| t.package == package) {
            out.push_str(&format!("  {} {{\n", type_declaration(declared)));
            written += 1;
            for member in signature.members_of(&declared.qualified_signature) {
                out.push_str(&format!("    {};\n", member_declaration(member, options)));
                written += 1;
            }
            out.push_str("  }\n\n");
        }
        out.push_str("}\n\n");
    }

    if written < signature.len() {
        log::warn!(
            "Skipped {} member(s) without a declared owner type",
            signature.len() - written
        );
    }
    out
}

fn type_declaration(element: &ApiElement) -> String {
    let mut parts = ordered_modifiers(element);
    parts.push(element.kind.keyword().to_string());
    parts.push(format!(
        "{}{}",
        element.simple_name(),
        element.type_parameters.as_deref().unwrap_or("")
    ));
    if let Some(clause) = &element.type_name {
        parts.push(clause.clone());
    }
    parts.join(" ")
}

fn member_declaration(element: &ApiElement, options: SerializeOptions) -> String {
    let mut parts = vec![element.kind.keyword().to_string()];
    parts.extend(ordered_modifiers(element));
    if let Some(type_parameters) = &element.type_parameters {
        parts.push(type_parameters.clone());
    }
    if let Some(type_name) = &element.type_name {
        parts.push(encode_type(
            type_name,
            element.nullability,
            options.kotlin_nulls,
        ));
    }

    if element.kind.is_callable() {
        let parameters: Vec<String> = element
            .parameters
            .iter()
            .map(|p| parameter(p, options))
            .collect();
        parts.push(format!("{}({})", element.name(), parameters.join(", ")));
        if !element.throws.is_empty() {
            parts.push("throws".to_string());
            parts.push(element.throws.join(", "));
        }
    } else {
        parts.push(element.name().to_string());
    }

    let mut line = parts.join(" ");
    if let Some(value) = &element.constant_value {
        line.push_str(" = ");
        line.push_str(value);
    }
    line
}

fn parameter(p: &Parameter, options: SerializeOptions) -> String {
    let mut parts = Vec::new();
    if options.default_values && p.optional {
        parts.push("optional".to_string());
    }
    parts.push(encode_type(&p.type_name, p.nullability, options.kotlin_nulls));
    if let Some(name) = &p.name {
        parts.push(name.clone());
    }
    if options.default_values {
        if let Some(value) = &p.default_value {
            parts.push(format!("= {}", value));
        }
    }
    parts.join(" ")
}

/// Annotations first, then known modifiers in canonical order, then the rest
fn ordered_modifiers(element: &ApiElement) -> Vec<String> {
    let modifiers = &element.modifiers;
    let mut ordered: Vec<String> = modifiers
        .iter()
        .filter(|m| m.starts_with('@'))
        .cloned()
        .collect();
    ordered.extend(
        MODIFIER_ORDER
            .iter()
            .filter(|m| modifiers.contains(**m))
            .map(|m| m.to_string()),
    );
    ordered.extend(
        modifiers
            .iter()
            .filter(|m| !m.starts_with('@') && !MODIFIER_ORDER.contains(&m.as_str()))
            .cloned(),
    );
    ordered
}
