//! Structured API model of a signature file

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use super::parser::split_top_level;

/// Member modifiers in the order they are written
///
/// Annotations (`@…` tokens) precede these; anything not listed sorts after.
pub const MODIFIER_ORDER: &[&str] = &[
    "public",
    "protected",
    "private",
    "internal",
    "abstract",
    "default",
    "static",
    "final",
    "sealed",
    "open",
    "expect",
    "actual",
    "const",
    "lateinit",
    "transient",
    "volatile",
    "synchronized",
    "native",
    "strictfp",
    "inline",
    "value",
    "data",
    "fun",
    "inner",
    "infix",
    "operator",
    "suspend",
    "tailrec",
    "external",
    "deprecated",
];

/// Keyword-like token that sits in modifier position
pub fn is_modifier(token: &str) -> bool {
    token.starts_with('@') || MODIFIER_ORDER.contains(&token)
}

/// Declaration kind of an API element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ElementKind {
    Class,
    Interface,
    Enum,
    Annotation,
    Constructor,
    Method,
    Field,
    EnumConstant,
    Property,
}

impl ElementKind {
    /// Keyword introducing the declaration in the signature grammar
    pub fn keyword(&self) -> &'static str {
        match self {
            ElementKind::Class => "class",
            ElementKind::Interface => "interface",
            ElementKind::Enum => "enum",
            ElementKind::Annotation => "@interface",
            ElementKind::Constructor => "ctor",
            ElementKind::Method => "method",
            ElementKind::Field => "field",
            ElementKind::EnumConstant => "enum_constant",
            ElementKind::Property => "property",
        }
    }

    pub fn type_from_keyword(keyword: &str) -> Option<ElementKind> {
        match keyword {
            "class" => Some(ElementKind::Class),
            "interface" => Some(ElementKind::Interface),
            "enum" => Some(ElementKind::Enum),
            "@interface" => Some(ElementKind::Annotation),
            _ => None,
        }
    }

    pub fn member_from_keyword(keyword: &str) -> Option<ElementKind> {
        match keyword {
            "ctor" => Some(ElementKind::Constructor),
            "method" => Some(ElementKind::Method),
            "field" => Some(ElementKind::Field),
            "enum_constant" => Some(ElementKind::EnumConstant),
            "property" => Some(ElementKind::Property),
            _ => None,
        }
    }

    /// Class, interface, enum or annotation declaration
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            ElementKind::Class | ElementKind::Interface | ElementKind::Enum | ElementKind::Annotation
        )
    }

    /// Constructor or method
    pub fn is_callable(&self) -> bool {
        matches!(self, ElementKind::Constructor | ElementKind::Method)
    }

    pub fn category(&self) -> KeyCategory {
        match self {
            ElementKind::Class
            | ElementKind::Interface
            | ElementKind::Enum
            | ElementKind::Annotation => KeyCategory::Type,
            ElementKind::Constructor => KeyCategory::Constructor,
            ElementKind::Method => KeyCategory::Method,
            ElementKind::Field | ElementKind::EnumConstant => KeyCategory::Field,
            ElementKind::Property => KeyCategory::Property,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Identity namespace of an element
///
/// A class turning into an interface keeps its identity; a field and a
/// property of the same name do not collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum KeyCategory {
    Type,
    Constructor,
    Method,
    Field,
    Property,
}

/// Identity key used by the differ
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementKey {
    pub signature: String,
    pub category: KeyCategory,
}

/// Decoded nullability of a type position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Nullability {
    /// Not encoded, or a primitive type
    #[default]
    None,
    /// `?` suffix
    Nullable,
    /// No suffix on a reference type
    NonNull,
    /// `!` suffix (platform type)
    Unknown,
}

impl Nullability {
    /// Suffix written after the type in Kotlin null encoding
    pub fn suffix(&self) -> &'static str {
        match self {
            Nullability::Nullable => "?",
            Nullability::Unknown => "!",
            Nullability::None | Nullability::NonNull => "",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Nullability::None => "NONE",
            Nullability::Nullable => "NULLABLE",
            Nullability::NonNull => "NONNULL",
            Nullability::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Nullability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A constructor or method parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Parameter {
    /// Type text with any decoded nullability suffix removed
    pub type_name: String,
    pub nullability: Nullability,
    pub name: Option<String>,
    /// Declared with the `optional` keyword
    pub optional: bool,
    /// Default value written as `= value`
    pub default_value: Option<String>,
}

impl Parameter {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            nullability: Nullability::None,
            name: None,
            optional: false,
            default_value: None,
        }
    }

    pub fn has_default(&self) -> bool {
        self.optional || self.default_value.is_some()
    }

    /// Type as it participates in the owning element's identity
    ///
    /// Type-use annotations are dropped so annotating a parameter is a change,
    /// not a removal plus an addition.
    pub fn signature_type(&self) -> String {
        split_top_level(&self.type_name, char::is_whitespace)
            .into_iter()
            .filter(|token| !token.starts_with('@'))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One declaration of the API surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiElement {
    pub kind: ElementKind,
    pub package: String,
    /// `pkg.Type` for types, `pkg.Type#member(paramTypes)` for callables,
    /// `pkg.Type#member` for fields and properties
    pub qualified_signature: String,
    pub modifiers: BTreeSet<String>,
    pub nullability: Nullability,
    pub has_default_value: bool,
    pub type_parameters: Option<String>,
    /// Return/field/property type, or the extends/implements clause of a type
    pub type_name: Option<String>,
    pub parameters: Vec<Parameter>,
    pub throws: Vec<String>,
    pub constant_value: Option<String>,
}

impl ApiElement {
    /// Bare type declaration
    pub fn new_type(kind: ElementKind, package: &str, simple_name: &str) -> Self {
        Self::bare(kind, package, format!("{}.{}", package, simple_name))
    }

    /// Bare member declaration; `qualified_signature` is recomputed from
    /// `parameters` for callables by [`ApiElement::member_signature`]
    pub fn new_member(kind: ElementKind, package: &str, owner: &str, name: &str) -> Self {
        let signature = if kind.is_callable() {
            format!("{}#{}()", owner, name)
        } else {
            format!("{}#{}", owner, name)
        };
        Self::bare(kind, package, signature)
    }

    fn bare(kind: ElementKind, package: &str, qualified_signature: String) -> Self {
        Self {
            kind,
            package: package.to_string(),
            qualified_signature,
            modifiers: BTreeSet::new(),
            nullability: Nullability::None,
            has_default_value: false,
            type_parameters: None,
            type_name: None,
            parameters: Vec::new(),
            throws: Vec::new(),
            constant_value: None,
        }
    }

    /// Compose the qualified signature of a callable from its parameters
    pub fn member_signature(owner: &str, name: &str, parameters: &[Parameter]) -> String {
        let types: Vec<String> = parameters.iter().map(Parameter::signature_type).collect();
        format!("{}#{}({})", owner, name, types.join(","))
    }

    pub fn key(&self) -> ElementKey {
        ElementKey {
            signature: self.qualified_signature.clone(),
            category: self.kind.category(),
        }
    }

    /// Qualified name of the enclosing type for members, of itself for types
    pub fn owner(&self) -> &str {
        match self.qualified_signature.split_once('#') {
            Some((owner, _)) => owner,
            None => &self.qualified_signature,
        }
    }

    /// Name of the member, or the package-relative name of a type
    pub fn name(&self) -> &str {
        match self.qualified_signature.split_once('#') {
            Some((_, member)) => member.split('(').next().unwrap_or(member),
            None => self.simple_name(),
        }
    }

    /// Type name relative to its package (`Outer.Inner` for nested types)
    pub fn simple_name(&self) -> &str {
        let owner = self.owner();
        if self.package.is_empty() {
            return owner;
        }
        owner
            .strip_prefix(self.package.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(owner)
    }

    /// Attributes compared for elements sharing a key
    pub fn differences(&self, other: &ApiElement) -> Vec<String> {
        let mut changes = Vec::new();
        if self.kind != other.kind {
            changes.push(format!("kind {} -> {}", self.kind, other.kind));
        }
        if self.modifiers != other.modifiers {
            changes.push(format!(
                "modifiers [{}] -> [{}]",
                join_set(&self.modifiers),
                join_set(&other.modifiers)
            ));
        }
        if self.nullability != other.nullability {
            changes.push(format!(
                "nullability {} -> {}",
                self.nullability, other.nullability
            ));
        }
        if self.has_default_value != other.has_default_value {
            changes.push(format!(
                "default value {} -> {}",
                self.has_default_value, other.has_default_value
            ));
        }
        if self.type_parameters != other.type_parameters {
            changes.push(format!(
                "type parameters {} -> {}",
                display_opt(&self.type_parameters),
                display_opt(&other.type_parameters)
            ));
        }
        if self.type_name != other.type_name {
            changes.push(format!(
                "type {} -> {}",
                display_opt(&self.type_name),
                display_opt(&other.type_name)
            ));
        }
        let params_before: Vec<_> = self.parameters.iter().map(parameter_shape).collect();
        let params_after: Vec<_> = other.parameters.iter().map(parameter_shape).collect();
        if params_before != params_after {
            changes.push("parameter nullability or defaults changed".to_string());
        }
        if self.throws != other.throws {
            changes.push(format!(
                "throws [{}] -> [{}]",
                self.throws.join(", "),
                other.throws.join(", ")
            ));
        }
        if self.constant_value != other.constant_value {
            changes.push(format!(
                "value {} -> {}",
                display_opt(&self.constant_value),
                display_opt(&other.constant_value)
            ));
        }
        changes
    }
}

fn parameter_shape(p: &Parameter) -> (Nullability, bool) {
    (p.nullability, p.has_default())
}

fn join_set(set: &BTreeSet<String>) -> String {
    set.iter().cloned().collect::<Vec<_>>().join(" ")
}

fn display_opt(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("<none>")
}

/// Parsed signature file
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SignatureFile {
    /// Version from the `// Signature format:` header, if one was present
    pub format_version: Option<String>,
    /// Elements in declaration order
    pub elements: Vec<ApiElement>,
}

impl SignatureFile {
    pub fn new(format_version: Option<String>, elements: Vec<ApiElement>) -> Self {
        Self {
            format_version,
            elements,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Type declarations in declaration order
    pub fn types(&self) -> impl Iterator<Item = &ApiElement> {
        self.elements.iter().filter(|e| e.kind.is_type())
    }

    /// Members declared directly inside the type `qualified_name`
    pub fn members_of<'a>(
        &'a self,
        qualified_name: &'a str,
    ) -> impl Iterator<Item = &'a ApiElement> + 'a {
        self.elements
            .iter()
            .filter(move |e| !e.kind.is_type() && e.owner() == qualified_name)
    }
}
