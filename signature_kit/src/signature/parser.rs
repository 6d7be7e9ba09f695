//! Signature file parser
//!
//! Line oriented: every declaration occupies one line. Package and type
//! declarations open a block with `{`, members end with `;`. Nested type
//! blocks inherit the enclosing type's name as a prefix.

use std::collections::{BTreeSet, HashSet};

use super::model::{
    is_modifier, ApiElement, ElementKey, ElementKind, Nullability, Parameter, SignatureFile,
};
use crate::errors::MalformedSignatureError;

/// Prefix of the version header line
pub const HEADER_PREFIX: &str = "// Signature format:";

/// Header versions this parser understands
pub const SUPPORTED_VERSIONS: &[&str] = &["2.0", "3.0", "4.0"];

const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

/// How a signature text is to be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    /// Decode `?`/`!` nullability suffixes
    pub kotlin_nulls: bool,
    /// Reject text without a `// Signature format:` header
    pub require_header: bool,
}

enum Block {
    Package(String),
    Type { package: String, simple: String },
}

/// Parse signature text into a [`SignatureFile`]
pub fn parse(text: &str, options: ParseOptions) -> Result<SignatureFile, MalformedSignatureError> {
    let mut format_version = None;
    let mut header_checked = false;
    let mut stack: Vec<Block> = Vec::new();
    let mut elements: Vec<ApiElement> = Vec::new();
    let mut seen = HashSet::new();

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if !header_checked {
            header_checked = true;
            if let Some(version) = line.strip_prefix(HEADER_PREFIX) {
                let version = version.trim();
                if !SUPPORTED_VERSIONS.contains(&version) {
                    return Err(MalformedSignatureError::UnknownHeader(version.to_string()));
                }
                format_version = Some(version.to_string());
                continue;
            }
            if options.require_header {
                return Err(MalformedSignatureError::MissingHeader);
            }
        }

        if line.starts_with("//") {
            continue;
        }

        let syntax = |reason| MalformedSignatureError::syntax(line_no, reason, line);

        if let Some(rest) = line.strip_prefix("package ") {
            let name = rest
                .strip_suffix('{')
                .map(str::trim)
                .ok_or_else(|| syntax("package declaration must open a block"))?;
            if !stack.is_empty() {
                return Err(syntax("package declaration must be top level"));
            }
            if !is_qualified_identifier(name) {
                return Err(syntax("invalid package name"));
            }
            stack.push(Block::Package(name.to_string()));
        } else if line == "}" {
            stack.pop().ok_or_else(|| syntax("unbalanced closing brace"))?;
        } else if let Some(declaration) = line.strip_suffix('{') {
            let (package, outer) = match stack.last() {
                Some(Block::Package(package)) => (package.clone(), None),
                Some(Block::Type { package, simple }) => (package.clone(), Some(simple.clone())),
                None => return Err(syntax("type declaration outside a package")),
            };
            let element = parse_type(declaration.trim(), &package, outer.as_deref())
                .map_err(syntax)?;
            let simple = element.simple_name().to_string();
            record(&mut elements, &mut seen, element);
            stack.push(Block::Type { package, simple });
        } else {
            let (package, owner) = match stack.last() {
                Some(Block::Type { package, simple }) => {
                    (package.clone(), format!("{}.{}", package, simple))
                }
                _ => return Err(syntax("member declaration outside a type")),
            };
            let element =
                parse_member(line, &package, &owner, options.kotlin_nulls).map_err(syntax)?;
            record(&mut elements, &mut seen, element);
        }
    }

    if !header_checked && options.require_header {
        return Err(MalformedSignatureError::MissingHeader);
    }
    if !stack.is_empty() {
        return Err(MalformedSignatureError::UnclosedBlock { open: stack.len() });
    }

    log::debug!(
        "Parsed signature: version={} elements={}",
        format_version.as_deref().unwrap_or("none"),
        elements.len()
    );
    Ok(SignatureFile::new(format_version, elements))
}

fn record(
    elements: &mut Vec<ApiElement>,
    seen: &mut HashSet<ElementKey>,
    element: ApiElement,
) {
    if !seen.insert(element.key()) {
        log::warn!(
            "Duplicate declaration of {}; the first occurrence is used for comparison",
            element.qualified_signature
        );
    }
    elements.push(element);
}

fn parse_type(
    declaration: &str,
    package: &str,
    outer: Option<&str>,
) -> Result<ApiElement, &'static str> {
    let tokens = split_top_level(declaration, char::is_whitespace);
    let (position, kind) = tokens
        .iter()
        .enumerate()
        .find_map(|(i, t)| ElementKind::type_from_keyword(t).map(|k| (i, k)))
        .ok_or("missing type keyword")?;

    let name_token = tokens.get(position + 1).ok_or("missing type name")?;
    let (name, type_parameters) = match name_token.find('<') {
        Some(i) => (&name_token[..i], Some(name_token[i..].to_string())),
        None => (*name_token, None),
    };
    // Nested types may also be written flat as `Outer.Inner`
    if !is_qualified_identifier(name) {
        return Err("invalid type name");
    }

    let simple = match outer {
        Some(outer) => format!("{}.{}", outer, name),
        None => name.to_string(),
    };
    let mut element = ApiElement::new_type(kind, package, &simple);
    element.modifiers = tokens[..position].iter().map(|t| t.to_string()).collect();
    element.type_parameters = type_parameters;
    let clause = tokens[position + 2..].join(" ");
    if !clause.is_empty() {
        element.type_name = Some(clause);
    }
    Ok(element)
}

fn parse_member(
    line: &str,
    package: &str,
    owner: &str,
    kotlin_nulls: bool,
) -> Result<ApiElement, &'static str> {
    let end = find_statement_end(line).ok_or("missing ';'")?;
    let trailer = line[end + 1..].trim();
    if !trailer.is_empty() && !trailer.starts_with("//") {
        return Err("unexpected text after ';'");
    }

    let tokens = split_top_level(line[..end].trim(), char::is_whitespace);
    let (keyword, rest) = tokens.split_first().ok_or("empty declaration")?;
    let kind = ElementKind::member_from_keyword(keyword).ok_or("unknown declaration keyword")?;

    if kind.is_callable() {
        parse_callable(kind, rest, package, owner, kotlin_nulls)
    } else {
        parse_variable(kind, rest, package, owner, kotlin_nulls)
    }
}

fn parse_callable(
    kind: ElementKind,
    tokens: &[&str],
    package: &str,
    owner: &str,
    kotlin_nulls: bool,
) -> Result<ApiElement, &'static str> {
    let call = tokens
        .iter()
        .position(|t| is_call_token(t))
        .ok_or("missing parameter list")?;
    let token = tokens[call];
    let open = token.find('(').ok_or("missing parameter list")?;
    let name = &token[..open];
    if !is_qualified_identifier(name) {
        return Err("invalid member name");
    }
    let parameters = parse_parameters(&token[open + 1..token.len() - 1], kotlin_nulls)?;

    let (modifiers, type_parameters, type_tokens) = split_prefix(&tokens[..call]);

    let mut element = ApiElement::new_member(kind, package, owner, name);
    match kind {
        ElementKind::Method => {
            if type_tokens.is_empty() {
                return Err("missing return type");
            }
            let (type_name, nullability) = decode_type(&type_tokens.join(" "), kotlin_nulls);
            element.type_name = Some(type_name);
            element.nullability = nullability;
        }
        _ => {
            if !type_tokens.is_empty() {
                return Err("unexpected return type on constructor");
            }
        }
    }

    element.throws = match tokens[call + 1..].split_first() {
        None => Vec::new(),
        Some((&"throws", thrown)) => {
            let thrown: Vec<String> = thrown
                .join(" ")
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect();
            if thrown.is_empty() {
                return Err("missing thrown types");
            }
            thrown
        }
        Some(_) => return Err("unexpected tokens after parameter list"),
    };

    element.qualified_signature = ApiElement::member_signature(owner, name, &parameters);
    element.has_default_value = parameters.iter().any(Parameter::has_default);
    element.modifiers = modifiers;
    element.type_parameters = type_parameters;
    element.parameters = parameters;
    Ok(element)
}

fn parse_variable(
    kind: ElementKind,
    tokens: &[&str],
    package: &str,
    owner: &str,
    kotlin_nulls: bool,
) -> Result<ApiElement, &'static str> {
    let (declaration, constant_value) = split_assignment(tokens)?;
    let (name, head) = declaration.split_last().ok_or("missing member name")?;
    if !is_identifier(name) {
        return Err("invalid member name");
    }

    let (modifiers, type_parameters, type_tokens) = split_prefix(head);
    if type_parameters.is_some() {
        return Err("unexpected type parameters");
    }
    if type_tokens.is_empty() {
        return Err("missing member type");
    }

    let (type_name, nullability) = decode_type(&type_tokens.join(" "), kotlin_nulls);
    let mut element = ApiElement::new_member(kind, package, owner, name);
    element.modifiers = modifiers;
    element.type_name = Some(type_name);
    element.nullability = nullability;
    element.constant_value = constant_value;
    Ok(element)
}

fn parse_parameters(text: &str, kotlin_nulls: bool) -> Result<Vec<Parameter>, &'static str> {
    let mut parameters = Vec::new();
    for part in split_top_level(text, |c| c == ',') {
        let tokens = split_top_level(part, char::is_whitespace);
        let (optional, tokens) = match tokens.split_first() {
            Some((&"optional", rest)) => (true, rest),
            _ => (false, tokens.as_slice()),
        };
        let (declaration, default_value) = split_assignment(tokens)?;

        let (type_tokens, name) = match declaration.split_last() {
            Some((last, head))
                if !head.is_empty()
                    && is_identifier(last)
                    && head.iter().any(|t| !t.starts_with('@')) =>
            {
                (head, Some(last.to_string()))
            }
            _ => (declaration, None),
        };
        if type_tokens.is_empty() {
            return Err("missing parameter type");
        }

        let (type_name, nullability) = decode_type(&type_tokens.join(" "), kotlin_nulls);
        parameters.push(Parameter {
            type_name,
            nullability,
            name,
            optional,
            default_value,
        });
    }
    Ok(parameters)
}

/// Split `a b = c d` into `[a, b]` and `Some("c d")`
fn split_assignment<'a, 'b>(
    tokens: &'b [&'a str],
) -> Result<(&'b [&'a str], Option<String>), &'static str> {
    match tokens.iter().position(|t| *t == "=") {
        Some(i) => {
            let value = tokens[i + 1..].join(" ");
            if value.is_empty() {
                return Err("missing value after '='");
            }
            Ok((&tokens[..i], Some(value)))
        }
        None => Ok((tokens, None)),
    }
}

/// Leading modifiers, then optional `<…>` type parameters, then the type
fn split_prefix<'a, 'b>(
    tokens: &'b [&'a str],
) -> (BTreeSet<String>, Option<String>, &'b [&'a str]) {
    let count = tokens.iter().take_while(|t| is_modifier(t)).count();
    let modifiers = tokens[..count].iter().map(|t| t.to_string()).collect();
    let rest = &tokens[count..];
    match rest.split_first() {
        Some((first, tail)) if first.starts_with('<') => (modifiers, Some(first.to_string()), tail),
        _ => (modifiers, None, rest),
    }
}

fn is_call_token(token: &str) -> bool {
    !token.starts_with('@')
        && !token.starts_with('<')
        && !token.starts_with('(')
        && token.ends_with(')')
        && token.contains('(')
}

/// Strip the nullability suffix when the Kotlin null encoding is active
pub(crate) fn decode_type(text: &str, kotlin_nulls: bool) -> (String, Nullability) {
    if !kotlin_nulls {
        return (text.to_string(), Nullability::None);
    }
    let (base, varargs) = match text.strip_suffix("...") {
        Some(base) => (base, "..."),
        None => (text, ""),
    };
    let (base, nullability) = if let Some(stripped) = base.strip_suffix('?') {
        (stripped, Nullability::Nullable)
    } else if let Some(stripped) = base.strip_suffix('!') {
        (stripped, Nullability::Unknown)
    } else if is_primitive(base) {
        (base, Nullability::None)
    } else {
        (base, Nullability::NonNull)
    };
    (format!("{}{}", base, varargs), nullability)
}

/// Inverse of [`decode_type`]
pub(crate) fn encode_type(type_name: &str, nullability: Nullability, kotlin_nulls: bool) -> String {
    if !kotlin_nulls {
        return type_name.to_string();
    }
    match type_name.strip_suffix("...") {
        Some(base) => format!("{}{}...", base, nullability.suffix()),
        None => format!("{}{}", type_name, nullability.suffix()),
    }
}

fn is_primitive(type_text: &str) -> bool {
    let last = type_text.rsplit(' ').next().unwrap_or(type_text);
    PRIMITIVES.contains(&last)
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn is_qualified_identifier(s: &str) -> bool {
    !s.is_empty() && s.split('.').all(is_identifier)
}

/// Tracks bracket depth and literals while scanning a declaration
#[derive(Default)]
struct Nesting {
    angle: usize,
    paren: usize,
    quote: Option<char>,
    escaped: bool,
    prev: char,
}

impl Nesting {
    /// Feed one character; true when it sits at top level outside any literal
    fn feed(&mut self, c: char) -> bool {
        let top = if let Some(quote) = self.quote {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == quote {
                self.quote = None;
            }
            false
        } else {
            match c {
                '"' | '\'' => {
                    self.quote = Some(c);
                    false
                }
                '<' => {
                    self.angle += 1;
                    false
                }
                // `->` in function types is not a closing bracket
                '>' if self.prev != '-' => {
                    self.angle = self.angle.saturating_sub(1);
                    false
                }
                '(' => {
                    self.paren += 1;
                    false
                }
                ')' => {
                    self.paren = self.paren.saturating_sub(1);
                    false
                }
                _ => self.angle == 0 && self.paren == 0,
            }
        };
        self.prev = c;
        top
    }
}

pub(crate) fn split_top_level(text: &str, is_separator: impl Fn(char) -> bool) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut nesting = Nesting::default();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if nesting.feed(c) && is_separator(c) {
            let part = text[start..i].trim();
            if !part.is_empty() {
                parts.push(part);
            }
            start = i + c.len_utf8();
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        parts.push(tail);
    }
    parts
}

fn find_statement_end(line: &str) -> Option<usize> {
    let mut nesting = Nesting::default();
    line.char_indices()
        .find(|&(_, c)| nesting.feed(c) && c == ';')
        .map(|(i, _)| i)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const KOTLIN: ParseOptions = ParseOptions {
        kotlin_nulls: true,
        require_header: true,
    };

    const SAMPLE: &str = r#"// Signature format: 4.0
package foo.bar {

  public class Baz extends foo.Base implements foo.Iface {
    ctor public Baz(int);
    method public String? name(optional int x = 1, String!);
    method public static <T> java.util.List<T> wrap(T...) throws java.io.IOException, java.lang.IllegalStateException;
    field public static final int MAX = 5; // 0x5
    field public static final String SEP = "; ";
    property public final String label;
  }

  public enum Color {
    enum_constant public static final foo.bar.Color RED;
  }

}
"#;

    fn find<'a>(file: &'a SignatureFile, signature: &str) -> &'a ApiElement {
        file.elements
            .iter()
            .find(|e| e.qualified_signature == signature)
            .unwrap_or_else(|| panic!("{} not found", signature))
    }

    #[test]
    fn test_parse_sample() {
        let file = parse(SAMPLE, KOTLIN).unwrap();
        assert_eq!(file.format_version.as_deref(), Some("4.0"));
        assert_eq!(file.len(), 9);

        let class = find(&file, "foo.bar.Baz");
        assert_eq!(class.kind, ElementKind::Class);
        assert!(class.modifiers.contains("public"));
        assert_eq!(
            class.type_name.as_deref(),
            Some("extends foo.Base implements foo.Iface")
        );

        let ctor = find(&file, "foo.bar.Baz#Baz(int)");
        assert_eq!(ctor.kind, ElementKind::Constructor);
        assert_eq!(ctor.parameters[0].nullability, Nullability::None);

        let name = find(&file, "foo.bar.Baz#name(int,String)");
        assert_eq!(name.nullability, Nullability::Nullable);
        assert!(name.has_default_value);
        assert_eq!(name.parameters[0].name.as_deref(), Some("x"));
        assert_eq!(name.parameters[0].default_value.as_deref(), Some("1"));
        assert!(name.parameters[0].optional);
        assert_eq!(name.parameters[1].nullability, Nullability::Unknown);

        let wrap = find(&file, "foo.bar.Baz#wrap(T...)");
        assert_eq!(wrap.type_parameters.as_deref(), Some("<T>"));
        assert_eq!(wrap.type_name.as_deref(), Some("java.util.List<T>"));
        assert_eq!(wrap.throws.len(), 2);

        let max = find(&file, "foo.bar.Baz#MAX");
        assert_eq!(max.constant_value.as_deref(), Some("5"));
        assert_eq!(max.nullability, Nullability::None);

        let sep = find(&file, "foo.bar.Baz#SEP");
        assert_eq!(sep.constant_value.as_deref(), Some("\"; \""));
        assert_eq!(sep.nullability, Nullability::NonNull);

        let label = find(&file, "foo.bar.Baz#label");
        assert_eq!(label.kind, ElementKind::Property);

        let red = find(&file, "foo.bar.Color#RED");
        assert_eq!(red.kind, ElementKind::EnumConstant);
    }

    #[test]
    fn test_nullability_not_decoded_without_mode() {
        let options = ParseOptions {
            kotlin_nulls: false,
            require_header: true,
        };
        let file = parse(SAMPLE, options).unwrap();
        let name = find(&file, "foo.bar.Baz#name(int,String!)");
        assert_eq!(name.nullability, Nullability::None);
        assert_eq!(name.type_name.as_deref(), Some("String?"));
    }

    #[test]
    fn test_nested_type_inherits_prefix() {
        let text = "// Signature format: 4.0\npackage foo {\n  public class Outer {\n    public static class Inner {\n      method public void run();\n    }\n    field public int x;\n  }\n}\n";
        let file = parse(text, KOTLIN).unwrap();
        let inner = find(&file, "foo.Outer.Inner");
        assert_eq!(inner.simple_name(), "Outer.Inner");
        assert_eq!(find(&file, "foo.Outer.Inner#run()").owner(), "foo.Outer.Inner");
        assert_eq!(find(&file, "foo.Outer#x").owner(), "foo.Outer");
    }

    #[test]
    fn test_header_rules() {
        let body = "package foo {\n}\n";
        assert_eq!(
            parse(body, KOTLIN).unwrap_err(),
            MalformedSignatureError::MissingHeader
        );
        assert_eq!(parse("", KOTLIN).unwrap_err(), MalformedSignatureError::MissingHeader);

        let lenient = ParseOptions {
            kotlin_nulls: true,
            require_header: false,
        };
        let file = parse(body, lenient).unwrap();
        assert!(file.format_version.is_none());
        assert!(file.is_empty());

        let err = parse("// Signature format: 9.9\n", lenient).unwrap_err();
        assert_eq!(err, MalformedSignatureError::UnknownHeader("9.9".to_string()));
    }

    #[test]
    fn test_malformed_bodies_report_line() {
        let cases = [
            ("// Signature format: 4.0\nmethod public void x();\n", 2),
            ("// Signature format: 4.0\npackage foo {\n  method public void x();\n}\n", 3),
            ("// Signature format: 4.0\npackage foo {\n}\n}\n", 4),
            ("// Signature format: 4.0\npackage foo {\n  public class A {\n    blob x;\n  }\n}\n", 4),
            ("// Signature format: 4.0\npackage foo {\n  public class A {\n    method public void x()\n  }\n}\n", 4),
        ];
        for (text, expected_line) in cases {
            match parse(text, KOTLIN).unwrap_err() {
                MalformedSignatureError::Syntax { line, .. } => assert_eq!(line, expected_line),
                other => panic!("unexpected error {:?}", other),
            }
        }
    }

    #[test]
    fn test_unclosed_block() {
        let err = parse("// Signature format: 4.0\npackage foo {\n  public class A {\n", KOTLIN)
            .unwrap_err();
        assert_eq!(err, MalformedSignatureError::UnclosedBlock { open: 2 });
    }

    #[test]
    fn test_type_encoding_inverse() {
        for text in ["String?", "int", "String", "String!...", "int[]?"] {
            let (base, nullability) = decode_type(text, true);
            assert_eq!(encode_type(&base, nullability, true), text);
        }
    }

    #[test]
    fn test_split_respects_nesting_and_literals() {
        let tokens = split_top_level(
            "public java.util.Map<K, V> get(K key, @Ann(a = 1) V) \"a b\"",
            char::is_whitespace,
        );
        assert_eq!(
            tokens,
            vec![
                "public",
                "java.util.Map<K, V>",
                "get(K key, @Ann(a = 1) V)",
                "\"a b\""
            ]
        );
    }
}
