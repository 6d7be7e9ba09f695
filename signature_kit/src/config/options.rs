//! Closed option sets of the configuration surface.
//!
//! Each enum parses from the lowercase spelling used in `sigguard.toml` and on
//! the command line; unknown spellings are rejected at construction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigurationError;

/// Signature file format version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    V1,
    V2,
    V3,
    V4,
}

impl Format {
    /// Version string written in the `// Signature format:` header.
    ///
    /// V1 predates the header and has none.
    pub fn header_version(&self) -> Option<&'static str> {
        match self {
            Format::V1 => None,
            Format::V2 => Some("2.0"),
            Format::V3 => Some("3.0"),
            Format::V4 => Some("4.0"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::V1 => "v1",
            Format::V2 => "v2",
            Format::V3 => "v3",
            Format::V4 => "v4",
        }
    }
}

impl FromStr for Format {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(Format::V1),
            "v2" | "2" => Ok(Format::V2),
            "v3" | "3" => Ok(Format::V3),
            "v4" | "4" => Ok(Format::V4),
            _ => Err(unknown("format", s, "v1, v2, v3, v4")),
        }
    }
}

/// Which signature file the tool writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureKind {
    Api,
    Removed,
}

impl SignatureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureKind::Api => "api",
            SignatureKind::Removed => "removed",
        }
    }
}

impl FromStr for SignatureKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "api" => Ok(SignatureKind::Api),
            "removed" | "removed-api" => Ok(SignatureKind::Removed),
            _ => Err(unknown("signature", s, "api, removed")),
        }
    }
}

/// Which surface a check run verifies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiType {
    Api,
    Removed,
}

impl ApiType {
    /// The signature kind a check of this surface generates
    pub fn signature_kind(&self) -> SignatureKind {
        match self {
            ApiType::Api => SignatureKind::Api,
            ApiType::Removed => SignatureKind::Removed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.signature_kind().as_str()
    }
}

impl FromStr for ApiType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "api" => Ok(ApiType::Api),
            "removed" => Ok(ApiType::Removed),
            _ => Err(unknown("api_type", s, "api, removed")),
        }
    }
}

/// Minimum visibility of elements included in the signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentationVisibility {
    Private,
    Package,
    Protected,
    Public,
    Hidden,
}

impl DocumentationVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentationVisibility::Private => "private",
            DocumentationVisibility::Package => "package",
            DocumentationVisibility::Protected => "protected",
            DocumentationVisibility::Public => "public",
            DocumentationVisibility::Hidden => "hidden",
        }
    }
}

impl FromStr for DocumentationVisibility {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "private" => Ok(DocumentationVisibility::Private),
            "package" => Ok(DocumentationVisibility::Package),
            "protected" => Ok(DocumentationVisibility::Protected),
            "public" => Ok(DocumentationVisibility::Public),
            "hidden" => Ok(DocumentationVisibility::Hidden),
            _ => Err(unknown(
                "documentation",
                s,
                "private, package, protected, public, hidden",
            )),
        }
    }
}

/// Java language level passed to the tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JavaSourceLevel {
    #[serde(rename = "1.8", alias = "8")]
    Java8,
    #[serde(rename = "11")]
    Java11,
    #[serde(rename = "17")]
    Java17,
    #[serde(rename = "21")]
    Java21,
}

impl JavaSourceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            JavaSourceLevel::Java8 => "1.8",
            JavaSourceLevel::Java11 => "11",
            JavaSourceLevel::Java17 => "17",
            JavaSourceLevel::Java21 => "21",
        }
    }
}

impl FromStr for JavaSourceLevel {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1.8" | "8" => Ok(JavaSourceLevel::Java8),
            "11" => Ok(JavaSourceLevel::Java11),
            "17" => Ok(JavaSourceLevel::Java17),
            "21" => Ok(JavaSourceLevel::Java21),
            _ => Err(unknown("java_source_level", s, "1.8, 11, 17, 21")),
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

display_as_str!(
    Format,
    SignatureKind,
    ApiType,
    DocumentationVisibility,
    JavaSourceLevel
);

fn unknown(field: &'static str, value: &str, expected: &'static str) -> ConfigurationError {
    ConfigurationError::UnknownValue {
        field,
        value: value.to_string(),
        expected,
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing_and_header() {
        assert_eq!("V4".parse::<Format>().unwrap(), Format::V4);
        assert_eq!("2".parse::<Format>().unwrap(), Format::V2);
        assert_eq!(Format::V1.header_version(), None);
        assert_eq!(Format::V3.header_version(), Some("3.0"));
        assert!("v9".parse::<Format>().is_err());
    }

    #[test]
    fn test_api_type_rejects_unknown() {
        let err = "public".parse::<ApiType>().unwrap_err();
        assert!(err.to_string().contains("api_type"));
        assert_eq!(ApiType::Removed.signature_kind(), SignatureKind::Removed);
    }

    #[test]
    fn test_java_source_level_aliases() {
        assert_eq!("8".parse::<JavaSourceLevel>().unwrap(), JavaSourceLevel::Java8);
        assert_eq!(JavaSourceLevel::Java8.to_string(), "1.8");
        assert!("9".parse::<JavaSourceLevel>().is_err());
    }

    #[test]
    fn test_visibility_round_trips_through_display() {
        for v in [
            DocumentationVisibility::Private,
            DocumentationVisibility::Package,
            DocumentationVisibility::Protected,
            DocumentationVisibility::Public,
            DocumentationVisibility::Hidden,
        ] {
            assert_eq!(v.to_string().parse::<DocumentationVisibility>().unwrap(), v);
        }
    }
}
