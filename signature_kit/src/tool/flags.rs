//! Flag spellings of the extraction tool
//!
//! Every command-line token the argument builder emits is spelled here and
//! nowhere else.

use crate::config::{DocumentationVisibility, SignatureKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    NoBanner,
    SourcePath,
    JavaSource,
    Format,
    ShowPackage,
    ShowProtected,
    ShowPublic,
    ShowHidden,
    Api,
    RemovedApi,
    OutputKotlinNulls,
    InputKotlinNulls,
    OutputDefaultValues,
    IncludeSignatureVersion,
    HidePackage,
    HideAnnotation,
    WarningsAsErrors,
    LintsAsErrors,
}

impl Flag {
    pub fn spelling(&self) -> &'static str {
        match self {
            Flag::NoBanner => "--no-banner",
            Flag::SourcePath => "--source-path",
            Flag::JavaSource => "--java-source",
            Flag::Format => "--format",
            Flag::ShowPackage => "--package",
            Flag::ShowProtected => "--protected",
            Flag::ShowPublic => "--public",
            Flag::ShowHidden => "--hidden",
            Flag::Api => "--api",
            Flag::RemovedApi => "--removed-api",
            Flag::OutputKotlinNulls => "--output-kotlin-nulls",
            Flag::InputKotlinNulls => "--input-kotlin-nulls",
            Flag::OutputDefaultValues => "--output-default-values",
            Flag::IncludeSignatureVersion => "--include-signature-version",
            Flag::HidePackage => "--hide-package",
            Flag::HideAnnotation => "--hide-annotation",
            Flag::WarningsAsErrors => "--warnings-as-errors",
            Flag::LintsAsErrors => "--lints-as-errors",
        }
    }

    /// `--flag=value` form
    pub fn with_value(&self, value: &str) -> String {
        format!("{}={}", self.spelling(), value)
    }

    /// `--flag=yes` / `--flag=no`
    pub fn toggle(&self, enabled: bool) -> String {
        self.with_value(if enabled { "yes" } else { "no" })
    }

    /// Visibility flag; `None` for the tool's inclusive default
    pub fn for_visibility(visibility: DocumentationVisibility) -> Option<Flag> {
        match visibility {
            DocumentationVisibility::Private => None,
            DocumentationVisibility::Package => Some(Flag::ShowPackage),
            DocumentationVisibility::Protected => Some(Flag::ShowProtected),
            DocumentationVisibility::Public => Some(Flag::ShowPublic),
            DocumentationVisibility::Hidden => Some(Flag::ShowHidden),
        }
    }

    pub fn for_signature(kind: SignatureKind) -> Flag {
        match kind {
            SignatureKind::Api => Flag::Api,
            SignatureKind::Removed => Flag::RemovedApi,
        }
    }
}

/// Tool defaults; a toggle equal to its default is not emitted
pub const DEFAULT_OUTPUT_KOTLIN_NULLS: bool = true;
pub const DEFAULT_INPUT_KOTLIN_NULLS: bool = false;
pub const DEFAULT_OUTPUT_DEFAULT_VALUES: bool = true;
pub const DEFAULT_INCLUDE_SIGNATURE_VERSION: bool = true;

/// Separator joining source directories into one argument
pub const SOURCE_PATH_SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };
