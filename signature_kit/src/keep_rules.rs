//! Keep rules derived from the accepted signature
//!
//! One `-keep class <name> { *; }` line per top-level type that retains at
//! least one visible member, in declaration order. No header.

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::config::Configuration;
use crate::errors::PipelineError;
use crate::signature::{ApiElement, SignatureFile};

/// Render keep rules, or `None` when no keep file is configured
pub fn generate(signature: &SignatureFile, config: &Configuration) -> Option<String> {
    config.keep_filename()?;

    let hidden = config.hidden_annotations();
    let mut rules = String::new();
    for declared in signature.types().filter(|t| !t.simple_name().contains('.')) {
        let retained = signature
            .members_of(&declared.qualified_signature)
            .any(|m| !is_hidden(m, hidden));
        if retained {
            rules.push_str(&format!("-keep class {} {{ *; }}\n", declared.qualified_signature));
        }
    }
    Some(rules)
}

/// Write the keep file in full, replacing any previous content
///
/// Returns the written path, or `None` without touching the filesystem when
/// no keep file is configured.
pub fn write_keep_file(
    signature: &SignatureFile,
    config: &Configuration,
) -> Result<Option<PathBuf>, PipelineError> {
    let (Some(path), Some(rules)) = (config.keep_path(), generate(signature, config)) else {
        return Ok(None);
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }
    std::fs::write(&path, rules).map_err(|e| PipelineError::io(&path, e))?;
    log::info!("Wrote keep rules to {}", path.display());
    Ok(Some(path))
}

/// Carries an annotation listed in `hidden` (matched by full or simple name)
fn is_hidden(member: &ApiElement, hidden: &BTreeSet<String>) -> bool {
    member
        .modifiers
        .iter()
        .filter_map(|m| m.strip_prefix('@'))
        .map(|a| a.split('(').next().unwrap_or(a))
        .any(|annotation| {
            hidden.iter().any(|h| {
                h == annotation || h.rsplit('.').next() == Some(annotation)
            })
        })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::{parse, ParseOptions};
    use std::fs;

    const SIGNATURE: &str = "// Signature format: 4.0\npackage foo {\n  public class Bar {\n    method public void baz(int);\n    public static class Inner {\n      method public void run();\n    }\n  }\n  public class Empty {\n  }\n  public class Internal {\n    method @RestrictTo(LIBRARY) public void hidden();\n  }\n}\npackage zed {\n  public interface Api {\n    field public static final int X = 1;\n  }\n}\n";

    fn signature() -> SignatureFile {
        parse(
            SIGNATURE,
            ParseOptions {
                kotlin_nulls: true,
                require_header: true,
            },
        )
        .unwrap()
    }

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        dir
    }

    #[test]
    fn test_absent_keep_filename_touches_nothing() {
        let dir = project();
        let config = Configuration::builder().build(dir.path()).unwrap();
        assert!(generate(&signature(), &config).is_none());
        assert!(write_keep_file(&signature(), &config).unwrap().is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_one_rule_per_retained_top_level_type() {
        let dir = project();
        let config = Configuration::builder()
            .keep_filename("keep.pro")
            .hidden_annotation("androidx.annotation.RestrictTo")
            .build(dir.path())
            .unwrap();
        let rules = generate(&signature(), &config).unwrap();
        assert_eq!(
            rules,
            "-keep class foo.Bar { *; }\n-keep class zed.Api { *; }\n"
        );
    }

    #[test]
    fn test_keep_file_overwritten_in_full() {
        let dir = project();
        let config = Configuration::builder()
            .keep_filename("proguard/api.pro")
            .build(dir.path())
            .unwrap();
        let path = dir.path().join("proguard/api.pro");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "-keep class stale.Entry { *; }\n".repeat(20)).unwrap();

        let written = write_keep_file(&signature(), &config).unwrap().unwrap();
        let text = fs::read_to_string(written).unwrap();
        assert!(!text.contains("stale"));
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().all(|l| l.starts_with("-keep class ")));
    }
}
