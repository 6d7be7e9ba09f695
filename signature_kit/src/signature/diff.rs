//! Structural difference between two signature files

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::model::{ApiElement, ElementKey, SignatureFile};

/// Kind of a single drift entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    Added,
    Removed,
    Changed,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Added => "ADDED",
            ChangeKind::Removed => "REMOVED",
            ChangeKind::Changed => "CHANGED",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Element present on both sides with differing attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedElement {
    pub old: ApiElement,
    pub new: ApiElement,
}

impl ChangedElement {
    pub fn signature(&self) -> &str {
        &self.new.qualified_signature
    }

    /// Human readable summary of what changed
    pub fn describe(&self) -> String {
        self.old.differences(&self.new).join("; ")
    }
}

/// Result of [`diff`]
///
/// Each list is sorted by qualified signature. The three lists never share
/// a key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    pub added: Vec<ApiElement>,
    pub removed: Vec<ApiElement>,
    pub changed: Vec<ChangedElement>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.changed.len()
    }

    /// Every entry as `(kind, signature)`, sorted by signature
    pub fn entries(&self) -> Vec<(ChangeKind, &str)> {
        let mut entries: Vec<(ChangeKind, &str)> = self
            .added
            .iter()
            .map(|e| (ChangeKind::Added, e.qualified_signature.as_str()))
            .chain(
                self.removed
                    .iter()
                    .map(|e| (ChangeKind::Removed, e.qualified_signature.as_str())),
            )
            .chain(self.changed.iter().map(|c| (ChangeKind::Changed, c.signature())))
            .collect();
        entries.sort_by(|a, b| a.1.cmp(b.1).then(a.0.cmp(&b.0)));
        entries
    }

    /// `ADDED|REMOVED|CHANGED <signature>` lines in lexicographic order
    pub fn report_lines(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .map(|(kind, signature)| format!("{} {}", kind, signature))
            .collect()
    }
}

/// Compare `current` against `baseline`
///
/// Elements are matched by [`ElementKey`]. When a file declares the same key
/// twice the first declaration is used.
pub fn diff(baseline: &SignatureFile, current: &SignatureFile) -> DiffResult {
    let before = index(baseline);
    let after = index(current);
    let mut result = DiffResult::default();

    for (key, old) in &before {
        match after.get(key) {
            None => result.removed.push((*old).clone()),
            Some(new) if !old.differences(new).is_empty() => {
                result.changed.push(ChangedElement {
                    old: (*old).clone(),
                    new: (*new).clone(),
                });
            }
            Some(_) => {}
        }
    }
    for (key, new) in &after {
        if !before.contains_key(key) {
            result.added.push((*new).clone());
        }
    }

    log::debug!(
        "Diff computed: added={} removed={} changed={}",
        result.added.len(),
        result.removed.len(),
        result.changed.len()
    );
    result
}

fn index(file: &SignatureFile) -> BTreeMap<ElementKey, &ApiElement> {
    let mut map = BTreeMap::new();
    for element in &file.elements {
        map.entry(element.key()).or_insert(element);
    }
    map
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::model::{ElementKind, Nullability, Parameter};
    use crate::signature::parser::{parse, ParseOptions};
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    const OPTIONS: ParseOptions = ParseOptions {
        kotlin_nulls: true,
        require_header: true,
    };

    const BASELINE: &str = "// Signature format: 4.0\npackage foo {\n\n  public class Bar {\n    ctor public Bar();\n    method public void baz(int);\n    method public String name();\n  }\n\n}\n";

    #[test]
    fn test_identical_files_have_no_drift() {
        let file = parse(BASELINE, OPTIONS).unwrap();
        let result = diff(&file, &file);
        assert!(result.is_empty());
        assert!(result.report_lines().is_empty());
    }

    #[test]
    fn test_removed_method_reported_once() {
        let baseline = parse(BASELINE, OPTIONS).unwrap();
        let current = parse(&BASELINE.replace("    method public void baz(int);\n", ""), OPTIONS)
            .unwrap();
        let result = diff(&baseline, &current);
        assert_eq!(result.removed.len(), 1);
        assert_eq!(result.removed[0].qualified_signature, "foo.Bar#baz(int)");
        assert!(result.added.is_empty());
        assert!(result.changed.is_empty());
        assert_eq!(result.report_lines(), vec!["REMOVED foo.Bar#baz(int)"]);
    }

    #[test]
    fn test_nullability_change_is_changed_pair() {
        let baseline = parse(BASELINE, OPTIONS).unwrap();
        let current = parse(&BASELINE.replace("String name()", "String? name()"), OPTIONS).unwrap();
        let result = diff(&baseline, &current);
        assert!(result.added.is_empty() && result.removed.is_empty());
        assert_eq!(result.changed.len(), 1);
        assert_eq!(result.changed[0].old.nullability, Nullability::NonNull);
        assert_eq!(result.changed[0].new.nullability, Nullability::Nullable);
        assert!(result.changed[0].describe().contains("nullability"));
        assert_eq!(result.report_lines(), vec!["CHANGED foo.Bar#name()"]);
    }

    #[test]
    fn test_overload_change_is_add_and_remove() {
        let baseline = parse(BASELINE, OPTIONS).unwrap();
        let current = parse(&BASELINE.replace("baz(int)", "baz(long)"), OPTIONS).unwrap();
        let result = diff(&baseline, &current);
        assert_eq!(
            result.report_lines(),
            vec!["REMOVED foo.Bar#baz(int)", "ADDED foo.Bar#baz(long)"]
        );
    }

    #[test]
    fn test_declaration_order_is_irrelevant() {
        let baseline = parse(BASELINE, OPTIONS).unwrap();
        let mut shuffled = baseline.clone();
        shuffled.elements.reverse();
        assert!(diff(&baseline, &shuffled).is_empty());
    }

    fn element(name: &str, nullable: bool, is_final: bool) -> ApiElement {
        let mut e = ApiElement::new_member(ElementKind::Method, "p", "p.T", name);
        e.parameters = vec![Parameter::new("int")];
        e.qualified_signature = ApiElement::member_signature("p.T", name, &e.parameters);
        e.type_name = Some("String".to_string());
        e.nullability = if nullable {
            Nullability::Nullable
        } else {
            Nullability::NonNull
        };
        if is_final {
            e.modifiers.insert("final".to_string());
        }
        e
    }

    fn arb_file() -> impl Strategy<Value = SignatureFile> {
        prop::collection::vec(("[a-e]", any::<bool>(), any::<bool>()), 0..10).prop_map(|specs| {
            let elements = specs
                .into_iter()
                .map(|(name, nullable, is_final)| element(&name, nullable, is_final))
                .collect();
            SignatureFile::new(None, elements)
        })
    }

    fn keys(elements: &[ApiElement]) -> BTreeSet<ElementKey> {
        elements.iter().map(ApiElement::key).collect()
    }

    proptest! {
        #[test]
        fn prop_diff_partitions_key_union(a in arb_file(), b in arb_file()) {
            let result = diff(&a, &b);
            let added = keys(&result.added);
            let removed = keys(&result.removed);
            let changed: BTreeSet<_> = result.changed.iter().map(|c| c.new.key()).collect();

            prop_assert!(added.is_disjoint(&removed));
            prop_assert!(added.is_disjoint(&changed));
            prop_assert!(removed.is_disjoint(&changed));

            let before = keys(&a.elements);
            let after = keys(&b.elements);
            prop_assert_eq!(added, after.difference(&before).cloned().collect::<BTreeSet<_>>());
            prop_assert_eq!(removed, before.difference(&after).cloned().collect::<BTreeSet<_>>());
            prop_assert!(changed.is_subset(&before.intersection(&after).cloned().collect()));
        }

        #[test]
        fn prop_diff_is_symmetric(a in arb_file(), b in arb_file()) {
            let forward = diff(&a, &b);
            let backward = diff(&b, &a);
            prop_assert_eq!(&forward.added, &backward.removed);
            prop_assert_eq!(&forward.removed, &backward.added);
            prop_assert_eq!(forward.changed.len(), backward.changed.len());
            for (f, b) in forward.changed.iter().zip(backward.changed.iter()) {
                prop_assert_eq!(&f.old, &b.new);
                prop_assert_eq!(&f.new, &b.old);
            }
        }

        #[test]
        fn prop_self_diff_is_empty(a in arb_file()) {
            prop_assert!(diff(&a, &a).is_empty());
        }
    }
}
