// crates/tessera-versioning/src/bump.rs
//
// Version-bump policy. Evaluated in priority order, first match wins:
//
//   1. any removed file                          -> major
//   2. any added file                            -> minor
//   3. modified file / metadata / config change  -> patch
//   4. nothing detected                          -> patch (revision marker)

use tessera_core::{BumpKind, VersionChanges};

/// Decide the bump for a change descriptor.
pub fn determine_bump(changes: &VersionChanges) -> BumpKind {
    if !changes.removed.is_empty() {
        BumpKind::Major
    } else if !changes.added.is_empty() {
        BumpKind::Minor
    } else {
        // Rules 3 and 4 both land here; an empty descriptor still records
        // a revision.
        BumpKind::Patch
    }
}

/// Human-readable summary of a change descriptor.
pub fn summarize(changes: &VersionChanges) -> String {
    let mut parts = Vec::new();
    if !changes.added.is_empty() {
        parts.push(format!("added {}", plural(changes.added.len(), "file")));
    }
    if !changes.removed.is_empty() {
        parts.push(format!("removed {}", plural(changes.removed.len(), "file")));
    }
    if !changes.modified.is_empty() {
        parts.push(format!("modified {}", plural(changes.modified.len(), "file")));
    }
    if changes.metadata_changed {
        parts.push("metadata updated".to_string());
    }
    if changes.config_changed {
        parts.push("configuration updated".to_string());
    }

    if parts.is_empty() {
        return "No changes".to_string();
    }
    let mut summary = parts.join(", ");
    if let Some(first) = summary.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    summary
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", n, noun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("cid{}", i)).collect()
    }

    #[test]
    fn removal_wins_over_everything() {
        let changes = VersionChanges {
            added: ids(3),
            removed: ids(1),
            modified: ids(2),
            metadata_changed: true,
            config_changed: true,
            ..VersionChanges::default()
        };
        assert_eq!(determine_bump(&changes), BumpKind::Major);
    }

    #[test]
    fn addition_without_removal_is_minor() {
        let changes = VersionChanges {
            added: ids(1),
            metadata_changed: true,
            ..VersionChanges::default()
        };
        assert_eq!(determine_bump(&changes), BumpKind::Minor);
    }

    #[test]
    fn other_changes_are_patch() {
        for changes in [
            VersionChanges {
                modified: ids(1),
                ..VersionChanges::default()
            },
            VersionChanges {
                metadata_changed: true,
                ..VersionChanges::default()
            },
            VersionChanges {
                config_changed: true,
                ..VersionChanges::default()
            },
        ] {
            assert_eq!(determine_bump(&changes), BumpKind::Patch);
        }
    }

    #[test]
    fn empty_changes_still_bump_patch() {
        assert_eq!(determine_bump(&VersionChanges::default()), BumpKind::Patch);
    }

    #[test]
    fn summary_lists_each_kind_of_change() {
        let changes = VersionChanges {
            added: ids(2),
            removed: ids(1),
            metadata_changed: true,
            ..VersionChanges::default()
        };
        assert_eq!(
            summarize(&changes),
            "Added 2 files, removed 1 file, metadata updated"
        );
        assert_eq!(summarize(&VersionChanges::default()), "No changes");
    }
}
