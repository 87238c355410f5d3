// crates/tessera-dataset/src/filter.rs
//
// Listing filters and pagination for the dataset registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tessera_core::Dataset;

/// Criteria for `DatasetManager::list_datasets`. Every set field must
/// match; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted: Option<bool>,
    /// Case-insensitive name match. Without wildcards it matches any name
    /// containing the pattern; with `*` or `?` the whole name must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_after: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_before: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_files: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_files: Option<usize>,
    #[serde(default)]
    pub offset: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// One page of a filtered listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetPage {
    pub items: Vec<Dataset>,
    /// Number of datasets matching the filter before pagination.
    pub total: usize,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl DatasetFilter {
    pub fn matches(&self, dataset: &Dataset) -> bool {
        if let Some(encrypted) = self.encrypted {
            if dataset.encrypted != encrypted {
                return false;
            }
        }
        if let Some(pattern) = &self.name_pattern {
            if !name_matches(pattern, &dataset.name) {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !dataset.tags.iter().any(|t| t == tag) {
                return false;
            }
        }
        if let Some(author) = &self.author {
            if dataset.metadata.author.as_deref() != Some(author.as_str()) {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if dataset.metadata.category.as_deref() != Some(category.as_str()) {
                return false;
            }
        }
        if let Some(after) = self.created_after {
            if dataset.created_at < after {
                return false;
            }
        }
        if let Some(before) = self.created_before {
            if dataset.created_at > before {
                return false;
            }
        }
        let count = dataset.files.len();
        if self.min_files.is_some_and(|min| count < min) {
            return false;
        }
        if self.max_files.is_some_and(|max| count > max) {
            return false;
        }
        true
    }

    /// Filter `datasets` (already in listing order) and cut out the page.
    pub fn apply<'a, I>(&self, datasets: I) -> DatasetPage
    where
        I: IntoIterator<Item = &'a Dataset>,
    {
        let matching: Vec<&Dataset> = datasets.into_iter().filter(|d| self.matches(d)).collect();
        let total = matching.len();
        let items = matching
            .into_iter()
            .skip(self.offset)
            .take(self.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        DatasetPage {
            items,
            total,
            offset: self.offset,
            limit: self.limit,
        }
    }
}

fn name_matches(pattern: &str, name: &str) -> bool {
    let pattern = pattern.to_lowercase();
    let name = name.to_lowercase();
    if pattern.contains(['*', '?']) {
        wildcard_match(&pattern, &name)
    } else {
        name.contains(&pattern)
    }
}

/// Glob match supporting `*` (any run) and `?` (one character).
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((sp, st)) = star {
            // backtrack: let the last star swallow one more character
            pi = sp + 1;
            ti = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::{DatasetConfig, UploadResult};

    fn dataset(name: &str, files: usize, encrypted: bool) -> Dataset {
        let mut config = DatasetConfig::new(name);
        config.encrypt = encrypted;
        config.tags = vec!["genomics".to_string()];
        config.metadata.author = Some("ada".to_string());
        let files = (0..files)
            .map(|i| UploadResult {
                cid: format!("{}-{}", name, i),
                size: 1,
                encrypted,
                access_conditions: None,
                tags: Vec::new(),
                uploaded_at: Utc::now(),
                original_path: format!("/d/{}", i),
                content_hash: None,
            })
            .collect();
        Dataset::new(config, files)
    }

    #[test]
    fn wildcards_and_substrings() {
        assert!(name_matches("cell", "Single-Cell Atlas"));
        assert!(name_matches("single*atlas", "Single-Cell Atlas"));
        assert!(name_matches("s?ngle*", "single"));
        assert!(!name_matches("atlas*", "Single-Cell Atlas"));
        assert!(!name_matches("x", "abc"));
        assert!(wildcard_match("*", ""));
        assert!(wildcard_match("a*b*c", "axxbyyc"));
        assert!(!wildcard_match("a*b?c", "abc"));
    }

    #[test]
    fn every_set_criterion_must_match() {
        let d = dataset("proteins", 3, true);
        let mut filter = DatasetFilter {
            encrypted: Some(true),
            tag: Some("genomics".to_string()),
            author: Some("ada".to_string()),
            min_files: Some(3),
            max_files: Some(3),
            ..DatasetFilter::default()
        };
        assert!(filter.matches(&d));

        filter.category = Some("biology".to_string());
        assert!(!filter.matches(&d));

        let filter = DatasetFilter {
            encrypted: Some(false),
            ..DatasetFilter::default()
        };
        assert!(!filter.matches(&d));
    }

    #[test]
    fn pagination_reports_total_before_slicing() {
        let all: Vec<Dataset> = (0..5).map(|i| dataset(&format!("d{}", i), 1, false)).collect();
        let filter = DatasetFilter {
            offset: 1,
            limit: Some(2),
            ..DatasetFilter::default()
        };
        let page = filter.apply(&all);
        assert_eq!(page.total, 5);
        let names: Vec<&str> = page.items.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["d1", "d2"]);

        let past_end = DatasetFilter {
            offset: 10,
            ..DatasetFilter::default()
        };
        assert!(past_end.apply(&all).items.is_empty());
    }
}
