//! Version Selector - picks the versions to republish
//!
//! Filters the registry's version list with an optional include list
//! (`--versions`) and an optional exclude list (`--exclude-versions`).
//! Exclusion is applied after inclusion, and the registry order is kept.
//!
//! # Example
//!
//! ```
//! use republish_npm::selection::select;
//!
//! let all = vec!["1.0.0".to_string(), "1.1.0".to_string(), "2.0.0".to_string()];
//! let picked = select(&all, Some("2.0.0, 1.0.0"), None);
//!
//! assert_eq!(picked, vec!["1.0.0", "2.0.0"]);
//! ```

use std::collections::HashSet;

/// Split a comma list, trimming whitespace and dropping empty tokens
pub fn parse_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Include/exclude filter over version identifiers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionFilter {
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
}

impl VersionFilter {
    /// Build a filter from the raw comma lists.
    ///
    /// A blank argument counts as absent.
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Self {
        let parse = |raw: Option<&str>| {
            raw.filter(|value| !value.trim().is_empty())
                .map(parse_list)
        };

        Self {
            include: parse(include),
            exclude: parse(exclude),
        }
    }

    pub fn include(&self) -> Option<&[String]> {
        self.include.as_deref()
    }

    pub fn exclude(&self) -> Option<&[String]> {
        self.exclude.as_deref()
    }

    /// Ordered subset of `all` that passes the filter
    pub fn select(&self, all: &[String]) -> Vec<String> {
        let included = self.apply_include(all);

        match &self.exclude {
            Some(exclude) => {
                let exclude: HashSet<&str> = exclude.iter().map(String::as_str).collect();
                included
                    .into_iter()
                    .filter(|version| !exclude.contains(version.as_str()))
                    .collect()
            }
            None => included,
        }
    }

    /// Number of versions that survived the include list but were excluded
    pub fn excluded_count(&self, all: &[String]) -> usize {
        self.apply_include(all).len() - self.select(all).len()
    }

    /// Include tokens that name no version in `all`
    pub fn unmatched_includes(&self, all: &[String]) -> Vec<String> {
        let Some(include) = &self.include else {
            return Vec::new();
        };

        let known: HashSet<&str> = all.iter().map(String::as_str).collect();
        include
            .iter()
            .filter(|token| !known.contains(token.as_str()))
            .cloned()
            .collect()
    }

    fn apply_include(&self, all: &[String]) -> Vec<String> {
        match &self.include {
            Some(include) => {
                let include: HashSet<&str> = include.iter().map(String::as_str).collect();
                all.iter()
                    .filter(|version| include.contains(version.as_str()))
                    .cloned()
                    .collect()
            }
            None => all.to_vec(),
        }
    }
}

/// Compute the versions to process from the full list and the raw filters
pub fn select(all: &[String], include: Option<&str>, exclude: Option<&str>) -> Vec<String> {
    VersionFilter::new(include, exclude).select(all)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn versions(list: &[&str]) -> Vec<String> {
        list.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_parse_list_trims_and_drops_empty() {
        assert_eq!(parse_list(" 1.0.0, ,2.0.0 ,,"), vec!["1.0.0", "2.0.0"]);
        assert!(parse_list(" , ").is_empty());
    }

    #[test]
    fn test_no_filters_is_identity() {
        let all = versions(&["1.0.0", "1.1.0", "2.0.0"]);
        assert_eq!(select(&all, None, None), all);
    }

    #[test]
    fn test_include_keeps_registry_order() {
        let all = versions(&["1.0.0", "1.1.0", "2.0.0"]);
        assert_eq!(
            select(&all, Some("2.0.0,1.0.0"), None),
            versions(&["1.0.0", "2.0.0"])
        );
    }

    #[test]
    fn test_exclude_without_include() {
        let all = versions(&["1.0.0", "1.1.0", "2.0.0"]);
        assert_eq!(
            select(&all, None, Some("1.1.0")),
            versions(&["1.0.0", "2.0.0"])
        );
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let all = versions(&["1.0.0", "1.1.0", "2.0.0"]);
        assert_eq!(
            select(&all, Some("1.0.0,2.0.0"), Some("2.0.0")),
            versions(&["1.0.0"])
        );
    }

    #[test]
    fn test_include_subset_of_exclude_is_empty() {
        let all = versions(&["1.0.0", "1.1.0", "2.0.0"]);
        assert!(select(&all, Some("1.0.0,1.1.0"), Some("1.1.0,1.0.0,2.0.0")).is_empty());
    }

    #[test]
    fn test_include_with_only_commas_selects_nothing() {
        let all = versions(&["1.0.0"]);
        assert!(select(&all, Some(","), None).is_empty());
    }

    #[test]
    fn test_blank_filters_are_absent() {
        let all = versions(&["1.0.0", "2.0.0"]);
        assert_eq!(select(&all, Some("  "), Some("")), all);
    }

    #[test]
    fn test_selection_is_filtered_subsequence() {
        let all = versions(&["0.1.0", "1.0.0-beta.1", "1.0.0", "1.0.1", "2.0.0"]);
        let include = ["1.0.0-beta.1", "1.0.0", "2.0.0", "9.9.9"];
        let exclude = ["1.0.0"];
        let picked = select(
            &all,
            Some(include.join(",").as_str()),
            Some(exclude.join(",").as_str()),
        );

        let mut cursor = all.iter();
        for version in &picked {
            assert!(include.contains(&version.as_str()));
            assert!(!exclude.contains(&version.as_str()));
            assert!(cursor.any(|v| v == version), "{version} out of order");
        }
        assert_eq!(picked, versions(&["1.0.0-beta.1", "2.0.0"]));
    }

    #[test]
    fn test_selection_is_idempotent() {
        let all = versions(&["1.0.0", "1.1.0", "2.0.0"]);
        let filter = VersionFilter::new(Some("1.0.0,1.1.0"), Some("1.1.0"));
        let once = filter.select(&all);
        assert_eq!(filter.select(&once), once);
    }

    #[test]
    fn test_duplicates_in_registry_list_are_kept() {
        let all = versions(&["1.0.0", "1.0.0"]);
        assert_eq!(select(&all, Some("1.0.0"), None), all);
    }

    #[test]
    fn test_excluded_count_counts_only_exclusions() {
        let all = versions(&["1.0.0", "1.1.0", "2.0.0", "3.0.0"]);
        let filter = VersionFilter::new(Some("1.0.0,1.1.0,2.0.0"), Some("1.1.0,3.0.0"));

        // 3.0.0 was already dropped by the include list
        assert_eq!(filter.excluded_count(&all), 1);
    }

    #[test]
    fn test_unmatched_includes() {
        let all = versions(&["1.0.0", "2.0.0"]);
        let filter = VersionFilter::new(Some("1.0.0, 1.0.1"), None);
        assert_eq!(filter.unmatched_includes(&all), vec!["1.0.1"]);

        let no_include = VersionFilter::new(None, Some("1.0.0"));
        assert!(no_include.unmatched_includes(&all).is_empty());
    }
}
