//! Configuration names for discovered resources.

use crate::discovery::value::{non_empty_str, AttributeMap};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

pub const NAME_PREFIX: &str = "export_";

/// Attributes tried, in order, when deriving a readable name.
const NAME_ATTRIBUTES: [&str; 2] = ["display_name", "name"];

static INVALID_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_-]").expect("Invalid name charset regex"));

/// Replace characters terraform does not accept in resource names.
pub fn sanitize(raw: &str) -> String {
    INVALID_NAME_CHARS.replace_all(raw, "-").into_owned()
}

/// Base name for a resource before collision handling.
///
/// Falls back to `<parent-name>_<abbreviation>_<index>` when the resource has
/// neither a display name nor a name.
pub fn base_name(
    attributes: &AttributeMap,
    parent_name: &str,
    abbreviation: &str,
    index: usize,
) -> String {
    NAME_ATTRIBUTES
        .iter()
        .find_map(|attr| non_empty_str(attributes, attr))
        .map(|raw| format!("{}{}", NAME_PREFIX, sanitize(raw)))
        .unwrap_or_else(|| sanitize(&format!("{}_{}_{}", parent_name, abbreviation, index)))
}

/// Hands out names unique within one discovery session.
#[derive(Debug, Default)]
pub struct NameRegistry {
    counters: HashMap<String, usize>,
    used: HashSet<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `base`, or `base_1`, `base_2`, ... if it is taken.
    pub fn assign(&mut self, base: &str) -> String {
        if self.used.insert(base.to_string()) {
            return base.to_string();
        }

        let counter = self.counters.entry(base.to_string()).or_insert(0);
        loop {
            *counter += 1;
            let candidate = format!("{}_{}", base, counter);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.used.contains(name)
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::value::attributes_from_json;
    use serde_json::json;

    #[test]
    fn test_base_name_prefers_display_name() {
        let attrs = attributes_from_json(json!({"display_name": "My VCN", "name": "vcn"}));
        assert_eq!(base_name(&attrs, "export", "vcn", 1), "export_My-VCN");

        let attrs = attributes_from_json(json!({"display_name": "", "name": "bucket.logs"}));
        assert_eq!(base_name(&attrs, "export", "bucket", 1), "export_bucket-logs");
    }

    #[test]
    fn test_base_name_fallback() {
        let attrs = attributes_from_json(json!({"id": "ocid1.x"}));
        assert_eq!(
            base_name(&attrs, "export_vcn", "route_table", 3),
            "export_vcn_route_table_3"
        );
    }

    #[test]
    fn test_assign_disambiguates() {
        let mut names = NameRegistry::new();
        assert_eq!(names.assign("export_db"), "export_db");
        assert_eq!(names.assign("export_db"), "export_db_1");
        assert_eq!(names.assign("export_db"), "export_db_2");
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn test_assign_skips_names_taken_verbatim() {
        let mut names = NameRegistry::new();
        assert_eq!(names.assign("export_db_1"), "export_db_1");
        assert_eq!(names.assign("export_db"), "export_db");
        assert_eq!(names.assign("export_db"), "export_db_2");
        assert!(names.contains("export_db_2"));
    }
}
