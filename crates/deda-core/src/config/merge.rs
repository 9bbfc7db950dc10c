//! Configuration layer merging logic
//!
//! Layers are applied in order site -> user -> project. For apps and plugins a
//! later layer's record replaces an earlier one with the same key at the
//! position where the key first appeared. Services are the exception: the
//! first layer to define a service name owns it.

use std::collections::HashMap;

use crate::types::{MergeKey, ServiceRecord};

/// Merge record layers, keeping first-occurrence order and last-writer values.
pub fn merge_layers<'a, T, I>(layers: I) -> Vec<T>
where
    T: MergeKey + Clone + 'a,
    I: IntoIterator<Item = &'a [T]>,
{
    let mut merged: Vec<T> = Vec::new();
    let mut positions: HashMap<T::Key, usize> = HashMap::new();

    for layer in layers {
        for record in layer {
            let key = record.merge_key();
            match positions.get(&key) {
                Some(&index) => merged[index] = record.clone(),
                None => {
                    positions.insert(key, merged.len());
                    merged.push(record.clone());
                }
            }
        }
    }

    merged
}

/// Merge service layers; a service name defined by an earlier layer is locked.
pub fn merge_services<'a, I>(layers: I) -> Vec<ServiceRecord>
where
    I: IntoIterator<Item = &'a [ServiceRecord]>,
{
    let mut merged: Vec<ServiceRecord> = Vec::new();

    for layer in layers {
        for service in layer {
            if merged.contains(service) {
                tracing::warn!(
                    service = %service.name,
                    "Ignoring redefinition of a service declared by an earlier layer"
                );
                continue;
            }
            merged.push(service.clone());
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AppRecord, PluginRecord};

    fn app(name: &str, version: &str) -> AppRecord {
        AppRecord::new(name, version, name)
    }

    fn versions(apps: &[AppRecord]) -> Vec<(String, String)> {
        apps.iter()
            .map(|a| (a.name.clone(), a.version.clone()))
            .collect()
    }

    #[test]
    fn later_layer_replaces_in_place() {
        let site = vec![app("A", "1.0")];
        let user = vec![app("B", "1.0")];
        let project = vec![app("A", "2.0")];

        let merged = merge_layers([site.as_slice(), user.as_slice(), project.as_slice()]);

        assert_eq!(
            versions(&merged),
            vec![
                ("A".to_string(), "2.0".to_string()),
                ("B".to_string(), "1.0".to_string()),
            ]
        );
    }

    #[test]
    fn new_names_append_in_layer_order() {
        let site = vec![app("A", "1"), app("B", "1")];
        let user = vec![app("C", "1"), app("A", "2")];
        let project = vec![app("D", "1"), app("B", "3")];

        let merged = merge_layers([site.as_slice(), user.as_slice(), project.as_slice()]);

        assert_eq!(
            versions(&merged),
            vec![
                ("A".to_string(), "2".to_string()),
                ("B".to_string(), "3".to_string()),
                ("C".to_string(), "1".to_string()),
                ("D".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn empty_layers_merge_to_empty() {
        let empty: Vec<AppRecord> = Vec::new();
        assert!(merge_layers([empty.as_slice(), empty.as_slice()]).is_empty());
    }

    #[test]
    fn plugins_merge_by_name_and_version() {
        let mut site_shell = PluginRecord::new("shell", "1.0");
        site_shell.enabled = false;
        let site = vec![site_shell, PluginRecord::new("godot", "4.2")];
        let user = vec![PluginRecord::new("shell", "2.0"), PluginRecord::new("shell", "1.0")];

        let merged = merge_layers([site.as_slice(), user.as_slice()]);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].version, "1.0");
        assert!(merged[0].enabled);
        assert_eq!(merged[1].name, "godot");
        assert_eq!(merged[2].version, "2.0");
    }

    #[test]
    fn first_service_definition_wins() {
        let site = vec![ServiceRecord::new("perforce", "ssl:p4.studio:1666")];
        let user = vec![
            ServiceRecord::new("perforce", "ssl:p4.home:1666"),
            ServiceRecord::new("jira", "https://jira.example.com"),
        ];

        let merged = merge_services([site.as_slice(), user.as_slice()]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].url, "ssl:p4.studio:1666");
        assert_eq!(merged[1].name, "jira");
    }
}
