//! Scope resolution
//!
//! Merges the common, process and sub-process field lists of a request into
//! one deduplicated field set, partitioned for grouped display.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::value_objects::{EntityId, FieldDefinition};

/// Fields fetched for one sub-process
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubProcessFields {
    pub sub_process_id: EntityId,
    pub name: String,
    pub fields: Vec<FieldDefinition>,
}

/// Specific fields of one active sub-process
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubProcessGroup {
    pub sub_process_id: EntityId,
    pub name: String,
    pub fields: Vec<FieldDefinition>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedFields {
    pub common_fields: Vec<FieldDefinition>,
    pub process_fields: Vec<FieldDefinition>,
    pub sub_process_groups: Vec<SubProcessGroup>,
}

impl ResolvedFields {
    /// Every field in display order: common, process, then each group
    pub fn all(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.common_fields
            .iter()
            .chain(self.process_fields.iter())
            .chain(self.sub_process_groups.iter().flat_map(|g| g.fields.iter()))
    }

    pub fn len(&self) -> usize {
        self.all().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct ScopeResolver;

impl ScopeResolver {
    /// Resolve the field set of a request.
    ///
    /// Common fields from any source land once in `common_fields` (first
    /// occurrence wins). Only sub-processes listed in `active` contribute a
    /// group, in `active` order; a group without specific fields is dropped.
    /// Buckets are stably sorted by `order`.
    pub fn resolve(
        common: &[FieldDefinition],
        process: &[FieldDefinition],
        sub_processes: &[SubProcessFields],
        active: &[EntityId],
    ) -> ResolvedFields {
        let mut seen: HashSet<&EntityId> = HashSet::new();
        let mut common_fields = Vec::new();
        let mut process_fields = Vec::new();

        let active_sources: Vec<&SubProcessFields> = active
            .iter()
            .filter_map(|id| sub_processes.iter().find(|s| &s.sub_process_id == id))
            .collect();

        // Common fields are collected across every source before any specific
        // bucket so that a promoted field is never shadowed by its own group.
        let sources = common
            .iter()
            .chain(process.iter())
            .chain(active_sources.iter().flat_map(|s| s.fields.iter()));
        for field in sources.filter(|f| f.scope.is_common()) {
            if seen.insert(&field.id) {
                common_fields.push(field.clone());
            }
        }

        for field in process.iter().filter(|f| !f.scope.is_common()) {
            if seen.insert(&field.id) {
                process_fields.push(field.clone());
            }
        }

        let mut sub_process_groups = Vec::new();
        for source in active_sources {
            let mut fields = Vec::new();
            for field in source.fields.iter().filter(|f| !f.scope.is_common()) {
                if seen.insert(&field.id) {
                    fields.push(field.clone());
                }
            }
            if fields.is_empty() {
                continue;
            }
            sort_by_order(&mut fields);
            sub_process_groups.push(SubProcessGroup {
                sub_process_id: source.sub_process_id.clone(),
                name: source.name.clone(),
                fields,
            });
        }

        sort_by_order(&mut common_fields);
        sort_by_order(&mut process_fields);

        tracing::debug!(
            "Resolved {} common, {} process and {} sub-process groups",
            common_fields.len(),
            process_fields.len(),
            sub_process_groups.len()
        );

        ResolvedFields { common_fields, process_fields, sub_process_groups }
    }
}

fn sort_by_order(fields: &mut [FieldDefinition]) {
    fields.sort_by_key(|f| f.order);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{FieldScope, FieldType};

    fn common(id: &str, order: i32) -> FieldDefinition {
        FieldDefinition::new(id, id, FieldType::ShortText).with_order(order)
    }

    fn scoped(id: &str, order: i32, scope: FieldScope) -> FieldDefinition {
        common(id, order).in_scope(scope)
    }

    fn ids(fields: &[FieldDefinition]) -> Vec<&str> {
        fields.iter().map(|f| f.id.as_str()).collect()
    }

    #[test]
    fn test_common_field_deduplicated_across_sources() {
        let p = FieldScope::Process("p1".into());
        let s = FieldScope::SubProcess("s1".into());
        let process = vec![common("shared", 1), scoped("budget", 2, p)];
        let subs = vec![SubProcessFields {
            sub_process_id: "s1".into(),
            name: "Purchasing".into(),
            fields: vec![common("shared", 1), scoped("vendor", 1, s)],
        }];

        let resolved = ScopeResolver::resolve(&[], &process, &subs, &["s1".into()]);
        assert_eq!(ids(&resolved.common_fields), vec!["shared"]);
        assert_eq!(ids(&resolved.process_fields), vec!["budget"]);
        assert_eq!(resolved.sub_process_groups.len(), 1);
        assert_eq!(ids(&resolved.sub_process_groups[0].fields), vec!["vendor"]);
        assert_eq!(resolved.len(), 3);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let mut first = common("shared", 1);
        first.label = "From common list".into();
        let mut second = common("shared", 1);
        second.label = "From process list".into();

        let resolved = ScopeResolver::resolve(&[first], &[second], &[], &[]);
        assert_eq!(resolved.common_fields.len(), 1);
        assert_eq!(resolved.common_fields[0].label, "From common list");
    }

    #[test]
    fn test_common_fields_promoted_from_groups() {
        let subs = vec![
            SubProcessFields {
                sub_process_id: "s1".into(),
                name: "One".into(),
                fields: vec![common("c1", 5), scoped("x", 1, FieldScope::SubProcess("s1".into()))],
            },
            SubProcessFields {
                sub_process_id: "s2".into(),
                name: "Two".into(),
                fields: vec![common("c1", 5), common("c2", 0)],
            },
        ];
        let resolved = ScopeResolver::resolve(&[], &[], &subs, &["s1".into(), "s2".into()]);
        assert_eq!(ids(&resolved.common_fields), vec!["c2", "c1"]);
        assert_eq!(resolved.sub_process_groups.len(), 1);
        assert_eq!(resolved.sub_process_groups[0].name, "One");
    }

    #[test]
    fn test_inactive_sub_processes_ignored_and_active_order_kept() {
        let subs = vec![
            SubProcessFields {
                sub_process_id: "s1".into(),
                name: "One".into(),
                fields: vec![scoped("a", 0, FieldScope::SubProcess("s1".into()))],
            },
            SubProcessFields {
                sub_process_id: "s2".into(),
                name: "Two".into(),
                fields: vec![scoped("b", 0, FieldScope::SubProcess("s2".into()))],
            },
            SubProcessFields {
                sub_process_id: "s3".into(),
                name: "Three".into(),
                fields: vec![scoped("c", 0, FieldScope::SubProcess("s3".into()))],
            },
        ];
        let resolved = ScopeResolver::resolve(&[], &[], &subs, &["s3".into(), "s1".into()]);
        let names: Vec<_> = resolved.sub_process_groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Three", "One"]);
    }

    #[test]
    fn test_stable_sort_by_order() {
        let p = FieldScope::Process("p".into());
        let process = vec![
            scoped("late", 9, p.clone()),
            scoped("tie_a", 1, p.clone()),
            scoped("early", 0, p.clone()),
            scoped("tie_b", 1, p),
        ];
        let resolved = ScopeResolver::resolve(&[], &process, &[], &[]);
        assert_eq!(ids(&resolved.process_fields), vec!["early", "tie_a", "tie_b", "late"]);
    }
}
