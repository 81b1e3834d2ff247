//! Section grouping
//!
//! Groups a resolved field list into display sections. Fields without a
//! matching declared section are gathered into a synthesized section.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::EngineConfig;
use crate::domain::value_objects::{EntityId, FieldDefinition, Section};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    /// An administrator-declared section
    Declared,
    /// Unassigned fields shown ahead of declared sections
    General,
    /// The only section, used when nothing was assigned anywhere
    Fallback,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrganizedSection {
    pub id: Option<EntityId>,
    pub label: String,
    pub kind: SectionKind,
    pub fields: Vec<FieldDefinition>,
}

#[derive(Clone, Debug)]
pub struct SectionOrganizer {
    general_label: String,
    fallback_label: String,
}

impl Default for SectionOrganizer {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl SectionOrganizer {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            general_label: config.general_section_label.clone(),
            fallback_label: config.fallback_section_label.clone(),
        }
    }

    /// Group `fields` (already in display order) by their section.
    pub fn organize(&self, fields: &[FieldDefinition], sections: &[Section]) -> Vec<OrganizedSection> {
        if fields.is_empty() {
            return vec![];
        }

        let mut declared: Vec<&Section> = sections.iter().collect();
        declared.sort_by_key(|s| s.order);

        let mut position: HashMap<&EntityId, usize> = HashMap::new();
        for (index, section) in declared.iter().enumerate() {
            position.entry(&section.id).or_insert(index);
        }

        let mut buckets: Vec<Vec<FieldDefinition>> = vec![Vec::new(); declared.len()];
        let mut unassigned = Vec::new();
        for field in fields {
            match field.section_id.as_ref().and_then(|id| position.get(id)) {
                Some(&index) => buckets[index].push(field.clone()),
                None => unassigned.push(field.clone()),
            }
        }

        let mut organized: Vec<OrganizedSection> = declared
            .into_iter()
            .zip(buckets)
            .filter(|(_, fields)| !fields.is_empty())
            .map(|(section, fields)| OrganizedSection {
                id: Some(section.id.clone()),
                label: section.label.clone(),
                kind: SectionKind::Declared,
                fields,
            })
            .collect();

        if organized.is_empty() {
            return vec![OrganizedSection {
                id: None,
                label: self.fallback_label.clone(),
                kind: SectionKind::Fallback,
                fields: unassigned,
            }];
        }

        if !unassigned.is_empty() {
            organized.insert(
                0,
                OrganizedSection {
                    id: None,
                    label: self.general_label.clone(),
                    kind: SectionKind::General,
                    fields: unassigned,
                },
            );
        }

        tracing::debug!("Organized {} fields into {} sections", fields.len(), organized.len());
        organized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::services::{ScopeResolver, SubProcessFields};
    use crate::domain::value_objects::{FieldScope, FieldType};

    fn field(id: &str, section: Option<&str>) -> FieldDefinition {
        let f = FieldDefinition::new(id, id, FieldType::ShortText);
        match section {
            Some(s) => f.in_section(s),
            None => f,
        }
    }

    fn labels(sections: &[OrganizedSection]) -> Vec<&str> {
        sections.iter().map(|s| s.label.as_str()).collect()
    }

    #[test]
    fn test_no_declared_sections_yields_single_fallback() {
        let organizer = SectionOrganizer::default();
        let result = organizer.organize(&[field("a", None), field("b", Some("ghost"))], &[]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].kind, SectionKind::Fallback);
        assert_eq!(result[0].label, "Fields");
        assert_eq!(result[0].fields.len(), 2);
    }

    #[test]
    fn test_empty_declared_sections_dropped() {
        let organizer = SectionOrganizer::default();
        let sections = vec![Section::new("s1", "Details", 1), Section::new("s2", "Empty", 2)];
        let result = organizer.organize(&[field("a", Some("s1"))], &sections);
        assert_eq!(labels(&result), vec!["Details"]);
    }

    #[test]
    fn test_unassigned_become_general_first() {
        let organizer = SectionOrganizer::default();
        let sections = vec![Section::new("late", "Late", 5), Section::new("early", "Early", 1)];
        let fields = vec![field("a", Some("late")), field("b", None), field("c", Some("early"))];
        let result = organizer.organize(&fields, &sections);
        assert_eq!(labels(&result), vec!["General", "Early", "Late"]);
        assert_eq!(result[0].kind, SectionKind::General);
        assert_eq!(result[0].fields[0].id.as_str(), "b");
    }

    #[test]
    fn test_only_empty_sections_falls_back() {
        let organizer = SectionOrganizer::default();
        let sections = vec![Section::new("s1", "Details", 1)];
        let result = organizer.organize(&[field("a", None)], &sections);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].kind, SectionKind::Fallback);
    }

    #[test]
    fn test_labels_follow_config() {
        let config = EngineConfig {
            general_section_label: "Other".into(),
            ..EngineConfig::default()
        };
        let organizer = SectionOrganizer::from_config(&config);
        let sections = vec![Section::new("s1", "Details", 1)];
        let result = organizer.organize(&[field("a", Some("s1")), field("b", None)], &sections);
        assert_eq!(labels(&result), vec!["Other", "Details"]);
    }

    #[test]
    fn test_no_fields_no_sections() {
        let organizer = SectionOrganizer::default();
        assert!(organizer.organize(&[], &[Section::new("s1", "Details", 1)]).is_empty());
    }

    proptest::proptest! {
        #[test]
        fn prop_resolve_then_organize_is_deterministic(
            layout in proptest::collection::vec((0u8..6, 0i32..4, 0u8..3, proptest::option::of(0u8..3)), 0..16)
        ) {
            let mut common = Vec::new();
            let mut process = Vec::new();
            let mut sub = Vec::new();
            for (i, (id, order, bucket, section)) in layout.iter().enumerate() {
                let id = format!("f{}", id);
                let mut f = FieldDefinition::new(id, format!("L{}", i), FieldType::ShortText).with_order(*order);
                if let Some(s) = section {
                    f = f.in_section(format!("s{}", s));
                }
                match bucket {
                    0 => common.push(f),
                    1 => process.push(f.in_scope(FieldScope::Process("p".into()))),
                    _ => sub.push(f.in_scope(FieldScope::SubProcess("sp".into()))),
                }
            }
            let groups = vec![SubProcessFields { sub_process_id: "sp".into(), name: "Sub".into(), fields: sub }];
            let sections = vec![Section::new("s0", "Zero", 2), Section::new("s1", "One", 1)];
            let organizer = SectionOrganizer::default();

            let run = || {
                let resolved = ScopeResolver::resolve(&common, &process, &groups, &["sp".into()]);
                let all: Vec<FieldDefinition> = resolved.all().cloned().collect();
                organizer.organize(&all, &sections)
            };
            proptest::prop_assert_eq!(run(), run());
        }
    }
}
