//! Diff computation between desired and assigned resources

use crate::context::IdentifierMap;
use negotiator::TargetResource;
use std::collections::{BTreeSet, HashSet};

/// A desired resource missing from the user's assignments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAdd {
    /// Registry id
    pub source_id: String,
    /// Negotiator id to assign
    pub target_id: String,
}

/// The changes that converge one user's assignments of one kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentDiff {
    /// Desired, mapped, and not yet assigned
    pub to_add: Vec<PlannedAdd>,
    /// Assigned but not desired
    pub to_remove: Vec<TargetResource>,
    /// Desired, not assigned, and unknown to the Negotiator
    pub unmapped: Vec<String>,
}

impl AssignmentDiff {
    /// Compute the diff for one user and one kind.
    ///
    /// Assigned resources are matched on their registry id. A resource with
    /// no registry id can never be desired, so it is always removed.
    pub fn compute(
        desired: &BTreeSet<String>,
        assigned: &[TargetResource],
        mapping: Option<&IdentifierMap>,
    ) -> Self {
        let assigned_ids: HashSet<&str> = assigned
            .iter()
            .filter_map(|r| r.identifier.as_deref())
            .collect();

        let mut diff = Self::default();

        for source_id in desired {
            if assigned_ids.contains(source_id.as_str()) {
                continue;
            }
            match mapping.and_then(|m| m.get(source_id)) {
                Some(target_id) => diff.to_add.push(PlannedAdd {
                    source_id: source_id.clone(),
                    target_id: target_id.clone(),
                }),
                None => diff.unmapped.push(source_id.clone()),
            }
        }

        diff.to_remove = assigned
            .iter()
            .filter(|r| {
                r.identifier
                    .as_ref()
                    .is_none_or(|identifier| !desired.contains(identifier))
            })
            .cloned()
            .collect();

        diff
    }

    /// Whether any add or remove is needed.
    pub fn has_changes(&self) -> bool {
        !self.to_add.is_empty() || !self.to_remove.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desired(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| (*s).to_string()).collect()
    }

    fn assigned(pairs: &[(&str, &str)]) -> Vec<TargetResource> {
        pairs
            .iter()
            .map(|(id, identifier)| TargetResource {
                id: (*id).to_string(),
                identifier: Some((*identifier).to_string()),
            })
            .collect()
    }

    fn mapping(pairs: &[(&str, &str)]) -> IdentifierMap {
        pairs
            .iter()
            .map(|(s, t)| ((*s).to_string(), (*t).to_string()))
            .collect()
    }

    #[test]
    fn test_add_missing_mapped() {
        let map = mapping(&[("col-B", "t2")]);
        let diff = AssignmentDiff::compute(
            &desired(&["col-A", "col-B"]),
            &assigned(&[("t1", "col-A")]),
            Some(&map),
        );

        assert_eq!(
            diff.to_add,
            vec![PlannedAdd {
                source_id: "col-B".to_string(),
                target_id: "t2".to_string(),
            }]
        );
        assert!(diff.to_remove.is_empty());
        assert!(diff.unmapped.is_empty());
        assert!(diff.has_changes());
    }

    #[test]
    fn test_remove_undesired() {
        let diff = AssignmentDiff::compute(
            &desired(&["col-A"]),
            &assigned(&[("t1", "col-A"), ("t3", "col-C")]),
            None,
        );

        assert!(diff.to_add.is_empty());
        assert_eq!(diff.to_remove, assigned(&[("t3", "col-C")]));
    }

    #[test]
    fn test_unmapped_not_added() {
        let diff = AssignmentDiff::compute(&desired(&["net-X"]), &[], Some(&IdentifierMap::new()));

        assert!(diff.to_add.is_empty());
        assert!(diff.to_remove.is_empty());
        assert_eq!(diff.unmapped, vec!["net-X".to_string()]);
        assert!(!diff.has_changes());
    }

    #[test]
    fn test_intersection_needs_no_action() {
        let map = mapping(&[("col-A", "t1"), ("col-B", "t2")]);
        let diff = AssignmentDiff::compute(
            &desired(&["col-A", "col-B"]),
            &assigned(&[("t1", "col-A"), ("t2", "col-B")]),
            Some(&map),
        );
        assert_eq!(diff, AssignmentDiff::default());
    }

    #[test]
    fn test_assigned_without_identifier_removed() {
        let assigned = vec![TargetResource {
            id: "t7".to_string(),
            identifier: None,
        }];
        let diff = AssignmentDiff::compute(&desired(&[]), &assigned, None);
        assert_eq!(diff.to_remove.len(), 1);
    }

    #[test]
    fn test_set_difference_property() {
        // Every combination of three ids across desired / assigned / mapped
        let ids = ["a", "b", "c"];
        for mask in 0u32..512 {
            let pick = |shift: u32| -> Vec<&str> {
                ids.iter()
                    .enumerate()
                    .filter(|(i, _)| mask >> (shift + *i as u32) & 1 == 1)
                    .map(|(_, id)| *id)
                    .collect()
            };
            let d = desired(&pick(0));
            let a: Vec<(String, String)> =
                pick(3).iter().map(|s| (format!("t-{s}"), (*s).to_string())).collect();
            let a = assigned(
                &a.iter()
                    .map(|(t, s)| (t.as_str(), s.as_str()))
                    .collect::<Vec<_>>(),
            );
            let mapped = pick(6);
            let m: IdentifierMap = mapped
                .iter()
                .map(|s| ((*s).to_string(), format!("t-{s}")))
                .collect();

            let diff = AssignmentDiff::compute(&d, &a, Some(&m));
            let assigned_ids: BTreeSet<String> =
                a.iter().filter_map(|r| r.identifier.clone()).collect();

            let expected_add: Vec<String> = d
                .iter()
                .filter(|s| m.contains_key(*s) && !assigned_ids.contains(*s))
                .cloned()
                .collect();
            let expected_unmapped: Vec<String> = d
                .iter()
                .filter(|s| !m.contains_key(*s) && !assigned_ids.contains(*s))
                .cloned()
                .collect();
            let expected_remove: Vec<String> = assigned_ids
                .iter()
                .filter(|s| !d.contains(*s))
                .cloned()
                .collect();

            let added: Vec<String> = diff.to_add.iter().map(|p| p.source_id.clone()).collect();
            let mut removed: Vec<String> = diff
                .to_remove
                .iter()
                .filter_map(|r| r.identifier.clone())
                .collect();
            removed.sort();

            assert_eq!(added, expected_add, "mask {mask:#b}");
            assert_eq!(diff.unmapped, expected_unmapped, "mask {mask:#b}");
            assert_eq!(removed, expected_remove, "mask {mask:#b}");
        }
    }
}
