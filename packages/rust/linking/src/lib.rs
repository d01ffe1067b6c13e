//! Internal-link planning for grouped content runs.
//!
//! Builds a deterministic link graph over the flattened item list: every item
//! gets a previous link (the homepage for group openers, the prior item
//! otherwise), a cyclic next link within its group, and a cross-group link
//! when other groups exist. Planning is pure: the same groups always produce
//! the same plan.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use contentforge_shared::Group;

// ---------------------------------------------------------------------------
// Plan types
// ---------------------------------------------------------------------------

/// A link target: another item in the run, addressed by subject and group handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    pub subject: String,
    pub handle: String,
}

/// Where an item's backward link points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PreviousLink {
    /// The item opens its group; it links back to the site root.
    Homepage,
    /// The item links back to the previous item in its group.
    Sequential { target: ItemRef },
}

/// The complete link assignment for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkPlan {
    /// Position in the flattened, group-major item order.
    pub item_index: usize,
    pub subject: String,
    pub handle: String,
    /// Backward link.
    pub previous: PreviousLink,
    /// Forward link, cyclic within the group.
    pub next: ItemRef,
    /// Link into another group, absent for single-group runs.
    pub cross_group: Option<ItemRef>,
}

/// Aggregate counts over a plan, for logging and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkStats {
    pub items: usize,
    pub total_links: usize,
    pub cross_group_links: usize,
    pub groups: usize,
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// Build the link plan for a set of groups.
///
/// Items are visited in group-major order (all of group 0, then group 1, ...).
/// Within a group: the first item's previous link is the homepage, every other
/// item links back to its predecessor; the last item's next link wraps to the
/// group's first item. The cross-group target for the item at flattened index
/// `i` is `pool[i % pool.len()]`, where the pool is every item outside the
/// current group, in flattened order.
///
/// A singleton group yields a self-referencing next link.
pub fn plan(groups: &[Group]) -> Vec<LinkPlan> {
    let flattened: Vec<(usize, &Group, usize)> = groups
        .iter()
        .flat_map(|group| group.items.iter().enumerate().map(move |(j, _)| (j, group)))
        .enumerate()
        .map(|(i, (j, group))| (i, group, j))
        .collect();

    let mut plans = Vec::with_capacity(flattened.len());

    for &(global_index, group, local_index) in &flattened {
        let item = &group.items[local_index];

        let previous = if local_index == 0 {
            PreviousLink::Homepage
        } else {
            PreviousLink::Sequential {
                target: item_ref(group, local_index - 1),
            }
        };

        let next = if local_index + 1 < group.items.len() {
            item_ref(group, local_index + 1)
        } else {
            // Cyclic: the group's last item points back at its opener. In a
            // singleton group this is a self-reference, kept on purpose so
            // every item carries a complete link set.
            item_ref(group, 0)
        };

        let pool: Vec<ItemRef> = flattened
            .iter()
            .filter(|(_, other, _)| other.id != group.id)
            .map(|&(_, other, j)| item_ref(other, j))
            .collect();

        let cross_group = if pool.is_empty() {
            None
        } else {
            Some(pool[global_index % pool.len()].clone())
        };

        plans.push(LinkPlan {
            item_index: global_index,
            subject: item.subject.clone(),
            handle: group.handle.clone(),
            previous,
            next,
            cross_group,
        });
    }

    let stats = stats(&plans);
    tracing::debug!(
        items = stats.items,
        groups = stats.groups,
        cross_group_links = stats.cross_group_links,
        "built link plan"
    );

    plans
}

fn item_ref(group: &Group, local_index: usize) -> ItemRef {
    ItemRef {
        subject: group.items[local_index].subject.clone(),
        handle: group.handle.clone(),
    }
}

/// Summarize a plan.
pub fn stats(plans: &[LinkPlan]) -> LinkStats {
    let cross_group_links = plans.iter().filter(|p| p.cross_group.is_some()).count();
    let groups = {
        let mut handles: Vec<&str> = plans.iter().map(|p| p.handle.as_str()).collect();
        handles.dedup();
        handles.len()
    };
    LinkStats {
        items: plans.len(),
        // previous + next for every item, plus one per cross-group link
        total_links: plans.len() * 2 + cross_group_links,
        cross_group_links,
        groups,
    }
}

/// Stable fingerprint of the group structure that drives planning.
///
/// Two runs over the same groups (same ids, handles, and subject order)
/// produce the same fingerprint, so plan outputs can be compared cheaply.
pub fn fingerprint(groups: &[Group]) -> String {
    let mut hasher = Sha256::new();
    for group in groups {
        hasher.update(group.id.as_bytes());
        hasher.update([0]);
        hasher.update(group.handle.as_bytes());
        hasher.update([0]);
        for item in &group.items {
            hasher.update(item.subject.as_bytes());
            hasher.update([0]);
        }
        hasher.update([0xff]);
    }
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(defs: &[(&str, &[&str])]) -> Vec<Group> {
        defs.iter()
            .map(|(handle, subjects)| {
                Group::from_subjects(format!("group-{handle}"), *handle, subjects, "en")
            })
            .collect()
    }

    #[test]
    fn plan_covers_every_item() {
        let groups = groups(&[("rings", &["a", "b", "c"]), ("necklaces", &["d", "e"])]);
        let plans = plan(&groups);
        assert_eq!(plans.len(), 5);
        for (i, p) in plans.iter().enumerate() {
            assert_eq!(p.item_index, i);
            assert!(p.cross_group.is_some());
        }
    }

    #[test]
    fn group_opener_links_to_homepage() {
        let groups = groups(&[("rings", &["a", "b"]), ("necklaces", &["c"])]);
        let plans = plan(&groups);
        assert_eq!(plans[0].previous, PreviousLink::Homepage);
        assert!(matches!(plans[1].previous, PreviousLink::Sequential { .. }));
        // First item of the second group is index 2
        assert_eq!(plans[2].previous, PreviousLink::Homepage);
    }

    #[test]
    fn next_links_are_cyclic_within_group() {
        let groups = groups(&[("rings", &["a", "b", "c"])]);
        let plans = plan(&groups);
        assert_eq!(plans[0].next.subject, "b");
        assert_eq!(plans[1].next.subject, "c");
        // Last wraps to the group's first
        assert_eq!(plans[2].next.subject, "a");
    }

    #[test]
    fn singleton_group_self_references() {
        let groups = groups(&[("solo", &["only"])]);
        let plans = plan(&groups);
        assert_eq!(plans[0].next.subject, "only");
        assert_eq!(plans[0].previous, PreviousLink::Homepage);
        assert!(plans[0].cross_group.is_none());
    }

    #[test]
    fn single_group_has_no_cross_links() {
        let groups = groups(&[("rings", &["a", "b", "c"])]);
        let plans = plan(&groups);
        assert!(plans.iter().all(|p| p.cross_group.is_none()));
        assert_eq!(stats(&plans).cross_group_links, 0);
    }

    #[test]
    fn cross_group_rotates_through_pool() {
        let groups = groups(&[("rings", &["a", "b"]), ("necklaces", &["c", "d"])]);
        let plans = plan(&groups);
        // Pool for group "rings" is [c, d]; items at index 0 and 1 pick
        // pool[0 % 2] and pool[1 % 2].
        assert_eq!(plans[0].cross_group.as_ref().unwrap().subject, "c");
        assert_eq!(plans[1].cross_group.as_ref().unwrap().subject, "d");
        // Pool for group "necklaces" is [a, b]; indexes 2 and 3.
        assert_eq!(plans[2].cross_group.as_ref().unwrap().subject, "a");
        assert_eq!(plans[3].cross_group.as_ref().unwrap().subject, "b");
        // Cross links never target the item's own group
        for p in &plans {
            assert_ne!(p.cross_group.as_ref().unwrap().handle, p.handle);
        }
    }

    #[test]
    fn planning_is_deterministic() {
        let groups = groups(&[("rings", &["a", "b", "c"]), ("necklaces", &["d"])]);
        assert_eq!(plan(&groups), plan(&groups));
        assert_eq!(fingerprint(&groups), fingerprint(&groups));
    }

    #[test]
    fn fingerprint_changes_with_structure() {
        let a = groups(&[("rings", &["a", "b"])]);
        let b = groups(&[("rings", &["b", "a"])]);
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn stats_counts() {
        let groups = groups(&[("rings", &["a", "b"]), ("necklaces", &["c"])]);
        let plans = plan(&groups);
        let s = stats(&plans);
        assert_eq!(s.items, 3);
        assert_eq!(s.groups, 2);
        assert_eq!(s.cross_group_links, 3);
        assert_eq!(s.total_links, 9);
    }
}
