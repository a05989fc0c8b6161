//! Aggregation of pod snapshots into namespace and node views
//!
//! All views borrow the input pods and are rebuilt in full on every call.
//! Grouping keeps first-occurrence order so rendering is deterministic.

mod namespace;
mod node;
mod resources;
mod rollup;

#[cfg(test)]
mod tests;

pub use namespace::{group_by_namespace, NamespaceGroup, NamespaceGroups};
pub use node::{group_by_node, NodeGroup, NodeGroups, NodeKey};
pub use resources::{group_resources_by_kind, ResourceKindGroup};
pub use rollup::{summarize, HealthRollup};

use std::collections::HashMap;
use std::hash::Hash;

/// Group items by key, preserving the order in which keys first appear
pub(crate) fn group_stable<'a, T, K, F>(
    items: impl IntoIterator<Item = &'a T>,
    mut key: F,
) -> Vec<(K, Vec<&'a T>)>
where
    T: 'a,
    K: Eq + Hash + Clone,
    F: FnMut(&'a T) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<&'a T>)> = Vec::new();

    for item in items {
        let k = key(item);
        match index.get(&k) {
            Some(&slot) => groups[slot].1.push(item),
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, vec![item]));
            }
        }
    }

    groups
}
