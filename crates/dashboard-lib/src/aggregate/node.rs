//! Grouping by hosting node, with nested namespace groups

use super::{group_stable, HealthRollup, NamespaceGroups};
use crate::models::Pod;
use std::fmt;

/// Node a pod is assigned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKey<'a> {
    Named(&'a str),
    /// Sentinel for pods without a usable node reference
    Unknown,
}

impl<'a> NodeKey<'a> {
    pub fn of(pod: &'a Pod) -> Self {
        match pod.node.as_deref() {
            Some(name) if !name.is_empty() && !name.eq_ignore_ascii_case("unknown") => {
                NodeKey::Named(name)
            }
            _ => NodeKey::Unknown,
        }
    }

    pub fn name(&self) -> Option<&'a str> {
        match self {
            NodeKey::Named(name) => Some(name),
            NodeKey::Unknown => None,
        }
    }
}

impl fmt::Display for NodeKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Named(name) => write!(f, "{}", name),
            NodeKey::Unknown => write!(f, "Unknown Node"),
        }
    }
}

/// Pods hosted on one node
#[derive(Debug, Clone)]
pub struct NodeGroup<'a> {
    pub node: NodeKey<'a>,
    pub pods: Vec<&'a Pod>,
    /// Computed over all of the node's pods, independent of `namespaces`
    pub rollup: HealthRollup,
    pub namespaces: NamespaceGroups<'a>,
}

impl NodeGroup<'_> {
    pub fn is_healthy(&self) -> bool {
        self.rollup.is_healthy()
    }
}

/// Node groups in first-occurrence order
#[derive(Debug, Clone, Default)]
pub struct NodeGroups<'a> {
    groups: Vec<NodeGroup<'a>>,
}

impl<'a> NodeGroups<'a> {
    pub fn get(&self, node: NodeKey<'_>) -> Option<&NodeGroup<'a>> {
        self.groups.iter().find(|g| g.node == node)
    }

    pub fn named(&self, node: &str) -> Option<&NodeGroup<'a>> {
        self.get(NodeKey::Named(node))
    }

    pub fn unknown(&self) -> Option<&NodeGroup<'a>> {
        self.get(NodeKey::Unknown)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeGroup<'a>> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl<'a, 'g> IntoIterator for &'g NodeGroups<'a> {
    type Item = &'g NodeGroup<'a>;
    type IntoIter = std::slice::Iter<'g, NodeGroup<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

/// Group pods by node. Pods without a node land in [`NodeKey::Unknown`].
pub fn group_by_node(pods: &[Pod]) -> NodeGroups<'_> {
    let groups = group_stable(pods, NodeKey::of)
        .into_iter()
        .map(|(node, pods)| NodeGroup {
            node,
            rollup: HealthRollup::from_pods(pods.iter().copied()),
            namespaces: NamespaceGroups::from_refs(pods.iter().copied()),
            pods,
        })
        .collect();

    NodeGroups { groups }
}
