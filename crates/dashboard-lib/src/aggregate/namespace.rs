//! Grouping by namespace

use super::{group_stable, HealthRollup};
use crate::models::Pod;

/// Pods sharing a namespace with their rollup
#[derive(Debug, Clone)]
pub struct NamespaceGroup<'a> {
    pub namespace: &'a str,
    pub pods: Vec<&'a Pod>,
    pub rollup: HealthRollup,
}

impl NamespaceGroup<'_> {
    pub fn is_healthy(&self) -> bool {
        self.rollup.is_healthy()
    }
}

/// Namespace groups in first-occurrence order
#[derive(Debug, Clone, Default)]
pub struct NamespaceGroups<'a> {
    groups: Vec<NamespaceGroup<'a>>,
}

impl<'a> NamespaceGroups<'a> {
    pub(crate) fn from_refs(pods: impl IntoIterator<Item = &'a Pod>) -> Self {
        let groups = group_stable(pods, |pod: &'a Pod| pod.namespace.as_str())
            .into_iter()
            .map(|(namespace, pods)| NamespaceGroup {
                namespace,
                rollup: HealthRollup::from_pods(pods.iter().copied()),
                pods,
            })
            .collect();

        Self { groups }
    }

    pub fn get(&self, namespace: &str) -> Option<&NamespaceGroup<'a>> {
        self.groups.iter().find(|g| g.namespace == namespace)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamespaceGroup<'a>> {
        self.groups.iter()
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.groups.iter().map(|g| g.namespace)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl<'a, 'g> IntoIterator for &'g NamespaceGroups<'a> {
    type Item = &'g NamespaceGroup<'a>;
    type IntoIter = std::slice::Iter<'g, NamespaceGroup<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

/// Group pods by namespace, keeping the order in which namespaces first appear
pub fn group_by_namespace(pods: &[Pod]) -> NamespaceGroups<'_> {
    NamespaceGroups::from_refs(pods)
}
