//! Grouping of container-related inventory by resource kind

use super::group_stable;
use crate::models::Resource;

#[derive(Debug, Clone)]
pub struct ResourceKindGroup<'a> {
    pub kind: &'a str,
    pub resources: Vec<&'a Resource>,
}

/// Group the container-related resources by kind, in first-occurrence order
pub fn group_resources_by_kind<'a>(resources: &'a [Resource]) -> Vec<ResourceKindGroup<'a>> {
    group_stable(
        resources.iter().filter(|r| r.is_container_related()),
        |r: &'a Resource| r.kind(),
    )
    .into_iter()
    .map(|(kind, resources)| ResourceKindGroup { kind, resources })
    .collect()
}
