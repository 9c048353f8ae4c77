use std::collections::HashSet;

use crate::catalog::{CatalogCache, ElementSet, ObjectGroup};

/// An element set and the group that owns its catalog id for this pass.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedObject<'a> {
    pub element_set: &'a ElementSet,
    pub group: &'a ObjectGroup,
}

/// Pick one owner per catalog id across the enabled groups.
///
/// Groups are walked from most to least specific category, ties broken by
/// group id; the first group holding an id claims it.
pub fn resolve<'a>(groups: &'a [ObjectGroup], cache: &'a CatalogCache) -> Vec<ResolvedObject<'a>> {
    let mut ordered: Vec<&ObjectGroup> = groups.iter().filter(|g| g.enabled).collect();
    ordered.sort_by(|a, b| {
        a.category
            .rank()
            .cmp(&b.category.rank())
            .then_with(|| a.id.cmp(&b.id))
    });

    let capacity = ordered.iter().map(|g| cache.get(&g.id).len()).sum();
    let mut claimed: HashSet<u32> = HashSet::with_capacity(capacity);
    let mut resolved = Vec::with_capacity(capacity);

    for group in ordered {
        for element_set in cache.get(&group.id) {
            if claimed.insert(element_set.catalog_id) {
                resolved.push(ResolvedObject { element_set, group });
            }
        }
    }

    resolved
}
