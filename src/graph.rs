//! Graph Query Layer - one-hop relationship expansion
//!
//! Attaches immediate parents and children to rows fetched from the entity
//! store. Expansion never goes past one generation: an attached parent has
//! no `parents` of its own and an attached child has no `children`. Callers
//! needing deeper trees call again with the neighbour.
//!
//! Holds no state; every call reads fresh rows from the stores.

use crate::{Error, Result};
use crate::identifier::Identifier;
use crate::listing::{Listing, Page};
use crate::stakeholder::Stakeholder;
use crate::storage::{EntityStore, RelationStore};

/// One-hop queries over a store.
pub struct GraphQuery<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> GraphQuery<'a, S>
where
    S: EntityStore + RelationStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Direct parents of `stakeholder`, in store order
    pub fn attach_parents(&self, stakeholder: &Stakeholder) -> Result<Vec<Stakeholder>> {
        let parent_ids = self.store.parent_ids(&stakeholder.stakeholder_uuid)?;
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.store.find_by_uuids(&parent_ids, None)
    }

    /// Direct children of `parent`, ordered by organization name and paged
    /// with the caller's window.
    ///
    /// Each child carries a single back-reference to the bare `parent`, not
    /// its full parent list.
    pub fn attach_children(&self, parent: &Stakeholder, page: Page) -> Result<Vec<Stakeholder>> {
        let child_ids = self.store.child_ids(&parent.stakeholder_uuid)?;
        if child_ids.is_empty() {
            return Ok(Vec::new());
        }

        let back_reference = parent.bare();
        let children = self
            .store
            .find_by_uuids(&child_ids, Some(page))?
            .into_iter()
            .map(|mut child| {
                child.parents = Some(vec![back_reference.clone()]);
                child
            })
            .collect();
        Ok(children)
    }

    /// Fill both `parents` and `children` of `stakeholder`
    pub fn expand(&self, mut stakeholder: Stakeholder, page: Page) -> Result<Stakeholder> {
        let parents = self.attach_parents(&stakeholder)?;
        let children = self.attach_children(&stakeholder, page)?;
        stakeholder.parents = Some(parents);
        stakeholder.children = Some(children);
        Ok(stakeholder)
    }

    /// Every stakeholder with no direct relation to the target, excluding
    /// the target itself
    pub fn get_unlinked(&self, id: &Identifier, page: Page) -> Result<Listing<Stakeholder>> {
        let target = self
            .store
            .get_by_id(id)?
            .ok_or_else(|| Error::NotFound(format!("stakeholder {}", id)))?;

        let mut excluded: Vec<String> = self.store.related_ids(id)?.into_iter().collect();
        excluded.push(target.stakeholder_uuid);
        self.store.list_excluding(&excluded, page)
    }
}
