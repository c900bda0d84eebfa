//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - stakeholder(id, stakeholder_uuid, org_name, first_name, last_name, email, phone, ...)
//! - stakeholder_relations(parent_id, child_id), both `stakeholder_uuid` values
//!
//! The entity and relation stores are traits so the graph layer and the
//! registry can run against a pooled store or an open transaction scope.

pub mod schema;
pub mod entities;
pub mod relations;
pub mod sqlite;

pub use sqlite::{SqliteStore, TxScope};

use std::collections::BTreeSet;
use rusqlite::Connection;
use serde::Serialize;
use crate::Result;
use crate::identifier::Identifier;
use crate::listing::{Listing, Page};
use crate::relation::Relation;
use crate::stakeholder::{Attributes, Filter, Stakeholder};

/// CRUD access to the `stakeholder` table.
pub trait EntityStore {
    /// Look up by numeric id or uuid; `None` when nothing matched
    fn get_by_id(&self, id: &Identifier) -> Result<Option<Stakeholder>>;
    /// Page ordered by organization name, with the total row count
    fn list(&self, page: Page) -> Result<Listing<Stakeholder>>;
    /// Equality filter with the same ordering and paging as `list`
    fn filter(&self, filter: &Filter, page: Page) -> Result<Listing<Stakeholder>>;
    fn create(&self, attrs: &Attributes) -> Result<Stakeholder>;
    /// `attrs` must carry the target `id`
    fn update(&self, attrs: &Attributes) -> Result<Stakeholder>;
    fn find_by_uuids(&self, uuids: &[String], page: Option<Page>) -> Result<Vec<Stakeholder>>;
    fn filter_within(&self, uuids: &[String], filter: &Filter, page: Page) -> Result<Listing<Stakeholder>>;
    fn list_excluding(&self, uuids: &[String], page: Page) -> Result<Listing<Stakeholder>>;
    fn list_roots(&self, page: Page) -> Result<Listing<Stakeholder>>;
    fn count_stakeholders(&self) -> Result<usize>;
}

/// CRUD access to the `stakeholder_relations` table.
pub trait RelationStore {
    fn parent_ids(&self, uuid: &str) -> Result<Vec<String>>;
    fn child_ids(&self, uuid: &str) -> Result<Vec<String>>;
    fn link(&self, relation: &Relation) -> Result<Relation>;
    fn unlink(&self, relation: &Relation) -> Result<Option<Relation>>;
    /// Union of every uuid directly related to the target, both directions
    fn related_ids(&self, id: &Identifier) -> Result<BTreeSet<String>>;
    fn count_relations(&self) -> Result<usize>;
}

/// A full store: both tables plus a transaction scope.
pub trait StakeholderStore: EntityStore + RelationStore {
    /// Run `f` inside one database transaction.
    ///
    /// Commits when `f` returns `Ok`, rolls back otherwise. Calling this on a
    /// scope that is already transactional joins the open transaction.
    fn in_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn StakeholderStore) -> Result<T>,
        Self: Sized;

    /// Row counts of both tables
    fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            stakeholders: self.count_stakeholders()?,
            relations: self.count_relations()?,
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DbStats {
    pub stakeholders: usize,
    pub relations: usize,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Stakeholders: {}", self.stakeholders)?;
        writeln!(f, "  Relations: {}", self.relations)
    }
}

/// Anything that can lend out a SQLite connection for one call.
pub trait ConnectionSource {
    fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>;
}

impl<C: ConnectionSource> EntityStore for C {
    fn get_by_id(&self, id: &Identifier) -> Result<Option<Stakeholder>> {
        tracing::debug!("get_by_id {} = {}", id.column(), id);
        self.with_conn(|conn| entities::get_by_id(conn, id))
    }

    fn list(&self, page: Page) -> Result<Listing<Stakeholder>> {
        tracing::debug!("list limit={} offset={}", page.limit, page.offset);
        self.with_conn(|conn| entities::list(conn, page))
    }

    fn filter(&self, filter: &Filter, page: Page) -> Result<Listing<Stakeholder>> {
        tracing::debug!("filter on {} column(s)", filter.len());
        self.with_conn(|conn| entities::filter(conn, filter, page))
    }

    fn create(&self, attrs: &Attributes) -> Result<Stakeholder> {
        self.with_conn(|conn| entities::create(conn, attrs))
    }

    fn update(&self, attrs: &Attributes) -> Result<Stakeholder> {
        self.with_conn(|conn| entities::update(conn, attrs))
    }

    fn find_by_uuids(&self, uuids: &[String], page: Option<Page>) -> Result<Vec<Stakeholder>> {
        self.with_conn(|conn| entities::find_by_uuids(conn, uuids, page))
    }

    fn filter_within(&self, uuids: &[String], filter: &Filter, page: Page) -> Result<Listing<Stakeholder>> {
        self.with_conn(|conn| entities::filter_within(conn, uuids, filter, page))
    }

    fn list_excluding(&self, uuids: &[String], page: Page) -> Result<Listing<Stakeholder>> {
        self.with_conn(|conn| entities::list_excluding(conn, uuids, page))
    }

    fn list_roots(&self, page: Page) -> Result<Listing<Stakeholder>> {
        self.with_conn(|conn| entities::list_roots(conn, page))
    }

    fn count_stakeholders(&self) -> Result<usize> {
        self.with_conn(entities::count)
    }
}

impl<C: ConnectionSource> RelationStore for C {
    fn parent_ids(&self, uuid: &str) -> Result<Vec<String>> {
        tracing::debug!("parent_ids of {}", uuid);
        self.with_conn(|conn| relations::parent_ids(conn, uuid))
    }

    fn child_ids(&self, uuid: &str) -> Result<Vec<String>> {
        tracing::debug!("child_ids of {}", uuid);
        self.with_conn(|conn| relations::child_ids(conn, uuid))
    }

    fn link(&self, relation: &Relation) -> Result<Relation> {
        self.with_conn(|conn| relations::link(conn, relation))
    }

    fn unlink(&self, relation: &Relation) -> Result<Option<Relation>> {
        self.with_conn(|conn| relations::unlink(conn, relation))
    }

    fn related_ids(&self, id: &Identifier) -> Result<BTreeSet<String>> {
        tracing::debug!("related_ids of {}", id);
        self.with_conn(|conn| relations::related_ids(conn, id))
    }

    fn count_relations(&self) -> Result<usize> {
        self.with_conn(relations::count)
    }
}
