//! Listing/Filtering Facade
//!
//! Async entry point for external callers. Every operation moves its SQL onto
//! tokio's blocking pool; listings expand each row in its own blocking task
//! and await the handles in list order, so output order is the store's order.
//!
//! Pagination always comes from the caller. The facade never clamps or
//! defaults a [`Page`].

use std::sync::Arc;
use crate::{Error, Result};
use crate::graph::GraphQuery;
use crate::identifier::Identifier;
use crate::listing::{Listing, Page};
use crate::relation::{LinkRequest, Relation, RelationType};
use crate::stakeholder::{Attributes, Filter, Stakeholder};
use crate::storage::{DbStats, StakeholderStore};

/// Async facade over an injected store.
pub struct StakeholderRegistry<S> {
    store: Arc<S>,
}

impl<S> Clone for StakeholderRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> StakeholderRegistry<S>
where
    S: StakeholderStore + Send + Sync + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Run one blocking store call off the async runtime
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&S) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(&store)).await?
    }

    /// Expand every row of `listing`, one blocking task per row.
    ///
    /// All tasks are started before any is awaited. The first failing row
    /// fails the whole listing.
    async fn expand_rows(&self, listing: Listing<Stakeholder>, page: Page) -> Result<Listing<Stakeholder>> {
        let Listing { rows, count } = listing;

        let handles: Vec<_> = rows
            .into_iter()
            .map(|row| {
                let store = Arc::clone(&self.store);
                tokio::task::spawn_blocking(move || GraphQuery::new(store.as_ref()).expand(row, page))
            })
            .collect();

        let mut expanded = Vec::with_capacity(handles.len());
        for handle in handles {
            expanded.push(handle.await??);
        }
        Ok(Listing::new(expanded, count))
    }

    /// Every stakeholder, ordered by organization name, each with its
    /// parents and children attached
    pub async fn list_all(&self, page: Page) -> Result<Listing<Stakeholder>> {
        let listing = self.blocking(move |store| store.list(page)).await?;
        self.expand_rows(listing, page).await
    }

    /// Stakeholders that are nobody's child, expanded one hop.
    ///
    /// `count` is the number of roots, not the number of all stakeholders.
    pub async fn list_trees(&self, page: Page) -> Result<Listing<Stakeholder>> {
        let roots = self.blocking(move |store| store.list_roots(page)).await?;
        self.expand_rows(roots, page).await
    }

    /// A single expanded stakeholder with all of its children
    pub async fn get_one(&self, id: &Identifier) -> Result<Listing<Stakeholder>> {
        self.get_one_paged(id, Page::unbounded()).await
    }

    /// A single expanded stakeholder, paging its children with `page`
    pub async fn get_one_paged(&self, id: &Identifier, page: Page) -> Result<Listing<Stakeholder>> {
        let id = id.clone();
        self.blocking(move |store| {
            let row = store
                .get_by_id(&id)?
                .ok_or_else(|| Error::NotFound(format!("stakeholder {}", id)))?;
            let expanded = GraphQuery::new(store).expand(row, page)?;
            Ok(Listing::new(vec![expanded], 1))
        })
        .await
    }

    /// Flat row by numeric id or uuid
    pub async fn get_by_id(&self, id: &Identifier) -> Result<Stakeholder> {
        let id = id.clone();
        self.blocking(move |store| {
            store
                .get_by_id(&id)?
                .ok_or_else(|| Error::NotFound(format!("stakeholder {}", id)))
        })
        .await
    }

    /// Equality-filtered listing, expanded; `count` is the number of matches
    pub async fn list_by_filter(&self, filter: &Filter, page: Page) -> Result<Listing<Stakeholder>> {
        let filter = filter.clone();
        let listing = self.blocking(move |store| store.filter(&filter, page)).await?;
        self.expand_rows(listing, page).await
    }

    /// Direct neighbours of the target that also match `filter`.
    ///
    /// Rows come back flat, unlike the other listings.
    pub async fn list_related_filtered(
        &self,
        id: &Identifier,
        filter: &Filter,
        page: Page,
    ) -> Result<Listing<Stakeholder>> {
        let id = id.clone();
        let filter = filter.clone();
        self.blocking(move |store| {
            let related: Vec<String> = store.related_ids(&id)?.into_iter().collect();
            store.filter_within(&related, &filter, page)
        })
        .await
    }

    /// Stakeholders with no direct relation to the target
    pub async fn get_unlinked(&self, id: &Identifier, page: Page) -> Result<Listing<Stakeholder>> {
        let id = id.clone();
        self.blocking(move |store| GraphQuery::new(store).get_unlinked(&id, page))
            .await
    }

    /// Link or unlink the subject and `request.other_uuid`.
    ///
    /// The subject may be given by numeric id or uuid. Returns the edge that
    /// was inserted or removed.
    pub async fn update_link(&self, subject: &Identifier, request: LinkRequest) -> Result<Relation> {
        let subject = subject.clone();
        self.blocking(move |store| {
            let row = store
                .get_by_id(&subject)?
                .ok_or_else(|| Error::NotFound(format!("stakeholder {}", subject)))?;
            let edge = request.edge_for(&row.stakeholder_uuid);

            if request.linked {
                store.link(&edge)
            } else {
                store
                    .unlink(&edge)?
                    .ok_or_else(|| Error::NotFound(format!("relation {} -> {}", edge.parent_id, edge.child_id)))
            }
        })
        .await
    }

    pub async fn create(&self, attrs: Attributes) -> Result<Stakeholder> {
        self.blocking(move |store| store.create(&attrs)).await
    }

    /// `attrs` must carry the `id` of the row to update
    pub async fn update(&self, attrs: Attributes) -> Result<Stakeholder> {
        self.blocking(move |store| store.update(&attrs)).await
    }

    /// Run `f` inside one transaction; commit on `Ok`, roll back on `Err`
    pub async fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn StakeholderStore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.blocking(move |store| store.in_transaction(f)).await
    }

    /// Create a stakeholder and link it to `other_uuid` atomically.
    ///
    /// With [`RelationType::Parents`] the other stakeholder becomes the new
    /// row's parent; with [`RelationType::Children`] its child.
    pub async fn create_linked(
        &self,
        attrs: Attributes,
        relation_type: RelationType,
        other_uuid: impl Into<String>,
    ) -> Result<(Stakeholder, Relation)> {
        let other_uuid = other_uuid.into();
        self.transaction(move |tx| {
            let created = tx.create(&attrs)?;
            let edge = tx.link(&relation_type.edge(&created.stakeholder_uuid, &other_uuid))?;
            Ok((created, edge))
        })
        .await
    }

    pub async fn stats(&self) -> Result<DbStats> {
        tracing::debug!("Collecting registry stats");
        self.blocking(|store| store.stats()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stakeholder::Column;
    use crate::storage::{ConnectionSource, EntityStore, RelationStore, SqliteStore};

    fn org(uuid: &str, name: &str) -> Attributes {
        Attributes::new()
            .with(Column::StakeholderUuid, uuid)
            .with(Column::OrgName, name)
    }

    fn registry_with(orgs: &[(&str, &str)], edges: &[(&str, &str)]) -> StakeholderRegistry<SqliteStore> {
        let store = SqliteStore::open_in_memory().unwrap();
        for (uuid, name) in orgs {
            store.create(&org(uuid, name)).unwrap();
        }
        for (parent, child) in edges {
            store.link(&Relation::new(*parent, *child)).unwrap();
        }
        StakeholderRegistry::new(Arc::new(store))
    }

    fn id(raw: &str) -> Identifier {
        Identifier::parse(raw).unwrap()
    }

    fn uuids(rows: &[Stakeholder]) -> Vec<&str> {
        rows.iter().map(|s| s.stakeholder_uuid.as_str()).collect()
    }

    #[tokio::test]
    async fn test_acme_beta_scenario() {
        let registry = registry_with(&[("u1", "Acme"), ("u2", "Beta")], &[("u1", "u2")]);

        let listing = registry.get_one(&id("u1")).await.unwrap();
        assert_eq!(listing.count, 1);
        let acme = &listing.rows[0];
        assert_eq!(acme.id, 1);
        assert_eq!(acme.org_name.as_deref(), Some("Acme"));
        assert!(acme.parents.as_ref().unwrap().is_empty());

        let children = acme.children.as_ref().unwrap();
        assert_eq!(uuids(children), vec!["u2"]);
        assert_eq!(uuids(children[0].parents.as_ref().unwrap()), vec!["u1"]);

        let removed = registry
            .update_link(&Identifier::Numeric(1), LinkRequest::unlink(RelationType::Children, "u2"))
            .await
            .unwrap();
        assert_eq!(removed, Relation::new("u1", "u2"));

        let acme = registry.get_one(&id("u1")).await.unwrap();
        assert!(acme.rows[0].children.as_ref().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_every_identifier_form_resolves() {
        let registry = registry_with(&[("u1", "Acme"), ("u2", "Beta")], &[]);

        for key in [Identifier::Numeric(2), id("2"), id("u2")] {
            let beta = registry.get_by_id(&key).await.unwrap();
            assert_eq!(beta.org_name.as_deref(), Some("Beta"), "lookup by {key}");
        }

        let err = registry.get_one(&id("u9")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_all_pages_with_stable_count() {
        let registry = registry_with(
            &[("d", "Delta"), ("a", "Alpha"), ("c", "Charlie"), ("b", "Bravo")],
            &[("a", "b")],
        );

        let first = registry.list_all(Page::new(2, 0)).await.unwrap();
        assert_eq!(uuids(&first.rows), vec!["a", "b"]);
        assert_eq!(first.count, 4);
        assert!(first.rows.iter().all(Stakeholder::is_expanded));
        assert_eq!(uuids(first.rows[0].children.as_ref().unwrap()), vec!["b"]);
        assert_eq!(uuids(first.rows[1].parents.as_ref().unwrap()), vec!["a"]);

        let rest = registry.list_all(Page::new(10, 2)).await.unwrap();
        assert_eq!(uuids(&rest.rows), vec!["c", "d"]);
        assert_eq!(rest.count, 4);

        let past_end = registry.list_all(Page::new(10, 10)).await.unwrap();
        assert!(past_end.rows.is_empty());
        assert_eq!(past_end.count, 4);
    }

    #[tokio::test]
    async fn test_list_by_filter_counts_matches() {
        let registry = registry_with(&[("a", "Same"), ("b", "Same"), ("c", "Other")], &[]);
        let filter = Filter::new().with(Column::OrgName, "Same");

        let listing = registry.list_by_filter(&filter, Page::new(1, 0)).await.unwrap();
        assert_eq!(listing.rows.len(), 1);
        assert_eq!(listing.count, 2);
        assert!(listing.rows[0].is_expanded());
    }

    #[tokio::test]
    async fn test_related_filtered_rows_are_flat() {
        let registry = registry_with(
            &[("x", "X"), ("p", "Partner"), ("c", "Partner"), ("o", "Other"), ("far", "Partner")],
            &[("p", "x"), ("x", "c"), ("x", "o"), ("c", "far")],
        );
        let filter = Filter::new().with(Column::OrgName, "Partner");

        let related = registry
            .list_related_filtered(&id("x"), &filter, Page::unbounded())
            .await
            .unwrap();
        assert_eq!(related.count, 2);
        let mut found = uuids(&related.rows);
        found.sort();
        assert_eq!(found, vec!["c", "p"]);
        assert!(related.rows.iter().all(|row| !row.is_expanded()));

        // the filtered listing over the same rows is expanded
        let expanded = registry.list_by_filter(&filter, Page::unbounded()).await.unwrap();
        assert!(expanded.rows.iter().all(Stakeholder::is_expanded));
    }

    #[tokio::test]
    async fn test_related_filtered_pages_in_name_order() {
        let registry = registry_with(&[("x", "X")], &[]);
        let store = Arc::clone(registry.store());
        for (uuid, name, email) in [
            ("k1", "Kilo", "team@partner.test"),
            ("a1", "Alpha", "team@partner.test"),
            ("m1", "Mike", "team@partner.test"),
            ("o", "Other", "solo@else.test"),
        ] {
            store.create(&org(uuid, name).with(Column::Email, email)).unwrap();
        }
        for edge in [Relation::new("k1", "x"), Relation::new("x", "a1"), Relation::new("x", "m1"), Relation::new("x", "o")] {
            store.link(&edge).unwrap();
        }
        let filter = Filter::new().with(Column::Email, "team@partner.test");

        let all = registry
            .list_related_filtered(&id("x"), &filter, Page::unbounded())
            .await
            .unwrap();
        assert_eq!(uuids(&all.rows), vec!["a1", "k1", "m1"]);
        assert_eq!(all.count, 3);

        let second = registry
            .list_related_filtered(&id("x"), &filter, Page::new(1, 1))
            .await
            .unwrap();
        assert_eq!(uuids(&second.rows), vec!["k1"]);
        assert_eq!(second.count, 3);
        assert!(!second.rows[0].is_expanded());
    }

    #[tokio::test]
    async fn test_update_link_assigns_roles() {
        let registry = registry_with(&[("s", "Subject"), ("o", "Other")], &[]);
        let store = Arc::clone(registry.store());

        let edge = registry
            .update_link(&id("s"), LinkRequest::link(RelationType::Parents, "o"))
            .await
            .unwrap();
        assert_eq!(edge, Relation::new("o", "s"));
        assert_eq!(store.parent_ids("s").unwrap(), vec!["o"]);

        let edge = registry
            .update_link(&id("s"), LinkRequest::link(RelationType::Children, "o"))
            .await
            .unwrap();
        assert_eq!(edge, Relation::new("s", "o"));
        assert_eq!(store.child_ids("s").unwrap(), vec!["o"]);
    }

    #[tokio::test]
    async fn test_update_link_errors() {
        let registry = registry_with(&[("s", "Subject"), ("o", "Other")], &[]);

        let missing_edge = registry
            .update_link(&id("s"), LinkRequest::unlink(RelationType::Children, "o"))
            .await
            .unwrap_err();
        assert!(missing_edge.is_not_found());

        let missing_subject = registry
            .update_link(&id("ghost"), LinkRequest::link(RelationType::Children, "o"))
            .await
            .unwrap_err();
        assert!(missing_subject.is_not_found());

        let missing_other = registry
            .update_link(&id("s"), LinkRequest::link(RelationType::Children, "ghost"))
            .await
            .unwrap_err();
        assert!(missing_other.is_validation());

        registry
            .update_link(&id("s"), LinkRequest::link(RelationType::Children, "o"))
            .await
            .unwrap();
        let duplicate = registry
            .update_link(&id("s"), LinkRequest::link(RelationType::Children, "o"))
            .await
            .unwrap_err();
        assert!(duplicate.is_validation());
    }

    #[tokio::test]
    async fn test_create_linked_is_atomic() {
        let registry = registry_with(&[("p", "Parent")], &[]);

        let (child, edge) = registry
            .create_linked(org("c", "Child"), RelationType::Parents, "p")
            .await
            .unwrap();
        assert_eq!(child.stakeholder_uuid, "c");
        assert_eq!(edge, Relation::new("p", "c"));

        let err = registry
            .create_linked(org("orphan", "Orphan"), RelationType::Parents, "ghost")
            .await
            .unwrap_err();
        assert!(err.is_validation(), "{err}");

        let orphan = registry.get_by_id(&id("orphan")).await.unwrap_err();
        assert!(orphan.is_not_found());
        assert_eq!(registry.stats().await.unwrap(), DbStats { stakeholders: 2, relations: 1 });
    }

    #[tokio::test]
    async fn test_transaction_returns_closure_value() {
        let registry = registry_with(&[], &[]);

        let count = registry
            .transaction(|tx| {
                tx.create(&org("a", "A"))?;
                tx.create(&org("b", "B"))?;
                tx.count_stakeholders()
            })
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_trees_list_only_roots() {
        let registry = registry_with(
            &[("r1", "Root One"), ("r2", "Root Two"), ("k", "Kid")],
            &[("r1", "k")],
        );

        let trees = registry.list_trees(Page::unbounded()).await.unwrap();
        assert_eq!(uuids(&trees.rows), vec!["r1", "r2"]);
        assert_eq!(trees.count, 2);
        assert_eq!(uuids(trees.rows[0].children.as_ref().unwrap()), vec!["k"]);
    }

    #[tokio::test]
    async fn test_failed_expansion_fails_listing() {
        let registry = registry_with(&[("a", "A"), ("b", "B")], &[("a", "b")]);
        registry
            .store()
            .with_conn(|conn| {
                conn.execute("DROP TABLE stakeholder_relations", [])?;
                Ok(())
            })
            .unwrap();

        let err = registry.list_all(Page::unbounded()).await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)), "{err}");
    }

    #[tokio::test]
    async fn test_get_unlinked_through_facade() {
        let registry = registry_with(&[("x", "X"), ("y", "Y"), ("z", "Z")], &[("x", "y")]);

        let unlinked = registry.get_unlinked(&id("x"), Page::unbounded()).await.unwrap();
        assert_eq!(uuids(&unlinked.rows), vec!["z"]);
        assert_eq!(unlinked.count, 1);
    }

    #[tokio::test]
    async fn test_update_through_facade() {
        let registry = registry_with(&[("a", "Acme")], &[]);

        let updated = registry
            .update(Attributes::new().with(Column::Id, 1i64).with(Column::Email, "hi@acme.test"))
            .await
            .unwrap();
        assert_eq!(updated.email.as_deref(), Some("hi@acme.test"));
        assert_eq!(updated.org_name.as_deref(), Some("Acme"));
    }
}
