//! Relation store queries over the `stakeholder_relations` table

use std::collections::BTreeSet;
use rusqlite::{Connection, params};
use crate::{Error, Result};
use crate::identifier::Identifier;
use crate::relation::Relation;

fn row_to_relation(row: &rusqlite::Row) -> rusqlite::Result<Relation> {
    Ok(Relation {
        parent_id: row.get(0)?,
        child_id: row.get(1)?,
    })
}

fn neighbour_ids(conn: &Connection, sql: &str, uuid: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map([uuid], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(ids)
}

/// Uuids of the direct parents of `uuid`
pub fn parent_ids(conn: &Connection, uuid: &str) -> Result<Vec<String>> {
    neighbour_ids(
        conn,
        "SELECT parent_id FROM stakeholder_relations WHERE child_id = ?1 ORDER BY id",
        uuid,
    )
}

/// Uuids of the direct children of `uuid`
pub fn child_ids(conn: &Connection, uuid: &str) -> Result<Vec<String>> {
    neighbour_ids(
        conn,
        "SELECT child_id FROM stakeholder_relations WHERE parent_id = ?1 ORDER BY id",
        uuid,
    )
}

/// Insert a directed edge
pub fn link(conn: &Connection, relation: &Relation) -> Result<Relation> {
    if relation.parent_id.is_empty() || relation.child_id.is_empty() {
        return Err(Error::Validation(format!(
            "relation requires both parent_id and child_id, got {:?}",
            relation
        )));
    }

    let linked = conn
        .query_row(
            "INSERT INTO stakeholder_relations (parent_id, child_id) VALUES (?1, ?2) RETURNING parent_id, child_id",
            params![relation.parent_id, relation.child_id],
            row_to_relation,
        )
        .map_err(Error::from_write)?;
    tracing::info!("Linked {} -> {}", linked.parent_id, linked.child_id);
    Ok(linked)
}

/// Delete the matching edge; `None` when nothing matched
pub fn unlink(conn: &Connection, relation: &Relation) -> Result<Option<Relation>> {
    let mut stmt = conn.prepare(
        "DELETE FROM stakeholder_relations WHERE parent_id = ?1 AND child_id = ?2 RETURNING parent_id, child_id",
    )?;
    let removed = stmt
        .query_map(params![relation.parent_id, relation.child_id], row_to_relation)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(Error::from_write)?;

    if let Some(first) = removed.first() {
        tracing::info!("Unlinked {} -> {}", first.parent_id, first.child_id);
    }
    Ok(removed.into_iter().next())
}

/// Set of every uuid directly related to the target, in either direction.
///
/// Resolved in a single join; the target's own uuid only appears for a
/// self-edge.
pub fn related_ids(conn: &Connection, id: &Identifier) -> Result<BTreeSet<String>> {
    let sql = format!(
        "SELECT s.stakeholder_uuid, sr.parent_id, sr.child_id
         FROM stakeholder s
         JOIN stakeholder_relations sr
           ON s.stakeholder_uuid = sr.child_id OR s.stakeholder_uuid = sr.parent_id
         WHERE s.{} = ?1",
        id.column()
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![id], |row| {
            let target: String = row.get(0)?;
            Ok((target, Relation::new(row.get::<_, String>(1)?, row.get::<_, String>(2)?)))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let ids = rows
        .iter()
        .filter_map(|(target, edge)| edge.other_end(target).map(str::to_string))
        .collect();
    Ok(ids)
}

/// Count all edges
pub fn count(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM stakeholder_relations", [], |row| row.get(0))?;
    Ok(count as usize)
}
