//! Entity store queries over the `stakeholder` table
//!
//! All functions take a borrowed `&Connection` so they run the same way on a
//! pooled connection or inside an open transaction.

use rusqlite::types::ToSql;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use crate::{Error, Result};
use crate::identifier::Identifier;
use crate::listing::{Listing, Page};
use crate::stakeholder::{AttrValue, Attributes, Column, Filter, Stakeholder};

/// Nameless stakeholders (individuals) sort after every organization
const ORDER_BY_ORG_NAME: &str = "ORDER BY org_name ASC NULLS LAST, id ASC";

/// WHERE clause under construction, with its positional parameters.
#[derive(Default)]
struct Predicate {
    conditions: Vec<String>,
    params: Vec<Box<dyn ToSql>>,
}

impl Predicate {
    fn push_param(&mut self, value: Box<dyn ToSql>) -> usize {
        self.params.push(value);
        self.params.len()
    }

    /// Equality on every filter entry; `NULL` compares with `IS NULL`
    fn equals(&mut self, filter: &Filter) {
        for (column, value) in filter.iter() {
            if value.is_null() {
                self.conditions.push(format!("{} IS NULL", column.as_str()));
            } else {
                let idx = self.push_param(Box::new(value.clone()));
                self.conditions.push(format!("{} = ?{}", column.as_str(), idx));
            }
        }
    }

    fn uuid_in(&mut self, uuids: &[String], negate: bool) {
        if uuids.is_empty() {
            // IN () matches nothing, NOT IN () matches everything
            if !negate {
                self.conditions.push("0".to_string());
            }
            return;
        }
        let placeholders: Vec<String> = uuids
            .iter()
            .map(|uuid| format!("?{}", self.push_param(Box::new(uuid.clone()))))
            .collect();
        let op = if negate { "NOT IN" } else { "IN" };
        self.conditions
            .push(format!("stakeholder_uuid {} ({})", op, placeholders.join(", ")));
    }

    fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    fn param_refs(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(AsRef::as_ref).collect()
    }
}

/// Helper to convert a row selected with [`Column::select_list`]
pub fn row_to_stakeholder(row: &rusqlite::Row) -> rusqlite::Result<Stakeholder> {
    Ok(Stakeholder {
        id: row.get(0)?,
        stakeholder_uuid: row.get(1)?,
        org_name: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        email: row.get(5)?,
        phone: row.get(6)?,
        website: row.get(7)?,
        logo_url: row.get(8)?,
        map: row.get(9)?,
        parents: None,
        children: None,
    })
}

/// Page of rows matching `predicate` plus the unpaged match count
fn select_page(conn: &Connection, predicate: &Predicate, page: Page) -> Result<Listing<Stakeholder>> {
    let where_clause = predicate.where_clause();
    let (limit, offset) = page.sql_bounds();
    let sql = format!(
        "SELECT {} FROM stakeholder{} {} LIMIT {} OFFSET {}",
        Column::select_list(),
        where_clause,
        ORDER_BY_ORG_NAME,
        limit,
        offset
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(predicate.param_refs()), row_to_stakeholder)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM stakeholder{}", where_clause),
        params_from_iter(predicate.param_refs()),
        |row| row.get(0),
    )?;

    Ok(Listing::new(rows, count as usize))
}

/// Get a stakeholder by numeric id or uuid (exactly one key per call)
pub fn get_by_id(conn: &Connection, id: &Identifier) -> Result<Option<Stakeholder>> {
    let sql = format!(
        "SELECT {} FROM stakeholder WHERE {} = ?1",
        Column::select_list(),
        id.column()
    );
    conn.query_row(&sql, params![id], row_to_stakeholder)
        .optional()
        .map_err(Into::into)
}

/// All stakeholders ordered by organization name
pub fn list(conn: &Connection, page: Page) -> Result<Listing<Stakeholder>> {
    select_page(conn, &Predicate::default(), page)
}

/// Equality filter over known columns
pub fn filter(conn: &Connection, filter: &Filter, page: Page) -> Result<Listing<Stakeholder>> {
    let mut predicate = Predicate::default();
    predicate.equals(filter);
    select_page(conn, &predicate, page)
}

/// Rows whose uuid is in `uuids`; ordered and paged only when `page` is given
pub fn find_by_uuids(conn: &Connection, uuids: &[String], page: Option<Page>) -> Result<Vec<Stakeholder>> {
    if uuids.is_empty() {
        return Ok(Vec::new());
    }

    let mut predicate = Predicate::default();
    predicate.uuid_in(uuids, false);

    let tail = match page {
        Some(page) => {
            let (limit, offset) = page.sql_bounds();
            format!(" {} LIMIT {} OFFSET {}", ORDER_BY_ORG_NAME, limit, offset)
        }
        None => String::new(),
    };
    let sql = format!(
        "SELECT {} FROM stakeholder{}{}",
        Column::select_list(),
        predicate.where_clause(),
        tail
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(predicate.param_refs()), row_to_stakeholder)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Rows in `uuids` that also match `filter`
pub fn filter_within(
    conn: &Connection,
    uuids: &[String],
    filter: &Filter,
    page: Page,
) -> Result<Listing<Stakeholder>> {
    if uuids.is_empty() {
        return Ok(Listing::empty());
    }

    let mut predicate = Predicate::default();
    predicate.uuid_in(uuids, false);
    predicate.equals(filter);
    select_page(conn, &predicate, page)
}

/// Rows whose uuid is not in `uuids`
pub fn list_excluding(conn: &Connection, uuids: &[String], page: Page) -> Result<Listing<Stakeholder>> {
    let mut predicate = Predicate::default();
    predicate.uuid_in(uuids, true);
    select_page(conn, &predicate, page)
}

/// Stakeholders that are nobody's child
pub fn list_roots(conn: &Connection, page: Page) -> Result<Listing<Stakeholder>> {
    let mut predicate = Predicate::default();
    predicate
        .conditions
        .push("stakeholder_uuid NOT IN (SELECT child_id FROM stakeholder_relations)".to_string());
    select_page(conn, &predicate, page)
}

/// Insert a stakeholder, generating a uuid when none is supplied
pub fn create(conn: &Connection, attrs: &Attributes) -> Result<Stakeholder> {
    let mut attrs = attrs.clone();
    if !attrs.contains(Column::StakeholderUuid) {
        attrs.insert(Column::StakeholderUuid, uuid::Uuid::new_v4().to_string());
    }

    let columns: Vec<&str> = attrs.iter().map(|(c, _)| c.as_str()).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
    let values: Vec<&AttrValue> = attrs.iter().map(|(_, v)| v).collect();

    let sql = format!(
        "INSERT INTO stakeholder ({}) VALUES ({}) RETURNING {}",
        columns.join(", "),
        placeholders.join(", "),
        Column::select_list()
    );

    let created = conn
        .query_row(&sql, params_from_iter(values), row_to_stakeholder)
        .map_err(Error::from_write)?;
    tracing::info!("Created stakeholder {} ({})", created.id, created.stakeholder_uuid);
    Ok(created)
}

/// Update the row named by the `id` attribute and return it
pub fn update(conn: &Connection, attrs: &Attributes) -> Result<Stakeholder> {
    let id = attrs
        .id()
        .ok_or_else(|| Error::Validation("update requires a numeric id".to_string()))?;

    let mut changes = attrs.clone();
    changes.remove(Column::Id);
    if changes.is_empty() {
        return Err(Error::Validation(format!("no columns to update for stakeholder {}", id)));
    }

    let assignments: Vec<String> = changes
        .iter()
        .enumerate()
        .map(|(i, (column, _))| format!("{} = ?{}", column.as_str(), i + 1))
        .collect();
    let mut values: Vec<&dyn ToSql> = changes.iter().map(|(_, v)| v as &dyn ToSql).collect();
    values.push(&id);

    let sql = format!(
        "UPDATE stakeholder SET {} WHERE id = ?{} RETURNING {}",
        assignments.join(", "),
        values.len(),
        Column::select_list()
    );

    let updated = conn
        .query_row(&sql, params_from_iter(values), row_to_stakeholder)
        .optional()
        .map_err(Error::from_write)?
        .ok_or_else(|| Error::NotFound(format!("stakeholder {}", id)))?;
    tracing::info!("Updated stakeholder {}", updated.id);
    Ok(updated)
}

/// Count all stakeholders
pub fn count(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM stakeholder", [], |row| row.get(0))?;
    Ok(count as usize)
}
