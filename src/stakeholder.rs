//! Stakeholder rows and column-keyed attribute maps
//!
//! The `stakeholder` table is only ever addressed through the [`Column`]
//! whitelist. Filters, inserts and updates are all expressed as an
//! [`Attributes`] map from a known column to a bound value, so no caller
//! supplied text ever reaches SQL as an identifier.

use crate::{Error, Result};
use rusqlite::types::ToSqlOutput;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Known columns of the `stakeholder` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    Id,
    StakeholderUuid,
    OrgName,
    FirstName,
    LastName,
    Email,
    Phone,
    Website,
    LogoUrl,
    Map,
}

impl Column {
    /// Get the SQL column name
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::StakeholderUuid => "stakeholder_uuid",
            Column::OrgName => "org_name",
            Column::FirstName => "first_name",
            Column::LastName => "last_name",
            Column::Email => "email",
            Column::Phone => "phone",
            Column::Website => "website",
            Column::LogoUrl => "logo_url",
            Column::Map => "map",
        }
    }

    /// Get all columns, in table order
    pub fn all() -> &'static [Column] {
        &[
            Column::Id,
            Column::StakeholderUuid,
            Column::OrgName,
            Column::FirstName,
            Column::LastName,
            Column::Email,
            Column::Phone,
            Column::Website,
            Column::LogoUrl,
            Column::Map,
        ]
    }

    /// Comma separated select list in table order
    pub fn select_list() -> String {
        Column::all()
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Column::Id)
    }
}

impl FromStr for Column {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Column::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::UnknownColumn(s.to_string()))
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A value bound against a [`Column`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Integer(i64),
    Text(String),
}

impl AttrValue {
    /// Parse a textual value for `column` (CLI `col=value` pairs).
    pub fn parse_for(column: Column, raw: &str) -> Result<Self> {
        if column.is_integer() {
            raw.trim()
                .parse::<i64>()
                .map(AttrValue::Integer)
                .map_err(|_| Error::Validation(format!("{} must be an integer, got {:?}", column, raw)))
        } else {
            Ok(AttrValue::Text(raw.to_string()))
        }
    }

    /// Convert a JSON value for `column`.
    pub fn from_json(column: Column, value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Null => Ok(AttrValue::Null),
            serde_json::Value::Number(n) if column.is_integer() => n
                .as_i64()
                .map(AttrValue::Integer)
                .ok_or_else(|| Error::Validation(format!("{} must be an integer", column))),
            serde_json::Value::String(s) => AttrValue::parse_for(column, s),
            other => Err(Error::Validation(format!(
                "unsupported value for {}: {}",
                column, other
            ))),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(s)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Integer(v)
    }
}

impl rusqlite::ToSql for AttrValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            AttrValue::Null => Ok(ToSqlOutput::Owned(rusqlite::types::Value::Null)),
            AttrValue::Integer(v) => v.to_sql(),
            AttrValue::Text(s) => s.to_sql(),
        }
    }
}

/// Column-keyed values used for inserts, updates and equality filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    values: BTreeMap<Column, AttrValue>,
}

/// Equality-only filter: every entry must match exactly.
pub type Filter = Attributes;

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, column: Column, value: impl Into<AttrValue>) -> Self {
        self.values.insert(column, value.into());
        self
    }

    pub fn insert(&mut self, column: Column, value: impl Into<AttrValue>) {
        self.values.insert(column, value.into());
    }

    pub fn get(&self, column: Column) -> Option<&AttrValue> {
        self.values.get(&column)
    }

    pub fn remove(&mut self, column: Column) -> Option<AttrValue> {
        self.values.remove(&column)
    }

    pub fn contains(&self, column: Column) -> bool {
        self.values.contains_key(&column)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Column, &AttrValue)> {
        self.values.iter().map(|(c, v)| (*c, v))
    }

    /// The numeric `id` entry, if present
    pub fn id(&self) -> Option<i64> {
        match self.values.get(&Column::Id) {
            Some(AttrValue::Integer(id)) => Some(*id),
            _ => None,
        }
    }

    /// Parse `column=value` pairs
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut attrs = Attributes::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, raw) = pair
                .split_once('=')
                .ok_or_else(|| Error::Validation(format!("expected column=value, got {:?}", pair)))?;
            let column: Column = key.trim().parse()?;
            attrs.insert(column, AttrValue::parse_for(column, raw)?);
        }
        Ok(attrs)
    }

    /// Build from a JSON object, rejecting keys outside the column whitelist
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::Validation("attributes must be a JSON object".to_string()))?;

        let mut attrs = Attributes::new();
        for (key, value) in object {
            let column: Column = key.parse()?;
            attrs.insert(column, AttrValue::from_json(column, value)?);
        }
        Ok(attrs)
    }
}

impl FromIterator<(Column, AttrValue)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (Column, AttrValue)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// A row of the `stakeholder` table.
///
/// `parents` and `children` are never stored. They stay `None` on flat rows
/// and are filled with one generation of neighbours by the graph layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stakeholder {
    pub id: i64,
    pub stakeholder_uuid: String,
    pub org_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub map: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parents: Option<Vec<Stakeholder>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Stakeholder>>,
}

impl Stakeholder {
    /// Copy of the persisted columns only
    pub fn bare(&self) -> Self {
        Self {
            parents: None,
            children: None,
            ..self.clone()
        }
    }

    /// Whether relationship data has been attached
    pub fn is_expanded(&self) -> bool {
        self.parents.is_some() || self.children.is_some()
    }

    /// Organization name, falling back to the person's name
    pub fn display_name(&self) -> String {
        if let Some(org) = self.org_name.as_deref().filter(|s| !s.is_empty()) {
            return org.to_string();
        }
        let person: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        if person.is_empty() {
            self.stakeholder_uuid.clone()
        } else {
            person.join(" ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_roundtrip() {
        for column in Column::all() {
            let parsed: Column = column.as_str().parse().unwrap();
            assert_eq!(*column, parsed);
        }
    }

    #[test]
    fn test_unknown_column_rejected() {
        let err = "password; DROP TABLE stakeholder".parse::<Column>().unwrap_err();
        assert!(matches!(err, Error::UnknownColumn(_)));

        let err = Attributes::from_pairs(["nickname=acme"]).unwrap_err();
        assert!(matches!(err, Error::UnknownColumn(ref c) if c == "nickname"));
    }

    #[test]
    fn test_from_pairs_types_values() {
        let attrs = Attributes::from_pairs(["id=7", "org_name=Acme = Co"]).unwrap();
        assert_eq!(attrs.id(), Some(7));
        assert_eq!(attrs.get(Column::OrgName), Some(&AttrValue::Text("Acme = Co".into())));

        let err = Attributes::from_pairs(["id=seven"]).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = Attributes::from_pairs(["org_name"]).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_from_json() {
        let value = serde_json::json!({ "id": 3, "email": "a@b.org", "phone": null });
        let attrs = Attributes::from_json(&value).unwrap();
        assert_eq!(attrs.id(), Some(3));
        assert!(attrs.get(Column::Phone).unwrap().is_null());

        let err = Attributes::from_json(&serde_json::json!({ "email": true })).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = Attributes::from_json(&serde_json::json!({ "nope": "x" })).unwrap_err();
        assert!(matches!(err, Error::UnknownColumn(_)));
    }

    #[test]
    fn test_display_name_fallbacks() {
        let mut s = Stakeholder {
            id: 1,
            stakeholder_uuid: "u1".into(),
            org_name: None,
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            email: None,
            phone: None,
            website: None,
            logo_url: None,
            map: None,
            parents: None,
            children: None,
        };
        assert_eq!(s.display_name(), "Ada Lovelace");

        s.org_name = Some("Acme".into());
        assert_eq!(s.display_name(), "Acme");

        s.org_name = None;
        s.first_name = None;
        s.last_name = None;
        assert_eq!(s.display_name(), "u1");
    }

    #[test]
    fn test_flat_rows_omit_transient_fields() {
        let s = Stakeholder {
            id: 1,
            stakeholder_uuid: "u1".into(),
            org_name: Some("Acme".into()),
            first_name: None,
            last_name: None,
            email: None,
            phone: None,
            website: None,
            logo_url: None,
            map: None,
            parents: None,
            children: Some(Vec::new()),
        };
        let json = serde_json::to_value(&s).unwrap();
        assert!(json.get("parents").is_none());
        assert_eq!(json["children"], serde_json::json!([]));
    }
}
