//! Relation types - directed parent → child edges between stakeholders
//!
//! Both ends of a [`Relation`] are `stakeholder_uuid` values, never numeric
//! ids. A link request names the role the *subject* plays relative to the
//! other stakeholder:
//! - `Parents`: the other stakeholder becomes a parent of the subject
//! - `Children`: the other stakeholder becomes a child of the subject

use crate::Error;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which side of the relation the other stakeholder lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationType {
    /// Other stakeholder is a parent of the subject
    Parents,
    /// Other stakeholder is a child of the subject
    Children,
}

impl RelationType {
    /// Get the string representation of the relation type
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::Parents => "parents",
            RelationType::Children => "children",
        }
    }

    /// Build the edge for `subject_uuid` and `other_uuid` in this role
    pub fn edge(&self, subject_uuid: &str, other_uuid: &str) -> Relation {
        match self {
            RelationType::Parents => Relation::new(other_uuid, subject_uuid),
            RelationType::Children => Relation::new(subject_uuid, other_uuid),
        }
    }
}

impl FromStr for RelationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "parents" | "parent" => Ok(RelationType::Parents),
            "children" | "child" => Ok(RelationType::Children),
            _ => Err(Error::Validation(format!("Unknown relation type: {}", s))),
        }
    }
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A row of `stakeholder_relations`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    /// Parent `stakeholder_uuid`
    pub parent_id: String,
    /// Child `stakeholder_uuid`
    pub child_id: String,
}

impl Relation {
    pub fn new(parent_id: impl Into<String>, child_id: impl Into<String>) -> Self {
        Self {
            parent_id: parent_id.into(),
            child_id: child_id.into(),
        }
    }

    /// The endpoint opposite `uuid`, if `uuid` is part of this edge
    pub fn other_end(&self, uuid: &str) -> Option<&str> {
        if self.parent_id == uuid {
            Some(&self.child_id)
        } else if self.child_id == uuid {
            Some(&self.parent_id)
        } else {
            None
        }
    }
}

/// Link or unlink request against a subject stakeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRequest {
    pub relation_type: RelationType,
    /// `true` to create the edge, `false` to remove it
    pub linked: bool,
    /// `stakeholder_uuid` of the other stakeholder
    pub other_uuid: String,
}

impl LinkRequest {
    pub fn link(relation_type: RelationType, other_uuid: impl Into<String>) -> Self {
        Self {
            relation_type,
            linked: true,
            other_uuid: other_uuid.into(),
        }
    }

    pub fn unlink(relation_type: RelationType, other_uuid: impl Into<String>) -> Self {
        Self {
            relation_type,
            linked: false,
            other_uuid: other_uuid.into(),
        }
    }

    /// Edge this request touches for a subject with `subject_uuid`
    pub fn edge_for(&self, subject_uuid: &str) -> Relation {
        self.relation_type.edge(subject_uuid, &self.other_uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_type_roundtrip() {
        for kind in [RelationType::Parents, RelationType::Children] {
            let parsed: RelationType = kind.as_str().parse().unwrap();
            assert_eq!(kind, parsed);
        }
        assert_eq!("Child".parse::<RelationType>().unwrap(), RelationType::Children);
        assert!("siblings".parse::<RelationType>().is_err());
    }

    #[test]
    fn test_role_assignment() {
        // subject u1 gains parent u9
        let edge = LinkRequest::link(RelationType::Parents, "u9").edge_for("u1");
        assert_eq!(edge, Relation::new("u9", "u1"));

        // subject u1 gains child u2
        let edge = LinkRequest::unlink(RelationType::Children, "u2").edge_for("u1");
        assert_eq!(edge, Relation::new("u1", "u2"));
    }

    #[test]
    fn test_other_end() {
        let edge = Relation::new("u1", "u2");
        assert_eq!(edge.other_end("u1"), Some("u2"));
        assert_eq!(edge.other_end("u2"), Some("u1"));
        assert_eq!(edge.other_end("u3"), None);

        let self_edge = Relation::new("u1", "u1");
        assert_eq!(self_edge.other_end("u1"), Some("u1"));
    }

    #[test]
    fn test_link_request_json_shape() {
        let req: LinkRequest = serde_json::from_value(serde_json::json!({
            "relation_type": "children",
            "linked": false,
            "other_uuid": "u2",
        }))
        .unwrap();
        assert_eq!(req, LinkRequest::unlink(RelationType::Children, "u2"));
    }
}
