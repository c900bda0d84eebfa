//! Database schema definitions

/// SQL to create the stakeholder table
pub const CREATE_STAKEHOLDER_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS stakeholder (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    stakeholder_uuid TEXT NOT NULL UNIQUE,
    org_name TEXT,
    first_name TEXT,
    last_name TEXT,
    email TEXT,
    phone TEXT,
    website TEXT,
    logo_url TEXT,
    map TEXT
)
"#;

/// SQL to create the relation table
/// Both ends reference stakeholder_uuid, not the numeric id
pub const CREATE_RELATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS stakeholder_relations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id TEXT NOT NULL REFERENCES stakeholder(stakeholder_uuid),
    child_id TEXT NOT NULL REFERENCES stakeholder(stakeholder_uuid),
    UNIQUE(parent_id, child_id)
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_stakeholder_org_name ON stakeholder(org_name)",
    "CREATE INDEX IF NOT EXISTS idx_relations_parent ON stakeholder_relations(parent_id)",
    "CREATE INDEX IF NOT EXISTS idx_relations_child ON stakeholder_relations(child_id)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_STAKEHOLDER_TABLE, CREATE_RELATIONS_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
