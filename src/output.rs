//! Human and JSON rendering for the CLI

use std::sync::OnceLock;
use owo_colors::{OwoColorize, Style};
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style as TableStyle};
use crate::listing::Listing;
use crate::relation::Relation;
use crate::stakeholder::Stakeholder;
use crate::storage::DbStats;

static THEME: OnceLock<Theme> = OnceLock::new();

/// How command results are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn is_human(&self) -> bool {
        matches!(self, OutputFormat::Text)
    }
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub dim: Style,
}

impl Theme {
    pub fn detect() -> Self {
        Self::for_terminal(console::Term::stdout().is_term())
    }

    /// Coloured on a terminal, plain when piped
    pub fn for_terminal(is_term: bool) -> Self {
        if !is_term {
            return Self::plain();
        }
        Self::colored()
    }

    pub fn colored() -> Self {
        Self {
            header: Style::new().cyan().bold(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            dim: Style::new().white().dimmed(),
        }
    }

    pub fn plain() -> Self {
        Self {
            header: Style::new(),
            success: Style::new(),
            error: Style::new(),
            dim: Style::new(),
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}

#[derive(Tabled)]
struct StakeholderRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "UUID")]
    uuid: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Parents")]
    parents: String,
    #[tabled(rename = "Children")]
    children: String,
}

impl From<&Stakeholder> for StakeholderRow {
    fn from(s: &Stakeholder) -> Self {
        // flat rows have no relationship data to count
        let count = |attached: &Option<Vec<Stakeholder>>| match attached {
            Some(rows) => rows.len().to_string(),
            None => "-".to_string(),
        };
        Self {
            id: s.id,
            uuid: s.stakeholder_uuid.clone(),
            name: s.display_name(),
            email: s.email.clone().unwrap_or_default(),
            parents: count(&s.parents),
            children: count(&s.children),
        }
    }
}

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

pub fn stakeholder_table(rows: &[Stakeholder]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    let rows: Vec<StakeholderRow> = rows.iter().map(StakeholderRow::from).collect();
    Table::new(rows).with(TableStyle::rounded()).to_string()
}

/// Table plus a "showing n of count" line
pub fn render_listing(listing: &Listing<Stakeholder>, theme: &Theme) -> String {
    let summary = format!(
        "Showing {} of {} stakeholder(s)",
        listing.rows.len(),
        listing.count
    );
    let summary = summary.style(theme.dim.clone()).to_string();

    if listing.is_empty() {
        return summary;
    }
    format!("{}\n{}", stakeholder_table(&listing.rows), summary)
}

/// One stakeholder with its attached parents and children by name
pub fn render_detail(stakeholder: &Stakeholder, theme: &Theme) -> String {
    let mut out = stakeholder_table(std::slice::from_ref(stakeholder));

    for (title, attached) in [("Parents", &stakeholder.parents), ("Children", &stakeholder.children)] {
        let Some(rows) = attached else { continue };
        out.push_str(&format!("\n{}", title.style(theme.header.clone())));
        if rows.is_empty() {
            out.push_str(&format!("\n  {}", "(none)".style(theme.dim.clone())));
        }
        for row in rows {
            out.push_str(&format!("\n  {} {}", row.display_name(), row.stakeholder_uuid.style(theme.dim.clone())));
        }
    }
    out
}

pub fn render_stats(stats: &DbStats) -> String {
    let rows = vec![
        MetricRow {
            metric: "Stakeholders",
            value: stats.stakeholders.to_string(),
        },
        MetricRow {
            metric: "Relations",
            value: stats.relations.to_string(),
        },
    ];
    Table::new(rows).with(TableStyle::rounded()).to_string()
}

pub fn render_relation(action: &str, relation: &Relation, theme: &Theme) -> String {
    format!(
        "{} {} -> {}",
        action.style(theme.success.clone()),
        relation.parent_id,
        relation.child_id
    )
}

pub fn success(label: &str) {
    println!("{}", label.style(theme().success.clone()));
}

pub fn error(label: &str) {
    eprintln!("{}", label.style(theme().error.clone()));
}

/// Pretty JSON for `--format json`
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> crate::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
