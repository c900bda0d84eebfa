//! Stakeholders CLI - query and maintain a stakeholder relationship registry

use std::path::{Path, PathBuf};
use std::sync::Arc;
use clap::{Args, Parser, Subcommand};
use stakeholders::config::{self, RegistryConfig};
use stakeholders::output::{self, OutputFormat, theme};
use stakeholders::{
    Attributes, Column, Identifier, LinkRequest, Listing, Page, Relation, RelationType, SqliteStore, Stakeholder,
    StakeholderRegistry,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "stakeholders")]
#[command(version)]
#[command(about = "Stakeholder relationship registry - organizations linked by parent/child relations")]
#[command(long_about = r#"
Stakeholders keeps organizations and individuals in SQLite, linked by directed
parent -> child relations, and answers one-hop queries over them.

Example usage:
  stakeholders init
  stakeholders create org_name=Acme email=hello@acme.test
  stakeholders link 1 children <UUID>
  stakeholders get 1
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the database file (overrides the config)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Copy)]
struct PageArgs {
    /// Maximum number of rows (defaults to the configured page size)
    #[arg(short, long)]
    limit: Option<usize>,

    /// Rows to skip
    #[arg(short, long, default_value = "0")]
    offset: usize,
}

impl PageArgs {
    fn page(&self, config: &RegistryConfig) -> Page {
        Page::new(self.limit.unwrap_or_else(|| config.page_size()), self.offset)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file and create the database
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// List stakeholders with their parents and children
    List {
        /// Only stakeholders that are nobody's child
        #[arg(long)]
        trees: bool,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Show one stakeholder by numeric id or uuid
    Get {
        id: String,

        #[command(flatten)]
        page: PageArgs,
    },

    /// List stakeholders matching every column=value pair
    Filter {
        #[arg(required = true)]
        pairs: Vec<String>,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Direct relations of a stakeholder, optionally filtered
    Related {
        id: String,

        pairs: Vec<String>,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Stakeholders with no direct relation to the given one
    Unlinked {
        id: String,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Create a stakeholder from column=value pairs or a JSON object
    Create {
        #[arg(required_unless_present = "json")]
        pairs: Vec<String>,

        /// Attributes as a JSON object instead of pairs
        #[arg(long, conflicts_with = "pairs")]
        json: Option<String>,

        /// Link the new stakeholder under this parent uuid
        #[arg(long, conflicts_with = "child")]
        parent: Option<String>,

        /// Link this child uuid under the new stakeholder
        #[arg(long)]
        child: Option<String>,
    },

    /// Update columns of an existing stakeholder
    Update {
        id: String,

        #[arg(required_unless_present = "json")]
        pairs: Vec<String>,

        /// Attributes as a JSON object instead of pairs
        #[arg(long, conflicts_with = "pairs")]
        json: Option<String>,
    },

    /// Link a stakeholder to another one
    Link {
        subject: String,

        /// `parents` makes OTHER the subject's parent, `children` its child
        relation_type: RelationType,

        other_uuid: String,
    },

    /// Remove a link between two stakeholders
    Unlink {
        subject: String,

        relation_type: RelationType,

        other_uuid: String,
    },

    /// Show row counts
    Stats,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        output::error(&format!("Error: {:#}", err));
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);

    let command = match cli.command {
        Commands::Init { force } => {
            return run_init(cli.database.as_deref(), cli.format, &config_path, force);
        }
        command => command,
    };

    let config = config::load_config(Some(&config_path))?.unwrap_or_default();
    let database = match &cli.database {
        Some(path) => path.clone(),
        None => config.database_path(Path::new(".")),
    };
    config::ensure_db_dir(&database)?;

    let store = SqliteStore::open(&database)?;
    let registry = StakeholderRegistry::new(Arc::new(store));
    let format = cli.format;

    match command {
        Commands::Init { .. } => {}

        Commands::List { trees, page } => {
            let page = page.page(&config);
            let listing = if trees {
                registry.list_trees(page).await?
            } else {
                registry.list_all(page).await?
            };
            print_listing(format, &listing)?;
        }

        Commands::Get { id, page } => {
            let id = Identifier::parse(&id)?;
            let listing = registry.get_one_paged(&id, page.page(&config)).await?;
            if format.is_human() {
                for stakeholder in &listing.rows {
                    println!("{}", output::render_detail(stakeholder, theme()));
                }
            } else {
                println!("{}", output::to_json(&listing)?);
            }
        }

        Commands::Filter { pairs, page } => {
            let filter = Attributes::from_pairs(&pairs)?;
            let listing = registry.list_by_filter(&filter, page.page(&config)).await?;
            print_listing(format, &listing)?;
        }

        Commands::Related { id, pairs, page } => {
            let id = Identifier::parse(&id)?;
            let filter = Attributes::from_pairs(&pairs)?;
            let listing = registry
                .list_related_filtered(&id, &filter, page.page(&config))
                .await?;
            print_listing(format, &listing)?;
        }

        Commands::Unlinked { id, page } => {
            let id = Identifier::parse(&id)?;
            let listing = registry.get_unlinked(&id, page.page(&config)).await?;
            print_listing(format, &listing)?;
        }

        Commands::Create { pairs, json, parent, child } => {
            let attrs = parse_attributes(&pairs, json.as_deref())?;
            let link = match (parent, child) {
                (Some(uuid), _) => Some((RelationType::Parents, uuid)),
                (None, Some(uuid)) => Some((RelationType::Children, uuid)),
                (None, None) => None,
            };

            let (created, edge) = match link {
                Some((relation_type, other)) => {
                    let (created, edge) = registry.create_linked(attrs, relation_type, other).await?;
                    (created, Some(edge))
                }
                None => (registry.create(attrs).await?, None),
            };

            if format.is_human() {
                output::success(&format!("Created {} ({})", created.display_name(), created.stakeholder_uuid));
                if let Some(edge) = &edge {
                    println!("{}", output::render_relation("Linked", edge, theme()));
                }
            } else {
                println!("{}", output::to_json(&serde_json::json!({ "created": created, "relation": edge }))?);
            }
        }

        Commands::Update { id, pairs, json } => {
            let target = registry.get_by_id(&Identifier::parse(&id)?).await?;
            let mut attrs = parse_attributes(&pairs, json.as_deref())?;
            if attrs.contains(Column::Id) {
                anyhow::bail!("the id column cannot be changed");
            }
            attrs.insert(Column::Id, target.id);

            let updated = registry.update(attrs).await?;
            print_one(format, "Updated", &updated)?;
        }

        Commands::Link { subject, relation_type, other_uuid } => {
            let subject = Identifier::parse(&subject)?;
            let edge = registry
                .update_link(&subject, LinkRequest::link(relation_type, other_uuid))
                .await?;
            print_relation(format, "Linked", &edge)?;
        }

        Commands::Unlink { subject, relation_type, other_uuid } => {
            let subject = Identifier::parse(&subject)?;
            let edge = registry
                .update_link(&subject, LinkRequest::unlink(relation_type, other_uuid))
                .await?;
            print_relation(format, "Unlinked", &edge)?;
        }

        Commands::Stats => {
            let stats = registry.stats().await?;
            if format.is_human() {
                println!("Stakeholder registry ({})", database.display());
                println!("{}", output::render_stats(&stats));
            } else {
                println!("{}", output::to_json(&stats)?);
            }
        }
    }

    Ok(())
}

fn run_init(database: Option<&Path>, format: OutputFormat, config_path: &Path, force: bool) -> anyhow::Result<()> {
    let base = std::env::current_dir()?;
    let database = database
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config::default_database_path_in(&base));

    let config = RegistryConfig {
        database: Some(database.to_string_lossy().to_string()),
        page_size: Some(config::DEFAULT_PAGE_SIZE),
    };
    config::write_config(config_path, &config, force)?;

    config::ensure_db_dir(&database)?;
    SqliteStore::open(&database)?;

    if format.is_human() {
        output::success(&format!("Wrote {}", config_path.display()));
        println!("Database: {}", database.display());
    } else {
        println!("{}", output::to_json(&config)?);
    }
    Ok(())
}

fn parse_attributes(pairs: &[String], json: Option<&str>) -> anyhow::Result<Attributes> {
    match json {
        Some(raw) => {
            let value: serde_json::Value = serde_json::from_str(raw)?;
            Ok(Attributes::from_json(&value)?)
        }
        None => Ok(Attributes::from_pairs(pairs)?),
    }
}

fn print_listing(format: OutputFormat, listing: &Listing<Stakeholder>) -> anyhow::Result<()> {
    if format.is_human() {
        println!("{}", output::render_listing(listing, theme()));
    } else {
        println!("{}", output::to_json(listing)?);
    }
    Ok(())
}

fn print_one(format: OutputFormat, action: &str, stakeholder: &Stakeholder) -> anyhow::Result<()> {
    if format.is_human() {
        output::success(&format!("{} {}", action, stakeholder.display_name()));
        println!("{}", output::stakeholder_table(std::slice::from_ref(stakeholder)));
    } else {
        println!("{}", output::to_json(stakeholder)?);
    }
    Ok(())
}

fn print_relation(format: OutputFormat, action: &str, edge: &Relation) -> anyhow::Result<()> {
    if format.is_human() {
        println!("{}", output::render_relation(action, edge, theme()));
    } else {
        println!("{}", output::to_json(edge)?);
    }
    Ok(())
}
