//! Operator commands.

mod prelude;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use dialoguer::Confirm;

use tablesync::{Config, SchemaSync, SyncError};
use tablesync_core::planning::{format_plan, TablePlan};
use tablesync_core::schema::{SchemaDocument, Throughput};

use prelude::*;

/// Keep DynamoDB tables in line with their declared schemas
#[derive(Debug, clap::Parser)]
#[command(name = "tablesync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: Global,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// JSON document declaring the tables
    #[arg(long, short, global = true, env = "TABLESYNC_DOCUMENT", value_name = "FILE")]
    pub document: Option<PathBuf>,

    /// Prefix for physical table names [env: TABLESYNC_NAMESPACE]
    #[arg(long, global = true)]
    pub namespace: Option<String>,

    /// Endpoint host, e.g. a local DynamoDB [env: TABLESYNC_HOST]
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Endpoint port [env: TABLESYNC_PORT]
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Use TLS for the endpoint [env: TABLESYNC_IS_SECURE]
    #[arg(long, global = true)]
    pub secure: bool,

    /// Region [env: TABLESYNC_REGION]
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Silence the command output
    #[clap(long, global = true)]
    pub silent: bool,

    /// Enable verbose output
    #[clap(long, global = true)]
    pub verbose: bool,
}

impl Global {
    pub fn is_silent(&self) -> bool {
        self.silent
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Flags first, then `TABLESYNC_*` environment variables.
    fn config(&self) -> Result<Config> {
        let mut builder = Config::builder();
        if let Some(namespace) = &self.namespace {
            builder = builder.namespace(namespace);
        }
        if let Some(host) = &self.host {
            builder = builder.host(host);
        }
        if let Some(port) = self.port {
            builder = builder.port(port);
        }
        if self.secure {
            builder = builder.is_secure(true);
        }
        if let Some(region) = &self.region {
            builder = builder.region(region);
        }
        Ok(builder.with_env().build()?)
    }

    fn document(&self) -> Result<SchemaDocument> {
        match &self.document {
            Some(path) => load_document(path),
            None => bail!("No document given. Use --document or TABLESYNC_DOCUMENT"),
        }
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// List the tables declared in the document
    List,

    /// List the remote tables in the namespace
    Remote,

    /// Show the changes a sync would make
    Plan(PlanCommand),

    /// Create or update tables to match the document
    Sync(SyncCommand),
}

#[derive(Debug, clap::Args)]
pub struct ThroughputArgs {
    /// Table read capacity, instead of the declared one
    #[arg(long, requires = "write")]
    pub read: Option<i64>,

    /// Table write capacity, instead of the declared one
    #[arg(long, requires = "read")]
    pub write: Option<i64>,
}

impl ThroughputArgs {
    fn throughput(&self) -> Option<Throughput> {
        match (self.read, self.write) {
            (Some(read), Some(write)) => Some(Throughput::new(read, write)),
            _ => None,
        }
    }
}

#[derive(Debug, clap::Args)]
pub struct PlanCommand {
    /// Logical table names (default: every declared table)
    pub tables: Vec<String>,

    #[command(flatten)]
    pub throughput: ThroughputArgs,
}

#[derive(Debug, clap::Args)]
#[command(long_about = "Create missing tables and reconcile existing ones.

Existing tables keep their primary key schema: a table whose keys differ
from the document is reported and left untouched. The other tables are
still synced, and the command then exits with an error. Global secondary
indexes are created, updated and deleted one at a time.

The command shows a plan of changes before applying and asks for confirmation.")]
pub struct SyncCommand {
    /// Logical table names (default: every declared table)
    pub tables: Vec<String>,

    #[command(flatten)]
    pub throughput: ThroughputArgs,

    /// Skip confirmation prompts.
    #[arg(long)]
    pub force: bool,
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::List => run_list(&cli.global),
        Commands::Remote => run_remote(&cli.global).await,
        Commands::Plan(cmd) => run_plan(cmd, &cli.global).await,
        Commands::Sync(cmd) => run_sync(cmd, &cli.global).await,
    }
}

fn load_document(path: &Path) -> Result<SchemaDocument> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read document {}", path.display()))?;
    let document = SchemaDocument::from_json_str(&json)
        .with_context(|| format!("Invalid document {}", path.display()))?;
    Ok(document)
}

async fn connect(global: &Global, document: SchemaDocument) -> Result<SchemaSync> {
    let config = global.config()?;
    if !global.is_silent() {
        aprintln!("{} {}", p_b("Target:"), config.target_display());
        aprintln!("{} {}", p_b("Namespace:"), config.namespace);
        aprintln!();
    }
    Ok(SchemaSync::connect(config, document).await)
}

fn selected_tables(sync: &SchemaSync, tables: &[String]) -> Vec<String> {
    if tables.is_empty() {
        sync.list_table_names()
    } else {
        tables.to_vec()
    }
}

fn print_plan(plan: &TablePlan) {
    for line in format_plan(plan) {
        aprintln!("  {}", p_plan(&line));
    }
}

fn run_list(global: &Global) -> Result<()> {
    let document = global.document()?;
    for name in document.table_names() {
        aprintln!("{}", name);
    }
    Ok(())
}

async fn run_remote(global: &Global) -> Result<()> {
    let sync = connect(global, SchemaDocument::default()).await?;
    let tables = sync.list_managed_tables().await?;

    if tables.is_empty() && !global.is_silent() {
        aprintln!("{}", p_y("No tables in this namespace."));
    }
    for name in tables {
        aprintln!("{} {}", name, p_c(&format!("({})", sync.physical_name(&name))));
    }
    Ok(())
}

/// Plans per table. Tables whose primary schema diverged are kept apart so
/// the rest can still be applied.
#[derive(Debug, Default)]
struct Plans {
    ready: Vec<(String, TablePlan)>,
    diverged: Vec<(String, SyncError)>,
}

async fn collect_plans(
    sync: &SchemaSync,
    tables: &[String],
    throughput: Option<Throughput>,
) -> Result<Plans> {
    let mut plans = Plans::default();
    for table in selected_tables(sync, tables) {
        match sync.plan(&table, throughput).await {
            Ok(plan) => plans.ready.push((table, plan)),
            Err(err @ SyncError::SchemaMismatch { .. }) => {
                tracing::warn!(table = %table, error = %err, "Primary schema diverged");
                plans.diverged.push((table, err));
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(plans)
}

fn print_diverged(diverged: &[(String, SyncError)]) {
    for (_, err) in diverged {
        aprintln!("  {}", p_r(&format!("! {}", err)));
    }
}

async fn run_plan(cmd: PlanCommand, global: &Global) -> Result<()> {
    let sync = connect(global, global.document()?).await?;
    let plans = collect_plans(&sync, &cmd.tables, cmd.throughput.throughput()).await?;

    aprintln!("{}", p_c("Plan:"));
    for (_, plan) in &plans.ready {
        print_plan(plan);
    }
    print_diverged(&plans.diverged);
    Ok(())
}

async fn run_sync(cmd: SyncCommand, global: &Global) -> Result<()> {
    let sync = connect(global, global.document()?).await?;
    let throughput = cmd.throughput.throughput();
    let plans = collect_plans(&sync, &cmd.tables, throughput).await?;

    if !global.is_silent() {
        aprintln!("{}", p_c("Sync Plan:"));
        for (_, plan) in &plans.ready {
            print_plan(plan);
        }
        print_diverged(&plans.diverged);
        aprintln!();
    }

    let pending: Vec<&String> = plans
        .ready
        .iter()
        .filter(|(_, plan)| !plan.is_noop())
        .map(|(table, _)| table)
        .collect();

    if pending.is_empty() {
        if !global.is_silent() && plans.diverged.is_empty() {
            aprintln!("{}", p_g("Tables are up to date."));
        }
        return left_untouched(&plans.diverged);
    }

    if !cmd.force {
        let confirmed = Confirm::new()
            .with_prompt("Apply these changes?")
            .default(true)
            .interact()
            .context("Failed to read confirmation")?;

        if !confirmed {
            bail!("Operation cancelled by user");
        }
    }

    for table in pending {
        if !global.is_silent() {
            aprintln!("{} {}", p_b("Syncing"), table);
        }
        sync.sync_table(table, throughput).await?;
    }

    if !global.is_silent() {
        aprintln!("{}", p_g("Tables synced successfully."));
    }
    left_untouched(&plans.diverged)
}

fn left_untouched(diverged: &[(String, SyncError)]) -> Result<()> {
    if diverged.is_empty() {
        return Ok(());
    }
    let tables: Vec<&str> = diverged.iter().map(|(table, _)| table.as_str()).collect();
    bail!(
        "{} table(s) left untouched, primary schema diverged: {}",
        tables.len(),
        tables.join(", ")
    )
}
