mod logging;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tracing::info;

use rowforge_fill::{FileFormat, FillConfig, FillEngine, FillError};
use rowforge_introspect::{
    IntrospectError, IntrospectOptions, MetadataProvider, PgFillExecutor, PostgresProvider,
};

#[derive(Debug, Error)]
enum CliError {
    #[error("fill error: {0}")]
    Fill(#[from] FillError),
    #[error("introspection error: {0}")]
    Introspect(#[from] IntrospectError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(
    name = "rowforge",
    version,
    about = "Fill relational schemas with deterministic synthetic data"
)]
struct Cli {
    /// Log filter, e.g. `info` or `rowforge_fill=debug`.
    #[arg(long, global = true, default_value = "info")]
    log: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Introspect the schema and insert generated rows.
    Fill(FillArgs),
    /// Introspect the schema and write flat files instead of inserting.
    Emit(EmitArgs),
    /// Print the dependency-ordered fill plan without touching data.
    Plan(PlanArgs),
}

#[derive(Args, Debug)]
struct ConnArgs {
    /// Database connection string.
    #[arg(long, value_name = "CONNECTION_STRING")]
    conn: String,
    /// Schema (namespace) to introspect.
    #[arg(long, default_value = "public")]
    schema: String,
}

#[derive(Args, Debug)]
struct FillArgs {
    #[command(flatten)]
    conn: ConnArgs,
    /// Fill configuration (TOML).
    #[arg(long, value_name = "FILE")]
    config: PathBuf,
}

#[derive(Args, Debug)]
struct EmitArgs {
    #[command(flatten)]
    conn: ConnArgs,
    /// Fill configuration (TOML).
    #[arg(long, value_name = "FILE")]
    config: PathBuf,
    /// Output directory for the generated files.
    #[arg(long, default_value = "out")]
    out: PathBuf,
    #[arg(long, value_enum, default_value_t = FormatArg::Csv)]
    format: FormatArg,
}

#[derive(Args, Debug)]
struct PlanArgs {
    #[command(flatten)]
    conn: ConnArgs,
    /// Fill configuration (TOML).
    #[arg(long, value_name = "FILE")]
    config: PathBuf,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Csv,
    Tdv,
    Pipe,
}

impl From<FormatArg> for FileFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Csv => FileFormat::Csv,
            FormatArg::Tdv => FileFormat::Tdv,
            FormatArg::Pipe => FileFormat::Pipe,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log);

    let outcome = match cli.command {
        Command::Fill(args) => run_fill(args).await,
        Command::Emit(args) => run_emit(args).await,
        Command::Plan(args) => run_plan(args).await,
    };

    if let Err(err) = outcome {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn load_config(path: &PathBuf) -> Result<FillConfig, CliError> {
    let text = std::fs::read_to_string(path)?;
    toml::from_str(&text).map_err(|err| CliError::Config(err.to_string()))
}

async fn connect(conn: &str) -> Result<PgPool, CliError> {
    let pool = PgPoolOptions::new().max_connections(4).connect(conn).await?;
    Ok(pool)
}

async fn introspect(pool: &PgPool, schema: &str) -> Result<rowforge_introspect::Database, CliError> {
    let provider = PostgresProvider::new(pool.clone());
    let opts = IntrospectOptions {
        catalog: None,
        schema: schema.to_string(),
    };
    let database = provider.schema(&opts).await?;
    info!(
        schema = %schema,
        tables = database.tables().len(),
        "schema introspected"
    );
    Ok(database)
}

async fn run_fill(args: FillArgs) -> Result<(), CliError> {
    let config = load_config(&args.config)?;
    let pool = connect(&args.conn.conn).await?;
    let database = introspect(&pool, &args.conn.schema).await?;

    let engine = FillEngine::new(config)?;
    let mut executor = PgFillExecutor::new(pool.clone());
    let report = engine.fill(&database, &mut executor).await?;

    println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
    Ok(())
}

async fn run_emit(args: EmitArgs) -> Result<(), CliError> {
    let config = load_config(&args.config)?;
    let pool = connect(&args.conn.conn).await?;
    let database = introspect(&pool, &args.conn.schema).await?;

    let engine = FillEngine::new(config)?;
    let report = engine.emit(&database, &args.out, args.format.into())?;

    println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
    Ok(())
}

async fn run_plan(args: PlanArgs) -> Result<(), CliError> {
    let config = load_config(&args.config)?;
    let pool = connect(&args.conn.conn).await?;
    let database = introspect(&pool, &args.conn.schema).await?;

    let engine = FillEngine::new(config)?;
    for task in engine.plan(&database)? {
        println!(
            "{}\trows={}\tbatch_size={}",
            task.table, task.rows, task.batch_size
        );
    }
    Ok(())
}
