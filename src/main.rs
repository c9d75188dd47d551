use std::error::Error as StdError;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pdxsql::{Config, ConnectionRegistry, ResultSet};

/// Runs SQL SELECT queries against directories of Paradox tables.
#[derive(Parser, Debug)]
#[command(name = "pdxsql", version)]
struct Args {
    /// Configuration file (defaults to ./pdxsql.toml, then ~/.pdxsql.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Catalog directory whose subdirectories are schemas
    #[arg(long, value_name = "DIR")]
    schema_root: Option<PathBuf>,

    /// Current schema
    #[arg(long)]
    schema: Option<String>,

    /// Fallback charset for tables without a known code page
    #[arg(long)]
    charset: Option<String>,

    /// Maximum number of rows to print (0 is unlimited)
    #[arg(long)]
    max_rows: Option<usize>,

    /// List tables matching a LIKE pattern instead of running a query
    #[arg(long, value_name = "PATTERN")]
    tables: Option<String>,

    /// Query to run
    sql: Option<String>,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> Result<Config, Box<dyn StdError>> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load_default()?,
    };
    if let Some(root) = &args.schema_root {
        config.schema_root = Some(root.clone());
    }
    if let Some(schema) = &args.schema {
        config.schema = Some(schema.clone());
    }
    if let Some(charset) = &args.charset {
        config.charset = charset.clone();
    }
    if let Some(max_rows) = args.max_rows {
        config.max_rows = max_rows;
    }
    Ok(config)
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn print_result(out: &mut impl Write, result: &ResultSet) -> io::Result<()> {
    let header: Vec<_> = result.columns().iter().map(|c| c.name.as_str()).collect();
    writeln!(out, "{}", header.join("\t"))?;
    for row in result.rows() {
        let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
        writeln!(out, "{}", cells.join("\t"))?;
    }
    out.flush()
}

fn run() -> Result<(), Box<dyn StdError>> {
    let args = Args::parse();
    let config = load_config(&args)?;
    init_logging(&config);

    let registry = ConnectionRegistry::new();
    let connection = registry.open(config.connection_info()?)?;
    let mut out = BufWriter::new(io::stdout().lock());

    if let Some(pattern) = &args.tables {
        for table in connection.list_tables(Some(pattern))? {
            writeln!(out, "{}\t{}\t{}", table.name, table.fields.len(), table.row_count())?;
        }
        out.flush()?;
    } else if let Some(sql) = &args.sql {
        info!(sql = %sql, "running query");
        let result = connection.create_statement()?.execute_query(sql)?;
        print_result(&mut out, &result)?;
    } else {
        return Err("nothing to do: pass a query or --tables".into());
    }

    for warning in connection.warnings()? {
        eprintln!("warning: [{}] {}", warning.catalog, warning.reason);
    }
    connection.close();
    Ok(())
}
