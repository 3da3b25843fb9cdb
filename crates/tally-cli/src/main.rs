use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tally_cli::commands::query::QueryOptions;
use tally_cli::commands::{import, maintenance, query, report, scan, stats};
use tally_cli::{Cli, Commands, Config, DbAction};

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

fn open_database(config: &Config) -> Result<tally_db::Database> {
    tally_db::Database::open(&config.database_path).with_context(|| {
        format!(
            "failed to open database {}",
            config.database_path.display()
        )
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = load_config(cli.config.as_deref())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Some(Commands::Report { file, report: args }) => match file {
            Some(path) => {
                let input = File::open(path)
                    .with_context(|| format!("cannot open file '{}'", path.display()))?;
                report::run(&mut out, BufReader::new(input), args, &config.span)?;
            }
            None => report::run(&mut out, io::stdin().lock(), args, &config.span)?,
        },
        Some(Commands::Scan {
            path,
            scan: scan_args,
            report: args,
            list,
        }) => {
            let scan_config = scan_args.apply(&config.scan);
            scan::run(&mut out, path, &scan_config, args, &config.span, *list)?;
        }
        Some(Commands::Import {
            path,
            scan: scan_args,
            force,
        }) => {
            let mut db = open_database(&config)?;
            let scan_config = scan_args.apply(&config.scan);
            import::run(&mut out, &mut db, path, &scan_config, &config.span, *force)?;
        }
        Some(Commands::Query {
            report: args,
            file,
            search,
            limit,
            offset,
        }) => {
            let db = open_database(&config)?;
            let options = QueryOptions {
                file_contains: file.clone(),
                description_contains: search.clone(),
                limit: *limit,
                offset: *offset,
            };
            query::run(&mut out, &db, args, options)?;
        }
        Some(Commands::Stats) => {
            let db = open_database(&config)?;
            stats::run(&mut out, &db, &config.database_path)?;
        }
        Some(Commands::Db(action)) => {
            let mut db = open_database(&config)?;
            match action {
                DbAction::Vacuum => maintenance::vacuum(&mut out, &db)?,
                DbAction::Backup { path } => maintenance::backup(&mut out, &db, path)?,
                DbAction::ClearCache => maintenance::clear_cache(&mut out, &mut db)?,
            }
        }
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
