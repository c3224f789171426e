// Requeue CLI binary
//
// HIGH RISK OPERATION: a real run modifies the recording application's
// database. The application must be completely closed (or stopped via
// --kill/--restart), a timestamped backup is taken before any write, and
// --dry-run shows the full plan without touching anything.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};

use requeue::constants::{DEFAULT_DB_PATH, INSPECT_SAMPLE_ROWS};
use requeue::db::{self, store};
use requeue::engine::{self, commit};
use requeue::engine::filter::{self, FilterCriteria};
use requeue::engine::plan::RunMode;
use requeue::engine::position::InsertionSpec;
use requeue::{process, report};

#[derive(Parser)]
#[command(name = "requeue")]
#[command(about = "Re-queue failed recordings in a recording queue database", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose output, including the SQL applied on commit
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Re-queue failed (and optionally partial) recordings
    Run(RunArgs),

    /// Show the current active queue
    Queue {
        /// Path to the recording queue database
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db: PathBuf,
    },

    /// Dump schema and sample rows of every table (read-only)
    Inspect {
        /// Path to the recording queue database
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db: PathBuf,
        /// Restrict the dump to one table
        #[arg(long)]
        table: Option<String>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Path to the recording queue database
    #[arg(long, default_value = DEFAULT_DB_PATH)]
    db: PathBuf,

    /// Title or series title to match (case-insensitive, repeatable)
    #[arg(long = "title")]
    titles: Vec<String>,

    /// Date filter: today|yesterday|this-week|this-month|MM-DD-YY
    #[arg(long)]
    since: Option<String>,

    /// Only items that appear to be movies (no season/episode number)
    #[arg(long)]
    movies_only: bool,

    /// Include partially recorded items in addition to failed ones
    #[arg(long)]
    include_partial: bool,

    /// Where to insert the re-queued items
    #[arg(long, value_enum, default_value_t = Position::End)]
    position: Position,

    /// Queue title to insert after (required with --position after)
    #[arg(long)]
    after_title: Option<String>,

    /// Compute and show the plan without modifying the database
    #[arg(long)]
    dry_run: bool,

    /// Export the proposed additions to FILE during a dry run
    /// (CSV, or JSON when FILE ends in .json)
    #[arg(long, value_name = "FILE")]
    dry_run_output: Option<PathBuf>,

    /// Stop running recorder processes before touching the database
    #[arg(long)]
    kill: bool,

    /// Stop, re-queue, and then restart the recorder (implies --kill)
    #[arg(long)]
    restart: bool,

    /// Allow re-queueing without any filters
    #[arg(long)]
    all: bool,

    /// Limit the number of items to re-queue (applied after filtering)
    #[arg(long)]
    limit: Option<usize>,

    /// Skip the safety backup (NOT RECOMMENDED)
    #[arg(long)]
    no_backup: bool,

    /// Proceed without the interactive confirmation
    #[arg(long, short = 'y')]
    yes: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Position {
    Beginning,
    End,
    After,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run(args) => cmd_run(args),
        Commands::Queue { db } => cmd_queue(db),
        Commands::Inspect { db, table } => cmd_inspect(db, table),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn cmd_run(args: RunArgs) -> Result<()> {
    let insertion = match args.position {
        Position::Beginning => InsertionSpec::Beginning,
        Position::End => InsertionSpec::End,
        Position::After => {
            let anchor = args
                .after_title
                .clone()
                .ok_or_else(|| anyhow::anyhow!("--after-title is required with --position after"))?;
            InsertionSpec::After(anchor)
        }
    };

    let since = args
        .since
        .as_deref()
        .map(|token| filter::resolve_since(token, Utc::now()))
        .transpose()?;

    let criteria = FilterCriteria {
        titles: args.titles.clone(),
        since,
        movies_only: args.movies_only,
        include_partial: args.include_partial,
        allow_unfiltered: args.all,
    };

    let mode = if args.dry_run { RunMode::Dry } else { RunMode::Real };

    // Stop the recorder before the store is even opened, so a stop failure
    // aborts the run with the database untouched.
    let should_kill = args.kill || args.restart;
    let mut restart_paths: Vec<PathBuf> = Vec::new();
    if should_kill {
        let processes = process::find_recorder_processes()?;
        if processes.is_empty() {
            println!("No running recorder processes found.");
        } else {
            println!("Stopping {} recorder process(es)...", processes.len());
            restart_paths = processes.iter().filter_map(|p| p.path.clone()).collect();
            restart_paths.sort();
            restart_paths.dedup();
            process::stop_recorder_processes(&processes)?;
        }
    }

    let mut conn = match mode {
        RunMode::Dry => db::open_store_read_only(&args.db)?,
        RunMode::Real => db::open_store(&args.db)?,
    };

    let records = store::read_all_records(&conn)?;
    let queue = store::read_active_queue(&conn)?;

    let plan = engine::plan_requeue(&records, &queue, &criteria, &insertion, args.limit, mode)?;

    if plan.is_empty() {
        println!("No matching failed/partial rows found.");
        return Ok(());
    }

    println!("Found {} item(s) to re-queue.", plan.selected());

    if mode == RunMode::Dry {
        report::print_dry_run(&queue, &plan);
        if let Some(path) = &args.dry_run_output {
            report::export_plan(&plan, path)?;
            println!("Proposed additions exported to {}", path.display());
        }
        return Ok(());
    }

    println!();
    println!("{}", "=".repeat(60));
    println!("!! WARNING: HIGH RISK OPERATION !!");
    println!("{}", "=".repeat(60));
    println!("You are about to re-queue {} item(s).", plan.selected());
    if args.no_backup {
        println!("WARNING: You have specified --no-backup.");
    } else {
        println!("A backup will be created first.");
    }

    if !args.yes && !confirm()? {
        println!("Operation cancelled.");
        return Ok(());
    }

    let outcome = commit::commit(&mut conn, &args.db, &plan, !args.no_backup)?;
    if let Some(backup) = &outcome.backup_path {
        println!("Database backed up to: {}", backup.display());
    }
    println!("Success! Promoted {} item(s).", outcome.rows_changed);

    if args.restart {
        if restart_paths.is_empty() {
            println!("--restart specified, but no running processes were found to restart.");
        } else if let Err(e) = process::start_recorder_processes(&restart_paths) {
            // The commit already succeeded; a failed restart is reported,
            // never rolled back.
            eprintln!("Restart failed: {}", e);
        }
    } else {
        println!("The recording application must be restarted to reload the queue.");
    }

    Ok(())
}

fn confirm() -> Result<bool> {
    print!("Are you sure you want to proceed? (yes/no): ");
    io::stdout().flush()?;
    let mut line = String::new();
    // EOF counts as no.
    if io::stdin().read_line(&mut line)? == 0 {
        println!();
        return Ok(false);
    }
    Ok(line.trim().eq_ignore_ascii_case("yes"))
}

fn cmd_queue(db_path: PathBuf) -> Result<()> {
    let conn = db::open_store_read_only(&db_path)?;
    let queue = store::read_active_queue(&conn)?;

    println!("Current queue ({} item(s)):", queue.len());
    report::print_queue(&queue);
    Ok(())
}

fn cmd_inspect(db_path: PathBuf, table: Option<String>) -> Result<()> {
    let conn = db::open_store_read_only(&db_path)?;

    let tables = match table {
        Some(name) => vec![name],
        None => store::list_tables(&conn)?,
    };

    println!("Inspecting database: {}", db_path.display());
    println!("Found {} table(s).", tables.len());
    println!();

    for table in &tables {
        println!("{}", "-".repeat(60));
        println!("Table: {}", table);
        println!("{}", "-".repeat(60));

        let columns = store::table_columns(&conn, table)?;
        println!("Schema:");
        for col in &columns {
            let mut notes = Vec::new();
            if col.primary_key {
                notes.push("primary key".to_string());
            }
            if col.not_null {
                notes.push("not null".to_string());
            }
            if let Some(default) = &col.default_value {
                notes.push(format!("default {}", default));
            }
            let notes = if notes.is_empty() {
                String::new()
            } else {
                format!("  ({})", notes.join(", "))
            };
            println!("  {:>3}  {:<20} {}{}", col.cid, col.name, col.col_type, notes);
        }

        let (headers, rows) = store::sample_rows(&conn, table, INSPECT_SAMPLE_ROWS)?;
        println!();
        println!("Sample data (first {} rows):", INSPECT_SAMPLE_ROWS);
        if rows.is_empty() {
            println!("  (no rows found)");
        } else {
            println!("  {}", headers.join(" | "));
            for row in rows {
                println!("  {}", row.join(" | "));
            }
        }
        println!();
    }

    Ok(())
}
