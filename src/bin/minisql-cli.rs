//! MiniSQL shell
//!
//! Runs statements given with `-e`, or an interactive prompt otherwise.

use anyhow::Context;
use clap::Parser;
use minisql::{DBConfig, Database};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "minisql", version, about = "MiniSQL interactive shell", long_about = None)]
struct Args {
    /// Data directory holding the catalog
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Keep everything in memory
    #[arg(long, conflicts_with = "data_dir")]
    in_memory: bool,

    /// Execute a statement and exit (repeatable)
    #[arg(short = 'e', long = "execute", value_name = "SQL")]
    execute: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => DBConfig::from_json_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => DBConfig::default(),
    };
    if let Some(dir) = args.data_dir {
        config = config.with_data_dir(dir);
    }
    if args.in_memory {
        config = DBConfig {
            row_storage: None,
            ..DBConfig::in_memory()
        };
    }

    let db = Database::open(config).context("failed to open database")?;

    if !args.execute.is_empty() {
        for sql in &args.execute {
            let result = db.execute(sql).with_context(|| format!("statement failed: {}", sql))?;
            println!("{}", result);
        }
        return Ok(());
    }

    repl(&db)
}

fn repl(db: &Database) -> anyhow::Result<()> {
    match db.config().data_dir.as_ref() {
        Some(dir) => println!("MiniSQL v{} ({})", env!("CARGO_PKG_VERSION"), dir.display()),
        None => println!("MiniSQL v{} (in memory)", env!("CARGO_PKG_VERSION")),
    }
    println!("Type 'exit' to quit.");

    let stdin = io::stdin();
    let mut buffer = String::new();

    loop {
        print!("MiniSQL> ");
        io::stdout().flush()?;

        buffer.clear();
        if stdin.lock().read_line(&mut buffer)? == 0 {
            // EOF
            println!();
            break;
        }

        let input = buffer.trim();
        match input.to_ascii_lowercase().as_str() {
            "" => continue,
            "exit" | "quit" | ".exit" | ".quit" => {
                println!("Exiting MiniSQL CLI.");
                break;
            }
            ".tables" => {
                for table in db.list_tables() {
                    println!("{}", table);
                }
                continue;
            }
            _ => {}
        }

        match db.execute(input) {
            Ok(result) => println!("{}", result),
            Err(e) => println!("Error: {}", e),
        }
    }

    Ok(())
}
