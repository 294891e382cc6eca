//! Interactive shell over an in-memory catalog.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::Parser;
use minidb::{Catalog, QueryResult, execute, render::format_table};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "minidb")]
#[command(about = "In-memory SQL database shell", long_about = None)]
struct Cli {
    /// Execute a single statement and exit
    #[arg(short, long, value_name = "SQL")]
    execute: Option<String>,

    /// Print results as JSON instead of text tables
    #[arg(long)]
    json: bool,

    /// Name of the in-memory catalog
    #[arg(long, default_value = "main")]
    catalog: String,

    /// Log filter directive (e.g. `debug`, `minidb=trace`)
    #[arg(long, env = "MINIDB_LOG", default_value = "warn")]
    log: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let mut catalog = Catalog::new(cli.catalog.clone());

    let outcome = match &cli.execute {
        Some(sql) => run_once(&mut catalog, sql, io::stdout().lock(), cli.json),
        None => repl(&mut catalog, io::stdin().lock(), io::stdout().lock(), cli.json).map(|()| true),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("I/O error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Runs one statement and prints its result. Returns whether it succeeded.
fn run_once(catalog: &mut Catalog, sql: &str, mut output: impl Write, json: bool) -> io::Result<bool> {
    let result = execute(catalog, sql);
    print_result(&mut output, &result, json)?;
    Ok(result.success)
}

/// Reads statements line by line until `exit` or end of input.
fn repl(
    catalog: &mut Catalog,
    mut input: impl BufRead,
    mut output: impl Write,
    json: bool,
) -> io::Result<()> {
    let mut line = String::new();

    loop {
        write!(output, "db> ")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            // EOF
            writeln!(output)?;
            break;
        }

        match line.trim() {
            "" => continue,
            "exit" => break,
            ".tables" => {
                for name in catalog.table_names() {
                    writeln!(output, "{name}")?;
                }
            }
            sql => {
                debug!(catalog = %catalog.name, sql, "read statement");
                let result = execute(catalog, sql);
                print_result(&mut output, &result, json)?;
            }
        }
    }
    output.flush()
}

fn print_result(output: &mut impl Write, result: &QueryResult, json: bool) -> io::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *output, result)?;
        return writeln!(output);
    }

    if let Some(message) = &result.message {
        writeln!(output, "{message}")?;
    }
    if let Some(rows) = &result.rows {
        writeln!(output, "{}", format_table(rows))?;
    }
    Ok(())
}
