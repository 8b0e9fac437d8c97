//! Schema Inspector CLI
//!
//! Loads a schema from its JSON wire form and prints, verifies, or reorders
//! its field catalogue.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use trellis_record::{is_valid_name, EntriesOrder, Entry, Schema, ENTRIES_ORDER_PROP};

#[derive(Parser)]
#[command(name = "record-inspect")]
#[command(about = "Inspect and verify schema wire files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the field catalogue in persisted order
    Show {
        /// Path to a schema JSON file
        file: PathBuf,
    },

    /// Verify structural invariants and print the fingerprint
    Verify {
        /// Path to a schema JSON file
        file: PathBuf,
    },

    /// Print the catalogue under an ad hoc field order
    Order {
        /// Path to a schema JSON file
        file: PathBuf,
        /// Comma-joined field names, e.g. "id,label,ts"
        #[arg(long)]
        by: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Show { file } => {
            let schema = load_schema(&file)?;
            println!("type: {:?}", schema.schema_type());
            println!(
                "entries: {} data, {} metadata",
                schema.entries().len(),
                schema.metadata().len()
            );
            for entry in schema.entries_ordered() {
                print_entry(entry);
            }
            Ok(())
        }

        Commands::Verify { file } => {
            let schema = load_schema(&file)?;
            let problems = verify(&schema);
            if problems.is_empty() {
                println!("✅ {} - all invariants hold", file.display());
                println!("fingerprint: {}", schema.fingerprint());
                Ok(())
            } else {
                for problem in &problems {
                    println!("❌ {problem}");
                }
                anyhow::bail!("{} invariant violation(s)", problems.len());
            }
        }

        Commands::Order { file, by } => {
            let schema = load_schema(&file)?;
            let order = EntriesOrder::of(&by);
            for entry in schema.entries_ordered_with(&order) {
                print_entry(entry);
            }
            Ok(())
        }
    }
}

fn load_schema(file: &PathBuf) -> anyhow::Result<Schema> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    Schema::from_json(&content).with_context(|| format!("parsing {}", file.display()))
}

fn print_entry(entry: &Entry) {
    let mut flags = Vec::new();
    if entry.is_nullable() {
        flags.push("nullable");
    }
    if entry.is_metadata() {
        flags.push("metadata");
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    };
    let raw = match entry.raw_name() {
        Some(raw) => format!(" (raw: {raw})"),
        None => String::new(),
    };
    println!("  {} : {:?}{flags}{raw}", entry.name(), entry.schema_type());
}

/// Re-derive the invariants a well-formed schema upholds by construction.
/// Hand-written wire files can violate them.
fn verify(schema: &Schema) -> Vec<String> {
    let mut problems = Vec::new();

    let entries = schema.all_entries();
    let mut seen = std::collections::BTreeSet::new();
    for entry in &entries {
        if !seen.insert(entry.name()) {
            problems.push(format!("duplicate entry name '{}'", entry.name()));
        }
        if !entry.name().is_empty() && !is_valid_name(entry.name()) {
            problems.push(format!("'{}' is not a sanitized identifier", entry.name()));
        }
        let has_element = entry.element_schema().is_some();
        if entry.schema_type().requires_element_schema() && !has_element {
            problems.push(format!("entry '{}' is missing its element schema", entry.name()));
        }
        if !entry.schema_type().requires_element_schema() && has_element {
            problems.push(format!(
                "entry '{}' of type {:?} carries an element schema",
                entry.name(),
                entry.schema_type()
            ));
        }
    }

    match schema.prop(ENTRIES_ORDER_PROP) {
        None => problems.push(format!("missing '{ENTRIES_ORDER_PROP}' prop")),
        Some(prop) => {
            for name in EntriesOrder::of(prop).names() {
                if schema.get_entry(name).is_none() {
                    problems.push(format!("ordering references unknown entry '{name}'"));
                }
            }
        }
    }

    problems
}
