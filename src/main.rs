use std::path::PathBuf;
use std::sync::Arc;
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table as ComfyTable, presets::UTF8_FULL};
use sqlgrain::operator::DELETE_ALL;
use sqlgrain::resource::script;
use sqlgrain::{DataGrain, DataRow, SchemaTable, Settings};

/// sqlgrain CLI
#[derive(Parser, Debug)]
#[command(name = "sqlgrain")]
#[command(about = "Inspect and prepare SQLite test databases", long_about = None)]
struct Args {
    /// Settings file (defaults to ./sqlgrain.toml when present)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Database file, overrides settings
    #[arg(short = 'd', long)]
    database: Option<PathBuf>,

    /// Resource directory, overrides settings
    #[arg(short = 'f', long)]
    fixtures_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the columns of a table as the schema loader sees them
    Columns {
        table: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Run a SQL script from the resource directory in one transaction
    Script { resource: String },
    /// Delete every row of the given tables in one transaction
    Clear {
        #[arg(required = true)]
        tables: Vec<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    // CLI args override everything
    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(database) = args.database {
        settings.database = database;
    }
    if let Some(dir) = args.fixtures_dir {
        settings.fixtures_dir = dir;
    }
    log::info!("using database {}", settings.database.display());

    let conductor = settings.conductor();
    match args.command {
        Command::Columns { table, json } => {
            let loaded = conductor.conduct_with(|session| {
                conductor.schema_loader().load(session, &SchemaTable::named(&table))
            })?;
            if json {
                println!("{}", serde_json::to_string_pretty(loaded.columns())?);
                return Ok(());
            }

            let mut out = ComfyTable::new();
            out.load_preset(UTF8_FULL);
            out.set_header(["column", "type", "nullable", "default", "key", "auto"].map(Cell::new));
            for column in loaded.columns() {
                out.add_row([
                    Cell::new(&column.name),
                    Cell::new(column.sql_type.as_deref().unwrap_or("")),
                    Cell::new(column.nullable.map_or_else(String::new, |n| n.to_string())),
                    Cell::new(column.default_value.as_deref().unwrap_or("")),
                    Cell::new(column.is_primary_key()),
                    Cell::new(column.is_auto_increment()),
                ]);
            }
            println!("{}", loaded.qualified_name());
            println!("{out}");
        }
        Command::Script { resource } => {
            let run = script(Arc::new(settings.loader()), &resource);
            conductor.transaction(|session| run(session))?;
            println!("ran {resource}");
        }
        Command::Clear { tables } => {
            let grain: DataGrain = tables
                .iter()
                .map(|t| DataRow::builder(Arc::new(SchemaTable::named(t))).build())
                .collect();
            conductor.transaction(|session| {
                let clear = conductor.operators().require(session, DELETE_ALL)?;
                conductor.apply(session, &grain, clear.as_ref(), None)
            })?;
            println!("cleared {} tables", tables.len());
        }
    }
    Ok(())
}
