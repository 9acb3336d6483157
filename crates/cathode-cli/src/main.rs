//! Archive identifier and side-table tools.
//!
//! Provides the `cathode` binary for hashing names into identifiers,
//! resolving identifiers back to names, and inspecting or editing the side
//! table stored past an archive's declared end.
//!
//! The factory name dataset shipped with `cathode-core` can be replaced by
//! pointing `CATHODE_FACTORY_NAMES` at a newline-delimited names file. Log
//! output goes to stderr and is filtered with `RUST_LOG` (default `info`).

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cathode_core::{Identifier, IdentifierRegistry, NameCache};
use cathode_storage::{
    attach_custom_names, end_offset, load_entity_names, read_slot, save_custom_names,
    save_entity_names, table_exists, SlotKind, StorageError,
};

/// Environment variable naming a replacement factory names file.
const FACTORY_NAMES_ENV: &str = "CATHODE_FACTORY_NAMES";

/// Archive identifier and side-table tools.
#[derive(Parser)]
#[command(name = "cathode", about = "Archive identifier and side-table tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Hash names into identifiers.
    Hash {
        /// Names to hash.
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Resolve identifiers to names.
    Lookup {
        /// Identifiers, as `01-A2-03-04` or `01A20304`.
        #[arg(required = true)]
        ids: Vec<String>,

        /// Archive whose custom names are consulted as well.
        #[arg(short, long)]
        archive: Option<PathBuf>,
    },

    /// Generate identifiers unused by the factory and custom names.
    Random {
        /// Number of identifiers to generate.
        #[arg(short, long, default_value_t = 1)]
        count: usize,

        /// Archive whose custom names must also be avoided.
        #[arg(short, long)]
        archive: Option<PathBuf>,

        /// Store the generated names in the archive's side table.
        #[arg(long, requires = "archive")]
        save: bool,
    },

    /// Print the side-table status of an archive as JSON.
    Slots {
        /// Path to the archive.
        archive: PathBuf,
    },

    /// Print the custom entity names stored in an archive as JSON.
    Names {
        /// Path to the archive.
        archive: PathBuf,
    },

    /// Set or clear the custom display name of an entity.
    ///
    /// COMPOSITE and ENTITY accept an identifier or a name to hash.
    Rename {
        /// Path to the archive.
        archive: PathBuf,

        /// Composite owning the entity.
        composite: String,

        /// Entity to rename.
        entity: String,

        /// New display name.
        #[arg(required_unless_present = "clear")]
        name: Option<String>,

        /// Remove the custom name instead of setting one.
        #[arg(long, conflicts_with = "name")]
        clear: bool,
    },
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let registry = match load_registry() {
        Ok(registry) => registry,
        Err(code) => process::exit(code),
    };

    let exit_code = match cli.command {
        Commands::Hash { names } => run_hash(&registry, &names),
        Commands::Lookup { ids, archive } => run_lookup(registry, &ids, archive.as_deref()),
        Commands::Random {
            count,
            archive,
            save,
        } => run_random(registry, count, archive.as_deref(), save),
        Commands::Slots { archive } => run_slots(&archive),
        Commands::Names { archive } => run_names(registry, &archive),
        Commands::Rename {
            archive,
            composite,
            entity,
            name,
            clear: _,
        } => run_rename(&registry, &archive, &composite, &entity, name),
    };
    process::exit(exit_code);
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Builds the registry, honouring a factory names override.
///
/// Returns exit code 3 if the override file cannot be read.
fn load_registry() -> Result<IdentifierRegistry, i32> {
    let Some(path) = std::env::var_os(FACTORY_NAMES_ENV) else {
        return Ok(IdentifierRegistry::new());
    };
    let path = PathBuf::from(path);

    match fs::read_to_string(&path) {
        Ok(text) => {
            let cache = NameCache::from_names(text.lines());
            debug!(path = %path.display(), entries = cache.len(), "loaded factory names override");
            Ok(IdentifierRegistry::with_factory(Arc::new(cache)))
        }
        Err(e) => {
            eprintln!(
                "Error: failed to read {} file '{}': {}",
                FACTORY_NAMES_ENV,
                path.display(),
                e
            );
            Err(3)
        }
    }
}

/// Execute the hash subcommand.
fn run_hash(registry: &IdentifierRegistry, names: &[String]) -> i32 {
    for name in names {
        println!("{}\t{}", registry.generate_uncached(name), name);
    }
    0
}

/// Execute the lookup subcommand.
///
/// Returns exit code: 0 = success, 1 = invalid identifier,
/// 3 = I/O error.
fn run_lookup(mut registry: IdentifierRegistry, ids: &[String], archive: Option<&Path>) -> i32 {
    let mut parsed = Vec::with_capacity(ids.len());
    for raw in ids {
        match raw.parse::<Identifier>() {
            Ok(id) => parsed.push(id),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
    }

    if let Some(path) = archive {
        if let Err(code) = attach(&mut registry, path) {
            return code;
        }
    }

    for id in parsed {
        println!("{}\t{}", id, registry.find_string(id));
    }
    0
}

/// Execute the random subcommand.
fn run_random(
    mut registry: IdentifierRegistry,
    count: usize,
    archive: Option<&Path>,
    save: bool,
) -> i32 {
    if let Some(path) = archive {
        if let Err(code) = attach(&mut registry, path) {
            return code;
        }
    }

    for _ in 0..count {
        let id = registry.generate_random();
        println!("{}\t{}", id, registry.find_string(id));
    }

    if let (true, Some(path)) = (save, archive) {
        if let Err(e) = save_custom_names(&registry, path) {
            eprintln!("Error: failed to save names to '{}': {}", path.display(), e);
            return storage_exit_code(&e);
        }
        info!(path = %path.display(), count, "saved random identifiers");
    }
    0
}

/// Execute the slots subcommand.
///
/// Prints the archive's end offset and the presence of each slot.
fn run_slots(path: &Path) -> i32 {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: failed to open archive '{}': {}", path.display(), e);
            return 3;
        }
    };

    let status = match slot_status(&mut file) {
        Ok(status) => status,
        Err(e) => {
            eprintln!("Error: failed to read archive '{}': {}", path.display(), e);
            return storage_exit_code(&e);
        }
    };

    let mut report = json!({ "path": path.display().to_string() });
    if let (Value::Object(report), Value::Object(status)) = (&mut report, status) {
        report.extend(status);
    }
    print_json(&report);
    0
}

fn slot_status(file: &mut File) -> Result<Value, StorageError> {
    let size = file.metadata()?.len();
    let end = end_offset(file)?;
    let exists = table_exists(file)?;

    let mut slots = Vec::with_capacity(SlotKind::ALL.len());
    for kind in SlotKind::ALL {
        let content = read_slot(file, kind)?;
        slots.push(json!({
            "slot": kind.name(),
            "index": kind.index(),
            "present": content.is_some(),
            "records": content.as_ref().map(|c| c.record_count()),
        }));
    }

    Ok(json!({
        "size": size,
        "end_offset": end,
        "side_table": exists,
        "slots": slots,
    }))
}

/// Execute the names subcommand.
fn run_names(mut registry: IdentifierRegistry, path: &Path) -> i32 {
    if let Err(code) = attach(&mut registry, path) {
        return code;
    }
    let table = match load_entity_names(path) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Error: failed to read entity names from '{}': {}", path.display(), e);
            return storage_exit_code(&e);
        }
    };

    let composites: Vec<Value> = table
        .composites()
        .map(|(composite, entities)| {
            let entities: Vec<Value> = entities
                .iter()
                .map(|(entity, name)| {
                    json!({
                        "entity": entity.to_byte_string(),
                        "name": name,
                    })
                })
                .collect();
            json!({
                "composite": composite.to_byte_string(),
                "composite_name": registry.find_string(composite),
                "entities": entities,
            })
        })
        .collect();

    print_json(&Value::Array(composites));
    0
}

/// Execute the rename subcommand. `name` of `None` clears the entry.
fn run_rename(
    registry: &IdentifierRegistry,
    path: &Path,
    composite: &str,
    entity: &str,
    name: Option<String>,
) -> i32 {
    let composite = parse_key(registry, composite);
    let entity = parse_key(registry, entity);

    let mut table = match load_entity_names(path) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Error: failed to read entity names from '{}': {}", path.display(), e);
            return storage_exit_code(&e);
        }
    };

    match name {
        Some(name) => {
            info!(%composite, %entity, %name, "renaming entity");
            table.set(composite, entity, name);
        }
        None => {
            if table.remove(composite, entity).is_none() {
                eprintln!("Error: entity {} in composite {} has no custom name", entity, composite);
                return 1;
            }
            info!(%composite, %entity, "cleared entity name");
        }
    }

    if let Err(e) = save_entity_names(path, &table) {
        eprintln!("Error: failed to save entity names to '{}': {}", path.display(), e);
        return storage_exit_code(&e);
    }
    0
}

/// Replaces the registry's custom names with the archive's.
fn attach(registry: &mut IdentifierRegistry, path: &Path) -> Result<(), i32> {
    attach_custom_names(registry, path).map(|_| ()).map_err(|e| {
        eprintln!("Error: failed to read archive '{}': {}", path.display(), e);
        storage_exit_code(&e)
    })
}

/// Interprets `input` as an identifier, or hashes it as a name if it does
/// not parse as one.
fn parse_key(registry: &IdentifierRegistry, input: &str) -> Identifier {
    input
        .parse()
        .unwrap_or_else(|_| registry.generate_uncached(input))
}

/// Maps a storage error to an exit code: 3 for I/O, 1 for bad content.
fn storage_exit_code(error: &StorageError) -> i32 {
    match error {
        StorageError::Io(_) | StorageError::Persist(_) => 3,
        _ => 1,
    }
}

fn print_json(value: &Value) {
    let json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize result: {}\"}}", e));
    println!("{}", json);
}
