use clap::{Parser, Subcommand};
use memmap2::Mmap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use protoproxy::MessageProxy;
use protoproxy_schema::{DescriptorBridge, SchemaError, fixtures, resolve_field};
use thiserror::Error;

mod script;

#[derive(Parser)]
#[command(name = "protoproxy", about = "Inspect and edit protobuf messages through reflective proxies")]
struct Cli {
    /// Serialized FileDescriptorSet (default: built-in demo schema)
    #[arg(short, long, global = true)]
    descriptors: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List message types
    Types,
    /// Show the fields of a message type
    Describe {
        /// Fully-qualified message type
        #[arg(short = 't', long = "type")]
        type_name: String,
    },
    /// Decode a binary message and print it in text form
    Show {
        #[arg(short = 't', long = "type")]
        type_name: String,
        /// Path to the encoded message
        input: PathBuf,
    },
    /// Apply a YAML edit script to a message
    Edit {
        #[arg(short = 't', long = "type")]
        type_name: String,
        /// Encoded message to start from (default: empty message)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// YAML edit script
        #[arg(short, long)]
        script: PathBuf,
        /// Write the encoded result here (default: print text form)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Lookup(#[from] protoproxy_schema::LookupError),
    #[error(transparent)]
    Proxy(#[from] protoproxy::Error),
    #[error("invalid script: {0}")]
    Script(#[from] serde_yaml::Error),
    #[error("invalid field path {0:?}")]
    Path(String),
    #[error("{0}")]
    Value(String),
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let bridge = load_bridge(cli.descriptors.as_deref())?;
    match cli.command {
        Commands::Types => cmd_types(&bridge),
        Commands::Describe { type_name } => cmd_describe(&bridge, &type_name),
        Commands::Show { type_name, input } => cmd_show(&bridge, &type_name, &input),
        Commands::Edit {
            type_name,
            input,
            script,
            output,
        } => cmd_edit(&bridge, &type_name, input.as_deref(), &script, output.as_deref()),
    }
}

fn load_bridge(path: Option<&Path>) -> Result<DescriptorBridge, CliError> {
    match path {
        Some(path) => with_file(path, |bytes| Ok(DescriptorBridge::decode(bytes)?)),
        None => Ok(fixtures::bridge()?),
    }
}

/// Map `path` read-only and pass its contents to `f`.
fn with_file<R>(path: &Path, f: impl FnOnce(&[u8]) -> Result<R, CliError>) -> Result<R, CliError> {
    let io = |source: std::io::Error| CliError::Io {
        path: path.to_owned(),
        source,
    };
    let file = File::open(path).map_err(io)?;
    if file.metadata().map_err(io)?.len() == 0 {
        return f(&[]);
    }
    // SAFETY: the mapping is only read for the duration of `f`.
    let map = unsafe { Mmap::map(&file) }.map_err(io)?;
    log::debug!("mapped {} ({} bytes)", path.display(), map.len());
    f(&map)
}

fn cmd_types(bridge: &DescriptorBridge) -> Result<(), CliError> {
    for name in bridge.message_names() {
        println!("{name}");
    }
    Ok(())
}

fn cmd_describe(bridge: &DescriptorBridge, type_name: &str) -> Result<(), CliError> {
    let desc = bridge.resolve_message(type_name)?;
    println!("message {} {{", desc.full_name());
    let mut fields: Vec<_> = desc.fields().collect();
    fields.sort_by_key(|f| f.number());
    for field in fields {
        let resolved = resolve_field(&desc, field.name())?;
        println!(
            "  {:>3}  {:<24} {}",
            field.number(),
            field.name(),
            resolved.kind
        );
    }
    println!("}}");
    Ok(())
}

fn cmd_show(bridge: &DescriptorBridge, type_name: &str, input: &Path) -> Result<(), CliError> {
    let msg = MessageProxy::new(bridge.resolve_message(type_name)?);
    with_file(input, |bytes| Ok(msg.parse_from_bytes(bytes)?))?;
    println!("{msg}");
    Ok(())
}

fn cmd_edit(
    bridge: &DescriptorBridge,
    type_name: &str,
    input: Option<&Path>,
    script_path: &Path,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let msg = MessageProxy::new(bridge.resolve_message(type_name)?);
    if let Some(input) = input {
        with_file(input, |bytes| Ok(msg.parse_from_bytes(bytes)?))?;
    }
    let ops = with_file(script_path, script::parse)?;
    script::apply(&msg, &ops)?;

    match output {
        Some(path) => {
            let bytes = msg.serialize()?;
            fs::write(path, &bytes).map_err(|source| CliError::Io {
                path: path.to_owned(),
                source,
            })?;
            log::info!("wrote {} bytes to {}", bytes.len(), path.display());
        }
        None => println!("{msg}"),
    }
    Ok(())
}
