use crate::commands;
use crate::config::{Config, load_config};
use crate::error::Error;
use crate::layout::compute_layout;
use crate::layout_dump::{LayoutDump, write_layout_dump};
use crate::parser::parse_diagram;
use crate::store::DirStore;
use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use serde_json::{Value, json};
use std::io::{self, Read};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(
    name = "exmd",
    version,
    about = "Lay out node/edge diagrams as Obsidian Excalidraw documents"
)]
pub struct Args {
    /// Directory document paths are resolved against (e.g. a vault)
    #[arg(short = 'r', long = "root", global = true, default_value = ".")]
    pub root: PathBuf,

    /// Config file (JSON5)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// More logging on stderr; repeat for more
    #[arg(short = 'v', long = "verbose", global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a diagram document from diagram JSON
    Create {
        path: String,
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print the scene stored in a diagram document
    Get { path: String },
    /// Append diagram JSON to an existing diagram document
    Patch {
        path: String,
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print the computed layout for diagram JSON
    Layout {
        #[command(flatten)]
        input: InputArgs,

        /// Write the layout dump here instead of printing it
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
}

impl Command {
    fn operation(&self) -> &'static str {
        match self {
            Command::Create { .. } => "excalidraw-create",
            Command::Get { .. } => "excalidraw-get",
            Command::Patch { .. } => "excalidraw-patch",
            Command::Layout { .. } => "excalidraw-layout",
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct InputArgs {
    /// Read diagram JSON from a file
    #[arg(long = "from-file", conflicts_with = "stdin")]
    pub from_file: Option<PathBuf>,

    /// Read diagram JSON from stdin
    #[arg(long = "stdin")]
    pub stdin: bool,
}

/// A failed command, as reported in the output envelope.
#[derive(Debug)]
struct Failure {
    message: String,
    code: &'static str,
}

impl Failure {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }
}

impl From<Error> for Failure {
    fn from(err: Error) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    success: bool,
    operation: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<Value>,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let operation = args.command.operation();
    let outcome = load_config(args.config.as_deref())
        .map_err(|err| Failure::new("CONFIG_ERROR", format!("{err:#}")))
        .and_then(|config| execute(&args, &config));

    let (envelope, failure) = match outcome {
        Ok(result) => (
            Envelope {
                success: true,
                operation,
                result: Some(result),
                error: None,
                meta: None,
            },
            None,
        ),
        Err(failure) => (
            Envelope {
                success: false,
                operation,
                result: None,
                error: Some(failure.message.clone()),
                meta: Some(json!({ "code": failure.code })),
            },
            Some(failure),
        ),
    };
    println!("{}", serde_json::to_string_pretty(&envelope)?);

    match failure {
        Some(failure) => Err(anyhow::anyhow!(failure.message)),
        None => Ok(()),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .try_init();
}

fn execute(args: &Args, config: &Config) -> std::result::Result<Value, Failure> {
    let mut store = DirStore::new(&args.root);
    tracing::debug!(root = %store.root().display(), "resolving documents");
    let value = match &args.command {
        Command::Create { path, input } => {
            let diagram = parse_diagram(&read_input(input)?).map_err(Error::from)?;
            let summary = commands::create(&mut store, path, &diagram, config)?;
            to_value(&summary)?
        }
        Command::Get { path } => {
            let diagram = commands::get(&store, path)?;
            to_value(&diagram)?
        }
        Command::Patch { path, input } => {
            let additions = parse_diagram(&read_input(input)?).map_err(Error::from)?;
            let summary = commands::patch(&mut store, path, &additions, config)?;
            to_value(&summary)?
        }
        Command::Layout { input, output } => {
            let diagram = parse_diagram(&read_input(input)?).map_err(Error::from)?;
            let layout = compute_layout(&diagram, &config.layout);
            match output {
                Some(path) => {
                    write_layout_dump(path, &layout)
                        .map_err(|err| Failure::new("OUTPUT_ERROR", format!("{err:#}")))?;
                    json!({ "path": path.display().to_string() })
                }
                None => to_value(&LayoutDump::from_layout(&layout))?,
            }
        }
    };
    Ok(value)
}

fn read_input(input: &InputArgs) -> std::result::Result<String, Failure> {
    if let Some(path) = &input.from_file {
        return std::fs::read_to_string(path).map_err(|err| {
            Failure::new(
                "INPUT_ERROR",
                format!("Source file not found: {} ({err})", path.display()),
            )
        });
    }
    if input.stdin {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|err| Failure::new("INPUT_ERROR", format!("Failed to read stdin: {err}")))?;
        if buf.trim().is_empty() {
            return Err(Failure::new("INPUT_ERROR", "No content provided via stdin"));
        }
        return Ok(buf);
    }
    Err(Failure::new(
        "INPUT_ERROR",
        "No input provided. Use --from-file or --stdin",
    ))
}

fn to_value<T: Serialize>(value: &T) -> std::result::Result<Value, Failure> {
    serde_json::to_value(value).map_err(|err| Failure::new("OUTPUT_ERROR", err.to_string()))
}
