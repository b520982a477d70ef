//! Agent Canvas CLI
//!
//! Usage:
//!   agent-canvas --scene <FILE> [OPTIONS] [BATCH]
//!
//! Options:
//!   -s, --scene <FILE>    Scene document (JSON tree)
//!   -c, --config <FILE>   Engine profile (TOML format)
//!   -o, --output <FILE>   Where to write the edited scene (stdout if omitted)
//!   --store <FILE>        Revert store path
//!   --revert              Undo the last persisted batch instead of applying one
//!   -d, --debug           Print the scene tree with node bounds after the edit
//!   -h, --help            Print help

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;

use agent_canvas::scene::{export, import};
use agent_canvas::{
    dump_tree, CanvasEditor, EditError, EngineConfig, JsonFileRevertStore, OperationBatch,
};

#[derive(Parser)]
#[command(name = "agent-canvas")]
#[command(about = "Structural edit engine for AI-driven design documents")]
struct Cli {
    /// Batch file with the operations to apply (reads from stdin if not
    /// provided)
    batch: Option<PathBuf>,

    /// Scene document (JSON tree)
    #[arg(short, long)]
    scene: PathBuf,

    /// Engine profile (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write the edited scene (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Revert store path
    #[arg(long, default_value = ".agent-canvas-revert.json")]
    store: PathBuf,

    /// Undo the last persisted batch instead of applying one
    #[arg(long)]
    revert: bool,

    /// Print the scene tree with node bounds after the edit
    #[arg(short, long)]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), EditError> {
    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    let scene_json = fs::read_to_string(&cli.scene)?;
    let portable = serde_json::from_str(&scene_json)?;
    let scene = import(&portable)?;

    let mut editor = CanvasEditor::new(scene, config)
        .with_store(JsonFileRevertStore::new(&cli.store));

    if cli.revert {
        let restored = editor.revert_last()?;
        eprintln!("reverted last batch ({restored} nodes restored)");
    } else {
        let batch = read_batch(&cli)?;
        let reports = editor.apply_batch(batch);
        for report in &reports {
            eprintln!("{}", report.status_line());
        }
        let failures = reports.iter().filter(|r| r.outcome.is_err()).count();
        eprintln!(
            "{}/{} operations applied",
            reports.len() - failures,
            reports.len()
        );
    }

    if cli.debug {
        eprintln!("=== Scene Debug ===");
        eprint!("{}", dump_tree(editor.scene()));
        eprintln!("===================");
    }

    let edited = export(editor.scene(), editor.scene().root(), None)?;
    let rendered = serde_json::to_string_pretty(&edited)?;
    match &cli.output {
        Some(path) => fs::write(path, rendered)?,
        None => println!("{rendered}"),
    }

    Ok(())
}

fn read_batch(cli: &Cli) -> Result<OperationBatch, EditError> {
    let content = match &cli.batch {
        Some(path) => fs::read_to_string(path)?,
        None => {
            if io::stdin().is_terminal() {
                eprintln!("reading batch JSON from stdin (pipe a batch or pass a file)...");
            }
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    Ok(serde_json::from_str(&content)?)
}
