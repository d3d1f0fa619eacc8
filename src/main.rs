use anyhow::{Context, Result};
use clap::Parser;
use playwise::engine::{PositionBase, SamePositionMove};
use playwise::index::ArtistMatching;
use playwise::script::ScriptRunner;
use playwise::validation::check_consistency;
use playwise::{EngineConfig, ExportConfig, PlaylistEngine, SnapshotExporter};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "playwise")]
#[command(about = "Run playlist command scripts against the PlayWise engine", long_about = None)]
struct Args {
    /// JSON-lines command script ("-" reads stdin)
    #[arg(short = 's', long, default_value = "-")]
    script: String,

    /// Write the final snapshot to this file instead of stdout
    #[arg(short = 'o', long)]
    export: Option<String>,

    /// Maximum number of undoable operations kept
    #[arg(long, default_value = "50")]
    history_depth: usize,

    /// Number playlist positions from 1 instead of 0
    #[arg(long)]
    one_based: bool,

    /// Reject moves to a song's current position
    #[arg(long)]
    strict_moves: bool,

    /// Match blocked artists ignoring case
    #[arg(long)]
    case_insensitive_artists: bool,

    /// Remove existing songs when their artist is blocked
    #[arg(long)]
    purge_on_block: bool,

    /// Check index consistency after every command
    #[arg(long)]
    check: bool,

    /// Leave timing data out of the final snapshot
    #[arg(long)]
    no_metrics: bool,

    /// Verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the JSON outcome lines
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut config = EngineConfig::new().with_history_depth(args.history_depth);
    if args.one_based {
        config = config.with_position_base(PositionBase::One);
    }
    if args.strict_moves {
        config = config.with_same_position_move(SamePositionMove::Reject);
    }
    if args.case_insensitive_artists {
        config = config.with_artist_matching(ArtistMatching::CaseInsensitive);
    }
    if args.purge_on_block {
        config = config.with_purge_on_block(true);
    }

    log::info!("PlayWise playlist engine");
    log::debug!("Engine configuration: {:?}", config);

    let mut runner =
        ScriptRunner::new(PlaylistEngine::new(config)).with_consistency_checks(args.check);

    let stdout = io::stdout();
    let summary = if args.script == "-" {
        log::info!("Reading commands from stdin");
        runner.run(io::stdin().lock(), stdout.lock())?
    } else {
        let path = PathBuf::from(shellexpand::tilde(&args.script).as_ref());
        log::info!("Reading commands from {:?}", path);
        let file =
            File::open(&path).with_context(|| format!("Failed to open script: {:?}", path))?;
        runner.run(BufReader::new(file), stdout.lock())?
    };

    let mut engine = runner.into_engine();
    let report = check_consistency(&engine)?;
    log::info!(
        "{} songs, {} seconds total, {} failed commands",
        report.songs,
        report.total_duration,
        summary.failures
    );

    let snapshot = engine.full_snapshot();
    match args.export {
        Some(path) => {
            let path = PathBuf::from(shellexpand::tilde(&path).as_ref());
            let mut export_config = ExportConfig::new(path);
            if args.no_metrics {
                export_config = export_config.without_metrics();
            }
            SnapshotExporter::new(export_config).export(&snapshot)?;
        }
        None => {
            let mut export_config = ExportConfig::new(PathBuf::new()).compact();
            if args.no_metrics {
                export_config = export_config.without_metrics();
            }
            println!("{}", SnapshotExporter::new(export_config).render(&snapshot)?);
        }
    }

    Ok(())
}
