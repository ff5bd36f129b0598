//! gless: a pager for sorted genomic tracks.
//!
//! Usage: gless [OPTIONS] <FILES>...

use clap::Parser;
use log::debug;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process;

use gless::config::{ScoreLimits, SessionConfig, DEFAULT_FEATURE_COUNT};
use gless::error::Result;
use gless::selection::Selection;
use gless::session::{Action, Advance, Response, Session};
use gless::streaming::{BatchConsumer, TextRenderer};
use gless::track::TrackFile;

#[derive(Parser)]
#[command(name = "gless")]
#[command(version)]
#[command(about = "gless: page through sorted BED and bedGraph tracks, one window at a time", long_about = None)]
#[command(after_help = "Commands (one per line on stdin): <enter> or n = next window, \
r = restart, q = quit, < and > = shift (not supported)")]
struct Cli {
    /// Number of features per window
    #[arg(short = 'n', long = "nfeat", default_value_t = DEFAULT_FEATURE_COUNT)]
    nfeat: u64,

    /// Number of base pairs per window (overrides -n)
    #[arg(short = 'b', long = "nbp")]
    nbp: Option<u64>,

    /// Start from a region: chr, chr:pos or chr:start-end
    #[arg(short = 's', long = "sel")]
    sel: Option<String>,

    /// Score limits for density tracks: max or min,max
    #[arg(short = 'y', long = "ylim", allow_hyphen_values = true)]
    ylim: Option<String>,

    /// Skip sorted validation (faster for pre-sorted input)
    #[arg(long)]
    assume_sorted: bool,

    /// Print every window and exit instead of waiting for commands
    #[arg(long)]
    all: bool,

    /// Print session statistics to stderr
    #[arg(long)]
    stats: bool,

    /// Track files (.bed, .bedGraph, .bdg, .bg)
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() {
    pretty_env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let selection = Selection::parse(cli.sel.as_deref())?;
    let limits = ScoreLimits::parse(cli.ylim.as_deref())?;
    let config = match cli.nbp {
        Some(bp) => SessionConfig::span(bp),
        None => SessionConfig::count(cli.nfeat),
    }
    .with_selection(selection);

    let sources = cli
        .files
        .iter()
        .map(|path| TrackFile::new(path).map(|t| t.with_sort_check(!cli.assume_sorted)))
        .collect::<Result<Vec<_>>>()?;

    let mut session = Session::open(sources, config)?;
    let stdout = io::stdout();
    let mut renderer = TextRenderer::new(stdout.lock(), session.track_names()).with_limits(limits);

    if cli.all {
        run_all(&mut session, &mut renderer)?;
    } else {
        run_interactive(&mut session, &mut renderer)?;
    }

    if cli.stats {
        eprintln!("Session stats: {}", session.stats());
    }
    Ok(())
}

/// Print every window in order.
fn run_all<W: io::Write>(
    session: &mut Session<TrackFile>,
    renderer: &mut TextRenderer<W>,
) -> Result<()> {
    while let Advance::Batch(batch) = session.advance()? {
        renderer.draw(&batch, session.current_chromosome())?;
    }
    Ok(())
}

/// Show the first window, then follow commands from stdin until `q` or EOF.
fn run_interactive<W: io::Write>(
    session: &mut Session<TrackFile>,
    renderer: &mut TextRenderer<W>,
) -> Result<()> {
    match session.advance()? {
        Advance::Batch(batch) => renderer.draw(&batch, session.current_chromosome())?,
        Advance::EndOfData => {
            renderer.message("Nothing to show")?;
            return Ok(());
        }
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let action = match line.parse::<Action>() {
            Ok(action) => action,
            Err(e) => {
                eprintln!("{} (n: next, r: restart, q: quit)", e);
                continue;
            }
        };
        debug!("Command {:?}", action);

        match session.apply(action)? {
            Response::Draw(batch) => renderer.draw(&batch, session.current_chromosome())?,
            Response::EndOfData => renderer.message("End of file")?,
            Response::Quit => break,
            Response::Unsupported(action) => eprintln!("{:?} is not supported", action),
        }
    }
    Ok(())
}
