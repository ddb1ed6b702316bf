use clap::{Parser, Subcommand};
use mathdoku_save::puzzle_file::PuzzleFile;
use mathdoku_save::store::PuzzleStore;
use mathdoku_save::CURRENT_REVISION;
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Parser)]
#[command(name = "mathdoku-save", about = "Inspect and upgrade MathDoku save files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the contents of a save file
    Inspect {
        input: PathBuf,
        /// Grid size of the game (1-9)
        #[arg(short, long)]
        grid_size: usize,
        /// Dump the decoded puzzle as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check that a save file decodes cleanly
    Validate {
        input: PathBuf,
        #[arg(short, long)]
        grid_size: usize,
    },
    /// Re-save a file in the current layout
    Upgrade {
        input: PathBuf,
        #[arg(short, long)]
        grid_size: usize,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Show revision and header without decoding the grid
    Header {
        input: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {

        // ── Inspect ──────────────────────────────────────────────────────────
        Commands::Inspect { input, grid_size, json } => {
            let puzzle = PuzzleStore::load(&input, grid_size)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&puzzle)?);
            } else {
                print_summary(&input, &puzzle);
            }
        }

        // ── Validate ─────────────────────────────────────────────────────────
        Commands::Validate { input, grid_size } => {
            match PuzzleStore::load(&input, grid_size) {
                Ok(p) => println!("{}: ok ({})", input.display(), p.revision),
                Err(e) => {
                    eprintln!("{}: {}", input.display(), e);
                    std::process::exit(1);
                }
            }
        }

        // ── Upgrade ──────────────────────────────────────────────────────────
        Commands::Upgrade { input, grid_size, output } => {
            let puzzle = PuzzleStore::load(&input, grid_size)?;
            let from = puzzle.revision;
            PuzzleStore::save(&output, &Mutex::new(puzzle))?;
            println!("Upgraded {} → {} ({} → {})", input.display(), output.display(), from, CURRENT_REVISION);
        }

        // ── Header ───────────────────────────────────────────────────────────
        Commands::Header { input } => {
            let s = PuzzleStore::peek_header(&input)?;
            println!("  Revision       {}", s.revision);
            println!("  Active         {}", s.header.active);
            println!("  Revealed       {}", s.header.revealed);
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn print_summary(path: &PathBuf, p: &PuzzleFile) {
    println!("── MathDoku save ────────────────────────────────────────");
    println!("  Path           {}", path.display());
    println!("  Revision       {}", p.revision);
    println!("  Grid           {0}x{0}", p.grid_size);
    println!("  Active         {}", p.header.active);
    println!("  Revealed       {}", p.header.revealed);
    if let Some(stats) = p.legacy_statistics {
        let created = stats
            .created_at()
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "—".into());
        println!("  Seed           {}", stats.game_seed);
        println!("  Created        {}", created);
        println!("  Elapsed        {} s", stats.elapsed_millis / 1000);
    }
    if let Some(c) = p.selected_cell() {
        let (row, col) = c.position(p.grid_size);
        println!("  Selected       r{} c{}", row + 1, col + 1);
    }

    println!("  Cages ({}):", p.cages.len());
    for cage in &p.cages {
        println!("    #{:<3} {:<8} cells {:?}", cage.id, cage.label(), cage.cells);
    }

    println!("  Grid:");
    for row in p.cells.chunks(p.grid_size) {
        let line: Vec<String> = row
            .iter()
            .map(|c| c.entered_value.map(|v| v.to_string()).unwrap_or_else(|| ".".into()))
            .collect();
        println!("    {}", line.join(" "));
    }

    let deepest = p.moves.iter().map(|m| m.depth()).max().unwrap_or(0);
    println!("  Moves          {} (deepest nesting {})", p.moves.len(), deepest);
}
