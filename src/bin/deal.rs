use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use patience::{Desk, Peaks};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GameOpt {
    Freecell,
    Tripeaks,
}

#[derive(Debug, Parser)]
#[command(name = "deal", about = "Print a numbered deal in the layout-file format")]
struct Args {
    #[arg(long, value_enum)]
    game: GameOpt,

    /// Deal number (0 .. 2^31)
    #[arg(long)]
    seed: u64,

    /// Print the board as a table instead of layout lines
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let (lines, pretty) = match args.game {
        GameOpt::Freecell => {
            let desk = Desk::deal(args.seed).with_context(|| format!("cannot deal seed {}", args.seed))?;
            (desk.layout_lines(), desk.to_string())
        }
        GameOpt::Tripeaks => {
            let peaks = Peaks::deal(args.seed).with_context(|| format!("cannot deal seed {}", args.seed))?;
            (peaks.layout_lines(), peaks.to_string())
        }
    };
    if args.pretty {
        print!("{pretty}");
    } else {
        for line in lines {
            println!("{line}");
        }
    }
    Ok(())
}
