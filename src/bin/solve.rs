use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use serde::de::DeserializeOwned;
use serde::Serialize;

use patience::engine::score::{HighestScore, SelectionPolicy, ShortestSequence};
use patience::logging;
use patience::solver::{SpillCompression, SpillStack};
use patience::{
    Desk, Exit, Game, Outcome, Peaks, Search, SearchLimits, SearchObserver, SearchStats,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GameOpt {
    Freecell,
    Tripeaks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyOpt {
    /// Shortest clear of the first generation that finds one
    First,
    /// Fewest moves to a clear, resuming every checkpoint to prove it
    Shortest,
    /// Highest run bonus plus cleared peaks (tripeaks only)
    Score,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CompressionOpt {
    None,
    Lz4,
}

impl From<CompressionOpt> for SpillCompression {
    fn from(c: CompressionOpt) -> Self {
        match c {
            CompressionOpt::None => SpillCompression::None,
            CompressionOpt::Lz4 => SpillCompression::Lz4,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "solve", about = "Bounded-memory FreeCell and TriPeaks solver")]
struct Args {
    #[arg(long, value_enum)]
    game: GameOpt,

    /// Deal numbers to solve, one after the other (0 .. 2^31)
    #[arg(long, num_args = 1.., required_unless_present = "layout", conflicts_with = "layout")]
    seed: Vec<u64>,

    /// Layout file: one pile per line, cards concatenated (e.g. 2C2H7C)
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Split the frontier once it holds more sequences than this (default per game)
    #[arg(long)]
    max: Option<usize>,

    /// Sequences kept by a split (default per game)
    #[arg(long)]
    min: Option<usize>,

    #[arg(long, value_enum, default_value_t = PolicyOpt::First)]
    policy: PolicyOpt,

    /// Stop after this many generations and report the best answer so far
    #[arg(long)]
    max_generations: Option<u64>,

    /// Spill checkpoints to files under this directory instead of keeping them in memory
    #[arg(long)]
    spill_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = CompressionOpt::Lz4)]
    spill_compression: CompressionOpt,

    /// Print a JSON array of reports instead of the move listing
    #[arg(long)]
    json: bool,

    /// Hide the progress spinner
    #[arg(long)]
    no_progress: bool,

    /// Mirror log output into this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// -v info, -vv debug, -vvv trace
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Per-game presentation used by the report.
trait Listing: Game {
    const NAME: &'static str;

    fn describe_move(&self, mv: Self::Move) -> String;

    /// Extra text for the total line.
    fn total_note(moves: usize, cleared: bool) -> Option<String> {
        let _ = (moves, cleared);
        None
    }
}

impl Listing for Desk {
    const NAME: &'static str = "freecell";

    fn describe_move(&self, mv: Self::Move) -> String {
        self.describe(mv)
    }

    fn total_note(moves: usize, cleared: bool) -> Option<String> {
        cleared.then(|| format!("{} playfield moves", moves.saturating_sub(52)))
    }
}

impl Listing for Peaks {
    const NAME: &'static str = "tripeaks";

    fn describe_move(&self, mv: Self::Move) -> String {
        self.describe(mv)
    }
}

#[derive(Debug, Serialize)]
struct Report {
    game: &'static str,
    deal: String,
    exit: Exit,
    cleared: bool,
    score: Option<i64>,
    moves: serde_json::Value,
    steps: Vec<String>,
    stats: SearchStats,
    elapsed_ms: u128,
}

/// Spinner fed by the search.
#[derive(Clone)]
struct Progress {
    pb: ProgressBar,
}

impl Progress {
    fn new(label: &str, hidden: bool) -> Result<Self> {
        let pb = if hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        pb.set_style(ProgressStyle::with_template(
            "[{elapsed_precise}] {spinner} {prefix} {msg}",
        )?);
        pb.set_prefix(label.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        Ok(Self { pb })
    }

    fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

impl SearchObserver for Progress {
    fn on_generation(&mut self, frontier: usize, stats: &SearchStats) {
        self.pb.set_message(format!(
            "gen {} frontier {} expanded {} splits {}",
            stats.generations, frontier, stats.expanded, stats.splits
        ));
    }

    fn on_split(&mut self, kept: usize, deferred: usize, stats: &SearchStats) {
        self.pb.set_message(format!(
            "split #{}: {kept} kept, {deferred} deferred",
            stats.splits
        ));
    }

    fn on_resume(&mut self, frontier: usize, stats: &SearchStats) {
        self.pb.set_message(format!(
            "resume #{}: {frontier} sequences",
            stats.resumes
        ));
    }
}

fn read_layout(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading layout {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn limits_for(args: &Args, preset: SearchLimits) -> SearchLimits {
    SearchLimits {
        max_frontier: args.max.unwrap_or(preset.max_frontier),
        min_frontier: args.min.unwrap_or(preset.min_frontier),
        max_generations: args.max_generations,
    }
}

fn run_search<G, P>(
    args: &Args,
    initial: &G,
    limits: SearchLimits,
    policy: P,
    label: &str,
) -> Result<Outcome<G::Move>>
where
    G: Game,
    G::Move: Serialize + DeserializeOwned,
    P: SelectionPolicy<G>,
{
    let progress = Progress::new(label, args.no_progress || args.json)?;
    let search = Search::new(initial.clone(), limits)?
        .with_policy(policy)
        .with_observer(progress.clone());
    let outcome = match &args.spill_dir {
        Some(dir) => {
            let name: String = label
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
                .collect();
            let dir = dir.join(name);
            let store = SpillStack::create(&dir, args.spill_compression.into())
                .with_context(|| format!("creating spill directory {}", dir.display()))?;
            search.with_store(store).run()?
        }
        None => search.run()?,
    };
    progress.finish();
    Ok(outcome)
}

fn report<G>(initial: &G, label: &str, outcome: &Outcome<G::Move>, elapsed: Duration) -> Result<Report>
where
    G: Listing,
    G::Move: Serialize,
{
    let mut board = initial.clone();
    let mut steps = Vec::new();
    let (moves, cleared, score) = match &outcome.solution {
        Some(s) => {
            for &mv in &s.moves {
                steps.push(board.describe_move(mv));
                board.apply(mv);
            }
            (serde_json::to_value(&s.moves)?, s.cleared, s.score)
        }
        None => (serde_json::Value::Null, false, None),
    };
    Ok(Report {
        game: G::NAME,
        deal: label.to_string(),
        exit: outcome.exit,
        cleared,
        score,
        moves,
        steps,
        stats: outcome.stats,
        elapsed_ms: elapsed.as_millis(),
    })
}

fn print_report<G: Listing>(r: &Report) {
    let rule = format!("o{}", "-=".repeat(25));
    println!("{rule}");
    println!("| {} {}", r.game, r.deal);
    if r.moves.is_null() {
        println!("| No solution ({:?})", r.exit);
    } else {
        let mut total = format!("| Total: {} moves", r.steps.len());
        if let Some(note) = G::total_note(r.steps.len(), r.cleared) {
            total.push_str(&format!(" ({note})"));
        }
        if !r.cleared {
            total.push_str(", board not cleared");
        }
        if let Some(score) = r.score {
            total.push_str(&format!(", score {score}"));
        }
        println!("{total}");
    }
    println!("{rule}");
    for (i, step) in r.steps.iter().enumerate() {
        println!("{}: {step}", i + 1);
    }
}

fn solve_deals<G, F>(
    args: &Args,
    deals: Vec<(String, G)>,
    preset: SearchLimits,
    run: F,
) -> Result<Vec<Report>>
where
    G: Listing,
    G::Move: Serialize,
    F: Fn(&G, SearchLimits, &str) -> Result<Outcome<G::Move>>,
{
    let limits = limits_for(args, preset);
    limits.validate()?;
    let mut reports = Vec::with_capacity(deals.len());
    for (label, initial) in deals {
        info!("solving {} {label}", G::NAME);
        let start = Instant::now();
        let outcome = run(&initial, limits, &label)?;
        let r = report(&initial, &label, &outcome, start.elapsed())?;
        if !args.json {
            print_report::<G>(&r);
        }
        reports.push(r);
    }
    Ok(reports)
}

fn load_deals<G>(
    args: &Args,
    deal: fn(u64) -> Result<G, patience::DealError>,
    from_layout: fn(&[String]) -> Result<G, patience::DealError>,
) -> Result<Vec<(String, G)>> {
    match &args.layout {
        Some(path) => {
            let lines = read_layout(path)?;
            let g = from_layout(&lines)
                .with_context(|| format!("invalid layout {}", path.display()))?;
            Ok(vec![(format!("layout {}", path.display()), g)])
        }
        None => args
            .seed
            .iter()
            .map(|&s| {
                deal(s)
                    .map(|g| (format!("seed {s}"), g))
                    .with_context(|| format!("cannot deal seed {s}"))
            })
            .collect(),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(logging::level_for_verbosity(args.verbose))
        .map_err(|e| anyhow!("installing logger: {e}"))?;
    if let Some(path) = &args.log_file {
        logging::init_log_file(path)
            .with_context(|| format!("opening log file {}", path.display()))?;
    }

    let reports = match args.game {
        GameOpt::Freecell => {
            if args.policy == PolicyOpt::Score {
                bail!("the score policy is only available for tripeaks");
            }
            let deals = load_deals(&args, Desk::deal, |l| Desk::from_layout(l))?;
            let policy = if args.policy == PolicyOpt::First {
                ShortestSequence::<Desk>::first_clear()
            } else {
                ShortestSequence::<Desk>::new()
            };
            solve_deals(&args, deals, SearchLimits::freecell(), |g, limits, label| {
                run_search(&args, g, limits, policy.clone(), label)
            })?
        }
        GameOpt::Tripeaks => {
            let deals = load_deals(&args, Peaks::deal, |l| Peaks::from_layout(l))?;
            solve_deals(&args, deals, SearchLimits::tripeaks(), |g, limits, label| {
                match args.policy {
                    PolicyOpt::First => run_search(
                        &args,
                        g,
                        limits,
                        ShortestSequence::<Peaks>::first_clear(),
                        label,
                    ),
                    PolicyOpt::Shortest => {
                        run_search(&args, g, limits, ShortestSequence::<Peaks>::new(), label)
                    }
                    PolicyOpt::Score => {
                        run_search(&args, g, limits, HighestScore::<Peaks>::default(), label)
                    }
                }
            })?
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    Ok(())
}
