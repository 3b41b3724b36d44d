//! Binary entry point for the pagetree demo CLI.
#![forbid(unsafe_code)]

mod config;
mod ui;

use std::error::Error;
use std::fmt::Write as _;
use std::io::{self, Write as _};
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use pagetree::{BTree, BTreeOptions, BTreeStatsSnapshot, TraversalOrder, TreeShape};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use config::CliConfig;
use ui::{format_duration, Theme, Ui};

const DEMO_KEYS: &str = "D1XJ2xTg8zKL9AhijOPQcEowRSp0NbW567BUfCqrs4FdtYZakHIuvGV3eMylmn";
const SHOWN: usize = 12;

#[derive(Parser, Debug)]
#[command(
    name = "pagetree",
    version,
    about = "Demo driver for the pagetree B-tree engine",
    disable_help_subcommand = true
)]
struct Cli {
    #[command(flatten)]
    tree: TreeArgs,

    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "PAGETREE_CONFIG",
        help = "TOML config file with a [tree] table"
    )]
    config: Option<PathBuf>,

    #[arg(
        short,
        long,
        global = true,
        action = ArgAction::Count,
        help = "Raise log verbosity (-v debug, -vv trace)"
    )]
    verbose: u8,

    #[arg(long, global = true, value_enum, help = "Output color theme")]
    theme: Option<Theme>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct TreeArgs {
    #[arg(long, global = true, help = "Tree order, at least 3")]
    order: Option<usize>,

    #[arg(long, global = true, help = "Accept duplicate keys")]
    non_unique: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk through construction, iteration, traversal, comparison and removal.
    Demo,
    /// Insert integer keys, optionally remove some, and report the tree shape.
    Load(LoadCmd),
}

#[derive(Args, Debug)]
struct LoadCmd {
    #[arg(value_name = "KEY", allow_negative_numbers = true, help = "Keys to insert in order")]
    keys: Vec<i64>,

    #[arg(
        long,
        value_name = "N",
        conflicts_with = "keys",
        help = "Insert a seeded shuffle of 0..N instead"
    )]
    random: Option<usize>,

    #[arg(long, default_value_t = 0, help = "Seed for --random")]
    seed: u64,

    #[arg(
        long,
        value_name = "KEY",
        value_delimiter = ',',
        allow_negative_numbers = true,
        help = "Keys to remove after loading"
    )]
    remove: Vec<i64>,

    #[arg(long, help = "Skip the page dump")]
    no_dump: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct LoadReport {
    options: BTreeOptions,
    inserted: usize,
    rejected: usize,
    removed: usize,
    missing: usize,
    len: usize,
    height: usize,
    shape: TreeShape,
    stats: BTreeStatsSnapshot,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = CliConfig::load(cli.config.as_deref())?;
    let options = resolve_options(&cli.tree, &config);
    options.validate()?;
    let theme = cli.theme.or(config.ui.theme).unwrap_or(Theme::Auto);
    let ui = Ui::new(theme);
    tracing::debug!(order = options.order, unique_keys = options.unique_keys, "resolved options");

    match cli.command {
        Command::Demo => run_demo(&ui, options)?,
        Command::Load(cmd) => run_load(&ui, options, &cmd)?,
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn resolve_options(args: &TreeArgs, config: &CliConfig) -> BTreeOptions {
    let mut options = config.tree;
    if let Some(order) = args.order {
        options.order = order;
    }
    if args.non_unique {
        options.unique_keys = false;
    }
    options
}

fn run_demo(ui: &Ui, options: BTreeOptions) -> Result<(), Box<dyn Error>> {
    let bt: BTree<char, i64> = BTree::with_options(options)?;
    let mut inserted = 0;
    for (i, key) in DEMO_KEYS.chars().enumerate() {
        let i = i as i64;
        if bt.insert(key, i * i) {
            inserted += 1;
        }
    }
    ui.section(
        "[1] Tree built",
        [
            ("inserted", inserted),
            ("size", bt.len()),
            ("height", bt.height()),
            ("order", bt.order()),
        ],
    );

    ui.heading("[2] Forward iteration");
    let mut line = String::new();
    let mut cursor = bt.begin();
    let end = bt.end();
    let mut shown = 0;
    while cursor != end && shown < SHOWN {
        if let Some(entry) = cursor.get() {
            let _ = write!(line, "{}({}) ", entry.key(), entry.id());
        }
        cursor.move_next();
        shown += 1;
    }
    ui.line(format!("{line}..."));

    ui.heading("[3] Backward iteration");
    line.clear();
    let mut cursor = bt.rbegin();
    let rend = bt.rend();
    shown = 0;
    while cursor != rend && shown < SHOWN {
        if let Some(entry) = cursor.get() {
            let _ = write!(line, "{}({}) ", entry.key(), entry.id());
        }
        cursor.move_next();
        shown += 1;
    }
    ui.line(format!("{line}..."));

    ui.section(
        "[4] Search",
        [
            ("'A'", bt.search_or_default(&'A')),
            ("'m'", bt.search_or_default(&'m')),
            ("'?' (0 = missing)", bt.search_or_default(&'?')),
        ],
    );

    let walks = [
        ("[5] In-order traversal", "IN", TraversalOrder::InOrder),
        ("[6] Pre-order traversal", "PRE", TraversalOrder::PreOrder),
        ("[7] Post-order traversal", "POST", TraversalOrder::PostOrder),
    ];
    for (title, tag, order) in walks {
        ui.heading(title);
        let mut count = 0;
        bt.traverse(order, |entry, level| {
            if count < SHOWN {
                ui.line(format!("{tag} [lvl={level}] {} -> {}", entry.key(), entry.id()));
            }
            count += 1;
        });
        ui.line(format!("visited: {count}"));
    }

    ui.heading("[8] First match");
    match bt.first_that(|entry, _| *entry.key() > 'm') {
        Some(entry) => ui.line(format!("first key > 'm': {} -> {}", entry.key(), entry.id())),
        None => ui.line("no match"),
    }

    ui.heading("[9] Batch insert and move");
    let many: BTree<char, i64> = BTree::with_options(options)?;
    many.insert_many([('M', 100), ('C', 200), ('X', 300), ('A', 400), ('Q', 500)]);
    for entry in &many {
        ui.line(format!("many: {} -> {}", entry.key(), entry.id()));
    }
    let moved = many.take();
    for entry in &moved {
        ui.line(format!("moved: {} -> {}", entry.key(), entry.id()));
    }
    ui.line(format!("source size after move: {}", many.len()));

    let a: BTree<char, i64> = BTree::with_options(options)?;
    let b: BTree<char, i64> = BTree::with_options(options)?;
    a.insert_many([('A', 1), ('B', 2), ('C', 3)]);
    b.insert_many([('A', 1), ('B', 2), ('D', 4)]);
    ui.section(
        "[10] Comparison",
        [("A < B", a < b), ("A > B", a > b), ("B > A", b > a)],
    );

    ui.heading("[11] Remove");
    let tiny: BTree<char, i64> = BTree::with_options(options)?;
    for (key, id) in [('A', 1), ('B', 2), ('C', 3), ('D', 4), ('E', 5)] {
        tiny.insert(key, id);
    }
    ui.line("before:");
    print_dump(&tiny)?;
    let removed = tiny.remove(&'C', &3);
    ui.line(format!("remove('C', 3): {}", if removed { "ok" } else { "failed" }));
    ui.line("after:");
    print_dump(&tiny)?;

    ui.heading("[12] Scoped drop");
    {
        let local: BTree<char, i64> = BTree::with_options(options)?;
        local.insert_many([('L', 11), ('O', 22), ('K', 33)]);
        ui.line(format!("inside scope: tree {} holds {} entries", local.id(), local.len()));
    }
    ui.line("outside scope: pages released");

    bt.verify()?;
    bt.emit_stats();
    ui.success("demo finished");
    Ok(())
}

fn run_load(ui: &Ui, options: BTreeOptions, cmd: &LoadCmd) -> Result<(), Box<dyn Error>> {
    let keys: Vec<i64> = match cmd.random {
        Some(count) => {
            let mut rng = ChaCha8Rng::seed_from_u64(cmd.seed);
            let mut keys: Vec<i64> = (0..count as i64).collect();
            keys.shuffle(&mut rng);
            keys
        }
        None => cmd.keys.clone(),
    };

    let tree: BTree<i64, u64> = BTree::with_options(options)?;
    let task = ui.task(format!("inserting {} keys", keys.len()));
    let inserted = tree.insert_many(keys.iter().enumerate().map(|(pos, &key)| (key, pos as u64)));
    let elapsed = task.finish();
    tracing::debug!(inserted, elapsed = %format_duration(elapsed), "loaded keys");

    let mut removed = 0;
    for key in &cmd.remove {
        let hit = tree
            .search(key)
            .map(|id| tree.remove(key, &id))
            .unwrap_or(false);
        if hit {
            removed += 1;
        } else if cmd.format == OutputFormat::Text {
            ui.warn(&format!("key {key} not present"));
        }
    }

    let shape = tree.verify()?;
    tree.emit_stats();
    let report = LoadReport {
        options,
        inserted,
        rejected: keys.len() - inserted,
        removed,
        missing: cmd.remove.len() - removed,
        len: tree.len(),
        height: tree.height(),
        shape,
        stats: tree.stats_snapshot(),
    };

    match cmd.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            ui.section(
                "Loaded",
                [
                    ("order", report.options.order.to_string()),
                    ("unique keys", report.options.unique_keys.to_string()),
                    ("inserted", report.inserted.to_string()),
                    ("rejected", report.rejected.to_string()),
                    ("removed", report.removed.to_string()),
                    ("size", report.len.to_string()),
                    ("height", report.height.to_string()),
                    ("elapsed", format_duration(elapsed)),
                ],
            );
            if !cmd.no_dump {
                ui.heading("Pages");
                print_dump(&tree)?;
            }
            ui.section(
                "Shape",
                [
                    ("pages", shape.pages),
                    ("leaves", shape.leaves),
                    ("entries", shape.entries),
                ],
            );
            let stats = report.stats;
            ui.section(
                "Stats",
                [
                    ("page splits", stats.page_splits),
                    ("root splits", stats.root_splits),
                    ("borrows", stats.borrows),
                    ("merges", stats.merges),
                    ("root collapses", stats.root_collapses),
                ],
            );
            ui.success("invariants verified");
        }
    }
    Ok(())
}

fn print_dump<K, V>(tree: &BTree<K, V>) -> Result<(), Box<dyn Error>>
where
    K: std::fmt::Display,
    V: std::fmt::Display,
{
    let stdout = io::stdout();
    let mut out = stdout.lock();
    tree.print(&mut out)?;
    out.flush()?;
    Ok(())
}
