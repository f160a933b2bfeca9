// Garlic Archive - CLI entry point
// Subcommands for scripted use; the TUI when no subcommand is given

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;

use garlic_archive::{
    load_csv, snapshot, write_csv, Entry, EntryFilter, EntryKind, EntryPatch, EntryStore,
    GeminiParser, Intake, LedgerConfig, LedgerError, LedgerResult, SqliteRepository, Tier,
    ViewMode, YearGranularity,
};

#[derive(Parser)]
#[command(name = "garlic-archive", version, about = "Personal ledger with AI-assisted entry")]
struct Cli {
    /// Ledger database (overrides storage.path)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a free-text note and record it
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Parse a voice memo (webm, ogg, wav, mp3, m4a, aac, flac) and record it
    Voice { file: PathBuf },
    /// Archive, newest first
    List {
        #[arg(long, value_enum, default_value_t = FilterArg::All)]
        filter: FilterArg,
    },
    /// Change fields of an entry
    Edit {
        id: String,
        #[arg(long)]
        amount: Option<f64>,
        #[arg(long)]
        currency: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long = "type", value_enum)]
        kind: Option<KindArg>,
    },
    /// Remove an entry
    Delete { id: String },
    /// Heatmap, category rollups, trend and summary
    Report {
        #[arg(long, value_enum, default_value_t = ViewArg::Week)]
        view: ViewArg,
        /// Year slicing
        #[arg(long, value_enum, default_value_t = ByArg::Month)]
        by: ByArg,
        /// Anchor date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        today: Option<String>,
    },
    /// Merge entries from a CSV file (re-importing is a no-op)
    Import { csv: PathBuf },
    /// Write every entry to a CSV file
    Export { csv: PathBuf },
    /// Interactive terminal UI
    Ui {
        /// JSON category rules replacing the built-in table
        #[arg(long)]
        rules: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FilterArg {
    All,
    Income,
    Expense,
}

impl From<FilterArg> for EntryFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => EntryFilter::All,
            FilterArg::Income => EntryFilter::Income,
            FilterArg::Expense => EntryFilter::Expense,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Income,
    Expense,
}

#[derive(Clone, Copy, ValueEnum)]
enum ViewArg {
    Week,
    Month,
    Year,
}

#[derive(Clone, Copy, ValueEnum)]
enum ByArg {
    Month,
    Week,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Ui { rules: None });

    // Log lines would tear the alternate screen; the TUI only logs when asked
    if !matches!(command, Command::Ui { .. }) || std::env::var_os("GARLIC_LOG").is_some() {
        init_tracing()?;
    }

    let mut config = LedgerConfig::load_with_dotenv()?;
    if let Some(db) = cli.db {
        config.storage.path = db;
    }

    let repo = SqliteRepository::open(&config.storage.path)?;
    let mut store = EntryStore::open(repo);
    let today = Local::now().date_naive();

    match command {
        Command::Add { text } => {
            let intake = intake(&config)?;
            let runtime = Runtime::new()?;
            println!("🧠 Parsing...");
            let candidate = runtime.block_on(intake.from_text(&text.join(" "), today))?;
            print_added(&store.add(candidate, true)?);
        }
        Command::Voice { file } => {
            let intake = intake(&config)?;
            let runtime = Runtime::new()?;
            println!("🎙️  Parsing {}...", file.display());
            let candidate = runtime.block_on(intake.from_audio_file(&file, today))?;
            print_added(&store.add(candidate, true)?);
        }
        Command::List { filter } => run_list(&store, filter.into()),
        Command::Edit {
            id,
            amount,
            currency,
            category,
            description,
            date,
            kind,
        } => {
            let patch = EntryPatch {
                amount,
                currency,
                category,
                description,
                date,
                kind: kind.map(|k| match k {
                    KindArg::Income => EntryKind::Income,
                    KindArg::Expense => EntryKind::Expense,
                }),
                is_ai_generated: None,
            };
            if patch.is_empty() {
                println!("Nothing to change.");
                return Ok(());
            }
            let entry = store.update(&id, &patch)?;
            println!("✓ Updated {}", entry.id);
            print_entry(&entry);
        }
        Command::Delete { id } => {
            let removed = store.delete(&id)?;
            println!("🗑️  Deleted {} ({} {:.2})", removed.id, removed.category, removed.amount);
        }
        Command::Report { view, by, today: anchor } => {
            let anchor = match anchor {
                Some(raw) => garlic_archive::parse_ledger_date(&raw)
                    .ok_or_else(|| LedgerError::Input(format!("invalid date: {}", raw)))?,
                None => today,
            };
            run_report(&store, view, by, anchor);
        }
        Command::Import { csv } => run_import(&mut store, &csv)?,
        Command::Export { csv } => {
            let count = write_csv(&csv, store.entries())?;
            println!("✓ Exported {} entries to {}", count, csv.display());
        }
        Command::Ui { rules } => run_ui_mode(store, &config, rules.as_deref(), today)?,
    }

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_env("GARLIC_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))
}

fn intake(config: &LedgerConfig) -> LedgerResult<Intake<GeminiParser>> {
    Ok(Intake::new(GeminiParser::new(&config.ai)?))
}

fn print_added(entry: &Entry) {
    println!("✅ Recorded");
    print_entry(entry);
}

fn print_entry(entry: &Entry) {
    println!(
        "   {}  {:<8} {:>10.2} {}  {}  {}",
        entry.date, entry.kind, entry.amount, entry.currency, entry.category, entry.description
    );
    println!("   id: {}", entry.id);
}

fn run_list(store: &EntryStore<SqliteRepository>, filter: EntryFilter) {
    let entries = store.newest_first(filter);
    println!("📒 Archive [{}] - {} entries", filter.title(), entries.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for entry in entries {
        println!(
            "{}  {:>+12.2} {:<4} {:<16} {:<30} {}{}",
            entry.date,
            entry.signed_amount(),
            entry.currency,
            entry.category,
            entry.description,
            entry.id.chars().take(8).collect::<String>(),
            if entry.is_ai_generated { " ✦" } else { "" }
        );
    }
}

fn run_report(store: &EntryStore<SqliteRepository>, view: ViewArg, by: ByArg, today: NaiveDate) {
    let mode = match view {
        ViewArg::Week => ViewMode::Week,
        ViewArg::Month => ViewMode::Month,
        ViewArg::Year => ViewMode::Year,
    };
    let granularity = match by {
        ByArg::Month => YearGranularity::ByMonth,
        ByArg::Week => YearGranularity::ByWeek,
    };

    let snap = snapshot(store.entries(), mode, granularity, today);

    println!("🧄 {} view ({}) anchored on {}", mode.title(), granularity.title(), today);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for cell in snap.cells.iter().filter(|c| c.tier != Tier::Blank) {
        let bar = match cell.tier {
            Tier::Gain(_) => "+".repeat(cell.tier.level() as usize),
            Tier::Loss(_) => "-".repeat(cell.tier.level() as usize),
            _ => ".".to_string(),
        };
        if cell.bucket.value != 0.0 || mode != ViewMode::Year || granularity == YearGranularity::ByMonth {
            println!("  {:<10} {:>12.2}  {}", cell.bucket.key, cell.bucket.value, bar);
        }
    }
    println!("  {:<10} {:>12.2}  (scale {:.2})", "total", snap.total, snap.max_abs);

    println!("\n📊 Categories");
    for row in &snap.table {
        println!(
            "  {:<18} {:>4}  +{:>10.2}  -{:>10.2}",
            row.category, row.count, row.income_sum, row.expense_sum
        );
    }

    println!("\n📈 Trend");
    for point in &snap.trend {
        println!("  {}  +{:>10.2}  -{:>10.2}", point.label, point.income_sum, point.expense_sum);
    }

    let stats = &snap.stats;
    println!("\n🔢 Summary");
    println!("  Average daily spend  {:>12.2}", stats.average_daily);
    println!("  Peak flow            {:>12.2}", stats.peak_flow);
    println!("  Positive frequency   {:>11.1}%", stats.positive_frequency);
    println!("  Net                  {:>12.2}", stats.net);
}

fn run_import(store: &mut EntryStore<SqliteRepository>, csv: &Path) -> Result<()> {
    println!("📂 Loading CSV...");
    let entries = load_csv(csv).with_context(|| format!("Failed to import {}", csv.display()))?;
    println!("✓ Read {} rows", entries.len());

    let total = entries.len();
    let inserted = store.import(entries)?;
    println!("✓ Inserted {} entries", inserted);
    if inserted < total {
        println!("✓ Skipped {} already present", total - inserted);
    }
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(
    store: EntryStore<SqliteRepository>,
    config: &LedgerConfig,
    rules: Option<&Path>,
    today: NaiveDate,
) -> Result<()> {
    use garlic_archive::{ui, CategoryStyler};

    let mut app = ui::App::new(store, today);
    if let Some(path) = rules {
        app.styler = CategoryStyler::from_file(path)?;
    }

    let runtime = Runtime::new()?;
    let intake = intake(config).ok();

    let mut submit = |text: &str| match &intake {
        Some(intake) => runtime.block_on(intake.from_text(text, today)),
        None => Err(LedgerError::ParseFailure("API key is missing".to_string())),
    };

    ui::run_ui(&mut app, &mut submit)?;
    println!("\n✅ UI closed");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(
    _store: EntryStore<SqliteRepository>,
    _config: &LedgerConfig,
    _rules: Option<&Path>,
    _today: NaiveDate,
) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin garlic-server --features server");
    std::process::exit(1);
}
