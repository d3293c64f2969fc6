use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

use expense_tracker::config::init_logging;
use expense_tracker::entities::{category_display_name, find_currency, CURRENCY_OPTIONS};
use expense_tracker::expense::ExpenseEdit;
use expense_tracker::{
    format_currency, format_date, json_export_filename, search, AppConfig, Expense, ExpenseStore,
    NewExpense, Period, SqliteStore, Theme, DEFAULT_CSV_FILENAME,
};

#[derive(Parser, Debug)]
#[command(name = "expense-tracker", version, about = "Track personal expenses from the terminal")]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "EXPENSE_TRACKER_DB")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a new expense
    Add {
        amount: f64,
        #[arg(long, short)]
        category: String,
        #[arg(long, short)]
        description: Option<String>,
        /// ISO date (defaults to now)
        #[arg(long)]
        date: Option<String>,
    },
    /// List expenses, newest first
    List {
        #[arg(long, default_value = "all")]
        period: Period,
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        category: Option<String>,
    },
    /// Change fields of an existing expense
    Edit {
        id: String,
        #[arg(long)]
        amount: Option<f64>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Remove the existing description
        #[arg(long, conflicts_with = "description")]
        clear_description: bool,
        #[arg(long)]
        date: Option<String>,
    },
    /// Delete an expense by id
    Delete { id: String },
    /// Today / week / month totals
    Summary,
    /// Count, average, largest, and top category for a period
    Stats {
        #[arg(long, default_value = "month")]
        period: Period,
    },
    /// Category breakdown and daily spending
    Chart {
        #[arg(long, default_value = "week")]
        period: Period,
    },
    /// Write the full collection as pretty JSON
    ExportJson { path: Option<PathBuf> },
    /// Write expenses as CSV
    ExportCsv {
        #[arg(long, default_value = "all")]
        period: Period,
        path: Option<PathBuf>,
    },
    /// Replace all expenses with the contents of a JSON export
    Import { path: PathBuf },
    /// Delete all expenses
    Clear {
        #[arg(long)]
        yes: bool,
    },
    /// Show or set the currency
    Currency { code: Option<String> },
    /// Show, set, or toggle the theme
    Theme {
        theme: Option<Theme>,
        #[arg(long, conflicts_with = "theme")]
        toggle: bool,
    },
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    let backend = SqliteStore::open(&config.db_path)
        .with_context(|| format!("Failed to open database at {}", config.db_path.display()))?;
    let store = ExpenseStore::new(backend);

    run(&store, cli.command)
}

fn run(store: &ExpenseStore<SqliteStore>, command: Command) -> Result<()> {
    let currency = store.currency()?;

    match command {
        Command::Add { amount, category, description, date } => {
            let mut new_expense = NewExpense::new(amount, category);
            new_expense.description = description;
            new_expense.date = date;
            new_expense.validate()?;

            let expense = store.add(new_expense)?;
            println!("✓ Added {} ({})", format_currency(expense.amount, &currency), expense.id);
        }

        Command::List { period, search: term, category } => {
            let expenses = search(&store.by_period(period)?, &term, category.as_deref());
            if expenses.is_empty() {
                println!("No expenses found.");
            }
            for expense in &expenses {
                print_expense(expense, &currency);
            }
        }

        Command::Edit { id, amount, category, description, clear_description, date } => {
            let Some(existing) = store.get(&id)? else {
                bail!("No expense with id {id}");
            };

            let edit = ExpenseEdit { amount, category, description, clear_description, date };
            let expense = edit.apply(existing)?;

            store.update(expense)?;
            println!("✓ Updated {id}");
        }

        Command::Delete { id } => {
            let before = store.load()?.len();
            let after = store.remove(&id)?.len();
            if before == after {
                println!("Nothing to delete for {id}");
            } else {
                println!("✓ Deleted {id}");
            }
        }

        Command::Summary => {
            let summary = store.summary_at(&Local::now())?;
            println!("📊 Summary");
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            println!("Today:         {} ({} expenses)", format_currency(summary.today.total, &currency), summary.today.count);
            println!("This week:     {} ({} expenses)", format_currency(summary.week.total, &currency), summary.week.count);
            println!("This month:    {} ({} expenses)", format_currency(summary.month.total, &currency), summary.month.count);
            println!("Daily average: {}", format_currency(summary.daily_average, &currency));
        }

        Command::Stats { period } => {
            let stats = store.statistics_at(period, &Local::now())?;
            println!("📈 Statistics ({period})");
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            println!("Expenses:      {}", stats.count);
            println!("Total:         {}", format_currency(stats.total, &currency));
            println!("Average:       {}", format_currency(stats.average, &currency));
            println!("Largest:       {}", format_currency(stats.largest, &currency));
            println!("Top category:  {}", stats.most_common_category);
        }

        Command::Chart { period } => {
            let now = Local::now();
            println!("🥧 By category ({period})");
            for slice in store.pie_chart_at(period, &now)? {
                println!("  {:<16} {}", slice.name, format_currency(slice.value, &currency));
            }
            println!("\n📅 Daily spending (last {} days)", period.chart_window());
            for point in store.daily_chart_at(period, &now)? {
                println!("  {:<12} {}", point.full_date, format_currency(point.amount, &currency));
            }
        }

        Command::ExportJson { path } => {
            let path = path.unwrap_or_else(|| PathBuf::from(json_export_filename(Local::now().date_naive())));
            fs::write(&path, store.export_json()?)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✓ Exported JSON to {}", path.display());
        }

        Command::ExportCsv { period, path } => {
            let expenses = store.by_period(period)?;
            let Some(csv) = store.export_csv(&expenses)? else {
                println!("No data to export. Add some expenses before exporting to CSV.");
                return Ok(());
            };
            let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_CSV_FILENAME));
            fs::write(&path, csv).with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✓ Exported {} expenses to {}", expenses.len(), path.display());
        }

        Command::Import { path } => {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let count = store.import_json(&text)?;
            println!("✓ Imported {count} expense records");
        }

        Command::Clear { yes } => {
            if !yes {
                bail!("Refusing to delete all expenses without --yes");
            }
            store.clear()?;
            println!("✓ All expense data deleted");
        }

        Command::Currency { code: None } => {
            for option in CURRENCY_OPTIONS {
                let marker = if option.code == currency { "*" } else { " " };
                println!("{marker} {} {} {}", option.code, option.symbol, option.name);
            }
        }

        Command::Currency { code: Some(code) } => {
            if find_currency(&code).is_none() {
                bail!("Unsupported currency: {code}");
            }
            store.set_currency(&code)?;
            println!("✓ Currency set to {code}");
        }

        Command::Theme { toggle: true, .. } => {
            let theme = store.toggle_theme()?;
            println!("✓ Switched to {theme} mode");
        }

        Command::Theme { theme: None, .. } => println!("{}", store.theme()?),

        Command::Theme { theme: Some(theme), .. } => {
            store.set_theme(theme)?;
            println!("✓ Theme set to {theme}");
        }
    }

    Ok(())
}

fn print_expense(expense: &Expense, currency: &str) {
    println!(
        "{:<14} {:<16} {:>14}  {}  [{}]",
        format_date(&expense.date),
        category_display_name(&expense.category),
        format_currency(expense.amount, currency),
        expense.description.as_deref().unwrap_or(""),
        expense.id
    );
}
