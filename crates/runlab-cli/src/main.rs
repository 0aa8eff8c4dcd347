//! runlab CLI: browse, compare and launch Experimentation Lab runs.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use indicatif::ProgressBar;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use runlab::compare::{BarChart, EXPORT_MIME};
use runlab::filter::{filter_experiments, RunFilter};
use runlab::launch::{attach_dataset, launch, parse_params};
use runlab::store::{fetch_logs, load_experiments};
use runlab::{
    ClientConfig, CompareSession, LabApi, LabClient, LabId, LogLine, Run, RunStatus, RunStore, SettingsPatch,
    SettingsStore, Toggle,
};

/// Log lines shown per run, as in the dashboard's log panel.
const LOG_PREVIEW_LINES: usize = 20;
const BAR_WIDTH: f64 = 40.0;

#[derive(Parser)]
#[command(
    name = "lab",
    about = "🧪 runlab: compare Experimentation Lab runs",
    version,
    author
)]
struct Cli {
    /// Base URL of the Lab API
    #[arg(long, global = true, env = "RUNLAB_API_URL", default_value = "http://127.0.0.1:8000/api")]
    api_url: String,
    /// Settings file
    #[arg(long, global = true, env = "RUNLAB_SETTINGS", default_value = "./lab-settings.yaml")]
    settings: PathBuf,
    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    timeout: u64,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List runs
    Runs {
        /// Experiment type passed to the API
        #[arg(long = "type")]
        experiment_type: Option<String>,
        /// Match experiment name, slug, status or run id
        #[arg(long, short)]
        search: Option<String>,
        /// Only runs with this status (pending, running, succeeded, failed)
        #[arg(long)]
        status: Option<RunStatus>,
    },
    /// List experiments
    Experiments {
        /// Experiment type passed to the API
        #[arg(long = "type")]
        experiment_type: Option<String>,
        /// Match experiment name or slug
        #[arg(long, short)]
        search: Option<String>,
    },
    /// Show one run with its metrics, params, output and latest logs
    Show {
        run_id: String,
    },
    /// Compare runs: metric chart, parameter diff and logs
    Compare {
        /// Run ids to select, in any order
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
        /// Experiment type passed to the API
        #[arg(long = "type")]
        experiment_type: Option<String>,
        /// Metric to plot (saved to settings)
        #[arg(long, short)]
        metric: Option<String>,
        /// Most runs to compare at once (saved to settings)
        #[arg(long)]
        cap: Option<usize>,
        /// Write the comparison as JSON into this directory
        #[arg(long, short)]
        export: Option<PathBuf>,
    },
    /// Launch an experiment run
    Run {
        experiment_id: String,
        /// Parameters as a JSON object
        #[arg(long, short, default_value = "{}")]
        params: String,
        /// File whose contents are passed as the `csv` parameter
        #[arg(long)]
        dataset: Option<PathBuf>,
    },
    /// Show or change comparison settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the current settings
    Show,
    /// Update one or more settings
    Set {
        #[arg(long)]
        compare_cap: Option<usize>,
        #[arg(long)]
        compare_metric: Option<String>,
        #[arg(long)]
        logs_limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();
    let store = SettingsStore::new(&cli.settings);
    let client_config = ClientConfig {
        base_url: cli.api_url.clone(),
        timeout: Duration::from_secs(cli.timeout),
    };

    match cli.command {
        Commands::Runs { experiment_type, search, status } => {
            let client = LabClient::new(client_config)?;
            cmd_runs(&client, experiment_type, search, status).await;
        }
        Commands::Experiments { experiment_type, search } => {
            let client = LabClient::new(client_config)?;
            cmd_experiments(&client, experiment_type, search).await;
        }
        Commands::Show { run_id } => {
            let client = LabClient::new(client_config)?;
            cmd_show(&client, &store, LabId::from(run_id)).await?;
        }
        Commands::Compare { ids, experiment_type, metric, cap, export } => {
            let client = LabClient::new(client_config)?;
            cmd_compare(client, &store, ids, experiment_type, metric, cap, export).await?;
        }
        Commands::Run { experiment_id, params, dataset } => {
            cmd_run(client_config, LabId::from(experiment_id), params, dataset).await?;
        }
        Commands::Settings { action } => {
            cmd_settings(&store, action)?;
        }
    }

    Ok(())
}

// ─── Command implementations ──────────────────────────────────────────────────

async fn cmd_runs(
    client: &LabClient,
    experiment_type: Option<String>,
    search: Option<String>,
    status: Option<RunStatus>,
) {
    let mut store = RunStore::new();
    store.load(client, experiment_type.as_deref()).await;
    if let Some(err) = store.last_error() {
        eprintln!("⚠ Failed to load runs: {}", err);
    }

    let filter = RunFilter {
        search,
        status,
        experiment_type: None,
    };
    let runs = filter.apply(store.runs());
    if runs.is_empty() {
        println!("No runs found");
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(["Run", "Experiment", "Type", "Status", "Duration", "Created"]);
    for run in &runs {
        table.add_row([
            run.label(),
            run.experiment.display_name().to_string(),
            run.experiment.experiment_type.clone().unwrap_or_else(|| "-".to_string()),
            run.status.to_string(),
            run.duration_ms.map(format_duration_ms).unwrap_or_else(|| "-".to_string()),
            format_created(run),
        ]);
    }

    println!("{}", table);
    println!("Showing {} / {}", runs.len(), store.runs().len());
}

async fn cmd_experiments(client: &LabClient, experiment_type: Option<String>, search: Option<String>) {
    let experiments = load_experiments(client, experiment_type.as_deref()).await;
    let shown = filter_experiments(&experiments, search.as_deref());
    if shown.is_empty() {
        println!("No experiments available.");
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(["ID", "Name", "Slug", "Type", "Description"]);
    for exp in shown {
        table.add_row([
            exp.id.to_string(),
            exp.name.clone(),
            exp.slug.clone(),
            exp.experiment_type.clone().unwrap_or_else(|| "-".to_string()),
            exp.description.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    println!("{}", table);
}

async fn cmd_show(client: &LabClient, store: &SettingsStore, id: LabId) -> Result<()> {
    let settings = store.load();
    let run = client.get_run(&id).await?;

    println!("Run: {}", run.label());
    println!("Experiment: {}", run.experiment.display_name());
    if let Some(kind) = &run.experiment.experiment_type {
        println!("Type: {}", kind);
    }
    println!("Status: {}", run.status);
    if let Some(ms) = run.duration_ms {
        println!("Duration: {}", format_duration_ms(ms));
    }
    println!("Created: {}", format_created(&run));
    println!();

    print_json_panel("Metrics", &Value::Object(run.metrics.clone()))?;
    print_json_panel("Params", &Value::Object(run.params.clone()))?;
    print_json_panel("Output", &run.output)?;

    let logs = fetch_logs(client, &[&run], settings.logs_limit)
        .await
        .pop()
        .map(|(_, lines)| lines)
        .unwrap_or_default();
    println!("── Logs ({}) ─────────────────────────────", logs.len());
    print_logs(&logs, logs.len());
    Ok(())
}

async fn cmd_compare(
    client: LabClient,
    store: &SettingsStore,
    ids: Vec<String>,
    experiment_type: Option<String>,
    metric: Option<String>,
    cap: Option<usize>,
    export: Option<PathBuf>,
) -> Result<()> {
    let mut session = CompareSession::new(client, store.load());
    if let Some(cap) = cap {
        session.set_cap(cap);
        store.save(session.settings())?;
    }
    session.reload(experiment_type.as_deref()).await;
    if let Some(err) = session.store().last_error() {
        eprintln!("⚠ Failed to load runs: {}", err);
    }

    for raw in ids {
        let id = LabId::from(raw);
        if session.store().find(&id).is_none() {
            eprintln!("Run #{} not found, skipped", id);
            continue;
        }
        match session.toggle(&id) {
            Toggle::Added => {}
            Toggle::Removed => println!("Run #{} listed twice, deselected", id),
            Toggle::Rejected => println!(
                "Run #{} skipped: comparison is capped at {} runs",
                id,
                session.selection().cap()
            ),
        }
    }

    if let Some(metric) = metric {
        if !session.metric_keys().contains(&metric) {
            eprintln!("⚠ No run has a numeric '{}' metric; values plot as 0", metric);
        }
        session.set_metric(metric);
        store.save(session.settings())?;
    }

    let selected = session.selected_runs().len();
    println!("Selected: {} (need at least 2 to compare)", selected);
    if !session.can_compare() {
        return Ok(());
    }
    println!();

    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Fetching logs...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    session.sync_logs().await;
    spinner.finish_and_clear();

    print_chart(&format!("Metrics Comparison ({})", session.metric_key()), &session.chart());
    println!("Available metrics: {}", session.metric_keys().join(", "));
    println!();

    print_param_diff(&session);

    for run in session.selected_runs() {
        println!("── Run {} ─────────────────────────────", run.label());
        println!("Local SQLite path: {}", run.local_sqlite_path.as_deref().unwrap_or("-"));
        print_json_panel("Metrics", &Value::Object(run.metrics.clone()))?;
        print_json_panel("Output", &run.output)?;
        print_logs(session.logs(&run.id), LOG_PREVIEW_LINES);
        println!();
    }

    if let Some(dir) = export {
        let artifact = session.export()?;
        let path = artifact.write_to(&dir)?;
        println!("Exported comparison to {} ({})", path.display(), EXPORT_MIME);
    }

    Ok(())
}

async fn cmd_run(
    config: ClientConfig,
    experiment_id: LabId,
    params: String,
    dataset: Option<PathBuf>,
) -> Result<()> {
    let mut params = parse_params(&params)?;
    if let Some(path) = dataset {
        params = attach_dataset(params, &path)?;
    }

    let client = LabClient::new(config)?;
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("Running experiment {}...", experiment_id));
    spinner.enable_steady_tick(Duration::from_millis(100));
    let outcome = launch(&client, &experiment_id, &params).await;
    spinner.finish_and_clear();
    let outcome = outcome?;

    println!("✓ Experiment {} finished", experiment_id);
    print_json_panel("Metrics", &Value::Object(outcome.metrics))?;
    print_json_panel("Output", &outcome.output)?;
    Ok(())
}

fn cmd_settings(store: &SettingsStore, action: SettingsAction) -> Result<()> {
    match action {
        SettingsAction::Show => {
            let settings = store.load();
            println!("# {}", store.path().display());
            print!("{}", serde_yaml::to_string(&settings)?);
        }
        SettingsAction::Set { compare_cap, compare_metric, logs_limit } => {
            let patch = SettingsPatch {
                compare_cap,
                compare_metric,
                logs_limit,
            };
            if patch.is_empty() {
                anyhow::bail!("Nothing to set: pass --compare-cap, --compare-metric or --logs-limit");
            }
            let settings = store.update(&patch)?;
            println!("✓ Saved {}", store.path().display());
            print!("{}", serde_yaml::to_string(&settings)?);
        }
    }
    Ok(())
}

// ─── Rendering ────────────────────────────────────────────────────────────────

fn print_chart(title: &str, chart: &BarChart) {
    println!("── {} ── Max: {:.2}", title, chart.max);
    let width = chart.bars.iter().map(|b| b.label.len()).max().unwrap_or(0);
    for bar in &chart.bars {
        let filled = (bar.percent / 100.0 * BAR_WIDTH).round() as usize;
        println!(
            "{:>width$} │{:<bar_width$}│ {}",
            bar.label,
            "█".repeat(filled),
            bar.value,
            width = width,
            bar_width = BAR_WIDTH as usize,
        );
    }
    println!();
}

fn print_param_diff<A: LabApi>(session: &CompareSession<A>) {
    let rows = session.param_diff();
    println!("── Parameter Differences ──────────────────");
    if rows.is_empty() {
        println!("No parameters recorded for these runs.");
        println!();
        return;
    }

    let mut header = vec!["Parameter".to_string()];
    header.extend(session.selected_runs().iter().map(|r| format!("Run {}", r.label())));

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(header);
    for row in &rows {
        let color = if row.is_different { Color::Yellow } else { Color::Reset };
        let mut cells = vec![Cell::new(&row.key).fg(color)];
        cells.extend(row.values.iter().map(|v| {
            let text = v.as_ref().map(Value::to_string).unwrap_or_else(|| "-".to_string());
            Cell::new(text).fg(color)
        }));
        table.add_row(cells);
    }
    println!("{}", table);
    println!("Rows highlighted when values differ.");
    println!();
}

fn print_json_panel(title: &str, value: &Value) -> Result<()> {
    let shown = if value.is_null() { Value::Object(Default::default()) } else { value.clone() };
    println!("{}:", title);
    println!("{}", serde_json::to_string_pretty(&shown)?);
    Ok(())
}

fn print_logs(logs: &[LogLine], limit: usize) {
    if logs.is_empty() {
        println!("No logs found.");
        return;
    }
    for line in logs.iter().take(limit) {
        println!("  {}: {}", line.level, line.message);
    }
}

// ─── Utilities ────────────────────────────────────────────────────────────────

fn format_created(run: &Run) -> String {
    run.created_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        return format!("{}ms", ms);
    }
    let secs = ms / 1000;
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{}h {}m", h, m)
    } else if m > 0 {
        format!("{}m {}s", m, s)
    } else {
        format!("{}.{}s", s, (ms % 1000) / 100)
    }
}
