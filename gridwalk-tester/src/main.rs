mod common;
mod logic;
mod terminal;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::scenario::{get_scenario, list_scenarios};
use common::{parse_seeds, split_csv};
use gridwalk_game::{
    FallbackPolicy, Renderer, RunConfig, RunSession, RunSummary, drive_on_interval,
};
use logic::{GameTester, LogicTester, TesterAssets};
use terminal::TerminalRenderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FallbackArg {
    /// Move straight up when boxed in, even into a visited cell
    ForceUp,
    /// Stop the run when boxed in
    Halt,
}

impl From<FallbackArg> for FallbackPolicy {
    fn from(arg: FallbackArg) -> Self {
        match arg {
            FallbackArg::ForceUp => Self::ForceUp,
            FallbackArg::Halt => Self::Halt,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "gridwalk-tester", version = "0.1.0")]
#[command(about = "Automated QA testing and terminal playback for Grid Walk runs")]
struct Args {
    /// Grid JSON file ({rows, cols, data}); defaults to the bundled grid
    #[arg(long)]
    grid: Option<PathBuf>,

    /// Play a single run in the terminal instead of running scenarios
    #[arg(long)]
    play: bool,

    /// Starting column for --play (1-based)
    #[arg(long, default_value_t = 1)]
    column: usize,

    /// Vertical threshold for --play
    #[arg(long, default_value_t = gridwalk_game::constants::DEFAULT_VERTICAL_THRESHOLD, allow_hyphen_values = true)]
    threshold: i64,

    /// What to do when no neighbour is eligible (--play)
    #[arg(long, value_enum, default_value_t = FallbackArg::ForceUp)]
    fallback: FallbackArg,

    /// Milliseconds between ticks for --play
    #[arg(long, default_value_t = gridwalk_game::constants::DEFAULT_TICK_INTERVAL_MS)]
    interval_ms: u64,

    /// Do not clear the screen between frames (--play)
    #[arg(long)]
    no_clear: bool,

    /// Scenarios to run (comma-separated, or "all")
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated, decimal or 0x-hex)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let assets = Arc::new(load_assets(&args)?);

    if args.play {
        let summary = play_run(&args, &assets).await?;
        let mut output_target = OutputTarget::new(args.output.clone())?;
        logic::reports::generate_run_report(
            output_target.writer(),
            &summary,
            args.report == "json",
        )?;
        output_target.flush_inner()?;
        return Ok(());
    }

    let scenarios = expand_scenarios(&args.scenarios);
    let seeds = parse_seeds(&split_csv(&args.seeds))?;
    let game_tester = GameTester::new(assets, args.verbose);

    let all_results = run_logic_scenarios(&args, &scenarios, &seeds, &game_tester);

    write_reports(&args, &all_results, start_time)?;

    if all_results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🧭 Grid Walk Tester".bright_cyan().bold());
    println!("{}", "===================".cyan());
}

fn load_assets(args: &Args) -> Result<TesterAssets> {
    match &args.grid {
        Some(path) => TesterAssets::load_from_file(path),
        None => Ok(TesterAssets::load_default()),
    }
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.contains(&"all".to_string()) {
        scenarios.retain(|s| s != "all");
        scenarios.extend(
            list_scenarios()
                .into_iter()
                .map(|(key, _)| key.to_string()),
        );
    }
    scenarios
}

/// Translate the 1-based CLI column into a run configuration.
fn play_config(args: &Args, cols: usize) -> Result<RunConfig> {
    anyhow::ensure!(
        (1..=cols).contains(&args.column),
        "Please select a column between 1 and {cols}."
    );
    Ok(RunConfig::new(args.column - 1, args.threshold)
        .with_fallback(args.fallback.into())
        .with_tick_interval(Duration::from_millis(args.interval_ms)))
}

async fn play_run(args: &Args, assets: &TesterAssets) -> Result<RunSummary> {
    let grid = assets.default_grid().clone();
    let config = play_config(args, grid.cols())?;
    let mut session = RunSession::new(grid, config).context("starting run")?;
    let mut renderer = TerminalRenderer::new(stdout(), !args.no_clear);
    Ok(play_session(&mut session, &mut renderer).await)
}

/// Show the freshly started run, then tick it on its configured cadence.
async fn play_session<R: Renderer>(session: &mut RunSession, renderer: &mut R) -> RunSummary {
    renderer.on_reset(session.grid(), session.position());
    drive_on_interval(session, renderer).await
}

fn run_logic_scenarios(
    args: &Args,
    scenarios: &[String],
    seeds: &[u64],
    game_tester: &GameTester,
) -> Vec<logic::ScenarioResult> {
    let mut results: Vec<logic::ScenarioResult> = Vec::new();

    println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let logic_tester = LogicTester::new(game_tester.clone());

    for scenario_name in scenarios {
        if let Some(scenario) = get_scenario(scenario_name) {
            results.extend(logic_tester.run_scenario(&scenario, seeds, args.iterations));
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }

    results
}

fn write_reports(
    args: &Args,
    results: &[logic::ScenarioResult],
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            if results.is_empty() {
                writeln!(&mut output_target, "[]")?;
            } else {
                logic::reports::generate_json_report(&mut output_target, results)?;
            }
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Grid Walk Logic Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            let duration = start_time.elapsed();
            if results.is_empty() {
                writeln!(&mut output_target, "No logic scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(&mut output_target, results, duration)?;
            }
        }
    }

    if args.report != "json" {
        let duration = start_time.elapsed();
        writeln!(&mut output_target)?;
        writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn base_args() -> Args {
        Args {
            grid: None,
            play: false,
            column: 1,
            threshold: 5,
            fallback: FallbackArg::ForceUp,
            interval_ms: 1,
            no_clear: true,
            scenarios: "smoke".to_string(),
            list_scenarios: false,
            seeds: "1337".to_string(),
            iterations: 1,
            report: "json".to_string(),
            verbose: false,
            output: None,
        }
    }

    fn temp_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "gridwalk-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    fn sample_result(passed: bool) -> logic::ScenarioResult {
        logic::ScenarioResult {
            scenario_name: "Smoke Test".to_string(),
            seed: 1337,
            passed,
            iterations_run: 3,
            successful_iterations: if passed { 3 } else { 2 },
            failures: if passed {
                Vec::new()
            } else {
                vec!["failure".to_string()]
            },
            average_duration: Duration::from_millis(10),
            performance_data: vec![Duration::from_millis(10)],
        }
    }

    #[test]
    fn expands_all_scenarios_keyword() {
        let expanded = expand_scenarios("all,smoke");
        assert!(expanded.contains(&"smoke".to_string()));
        assert!(expanded.contains(&"vertical-bias".to_string()));
        assert!(!expanded.contains(&"all".to_string()));
    }

    #[test]
    fn expand_scenarios_without_all_preserves_order() {
        let expanded = expand_scenarios("smoke,score-ledger");
        assert_eq!(
            expanded,
            vec!["smoke".to_string(), "score-ledger".to_string()]
        );
    }

    #[test]
    fn play_config_converts_column_and_rejects_out_of_range() {
        let mut args = base_args();
        args.column = 3;
        args.threshold = -7;
        args.fallback = FallbackArg::Halt;
        let config = play_config(&args, 3).unwrap();
        assert_eq!(config.start_column, 2);
        assert_eq!(config.vertical_threshold, -7);
        assert_eq!(config.fallback, FallbackPolicy::Halt);
        assert_eq!(config.tick_interval, Duration::from_millis(1));

        args.column = 4;
        let err = play_config(&args, 3).unwrap_err();
        assert!(err.to_string().contains("between 1 and 3"));
        args.column = 0;
        assert!(play_config(&args, 3).is_err());
    }

    #[test]
    fn play_run_walks_bundled_grid_to_the_top() {
        let args = base_args();
        let assets = TesterAssets::load_default();
        let summary = tokio_test::block_on(play_run(&args, &assets)).unwrap();
        assert_eq!(summary.status, gridwalk_game::RunStatus::ReachedTop);
        assert_eq!(summary.start.col, 0);
    }

    #[test]
    fn play_session_announces_the_run_once() {
        let grid = gridwalk_game::Grid::from_rows(vec![vec![4, 1], vec![2, 3]]).unwrap();
        let config = RunConfig::new(1, 5).with_tick_interval(Duration::from_millis(1));
        let mut session = RunSession::new(grid, config).unwrap();
        let mut trace = gridwalk_game::TraceRenderer::new();

        let summary = tokio_test::block_on(play_session(&mut session, &mut trace));
        assert_eq!(trace.resets, vec![gridwalk_game::Position::new(1, 1)]);
        assert_eq!(trace.steps.len(), 1);
        assert_eq!(summary.score, 1);
        assert_eq!(summary.status, gridwalk_game::RunStatus::ReachedTop);
    }

    #[test]
    fn run_logic_scenarios_skips_unknown_names() {
        let tester = GameTester::try_new(false);
        let args = base_args();
        let results = run_logic_scenarios(
            &args,
            &["smoke".to_string(), "mystery".to_string()],
            &[1, 2],
            &tester,
        );
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.passed));
    }

    #[test]
    fn write_reports_emits_json_output() {
        let temp = temp_path("report.json");
        let args = Args {
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[], Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert_eq!(content.trim(), "[]");
    }

    #[test]
    fn write_reports_emits_json_for_results() {
        let temp = temp_path("report-full.json");
        let args = Args {
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[sample_result(true)], Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed[0]["scenario_name"], "Smoke Test");
    }

    #[test]
    fn write_reports_markdown_empty_results() {
        let temp = temp_path("report.md");
        let args = Args {
            report: "markdown".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[], Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("No scenarios executed"));
    }

    #[test]
    fn write_reports_console_lists_failures() {
        let temp = temp_path("report.txt");
        let args = Args {
            report: "console".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[sample_result(false)], Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Logic Test Results Summary"));
        assert!(content.contains("failure"));
        assert!(content.contains("Total time"));
    }

    #[test]
    fn maybe_list_scenarios_writes_output() {
        let temp = temp_path("scenarios.txt");
        let args = Args {
            list_scenarios: true,
            output: Some(temp.clone()),
            ..base_args()
        };
        assert!(maybe_list_scenarios(&args).unwrap());
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Available scenarios"));
        assert!(content.contains("reset-clears-state"));
    }

    #[test]
    fn maybe_list_scenarios_returns_false_when_disabled() {
        let args = base_args();
        assert!(!maybe_list_scenarios(&args).unwrap());
    }

    #[test]
    fn output_target_stdout_writes() {
        let mut target = OutputTarget::new(None).unwrap();
        target.write_all(b"ok").unwrap();
        target.flush().unwrap();
    }

    #[test]
    fn args_parse_negative_threshold() {
        let args = Args::parse_from(["gridwalk-tester", "--play", "--threshold", "-3"]);
        assert!(args.play);
        assert_eq!(args.threshold, -3);
        assert_eq!(args.interval_ms, 300);
    }
}
