//! scenematch CLI entrypoint.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::config::{ConfigError, ConfigLoader, MatchConfig};
use crate::io::{DatasetError, MatchIoError};
use crate::matching::MatchSummary;
use crate::scene::ScannedScene;


/// scenematch command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "scenematch", version, about = "Cross-frame keypoint matching for RGB-D scenes")]
struct CliArgs {
    /// Scene directory (one sub-directory per sensor).
    #[arg(long, value_name = "DIR")]
    input: Option<PathBuf>,
    /// Output directory path.
    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,
    /// Path to YAML or TOML configuration file.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Scene name written to the match file (defaults to the input directory name).
    #[arg(long, value_name = "NAME")]
    name: Option<String>,
    /// Match radius in world units.
    #[arg(long, value_name = "METERS")]
    radius: Option<f32>,
    /// Maximum neighbors per keypoint and target frame.
    #[arg(long, value_name = "K")]
    max_neighbors: Option<usize>,
    /// Minimum distance of a keypoint from the image border, in pixels.
    #[arg(long, value_name = "PIXELS")]
    padding: Option<u32>,
    /// Maximum keypoints detected per frame.
    #[arg(long, value_name = "N")]
    max_keypoints: Option<usize>,
    /// Minimum normalized detector response.
    #[arg(long, value_name = "VALUE")]
    min_response: Option<f32>,
    /// Maximum number of frames per sensor (0 = no limit).
    #[arg(long, value_name = "N")]
    max_frames: Option<usize>,
    /// Process every Nth frame (stride).
    #[arg(long, value_name = "N")]
    frame_stride: Option<usize>,
    /// Run keypoint collection and matching on all cores (true/false).
    #[arg(long, value_name = "BOOL")]
    parallel: Option<bool>,
    /// Output format for results.
    #[arg(long, value_enum)]
    output_format: Option<OutputFormat>,
    /// Log verbosity level.
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,
    /// Log format (text/json).
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum OutputFormat {
    #[default]
    Json,
    Text,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Run configuration loaded from YAML or TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RunConfig {
    /// Scene directory.
    input: Option<PathBuf>,
    /// Output directory path.
    output: PathBuf,
    /// Scene name.
    name: Option<String>,
    /// Output format for results.
    output_format: OutputFormat,
    /// Log verbosity.
    log_level: Option<LogLevel>,
    /// Log format (text/json).
    log_format: LogFormat,
    /// Matching pipeline configuration.
    matching: MatchConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input: None,
            output: PathBuf::from("./output"),
            name: None,
            output_format: OutputFormat::Json,
            log_level: None,
            log_format: LogFormat::Text,
            matching: MatchConfig::default(),
        }
    }
}

#[derive(Debug)]
struct ResolvedConfig {
    input: PathBuf,
    output: PathBuf,
    name: Option<String>,
    output_format: OutputFormat,
    matching: MatchConfig,
}

#[derive(Error, Debug)]
enum CliError {
    #[error("input path is required but was not provided")]
    InputNotProvided,
    #[error("input directory not found: {0}")]
    InputMissing(PathBuf),
    #[error("input path is not a directory: {0}")]
    InputNotDirectory(PathBuf),
    #[error("failed to load config file {path}: {source}")]
    Config { path: PathBuf, source: ConfigError },
    #[error("output path exists but is not a directory: {0}")]
    OutputNotDirectory(PathBuf),
    #[error("failed to create output directory {path}: {source}")]
    OutputCreate { path: PathBuf, source: std::io::Error },
    #[error("failed to write results to {path}: {source}")]
    OutputWrite { path: PathBuf, source: std::io::Error },
    #[error("failed to load scene: {0}")]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Matches(#[from] MatchIoError),
    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }

    fn exit_status(&self) -> u8 {
        match self {
            CliError::InputNotProvided
            | CliError::InputMissing(_)
            | CliError::InputNotDirectory(_)
            | CliError::Config { .. }
            | CliError::OutputNotDirectory(_) => 1,
            CliError::OutputCreate { .. }
            | CliError::OutputWrite { .. }
            | CliError::Dataset(_)
            | CliError::Matches(_)
            | CliError::Serialize(_) => 2,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            CliError::InputNotProvided
            | CliError::InputMissing(_)
            | CliError::InputNotDirectory(_) => "InputError",
            CliError::Config { .. } => "ConfigError",
            CliError::OutputNotDirectory(_)
            | CliError::OutputCreate { .. }
            | CliError::OutputWrite { .. }
            | CliError::Matches(_)
            | CliError::Serialize(_) => "OutputError",
            CliError::Dataset(_) => "DatasetError",
        }
    }

    fn component(&self) -> &'static str {
        match self {
            CliError::InputNotProvided
            | CliError::InputMissing(_)
            | CliError::InputNotDirectory(_) => "cli",
            CliError::Config { .. } => "config",
            CliError::OutputNotDirectory(_)
            | CliError::OutputCreate { .. }
            | CliError::OutputWrite { .. }
            | CliError::Matches(_)
            | CliError::Serialize(_) => "io",
            CliError::Dataset(_) => "dataset",
        }
    }

    fn suggestion(&self) -> &'static str {
        match self {
            CliError::InputNotProvided => "Pass --input <scene-dir> or set input in the config file.",
            CliError::InputMissing(_) => "Verify the input path and ensure the directory exists.",
            CliError::InputNotDirectory(_) => "Provide a scene directory containing one sub-directory per sensor.",
            CliError::Config { .. } => "Use a .yaml/.yml/.toml file whose fields match the schema.",
            CliError::OutputNotDirectory(_) => "Choose an output path that is a directory.",
            CliError::OutputCreate { .. } => "Check write permissions or select a different output directory.",
            CliError::OutputWrite { .. } | CliError::Matches(_) | CliError::Serialize(_) => {
                "Ensure the output directory is writable and has free space."
            }
            CliError::Dataset(_) => {
                "Each sensor directory needs rgb.txt, depth.txt and groundtruth.txt; run with --log-level debug for details."
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorInfo {
    error_type: String,
    root_cause: String,
    component: String,
    suggestion: String,
}

#[derive(Debug, Serialize)]
struct Diagnostics {
    os: String,
    arch: String,
    scenematch_version: String,
    config: Option<String>,
}

#[derive(Debug, Serialize)]
struct ResultsJson {
    status: String,
    input: Option<String>,
    output: Option<String>,
    processing_time_ms: u128,
    scene_name: Option<String>,
    sensor_count: usize,
    frame_count: usize,
    keypoint_count: usize,
    matches: Option<MatchSummary>,
    matches_file: Option<String>,
    error: Option<ErrorInfo>,
    diagnostics: Diagnostics,
}

struct PipelineReport {
    scene_name: String,
    sensor_count: usize,
    frame_count: usize,
    keypoint_count: usize,
    matches: MatchSummary,
    matches_file: PathBuf,
}

pub fn run() -> ExitCode {
    run_with_args(CliArgs::parse())
}

fn run_with_args(cli: CliArgs) -> ExitCode {
    let start = Instant::now();
    let config_path = cli.config.clone();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            return handle_error(&err, start, None, cli.output_format, cli.output, config_path);
        }
    };

    let log_level = resolve_log_level(&cli, &config);
    let log_format = resolve_log_format(&cli, &config);
    init_logger(&log_level, log_format);

    let mut merged = config;
    let overrides = apply_overrides(&mut merged, &cli);
    for override_entry in overrides {
        debug!("CLI override: {}", override_entry);
    }

    let resolved = match finalize_config(merged) {
        Ok(resolved) => resolved,
        Err(err) => {
            return handle_error(&err, start, None, cli.output_format, cli.output, config_path);
        }
    };

    let output_dir = match ensure_output_dir(&resolved.output) {
        Ok(dir) => dir,
        Err(err) => {
            return handle_error(&err, start, Some(&resolved), Some(resolved.output_format), Some(resolved.output.clone()), config_path);
        }
    };

    info!("Starting scenematch");
    info!("Input: {}", resolved.input.display());
    info!("Output: {}", output_dir.display());
    debug!(
        "Matching radius {}, max neighbors {}, padding {}",
        resolved.matching.matcher.radius,
        resolved.matching.matcher.max_neighbors,
        resolved.matching.collector.padding
    );

    let report = match run_pipeline(&resolved, &output_dir) {
        Ok(report) => report,
        Err(err) => {
            return handle_error(&err, start, Some(&resolved), Some(resolved.output_format), Some(resolved.output.clone()), config_path);
        }
    };

    let results = ResultsJson {
        status: "success".to_string(),
        input: Some(resolved.input.display().to_string()),
        output: Some(output_dir.display().to_string()),
        processing_time_ms: start.elapsed().as_millis(),
        scene_name: Some(report.scene_name),
        sensor_count: report.sensor_count,
        frame_count: report.frame_count,
        keypoint_count: report.keypoint_count,
        matches: Some(report.matches),
        matches_file: Some(report.matches_file.display().to_string()),
        error: None,
        diagnostics: build_diagnostics(config_path.as_deref()),
    };

    if let Err(err) = write_results(&results, &output_dir, resolved.output_format) {
        return handle_error(&err, start, Some(&resolved), Some(resolved.output_format), Some(resolved.output.clone()), config_path);
    }

    if resolved.output_format == OutputFormat::Text {
        print_text_summary(&results);
    }

    ExitCode::SUCCESS
}

fn load_config(cli: &CliArgs) -> Result<RunConfig, CliError> {
    match &cli.config {
        Some(path) => ConfigLoader::load(path).map_err(|source| CliError::Config {
            path: path.clone(),
            source,
        }),
        None => Ok(RunConfig::default()),
    }
}

fn resolve_log_level(cli: &CliArgs, config: &RunConfig) -> String {
    if let Some(level) = cli.log_level {
        return level.as_str().to_string();
    }

    if let Ok(level) = std::env::var("RUST_LOG") {
        if !level.trim().is_empty() {
            return level;
        }
    }

    if let Some(level) = config.log_level {
        return level.as_str().to_string();
    }

    "info".to_string()
}

fn resolve_log_format(cli: &CliArgs, config: &RunConfig) -> LogFormat {
    cli.log_format.unwrap_or(config.log_format)
}

/// Log to stderr, one JSON object per record in `json` format.
fn init_logger(level: &str, format: LogFormat) {
    let mut builder = env_logger::Builder::new();
    builder
        .target(env_logger::Target::Stderr)
        .filter_level(log::LevelFilter::Info)
        .parse_filters(level)
        .format_timestamp_millis();

    if format == LogFormat::Json {
        builder.format(|buf, record| {
            use std::io::Write;
            let line = json!({
                "timestamp": buf.timestamp_millis().to_string(),
                "level": record.level().as_str(),
                "target": record.target(),
                "message": record.args().to_string(),
            });
            writeln!(buf, "{line}")
        });
    }

    // Tests run the CLI several times per process
    let _ = builder.try_init();
}

/// Apply a CLI value to a config field, recording the change.
fn override_field<T>(field: &mut T, value: Option<T>, key: &str, overrides: &mut Vec<String>)
where
    T: PartialEq + std::fmt::Debug,
{
    if let Some(value) = value {
        if *field != value {
            overrides.push(format!("{} = {:?}", key, value));
        }
        *field = value;
    }
}

fn apply_overrides(config: &mut RunConfig, cli: &CliArgs) -> Vec<String> {
    let mut overrides = Vec::new();
    let matching = &mut config.matching;

    if let Some(input) = cli.input.clone() {
        if config.input.as_ref() != Some(&input) {
            overrides.push(format!("input = {}", input.display()));
        }
        config.input = Some(input);
    }

    if let Some(name) = cli.name.clone() {
        if config.name.as_ref() != Some(&name) {
            overrides.push(format!("name = {}", name));
        }
        config.name = Some(name);
    }

    if let Some(level) = cli.log_level {
        if config.log_level != Some(level) {
            overrides.push(format!("log_level = {:?}", level));
        }
        config.log_level = Some(level);
    }

    override_field(&mut config.output, cli.output.clone(), "output", &mut overrides);
    override_field(&mut config.output_format, cli.output_format, "output_format", &mut overrides);
    override_field(&mut config.log_format, cli.log_format, "log_format", &mut overrides);
    override_field(&mut matching.matcher.radius, cli.radius, "matcher.radius", &mut overrides);
    override_field(&mut matching.matcher.max_neighbors, cli.max_neighbors, "matcher.max_neighbors", &mut overrides);
    override_field(&mut matching.collector.padding, cli.padding, "collector.padding", &mut overrides);
    override_field(&mut matching.detector.max_keypoints, cli.max_keypoints, "detector.max_keypoints", &mut overrides);
    override_field(&mut matching.detector.min_response, cli.min_response, "detector.min_response", &mut overrides);
    override_field(&mut matching.dataset.max_frames, cli.max_frames, "dataset.max_frames", &mut overrides);
    override_field(
        &mut matching.dataset.stride,
        cli.frame_stride.map(|stride| stride.max(1)),
        "dataset.stride",
        &mut overrides,
    );

    if let Some(parallel) = cli.parallel {
        if matching.collector.parallel != parallel || matching.matcher.parallel != parallel {
            overrides.push(format!("parallel = {}", parallel));
        }
        matching.collector.parallel = parallel;
        matching.matcher.parallel = parallel;
    }

    overrides
}

fn finalize_config(config: RunConfig) -> Result<ResolvedConfig, CliError> {
    let input = config.input.ok_or(CliError::InputNotProvided)?;

    if !input.exists() {
        return Err(CliError::InputMissing(input));
    }
    if !input.is_dir() {
        return Err(CliError::InputNotDirectory(input));
    }

    Ok(ResolvedConfig {
        input,
        output: config.output,
        name: config.name,
        output_format: config.output_format,
        matching: config.matching,
    })
}

fn ensure_output_dir(output: &Path) -> Result<PathBuf, CliError> {
    if output.exists() {
        if output.is_dir() {
            return Ok(output.to_path_buf());
        }
        return Err(CliError::OutputNotDirectory(output.to_path_buf()));
    }

    fs::create_dir_all(output).map_err(|source| CliError::OutputCreate {
        path: output.to_path_buf(),
        source,
    })?;

    Ok(output.to_path_buf())
}

fn run_pipeline(config: &ResolvedConfig, output_dir: &Path) -> Result<PipelineReport, CliError> {
    info!("Stage 1/3: Loading scene");
    let mut scene = ScannedScene::load(&config.input, config.name.as_deref(), config.matching.clone())?;

    info!("Stage 2/3: Detecting keypoints");
    let keypoint_count = scene.find_keypoints()?.len();

    info!("Stage 3/3: Matching keypoints");
    let matches = scene.match_keypoints()?.summary();

    let matches_file = output_dir.join(format!("{}.matches.txt", scene.name()));
    scene.save_matches(&matches_file)?;

    Ok(PipelineReport {
        scene_name: scene.name().to_string(),
        sensor_count: scene.sensors().len(),
        frame_count: scene.frame_count(),
        keypoint_count,
        matches,
        matches_file,
    })
}

fn write_results(results: &ResultsJson, output_dir: &Path, format: OutputFormat) -> Result<(), CliError> {
    if format != OutputFormat::Json {
        return Ok(());
    }

    let path = output_dir.join("results.json");
    let payload = serde_json::to_string_pretty(results)?;

    fs::write(&path, payload).map_err(|source| CliError::OutputWrite {
        path: path.clone(),
        source,
    })?;
    info!("Results written to {}", path.display());

    Ok(())
}

fn print_text_summary(results: &ResultsJson) {
    println!("scenematch Results");
    println!("Status: {}", results.status);
    if let Some(input) = &results.input {
        println!("Input: {}", input);
    }
    if let Some(output) = &results.output {
        println!("Output: {}", output);
    }
    println!("Processing time (ms): {}", results.processing_time_ms);
    println!("Sensors: {}", results.sensor_count);
    println!("Frames: {}", results.frame_count);
    println!("Keypoints: {}", results.keypoint_count);
    if let Some(matches) = &results.matches {
        println!("Matches: {}", matches.match_count);
        println!("Frame pairs: {}", matches.frame_pair_count);
        println!("Mean residual (px): {:.3}", matches.mean_residual);
    }
    if let Some(path) = &results.matches_file {
        println!("Match file: {}", path);
    }
}

fn build_diagnostics(config: Option<&Path>) -> Diagnostics {
    Diagnostics {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        scenematch_version: env!("CARGO_PKG_VERSION").to_string(),
        config: config.map(|path| path.display().to_string()),
    }
}

/// Report a failed run on stderr and, for JSON output, in `results.json`.
fn handle_error(
    err: &CliError,
    start: Instant,
    resolved: Option<&ResolvedConfig>,
    output_format: Option<OutputFormat>,
    output_override: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> ExitCode {
    let error_info = ErrorInfo {
        error_type: err.error_type().to_string(),
        root_cause: err.to_string(),
        component: err.component().to_string(),
        suggestion: err.suggestion().to_string(),
    };
    error!("{} in {}: {}", error_info.error_type, error_info.component, error_info.root_cause);
    eprintln!("Error: {}\nHint: {}", error_info.root_cause, error_info.suggestion);

    let output = resolved.map(|r| r.output.clone()).or(output_override);
    let format = output_format.or_else(|| resolved.map(|r| r.output_format));
    if let (Some(OutputFormat::Json), Some(output_dir)) = (format, output.as_ref()) {
        let results = ResultsJson {
            status: "error".to_string(),
            input: resolved.map(|r| r.input.display().to_string()),
            output: Some(output_dir.display().to_string()),
            processing_time_ms: start.elapsed().as_millis(),
            scene_name: None,
            sensor_count: 0,
            frame_count: 0,
            keypoint_count: 0,
            matches: None,
            matches_file: None,
            error: Some(error_info),
            diagnostics: build_diagnostics(config_path.as_deref()),
        };
        // A failed write must not replace `err` as the reported failure
        let _ = ensure_output_dir(output_dir).and_then(|dir| write_results(&results, &dir, OutputFormat::Json));
    }

    err.exit_code()
}
