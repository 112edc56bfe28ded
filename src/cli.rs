//! Command-line interface for composecheck.

use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::{Config, OutputMode, Settings};
use crate::corpus::{relative_path, Corpus, IngestionFailure};
use crate::detect::Runner;
use crate::error::AuditError;
use crate::report::{self, Report};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_CONFIG: i32 = 2;
pub const EXIT_ERROR: i32 = 3;

/// Default configuration file names to search for.
const DEFAULT_CONFIG_NAMES: &[&str] = &["composecheck.yaml", ".composecheck.yaml"];

/// Directories that never contain first-party feature code.
const SKIPPED_DIRS: &[&str] = &[".build", "Pods", "Carthage", "DerivedData"];

/// Architecture health checks for Swift reducer features.
///
/// composecheck reads feature reducers (State, Action, reducer body and
/// injected dependencies), flags structural problems, scores testability,
/// maps how features compose each other and proposes an ordered
/// decomposition plan.
#[derive(Parser)]
#[command(name = "composecheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze feature architecture under a path
    #[command(visible_alias = "check")]
    Analyze(AnalyzeArgs),
    /// Create a composecheck configuration from a template
    Init(InitArgs),
}

/// Arguments for the analyze command.
#[derive(Parser)]
pub struct AnalyzeArgs {
    /// Path to analyze (file or directory)
    pub path: PathBuf,

    /// Path to configuration YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: human or json
    #[arg(short, long)]
    pub format: Option<String>,

    /// Fail on any HIGH or CRITICAL violation
    #[arg(long)]
    pub strict: bool,

    /// Minimum passing testability score (0-100)
    #[arg(short, long, allow_negative_numbers = true)]
    pub threshold: Option<i64>,

    /// Cap on any combined effort estimate, in hours
    #[arg(long, allow_negative_numbers = true)]
    pub max_effort_cap: Option<f64>,

    /// Fail when any file could not be read
    #[arg(long)]
    pub fail_on_ingestion_error: bool,

    /// Show suppressed violations in output
    #[arg(long)]
    pub show_suppressed: bool,
}

impl AnalyzeArgs {
    /// Apply command-line overrides on top of a configuration file.
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(format) = &self.format {
            config.mode = Some(format.clone());
        }
        if self.strict {
            config.strict = Some(true);
        }
        if let Some(threshold) = self.threshold {
            config.threshold = Some(threshold);
        }
        if let Some(cap) = self.max_effort_cap {
            config.max_effort_cap_hours = Some(cap);
        }
        if self.fail_on_ingestion_error {
            config.fail_on_ingestion_error = Some(true);
        }
    }
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "composecheck.yaml")]
    pub output: PathBuf,

    /// Template to use
    #[arg(short, long, default_value = "default")]
    pub template: String,

    /// List available templates
    #[arg(short, long)]
    pub list: bool,
}

/// Available configuration templates.
pub struct Template {
    pub name: &'static str,
    pub description: &'static str,
    pub content: &'static str,
}

/// All available templates.
pub static TEMPLATES: &[Template] = &[
    Template {
        name: "default",
        description: "Default thresholds; only low testability scores fail",
        content: include_str!("templates/default.yaml"),
    },
    Template {
        name: "strict",
        description: "CI gate: HIGH/CRITICAL violations and unreadable files fail",
        content: include_str!("templates/strict.yaml"),
    },
];

/// Discover a configuration file in `dir`.
pub fn discover_config(dir: &Path) -> Option<PathBuf> {
    DEFAULT_CONFIG_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Load the configuration file: explicit, discovered, or defaults.
fn load_config(explicit: Option<&Path>) -> Result<Config, AuditError> {
    match explicit {
        Some(path) => Config::parse_file(path),
        None => match discover_config(Path::new(".")) {
            Some(path) => {
                debug!(path = %path.display(), "using discovered configuration");
                Config::parse_file(&path)
            }
            None => Ok(Config::default()),
        },
    }
}

/// Collect `.swift` files under `root`. Walk errors become ingestion failures.
pub fn collect_files(root: &Path, settings: &Settings) -> (Vec<PathBuf>, Vec<IngestionFailure>) {
    let include_tests = settings.include_test_files;
    let mut files = Vec::new();
    let mut failures = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            // Skip hidden directories
            if name.starts_with('.') {
                return false;
            }
            if SKIPPED_DIRS.contains(&name.as_ref()) {
                return false;
            }
            // Skip test targets unless explicitly included
            include_tests || !name.ends_with("Tests")
        })
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e
                    .path()
                    .map(|p| relative_path(p, root))
                    .unwrap_or_else(|| relative_path(root, root));
                warn!(path = %path, error = %e, "failed to walk directory entry");
                failures.push(IngestionFailure {
                    path,
                    message: e.to_string(),
                });
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("swift") {
            continue;
        }
        if !include_tests {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if name.ends_with("Tests.swift") {
                continue;
            }
        }
        if settings.is_path_excluded(&relative_path(path, root)) {
            continue;
        }
        files.push(path.to_path_buf());
    }

    files.sort();
    (files, failures)
}

/// Analyze `path` (file or directory) with resolved settings.
///
/// The report's `root` is `path` as given.
pub fn analyze(path: &Path, settings: &Settings) -> anyhow::Result<Report> {
    let abs_path = path
        .canonicalize()
        .map_err(|e| anyhow::anyhow!("cannot access path {:?}: {}", path, e))?;

    let (files, failures) = if abs_path.is_dir() {
        collect_files(&abs_path, settings)
    } else {
        (vec![abs_path.clone()], Vec::new())
    };
    info!(files = files.len(), "collected source files");

    let mut corpus = Corpus::load(&abs_path, &files);
    for failure in failures {
        corpus.add_failure(failure.path, failure.message);
    }

    let root = path.to_string_lossy().replace('\\', "/");
    let runner = Runner::new(settings.clone());
    Ok(runner.run(&root, &corpus)?)
}

/// Run the analyze command.
pub fn run_analyze(args: &AnalyzeArgs) -> anyhow::Result<i32> {
    let mut config = match load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_CONFIG);
        }
    };
    args.apply_overrides(&mut config);

    let settings = match config.resolve() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_CONFIG);
        }
    };

    let report = match analyze(&args.path, &settings) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return match e.downcast_ref::<AuditError>() {
                Some(err) if err.is_configuration() => Ok(EXIT_CONFIG),
                _ => Ok(EXIT_ERROR),
            };
        }
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match settings.mode {
        OutputMode::Json => report::write_json(&mut out, &report)?,
        OutputMode::Human => report::write_pretty(&mut out, &report, args.show_suppressed)?,
    }
    out.flush()?;

    Ok(exit_code(&report))
}

/// Map a report's verdict to a process exit code.
pub fn exit_code(report: &Report) -> i32 {
    if report.passed() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILED
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    // List mode
    if args.list {
        return list_templates();
    }

    // Find template
    let template = match TEMPLATES.iter().find(|t| t.name == args.template) {
        Some(t) => t,
        None => {
            eprintln!("Error: unknown template {:?}", args.template);
            eprintln!("Run 'composecheck init --list' to see available templates");
            return Ok(EXIT_CONFIG);
        }
    };

    // Check if output already exists
    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    // Create output directory if needed
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, template.content) {
        eprintln!("Error: failed to write configuration: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {} from template '{}'", args.output.display(), template.name);
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to tune thresholds for your project", args.output.display());
    println!("  2. Run: composecheck analyze . --config {}", args.output.display());

    Ok(EXIT_SUCCESS)
}

/// List available templates.
fn list_templates() -> anyhow::Result<i32> {
    println!("Available templates:");
    println!();

    for template in TEMPLATES {
        let name = if template.name == "default" {
            format!("{} (default)", template.name)
        } else {
            template.name.to_string()
        };
        println!("  {:<20} {}", name, template.description);
    }

    println!();
    println!("Usage:");
    println!("  composecheck init --template <name>");

    Ok(EXIT_SUCCESS)
}
