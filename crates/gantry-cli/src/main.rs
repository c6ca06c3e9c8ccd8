use clap::{Parser, ValueEnum};
use gantry_core::{reporter, GantryConfig, GantryEngine};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "gantry")]
#[command(about = "Gantry - static analyzer for GitHub Actions workflow files")]
struct Cli {
    /// Workflow files to check. When omitted, `.github/workflows/` is
    /// searched relative to the current directory.
    paths: Vec<PathBuf>,

    /// Path to a configuration file (default: discover `.gantry.yml`
    /// upward from the current directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format of the diagnostic stream.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn load_config(cli: &Cli) -> Result<GantryConfig, gantry_core::config::ConfigError> {
    if let Some(path) = &cli.config {
        return GantryConfig::from_file(path);
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    match GantryConfig::discover(&cwd) {
        Some(path) => GantryConfig::from_file(&path),
        None => Ok(GantryConfig::default()),
    }
}

/// Discover workflow files under the conventional directory.
fn discover_workflows() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for pattern in [".github/workflows/*.yml", ".github/workflows/*.yaml"] {
        if let Ok(matches) = glob::glob(pattern) {
            paths.extend(matches.flatten());
        }
    }
    paths
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("gantry: {}", err);
            return ExitCode::from(2);
        }
    };

    let mut paths = if cli.paths.is_empty() {
        discover_workflows()
    } else {
        cli.paths.clone()
    };
    paths.retain(|p| !config.is_ignored(&p.display().to_string()));
    paths.sort();
    paths.dedup();

    if paths.is_empty() {
        eprintln!("gantry: no workflow files found");
        return ExitCode::SUCCESS;
    }

    let engine = GantryEngine::with_config(config);
    let reports = engine.analyze_files(&paths);

    let rendered = match cli.format {
        Format::Text => reporter::render_text(&reports),
        Format::Json => reporter::render_json(&reports),
    };
    print!("{}", rendered);

    if reporter::has_errors(&reports) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
