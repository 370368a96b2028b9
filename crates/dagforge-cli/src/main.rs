use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dagforge_core::Settings;
use dagforge_dbt::{LineageCompiler, LineageDefaults, Manifest};
use dagforge_pipeline::{PipelineBundle, PipelineModel, Registries};

/// dagforge - declarative pipeline validation and dbt lineage compilation
#[derive(Parser)]
#[command(name = "dagforge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to settings file (default: dagforge.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a dbt model's inputs and outputs
    DbtIo {
        /// Model name (can be short name or unique_id)
        model: String,

        /// Path to dbt manifest.json
        #[arg(short = 'f', long, default_value = "target/manifest.json")]
        manifest: PathBuf,

        /// Directory holding profiles.yml, used for lineage defaults
        #[arg(long)]
        profiles_dir: Option<PathBuf>,

        /// Profile to read from profiles.yml
        #[arg(long, requires = "profiles_dir")]
        profile: Option<String>,

        /// Profile target to read lineage defaults from
        #[arg(long, default_value = "data")]
        target: String,
    },

    /// Validate a pipeline bundle and list each task's IOs
    Validate {
        /// Bundle JSON: {"directory", "pipeline", "tasks"}
        bundle: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let settings = load_settings(cli.config.as_deref(), cli.verbose)?;

    match cli.command {
        Commands::DbtIo {
            model,
            manifest,
            profiles_dir,
            profile,
            target,
        } => {
            let profile = ProfileTarget {
                dir: profiles_dir,
                name: profile,
                target,
            };
            dbt_io_command(settings, &model, &manifest, &profile, cli.verbose)
        }
        Commands::Validate { bundle } => validate_command(settings, &bundle, cli.verbose),
    }
}

fn load_settings(path: Option<&Path>, verbose: bool) -> Result<Settings> {
    let settings = if let Some(path) = path {
        Settings::from_file(path)?
    } else if Path::new("dagforge.toml").exists() {
        Settings::from_file(Path::new("dagforge.toml"))?
    } else {
        if verbose {
            eprintln!("{}", "No settings file found, using defaults".yellow());
        }
        Settings::default()
    };

    tracing::debug!(adapter = %settings.lineage.adapter, dags_dir = %settings.dags_dir.display(), "settings loaded");
    if verbose {
        eprintln!("{} {} adapter", "Using".cyan(), settings.lineage.adapter);
    }

    Ok(settings)
}

struct ProfileTarget {
    dir: Option<PathBuf>,
    name: Option<String>,
    target: String,
}

/// Fill unset lineage settings from `profiles.yml`
fn apply_profile(settings: &mut Settings, profile: &ProfileTarget) -> Result<()> {
    let Some(dir) = &profile.dir else {
        return Ok(());
    };

    let path = dir.join("profiles.yml");
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let profiles: serde_json::Value = serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let name = profile
        .name
        .clone()
        .unwrap_or_else(|| settings.lineage.adapter.to_string());

    let defaults = LineageDefaults::from_profiles(&profiles, &name, &profile.target)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Profile '{}' has no target '{}' in {}",
                name,
                profile.target,
                path.display()
            )
        })?;
    defaults.apply(&mut settings.lineage);

    Ok(())
}

fn dbt_io_command(
    mut settings: Settings,
    model: &str,
    manifest_path: &Path,
    profile: &ProfileTarget,
    verbose: bool,
) -> Result<()> {
    apply_profile(&mut settings, profile)?;

    if verbose {
        eprintln!("{} {}", "Loading manifest from:".cyan(), manifest_path.display());
    }

    let manifest = Manifest::from_file(manifest_path)
        .map_err(|e| anyhow::anyhow!("Failed to load manifest: {}", e))?;

    let compiler = LineageCompiler::from_settings(manifest, &settings.lineage);
    let io = compiler.generate_io(model)?;

    if verbose {
        eprintln!(
            "{} {} inputs, {} outputs",
            "Compiled".cyan(),
            io.inputs.len(),
            io.outputs.len()
        );
    }

    println!("{}", serde_json::to_string_pretty(&io)?);
    Ok(())
}

fn validate_command(settings: Settings, bundle_path: &Path, verbose: bool) -> Result<()> {
    if verbose {
        eprintln!("{} {}", "Loading bundle from:".cyan(), bundle_path.display());
    }

    let contents = std::fs::read_to_string(bundle_path)
        .with_context(|| format!("Failed to read {}", bundle_path.display()))?;
    let bundle: PipelineBundle = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", bundle_path.display()))?;

    let registries = Registries::builtin(settings);
    let pipeline = match PipelineModel::from_bundle(&bundle, &registries) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            println!("{} {}", "✗".red().bold(), err.to_string().red());
            std::process::exit(1);
        }
    };

    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{} {}", "Pipeline:".bold(), pipeline.name().green());
    println!("{}", "=".repeat(60).bright_blue());
    println!("{} {}", "Owner:".bold(), pipeline.owner());
    println!(
        "{} {}",
        "Schedule:".bold(),
        pipeline.schedule().unwrap_or("manual")
    );
    println!();

    for task in pipeline.tasks() {
        println!("{} {}", task.kind().cyan(), task.uniq_name().bold());
        for io in task.inputs() {
            println!("  {} {}", "<-".dimmed(), io.alias().yellow());
        }
        for io in task.outputs() {
            println!("  {} {}", "->".dimmed(), io.alias().green());
        }
    }

    println!();
    println!(
        "{}",
        format!("✓ {} tasks valid", pipeline.tasks().len()).green()
    );

    Ok(())
}
