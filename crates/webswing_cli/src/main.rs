//! Webswing CLI
//!
//! Headless driver for motion scenes:
//! - `run`: replay a scroll scenario and report the resolved transforms
//! - `check`: validate a scene file
//! - `ease`: tabulate an easing curve

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use webswing_animation::Easing;
use webswing_cli::{run_paths, Scene, SceneConfig};

/// Scroll-synchronized motion scenes, headless
#[derive(Parser, Debug)]
#[command(name = "webswing")]
#[command(about = "Headless driver for webswing motion scenes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a scroll scenario against a scene
    Run {
        /// Scene file, or a directory containing webswing.toml
        #[arg(long)]
        scene: PathBuf,

        /// Scenario JSON file
        #[arg(long)]
        scenario: PathBuf,

        /// Also write the report to this relative path
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Load and build a scene without running it
    Check {
        #[arg(long)]
        scene: PathBuf,
    },

    /// Print an easing curve sampled at evenly spaced points
    Ease {
        /// Easing name, e.g. "power2.out" or "cubic-bezier(0.4, 0, 0.2, 1)"
        name: String,

        #[arg(long, default_value_t = 10)]
        steps: u32,
    },
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            scene,
            scenario,
            report,
        } => {
            let outcome = run_paths(&scene, &scenario)?;
            outcome.report().write_to_writer(&mut io::stdout().lock())?;
            if let Some(path) = report {
                outcome
                    .report()
                    .write_to_path(&path)
                    .with_context(|| format!("Failed to write report to {}", path.display()))?;
                tracing::info!("report written to {}", path.display());
            }
            Ok(if outcome.is_failed() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Commands::Check { scene } => {
            let config = SceneConfig::load(&scene)?;
            let built = Scene::build(&config).with_context(|| format!("Invalid scene {}", scene.display()))?;
            println!("{}: {} timelines", built.name, built.stage.len());
            for (name, id) in built.targets() {
                println!("  {name} (target {})", id.0);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Ease { name, steps } => {
            let easing: Easing = name.parse()?;
            let steps = steps.max(1);
            for i in 0..=steps {
                let t = i as f32 / steps as f32;
                println!("{t:.3}\t{:.4}", easing.apply(t));
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
