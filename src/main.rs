//! Tetration Math - CLI
//!
//! CLI commands:
//! - render: Classify the configured viewport and write the grid as JSON
//! - pow: Evaluate one complex power
//! - random: Draw bounded random integers

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tetration_math::backend;
use tetration_math::complex::{self, Complex};
use tetration_math::config::{Config, Env};
use tetration_math::logging;
use tetration_math::state::AppState;

#[derive(Parser)]
#[command(name = "tetration_math")]
#[command(about = "Complex power towers and their escape-time fractal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to tetration.yaml config
    #[arg(short, long, global = true, default_value = "tetration.yaml")]
    config: PathBuf,

    /// Route arithmetic through the numeric backend adapter
    #[arg(long, global = true)]
    backend: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the configured viewport
    Render {
        /// Output JSON file (defaults to OUTPUT_DIR/render.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override samples per axis
        #[arg(short)]
        n: Option<u32>,

        /// Override iteration limit
        #[arg(long)]
        max_iter: Option<u32>,
    },

    /// Compute base^exponent
    Pow {
        #[arg(allow_negative_numbers = true)]
        base_re: f64,
        #[arg(allow_negative_numbers = true)]
        base_im: f64,
        #[arg(allow_negative_numbers = true)]
        exp_re: f64,
        #[arg(allow_negative_numbers = true)]
        exp_im: f64,
    },

    /// Draw integers uniformly from [ceil(min), floor(max)]
    Random {
        #[arg(allow_negative_numbers = true)]
        min: f64,
        #[arg(allow_negative_numbers = true)]
        max: f64,

        /// How many to draw
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = Env::load();
    logging::init_logging(&env.log_dir)?;
    tracing::info!("Tetration Math starting up");

    let cli = Cli::parse();
    tracing::debug!("CLI args parsed: config={:?}", cli.config);

    let mut config = if cli.config.exists() {
        tracing::info!("Loading config from {:?}", cli.config);
        Config::load(&cli.config)?
    } else {
        tracing::warn!("Config file not found: {:?}, using defaults", cli.config);
        Config::default()
    };
    if cli.backend {
        config.backend.enabled = true;
    }
    let use_backend = config.backend.enabled;

    match cli.command {
        Commands::Render { output, n, max_iter } => {
            if let Some(n) = n {
                config.render.n = n;
            }
            if let Some(max_iter) = max_iter {
                config.render.max_iter = max_iter;
            }
            let output = output.unwrap_or_else(|| PathBuf::from(&env.output_dir).join("render.json"));
            render(AppState::new(config), &output).await?;
        }

        Commands::Pow { base_re, base_im, exp_re, exp_im } => {
            let base = Complex::new(base_re, base_im);
            let exponent = Complex::new(exp_re, exp_im);
            let z = if use_backend {
                backend::shared().power(base, exponent).await?
            } else {
                complex::power(base, exponent)
            };
            println!("({}) ^ ({}) = {} (|z| = {})", base, exponent, z, complex::magnitude(z));
        }

        Commands::Random { min, max, count } => {
            for _ in 0..count {
                let v = if use_backend {
                    backend::shared().random_int(min, max).await?
                } else {
                    complex::random_int(min, max)?
                };
                println!("{}", v);
            }
        }
    }

    Ok(())
}

/// Render the configured viewport and write it as JSON
async fn render(state: AppState, output: &Path) -> anyhow::Result<()> {
    let settings = state.settings().clone();
    let n = settings.resolution();
    println!("Rendering {}x{} (max_iter {})...", n, n, settings.max_iter);

    let grid = state.render(&settings).await?;

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let data = serde_json::json!({
        "generated": chrono::Local::now().to_rfc3339(),
        "backend": state.config.backend.enabled,
        "settings": settings,
        "escaped": grid.escaped_count(),
        "grid": &*grid,
    });
    std::fs::write(output, serde_json::to_string(&data)?)?;

    println!("  {} of {} points escaped -> {:?}", grid.escaped_count(), grid.cells.len(), output);
    tracing::info!("Wrote render to {:?}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_config_accepted_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tetration_math", "random", "1", "6", "--config", "custom.yaml", "-n", "3",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("custom.yaml"));
        assert!(matches!(cli.command, Commands::Random { count: 3, .. }));

        let cli = Cli::try_parse_from(["tetration_math", "render", "-c", "other.yaml", "--backend"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("other.yaml"));
        assert!(cli.backend);
    }

    #[test]
    fn test_negative_operands_parse() {
        let cli = Cli::try_parse_from(["tetration_math", "pow", "-1", "0", "0.5", "-0.25"]).unwrap();
        match cli.command {
            Commands::Pow { base_re, exp_im, .. } => {
                assert_eq!(base_re, -1.0);
                assert_eq!(exp_im, -0.25);
            }
            _ => panic!("expected pow"),
        }
    }
}
