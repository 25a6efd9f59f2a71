mod config_file;

use std::env;
use std::process::ExitCode;

use poi_core::run_analysis;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config_file::{config_path_from, load_config, CONFIG_ENV_VAR};

fn main() -> ExitCode {
    init_tracing();
    info!("=== POI Analysis ===");
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!(error = %message, "analysis_failed");
            eprintln!("{message}");
            ExitCode::from(1)
        }
    }
}

fn run_cli() -> Result<(), String> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    if args.iter().any(|arg| arg == "-h" || arg == "--help") {
        println!("{}", usage_text());
        return Ok(());
    }
    if args.len() > 1 {
        return Err(usage_text());
    }

    let cwd = env::current_dir().map_err(|error| format!("resolve working directory: {error}"))?;
    let config_path = config_path_from(
        args.first().map(String::as_str),
        env::var(CONFIG_ENV_VAR).ok(),
    );
    let config = load_config(config_path.as_deref(), &cwd)?;
    match &config_path {
        Some(path) => info!(config_path = %path.display(), "config_loaded"),
        None => info!("config_defaults_used"),
    }

    let run = run_analysis(&config).map_err(|error| error.to_string())?;
    println!("{}", run.report.render_human_readable());
    println!("output_dir={}", config.output_dir.display());
    for output in &run.manifest.outputs {
        println!("table={} sha256={}", output.path, output.sha256_hex);
    }
    for path in &run.heatmaps {
        println!("heatmap={}", path.display());
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn usage_text() -> String {
    [
        "poi_analysis - landing zone analytics for breadcrumb telemetry",
        "",
        "Usage:",
        "  poi_analysis [config.json]",
        "",
        "The config path may also come from POI_ANALYSIS_CONFIG.",
        "Without a config the defaults are used relative to the working directory:",
        "  catalog_path      CalderaCoordinates.csv",
        "  breadcrumbs_path  caldera_breadcrumbs.csv",
        "  output_dir        reports",
        "  landing_window    45",
    ]
    .join("\n")
}
