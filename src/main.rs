use anyhow::{Context, Result};
use gym_usage_analysis::{
    AnalysisSettings, GymAnalysis, PlottersRenderer, config::AppConfig, dataset, ml,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only the report
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
        .parse_lossy(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "gym_usage_analysis=debug".to_string()),
        );

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    tracing::info!("Outdoor Gym Analysis");

    let config = AppConfig::load().context("Failed to load configuration")?;

    let model = ml::load_model(&config.model.path).with_context(|| {
        format!("Failed to load model from {}", config.model.path.display())
    })?;
    tracing::debug!("{}", model.info());

    let usage = dataset::load_usage_or_empty(&config.data.gym_path)?;
    let weather = dataset::load_weather_or_empty(&config.data.weather_path)?;

    let analysis = GymAnalysis::new(AnalysisSettings::from_config(&config), model, PlottersRenderer);
    tracing::debug!("Settings: {:?}", analysis.settings());

    let report = analysis.run(&usage, &weather).context("Analysis failed")?;
    println!("{report}");

    Ok(())
}
