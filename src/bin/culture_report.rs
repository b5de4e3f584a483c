//! culture_report: build one culture record and print its report
//!
//! Example: `culture_report 2 15 1.55 --irrigation --sub-type long --format text`

use clap::Parser;
use crop_planner_rust::{
    format::envelope, format_output, CultureRecordBuilder, EngineConfig, OutputFormat, ScriptBridge,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "culture_report")]
#[command(about = "Validate planting parameters and derive rows and input quantities")]
#[command(version)]
#[command(allow_negative_numbers = true)]
struct Args {
    /// Crop type (1 = soybean, 2 = sugarcane)
    crop: i64,

    /// Plot area in hectares
    area: f64,

    /// Row spacing in meters
    spacing: f64,

    /// Irrigation is in place
    #[arg(long)]
    irrigation: bool,

    /// Soybean variety or sugarcane cycle
    #[arg(long, value_name = "KEY")]
    sub_type: Option<String>,

    /// Output format (json or text)
    #[arg(long, default_value = "json")]
    format: OutputFormat,

    /// Skip the external statistics script
    #[arg(long)]
    no_analysis: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crop_planner_rust=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let builder = if args.no_analysis {
        CultureRecordBuilder::new()
    } else {
        let config = EngineConfig::from_env();
        CultureRecordBuilder::with_analysis(Arc::new(ScriptBridge::from_config(&config)))
    };

    let output = match builder.create(
        args.crop,
        args.area,
        args.spacing,
        args.irrigation,
        args.sub_type.as_deref(),
    ) {
        Ok(record) => {
            let mut doc = envelope("success", "Culture created successfully", &record);
            doc["alerts"] = serde_json::json!(record.recommendation_report.alerts());
            doc
        }
        Err(e) => envelope("error", e.to_string(), serde_json::Value::Null),
    };

    println!("{}", format_output(&output, args.format));

    if output["status"] == "error" {
        std::process::exit(1);
    }
    Ok(())
}
