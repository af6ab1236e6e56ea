// Module declarations
mod chart;
mod cli;
mod config;
mod context;
mod gateway;
mod llm;
mod normalize;
mod server;
mod types;
mod util;

// Re-export all module items at crate root so cross-module references work
// through a single shared namespace.
#[allow(unused_imports)]
pub(crate) use chart::*;
#[allow(unused_imports)]
pub(crate) use cli::*;
#[allow(unused_imports)]
pub(crate) use config::*;
#[allow(unused_imports)]
pub(crate) use context::*;
#[allow(unused_imports)]
pub(crate) use gateway::*;
#[allow(unused_imports)]
pub(crate) use llm::*;
#[allow(unused_imports)]
pub(crate) use normalize::*;
#[allow(unused_imports)]
pub(crate) use server::*;
#[allow(unused_imports)]
pub(crate) use types::*;
#[allow(unused_imports)]
pub(crate) use util::*;

use std::sync::Arc;

use clap::Parser;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let gateway_cfg = GatewayConfig::from_env()?;
    let llm_cfg = LlmConfig::from_env()?;
    let session = Arc::new(TelemetrySession::new(
        &gateway_cfg.base_url,
        &gateway_cfg.username,
        &gateway_cfg.secret,
    ));
    if session.is_static() {
        eprintln!("[gateway] using pre-issued token; login disabled");
    }

    match cli.command {
        Command::Serve { bind, port } => {
            let port = port.unwrap_or_else(default_port);
            run_server(&bind, port, session, llm_cfg, &gateway_cfg.device_id)
        }

        Command::Ask { question } => {
            let question = question.trim();
            if question.is_empty() {
                eprintln!("No question provided");
                std::process::exit(2);
            }
            let snapshot = device_snapshot(&session, &gateway_cfg.device_id);
            let chart = extract_chart(
                &session,
                &llm_cfg,
                &gateway_cfg.device_id,
                question,
                &snapshot.timeseries_keys,
            );
            if let Some(chart) = &chart {
                eprintln!("[chart] plotted '{}' with {} points", chart.label, chart.points.len());
            }
            let answer = answer_question(
                &llm_cfg,
                question,
                &snapshot.context,
                chart.as_ref().map(|c| c.label.as_str()),
            );
            println!("{answer}");
            Ok(())
        }
    }
}
