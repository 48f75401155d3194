use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use stride_core::graph::{RunContext, StopReason};
use stride_core::solver::{PlanSolver, SolveReport};
use stride_core::{EngineError, agent, config, providers, tools};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
mod onboard;
use std::io::Write;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "stride")]
#[command(about = "stride - plan, execute, replan", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    Onboard,
    Run {
        #[arg(short, long)]
        objective: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("warn".parse().unwrap()))
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let command = cli.command.unwrap_or_else(|| {
        if !config::config_exists() {
            Commands::Onboard
        } else {
            Commands::Run { objective: None }
        }
    });

    match command {
        Commands::Onboard => {
            let onboard_config = onboard::run_onboard().map_err(|e| {
                eprintln!("❌ Onboarding failed: {}", e);
                anyhow::anyhow!("Onboarding failed: {}", e)
            })?;
            config::save_config(&onboard_config)?;
        }
        Commands::Run { objective } => {
            let config = config::load_config()?;
            let solver = build_solver(&config)?;
            let ctx = cancellable_context();

            if let Some(objective) = objective {
                println!("\n🗺️  Planning...\n");
                match solver.run(&objective, &ctx).await {
                    Ok(report) => print_report(&report),
                    Err(EngineError::Cancelled) => {
                        println!("{}", style("Run cancelled.").yellow());
                    }
                    Err(e) => {
                        eprintln!("❌ Error: {}", e);
                        anyhow::bail!("Objective failed: {}", e);
                    }
                }
            } else {
                prompt_loop(&solver, &ctx).await;
            }
        }
    }

    Ok(())
}

fn build_solver(config: &config::Config) -> Result<PlanSolver> {
    let provider = providers::create_provider(config)?;

    let mut registry = agent::ToolRegistry::new();
    registry.register(Arc::new(tools::CurrentWeatherTool::new(
        config.weather_key(),
    )));
    registry.register(Arc::new(tools::GeoCoordinatesTool::new(
        config.weather_key(),
    )));
    registry.register(Arc::new(tools::WeatherForecastTool::new(
        config.weather_key(),
    )));
    registry.register(Arc::new(tools::PlotWeatherTool::new(
        config.artifacts_dir.clone(),
    )));
    registry.register(Arc::new(tools::StockPriceTool::new(config.stock_key())));
    registry.register(Arc::new(tools::PlanCompleteTool));

    Ok(PlanSolver::new(provider, Arc::new(registry))
        .with_max_rounds(config.max_rounds)
        .with_max_turns(config.max_turns)
        .with_summary(config.summarize))
}

/// Context whose token trips on the first Ctrl+C, stopping the run at the
/// next node boundary.
fn cancellable_context() -> RunContext {
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!(
                "\n{}",
                style("Stopping after the current step...").yellow()
            );
            on_signal.cancel();
        }
    });
    RunContext::with_cancel(cancel)
}

async fn prompt_loop(solver: &PlanSolver, ctx: &RunContext) {
    println!("🧭 Stride");
    println!("Type an objective (Ctrl+D to exit):\n");
    use std::io::{self, BufRead};
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut stdout_lock = stdout.lock();

    loop {
        if ctx.cancel.is_cancelled() {
            println!("\n👋 Goodbye!");
            break;
        }

        print!("> ");
        let _ = stdout_lock.flush();

        let mut input = String::new();
        let mut reader = stdin.lock();

        match reader.read_line(&mut input) {
            Ok(0) => {
                println!("\n👋 Goodbye!");
                break;
            }
            Ok(_) => {
                let input = input.trim();
                if input.is_empty() {
                    continue;
                }

                println!("\n🗺️  Planning...\n");

                match solver.run(input, ctx).await {
                    Ok(report) => print_report(&report),
                    Err(EngineError::Cancelled) => {
                        println!("{}", style("Run cancelled.").yellow());
                    }
                    Err(e) => {
                        eprintln!("❌ Error: {}", e);
                    }
                }

                println!();
            }
            Err(_) => {
                println!("\n👋 Goodbye!");
                break;
            }
        }
    }
}

fn print_report(report: &SolveReport) {
    if report.records.is_empty() {
        println!("{}", style("No tool steps were executed.").dim());
    }
    for (i, record) in report.records.iter().enumerate() {
        println!(
            "{} {}",
            style(format!("{}.", i + 1)).cyan().bold(),
            record.describe_calls()
        );
        for result in &record.results {
            println!("   {}", style(truncate(result, 200)).dim());
        }
    }

    println!();
    match report.stop {
        StopReason::BudgetExhausted => {
            println!(
                "{}",
                style("⏳ Stopped: round budget spent before the plan completed.").yellow()
            );
            if !report.plan.is_empty() {
                println!("{}", style("Remaining steps:").yellow());
                println!("{}", style(report.plan.render_numbered()).dim());
            }
        }
        StopReason::GraphEnd if report.completed => {
            println!("{}", style("✓ Plan completed.").green().bold());
        }
        StopReason::GraphEnd => {
            println!("{}", style("✓ Nothing left to do.").green());
        }
    }

    if let Some(answer) = &report.answer {
        println!("\n{}", answer);
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut)
}
