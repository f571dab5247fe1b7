use std::io::Write;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use tokio::io::AsyncBufReadExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use floorsight_common::{Config, FloorsightError, Intent};
use floorsight_workflow::analyst::evidence_payload;
use floorsight_workflow::{RunOptions, RunStats, Workflow};

/// Ask the manufacturing graph a question in plain language.
#[derive(Parser, Debug)]
#[command(name = "floorsight")]
struct Args {
    /// Goal text; omit to start an interactive session
    goal: Vec<String>,

    /// Pin the run to one production line (skips the urgency probe)
    #[arg(long)]
    line: Option<String>,

    /// Pin the run to one job
    #[arg(long)]
    job: Option<String>,

    /// Skip routing and force an intent: line_status, capacity_wip,
    /// work_instructions, supplier_risk or vsm
    #[arg(long)]
    intent: Option<String>,

    /// Print the fetched evidence rows after the answer
    #[arg(long)]
    show_evidence: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("floorsight=info".parse()?))
        .init();

    let args = Args::parse();

    // Parse the forced intent up front so a bad token fails before connecting.
    let forced_intent = args
        .intent
        .as_deref()
        .map(str::parse::<Intent>)
        .transpose()?;

    // Load config and connect
    let config = Config::from_env()?;
    let workflow = Workflow::connect(&config).await?;
    info!(model = config.llm_model.as_str(), "Floorsight ready");

    let options = RunOptions {
        line: args.line,
        job: args.job,
        intent: forced_intent,
    };

    if args.goal.is_empty() {
        interactive(&workflow, &options, args.show_evidence).await
    } else {
        let goal = args.goal.join(" ");
        run_goal(&workflow, &goal, &options, args.show_evidence).await?;
        Ok(())
    }
}

async fn run_goal(
    workflow: &Workflow,
    goal: &str,
    options: &RunOptions,
    show_evidence: bool,
) -> Result<(), FloorsightError> {
    let started = Instant::now();
    let state = workflow.run(goal, options).await?;

    if let Some(answer) = &state.answer {
        println!("{}", answer.text);
    }
    if show_evidence {
        println!("\n---\n{}", evidence_payload(&state));
    }

    info!("{}", RunStats::collect(&state, started.elapsed().as_millis()));
    Ok(())
}

async fn interactive(workflow: &Workflow, options: &RunOptions, show_evidence: bool) -> Result<()> {
    println!("floorsight — ask about line status, capacity/WIP, work instructions, supplier risk, or a value-stream map.");
    println!("Type 'exit' to quit.\n");

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("floorsight> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let goal = line.trim();
        if goal.is_empty() {
            continue;
        }
        if goal == "exit" || goal == "quit" {
            break;
        }

        match run_goal(workflow, goal, options, show_evidence).await {
            Ok(()) => {}
            Err(FloorsightError::UnroutableGoal { .. }) => {
                eprintln!(
                    "Could not route that goal. Try asking about line status, capacity/WIP, \
                     work instructions, supplier risk, or a value-stream map."
                );
            }
            Err(err) => {
                eprintln!("Run failed: {err}");
            }
        }
    }

    Ok(())
}
