use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;

use wayfarer_client::{
  AgentService, PollOptions, RunHandle, RunStatus, WorkflowHandle, WorkflowRunClient,
};
use wayfarer_config::{ClientConfig, WorkflowDefinition, example_workflows};
use wayfarer_http::HttpAgentService;

/// Wayfarer - create and run workflows on a remote agent service
#[derive(Parser)]
#[command(name = "wayfarer")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Agent to create workflows for (default: $WAYFARER_AGENT or "ceres")
  #[arg(long, global = true)]
  agent: Option<String>,

  /// Base URL of the agent API (default: $ASTEROID_BASE_URL)
  #[arg(long, global = true)]
  base_url: Option<String>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// List the built-in example workflows
  Examples,

  /// Create a workflow and print its ID
  Create {
    /// Path to a workflow definition (JSON)
    #[arg(required_unless_present = "example", conflicts_with = "example")]
    workflow_file: Option<PathBuf>,

    /// Create an example workflow instead (see `wayfarer examples`)
    #[arg(long)]
    example: Option<usize>,
  },

  /// Trigger a run, wait for it to finish and print its result
  Run {
    /// The workflow ID to run
    workflow_id: String,

    /// Run parameters as a JSON object (default: stdin, or {})
    #[arg(long)]
    input: Option<String>,

    #[command(flatten)]
    poll: PollArgs,
  },

  /// Print the current status of a run
  Status {
    /// The run ID
    run_id: String,
  },

  /// Wait for a run to finish and print its result
  #[command(name = "result")]
  Fetch {
    /// The run ID
    run_id: String,

    #[command(flatten)]
    poll: PollArgs,
  },
}

#[derive(clap::Args)]
struct PollArgs {
  /// Milliseconds between status queries
  #[arg(long)]
  interval_ms: Option<u64>,

  /// Give up after this many status queries
  #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
  max_attempts: Option<u32>,
}

impl PollArgs {
  fn apply(&self, mut options: PollOptions) -> PollOptions {
    if let Some(interval_ms) = self.interval_ms {
      options.interval = Duration::from_millis(interval_ms);
    }
    if let Some(max_attempts) = self.max_attempts {
      options.max_attempts = Some(max_attempts);
    }
    options
  }
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into()),
    )
    .with_writer(io::stderr)
    .init();

  match cli.command {
    Some(Commands::Examples) => list_examples(),
    Some(Commands::Create {
      workflow_file,
      example,
    }) => {
      let definition = load_definition(workflow_file, example)?;
      let config = load_config(cli.agent, cli.base_url)?;
      block_on(create_workflow(config, definition))?;
    }
    Some(Commands::Run {
      workflow_id,
      input,
      poll,
    }) => {
      let input = read_input(input)?;
      let config = load_config(cli.agent, cli.base_url)?;
      block_on(run_workflow(config, workflow_id, input, poll))?;
    }
    Some(Commands::Status { run_id }) => {
      let config = load_config(cli.agent, cli.base_url)?;
      block_on(show_status(config, run_id))?;
    }
    Some(Commands::Fetch { run_id, poll }) => {
      let config = load_config(cli.agent, cli.base_url)?;
      block_on(fetch_result(config, run_id, poll))?;
    }
    None => {
      println!("wayfarer - use --help to see available commands");
    }
  }

  Ok(())
}

fn block_on<F: std::future::Future<Output = Result<()>>>(future: F) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(future)
}

fn load_config(agent: Option<String>, base_url: Option<String>) -> Result<ClientConfig> {
  let mut config = ClientConfig::from_env().context("failed to load configuration")?;

  if let Some(agent) = agent {
    config.agent_name = agent;
  }
  if let Some(base_url) = base_url {
    config.base_url = base_url.trim_end_matches('/').to_string();
  }

  Ok(config)
}

fn build_client(config: &ClientConfig) -> Result<WorkflowRunClient<HttpAgentService>> {
  let service = HttpAgentService::new(config).context("failed to build agent service")?;
  Ok(WorkflowRunClient::from_config(service, config))
}

fn list_examples() {
  for (index, workflow) in example_workflows().iter().enumerate() {
    println!("{}. {}", index + 1, workflow.name);
  }
}

fn load_definition(
  workflow_file: Option<PathBuf>,
  example: Option<usize>,
) -> Result<WorkflowDefinition> {
  if let Some(choice) = example {
    let workflows = example_workflows();
    return choice
      .checked_sub(1)
      .and_then(|index| workflows.into_iter().nth(index))
      .with_context(|| format!("no example workflow numbered {}", choice));
  }

  let Some(workflow_file) = workflow_file else {
    bail!("either a workflow file or --example is required");
  };

  let content = std::fs::read_to_string(&workflow_file)
    .with_context(|| format!("failed to read workflow file: {}", workflow_file.display()))?;

  serde_json::from_str(&content)
    .with_context(|| format!("failed to parse workflow file: {}", workflow_file.display()))
}

async fn create_workflow(config: ClientConfig, definition: WorkflowDefinition) -> Result<()> {
  let client = build_client(&config)?;

  eprintln!("Creating workflow: {}", definition.name);

  let workflow = client
    .create_workflow(&definition)
    .await
    .context("workflow creation failed")?;

  println!("{}", workflow);

  Ok(())
}

async fn run_workflow(
  config: ClientConfig,
  workflow_id: String,
  input: serde_json::Value,
  poll: PollArgs,
) -> Result<()> {
  let client = build_client(&config)?;
  let options = poll.apply(client.poll_options().clone());
  let cancel = cancel_on_ctrl_c();

  let mut run = client
    .trigger_run(&WorkflowHandle::new(workflow_id), input)
    .await
    .context("failed to trigger run")?;

  eprintln!("Run started: {}", run);

  finish_run(&client, &mut run, &options, &cancel).await
}

async fn show_status(config: ClientConfig, run_id: String) -> Result<()> {
  let service = HttpAgentService::new(&config).context("failed to build agent service")?;

  let status = service
    .get_run_status(&run_id)
    .await
    .with_context(|| format!("failed to get status of run {}", run_id))?;

  println!("{}", status);

  Ok(())
}

async fn fetch_result(config: ClientConfig, run_id: String, poll: PollArgs) -> Result<()> {
  let client = build_client(&config)?;
  let options = poll.apply(client.poll_options().clone());
  let cancel = cancel_on_ctrl_c();
  let mut run = RunHandle::new(run_id);

  finish_run(&client, &mut run, &options, &cancel).await
}

/// Wait for a run and print its result as JSON.
async fn finish_run(
  client: &WorkflowRunClient<HttpAgentService>,
  run: &mut RunHandle,
  options: &PollOptions,
  cancel: &CancellationToken,
) -> Result<()> {
  let status = client
    .await_completion(run, options, cancel)
    .await
    .with_context(|| format!("failed while waiting for run {}", run))?;

  if status != RunStatus::Completed {
    bail!("run {} finished with status {}", run, status);
  }

  let result = client
    .fetch_result(run)
    .await
    .with_context(|| format!("failed to fetch result of run {}", run))?;

  eprintln!("Run completed: {}", run);
  println!("{}", serde_json::to_string_pretty(&result.payload)?);

  Ok(())
}

/// A token that is cancelled on the first Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
  let cancel = CancellationToken::new();
  let token = cancel.clone();

  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      info!("interrupt received, stopping at next poll");
      token.cancel();
    }
  });

  cancel
}

fn read_input(input: Option<String>) -> Result<serde_json::Value> {
  use std::io::IsTerminal;

  if let Some(input) = input {
    return serde_json::from_str(&input).context("failed to parse --input JSON");
  }

  if io::stdin().is_terminal() {
    // No stdin pipe, use empty object
    Ok(serde_json::json!({}))
  } else {
    let mut input = String::new();
    io::stdin()
      .read_to_string(&mut input)
      .context("failed to read input from stdin")?;

    if input.trim().is_empty() {
      Ok(serde_json::json!({}))
    } else {
      serde_json::from_str(&input).context("failed to parse input JSON from stdin")
    }
  }
}
