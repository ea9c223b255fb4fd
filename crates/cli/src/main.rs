mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{cmd_build, cmd_create_services, cmd_k8s, cmd_names};
use output::OutputFormat;

/// cloudmodel - Compile deployment descriptors into cloud models
#[derive(Parser)]
#[command(name = "cloudmodel")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

/// Files every command reads.
#[derive(Args, Debug, Clone)]
pub struct Inputs {
  /// Path to the deployment descriptor (default: mtad.yaml)
  #[arg(default_value = "mtad.yaml")]
  pub descriptor: PathBuf,

  /// Settings file with the model switches and the deployment target
  #[arg(short, long, default_value = "cloudmodel.yaml")]
  pub config: PathBuf,

  /// State of the previous deployment, used to keep existing routes
  #[arg(long)]
  pub deployed: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
  /// Build the cloud model of a descriptor
  Build {
    #[command(flatten)]
    inputs: Inputs,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "json")]
    output: OutputFormat,
  },

  /// Print the Kubernetes manifests of a descriptor as YAML
  K8s {
    #[command(flatten)]
    inputs: Inputs,
  },

  /// Show the platform names of the service resources
  Names {
    #[command(flatten)]
    inputs: Inputs,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Create the managed services of a descriptor on the target
  CreateServices {
    #[command(flatten)]
    inputs: Inputs,

    /// Bearer token for the cloud controller
    #[arg(long, env = "CLOUDMODEL_TOKEN", hide_env_values = true)]
    token: String,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Build { inputs, output } => cmd_build(&inputs, output),
    Commands::K8s { inputs } => cmd_k8s(&inputs),
    Commands::Names { inputs, output } => cmd_names(&inputs, output),
    Commands::CreateServices { inputs, token } => cmd_create_services(&inputs, &token),
  }
}
