use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "run-cli")]
#[command(about = "Command line interface for Cloud Run services, jobs and worker pools")]
#[command(version)]
#[command(after_help = "Examples:
  run-cli service list                          # Services in the default region
  run-cli service list --region -               # Services in every region
  run-cli service describe api --format yaml    # One service as YAML
  run-cli service scale api --min 1 --max 10    # Autoscale between 1 and 10
  run-cli job run nightly --wait                # Run a job and wait for it
  run-cli worker-pool scale consumers --instances 3
  run-cli config set project my-project         # Persist a default project
  run-cli info                                  # Active gcloud configuration

Environment Variables:
  RUN_PROJECT        Default project
  RUN_REGION         Default region ('-' for all regions)
  RUN_ACCESS_TOKEN   OAuth access token used instead of gcloud
  RUST_LOG           Log filter (default: warn)")]
pub struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Google Cloud project ID
    #[arg(long, global = true)]
    pub project: Option<String>,

    /// Region code, or '-' for all regions
    #[arg(long, global = true, allow_hyphen_values = true)]
    pub region: Option<String>,

    /// Output format: table, json or yaml
    #[arg(long, global = true)]
    pub format: Option<String>,

    /// Custom configuration directory path
    #[arg(long, global = true)]
    pub config_dir: Option<String>,

    /// Access token to use instead of discovering one
    #[arg(long, global = true)]
    pub access_token: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Overall time limit in seconds for a listing or an operation wait
    #[arg(long, global = true)]
    pub deadline: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Cloud Run services
    Service {
        #[command(subcommand)]
        command: ServiceCommands,
    },
    /// Revisions of a service
    Revision {
        #[command(subcommand)]
        command: RevisionCommands,
    },
    /// Cloud Run jobs
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
    /// Executions of a job
    Execution {
        #[command(subcommand)]
        command: ExecutionCommands,
    },
    /// Cloud Run worker pools
    WorkerPool {
        #[command(subcommand)]
        command: WorkerPoolCommands,
    },
    /// Custom domain mappings
    DomainMapping {
        #[command(subcommand)]
        command: DomainMappingCommands,
    },
    /// Projects visible to the current credentials
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    /// Known Cloud Run regions
    Region {
        #[command(subcommand)]
        command: RegionCommands,
    },
    /// Show the active gcloud configuration and effective settings
    Info,
    /// Configuration management (show, set, unset)
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ServiceCommands {
    /// List services
    List,
    /// Show one service
    Describe {
        /// Service name or full resource path
        name: String,
    },
    /// Change a service's scaling
    #[command(after_help = "Examples:
  run-cli service scale api --manual 3          # Exactly 3 instances
  run-cli service scale api --min 1             # Autoscale from 1, no upper bound
  run-cli service scale api --min 1 --max 10    # Autoscale between 1 and 10")]
    Scale {
        /// Service name or full resource path
        name: String,
        /// Fixed number of instances
        #[arg(long, allow_hyphen_values = true, conflicts_with_all = ["min", "max"])]
        manual: Option<String>,
        /// Minimum instances when autoscaling
        #[arg(long, allow_hyphen_values = true)]
        min: Option<String>,
        /// Maximum instances when autoscaling (0 or empty for no limit)
        #[arg(long, allow_hyphen_values = true, requires = "min")]
        max: Option<String>,
    },
    /// Open the service in the Cloud Console
    Open {
        /// Service name or full resource path
        name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum RevisionCommands {
    /// List revisions of a service
    List {
        /// Service whose revisions to list
        #[arg(long)]
        service: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum JobCommands {
    /// List jobs
    List,
    /// Start an execution of a job
    Run {
        /// Job name or full resource path
        name: String,
        /// Wait for the execution to finish
        #[arg(long)]
        wait: bool,
    },
    /// Open the job in the Cloud Console
    Open {
        /// Job name or full resource path
        name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ExecutionCommands {
    /// List executions of a job
    List {
        /// Job whose executions to list
        #[arg(long)]
        job: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum WorkerPoolCommands {
    /// List worker pools
    List,
    /// Show one worker pool
    Describe {
        /// Worker pool name or full resource path
        name: String,
    },
    /// Set a worker pool's instance count
    Scale {
        /// Worker pool name or full resource path
        name: String,
        /// Number of instances
        #[arg(long, allow_hyphen_values = true)]
        instances: String,
    },
    /// Open the worker pool in the Cloud Console
    Open {
        /// Worker pool name or full resource path
        name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum DomainMappingCommands {
    /// List domain mappings
    List,
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// List projects
    List,
}

#[derive(Subcommand, Debug)]
pub enum RegionCommands {
    /// List known regions
    List {
        /// Only regions containing this text
        #[arg(long)]
        filter: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the configuration file
    Show,
    /// Set configuration values
    #[command(after_help = "Examples:
  run-cli config set project my-project
  run-cli config set region europe-west1
  run-cli config set --project my-project --region - --format json
  run-cli config set --region-errors fail

Keys: project, region, format, timeout_secs, deadline_secs, region_errors")]
    Set {
        /// Key to set
        key: Option<String>,
        /// Value for the key
        #[arg(allow_hyphen_values = true)]
        value: Option<String>,
        /// What to do when some regions fail: ignore, warn or fail
        #[arg(long)]
        region_errors: Option<String>,
    },
    /// Remove a value so it falls back to the environment or gcloud
    Unset {
        /// Key to remove
        key: String,
    },
}
