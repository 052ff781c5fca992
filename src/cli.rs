use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use kube_node_pod::config::ClusterConfig;
use kube_node_pod::ownership::{DEFAULT_MAX_OWNER_DEPTH, OwnerSelection, ResolveOptions};
use kube_node_pod::render::OutputFormat;
use kube_node_pod::report::ReportOptions;

#[derive(Parser)]
#[command(name = "kube-node-pod")]
#[command(about = "kube-node-pod provides an overview of nodes and pods")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(flatten)]
    pub report: ReportArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the node and pod report (default)
    Report,

    /// Print the version number of kube-node-pod
    Version,
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// Path to the kubeconfig file (defaults to KUBECONFIG or ~/.kube/config)
    #[arg(long, global = true)]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub output: OutputFormat,

    /// Do not color node names
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Follow the owner reference flagged as controller instead of the first one
    #[arg(long, global = true)]
    pub prefer_controller: bool,

    /// Show <unknown> for pods whose owners cannot be resolved instead of failing
    #[arg(long, global = true)]
    pub keep_going: bool,

    /// Maximum number of owner references followed per pod
    #[arg(long, default_value_t = DEFAULT_MAX_OWNER_DEPTH, global = true)]
    pub max_owner_depth: usize,
}

impl ReportArgs {
    pub fn cluster_config(&self) -> ClusterConfig {
        ClusterConfig {
            kubeconfig: self.kubeconfig.clone(),
            context: self.context.clone(),
        }
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            resolve: ResolveOptions {
                selection: if self.prefer_controller {
                    OwnerSelection::PreferController
                } else {
                    OwnerSelection::First
                },
                max_depth: self.max_owner_depth,
            },
            keep_going: self.keep_going,
            color: !self.no_color && self.output == OutputFormat::Table,
        }
    }
}
