use std::io::Write;

use anyhow::Context;
use chrono::Utc;
use tracing::info;

use kube_node_pod::discovery::KubeOwnerFetcher;
use kube_node_pod::render;
use kube_node_pod::report;
use kube_node_pod::snapshot::ClusterSnapshot;

use crate::cli::ReportArgs;

pub async fn run(args: &ReportArgs) -> anyhow::Result<()> {
    info!("report_starting");

    let client = args.cluster_config().client().await?;
    let snapshot = ClusterSnapshot::new(client.clone());

    let nodes = snapshot.list_nodes().await?;
    let pods = snapshot.list_pods().await?;

    let fetcher = KubeOwnerFetcher::new(client);
    let report = report::assemble(&nodes, pods, &fetcher, &args.report_options(), Utc::now()).await?;

    let out = render::render(&report, args.output)?;
    std::io::stdout()
        .lock()
        .write_all(out.as_bytes())
        .context("Failed to write report")?;

    Ok(())
}
