use std::collections::HashMap;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::eligibility;
use crate::model::{NodeSnapshot, PodSnapshot, summarize_taints, summarize_tolerations};
use crate::ownership::{self, OwnerFetcher, ResolveOptions};

/* ============================= CONSTANTS ============================= */

pub const ALL_PODS: &str = "*";
pub const NO_PODS: &str = "<none>";
pub const UNKNOWN_AGE: &str = "<unknown>";
pub const UNKNOWN_KIND: &str = "<unknown>";

/// Number of foreground colors node names cycle through.
pub const NODE_COLOR_COUNT: usize = 6;

/* ============================= TYPES ============================= */

/// Pods permitted on a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowedPods {
    /// The node has no taints.
    All,
    Only(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeRow {
    pub name: String,
    #[serde(skip)]
    pub color: Option<u8>,
    pub taints: String,
    pub allowed: AllowedPods,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PodRecord {
    pub name: String,
    pub namespace: String,
    pub node_name: String,
    #[serde(skip)]
    pub node_color: Option<u8>,
    pub status: String,
    pub age: String,
    pub tolerations: String,
    pub owner_kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub nodes: Vec<NodeRow>,
    pub pods: Vec<PodRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    pub resolve: ResolveOptions,
    /// Report `<unknown>` for pods whose owners cannot be resolved instead of failing.
    pub keep_going: bool,
    pub color: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            resolve: ResolveOptions::default(),
            keep_going: false,
            color: true,
        }
    }
}

/* ============================= COLOR ============================= */

/// Index into the node color palette for the node at `ordinal`.
pub fn color_index(ordinal: usize) -> u8 {
    (ordinal % NODE_COLOR_COUNT) as u8
}

/* ============================= AGE ============================= */

/// Coarse age in the largest whole unit: days, hours, then minutes.
pub fn format_age(start: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(start) = start else {
        return UNKNOWN_AGE.to_string();
    };

    let secs = now.signed_duration_since(start).num_seconds().max(0);
    let (days, hours, minutes) = (secs / 86_400, secs / 3_600, secs / 60);

    if days > 0 {
        format!("{days}d")
    } else if hours > 0 {
        format!("{hours}h")
    } else {
        format!("{minutes}m")
    }
}

/* ============================= ASSEMBLY ============================= */

/// Which pods each node admits, in node order.
pub fn node_eligibility(nodes: &[NodeSnapshot], pods: &[PodSnapshot], color: bool) -> Vec<NodeRow> {
    nodes
        .iter()
        .enumerate()
        .map(|(ordinal, node)| {
            let allowed = if node.taints.is_empty() {
                AllowedPods::All
            } else {
                AllowedPods::Only(
                    pods.iter()
                        .filter(|p| eligibility::matches(&node.taints, &p.tolerations))
                        .map(|p| p.name.clone())
                        .collect(),
                )
            };

            NodeRow {
                name: node.name.clone(),
                color: color.then(|| color_index(ordinal)),
                taints: summarize_taints(&node.taints),
                allowed,
            }
        })
        .collect()
}

/// Sort pods by node name, keeping snapshot order among pods on the same node.
pub fn sort_by_node(pods: &mut [PodSnapshot]) {
    pods.sort_by(|a, b| a.node_name.cmp(&b.node_name));
}

/// Join node and pod snapshots into the rows of the report.
///
/// Owner lookups run one pod at a time, in output order.
pub async fn assemble<F: OwnerFetcher>(
    nodes: &[NodeSnapshot],
    mut pods: Vec<PodSnapshot>,
    fetcher: &F,
    opts: &ReportOptions,
    now: DateTime<Utc>,
) -> anyhow::Result<Report> {
    let node_rows = node_eligibility(nodes, &pods, opts.color);

    let colors: HashMap<&str, Option<u8>> = node_rows
        .iter()
        .map(|row| (row.name.as_str(), row.color))
        .collect();

    sort_by_node(&mut pods);

    let mut records = Vec::with_capacity(pods.len());
    for pod in &pods {
        let owner_kind = match ownership::resolve_root_kind(pod, fetcher, &opts.resolve).await {
            Ok(kind) => kind,
            Err(e) if opts.keep_going => {
                warn!(
                    pod = %pod.name,
                    namespace = %pod.namespace,
                    error = %e,
                    "owner_resolution_failed"
                );
                UNKNOWN_KIND.to_string()
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!(
                        "Failed to resolve owner of pod '{}/{}'",
                        pod.namespace, pod.name
                    )
                });
            }
        };

        records.push(PodRecord {
            name: pod.name.clone(),
            namespace: pod.namespace.clone(),
            node_name: pod.node_name.clone(),
            node_color: colors.get(pod.node_name.as_str()).copied().flatten(),
            status: pod.status.as_str().to_string(),
            age: format_age(pod.start_time, now),
            tolerations: summarize_tolerations(&pod.tolerations),
            owner_kind,
        });
    }

    info!(nodes = node_rows.len(), pods = records.len(), "report_assembled");

    Ok(Report {
        nodes: node_rows,
        pods: records,
    })
}

/* ============================= TESTS ============================= */
