use anyhow::Context;
use k8s_openapi::api::core::v1::{Node, Pod};
use kube::api::ListParams;
use kube::{Api, Client};
use tracing::info;

use crate::model::{NodeSnapshot, PodSnapshot};

/// One-shot listing of every node and every pod in the cluster.
pub struct ClusterSnapshot {
    client: Client,
}

impl ClusterSnapshot {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn list_nodes(&self) -> anyhow::Result<Vec<NodeSnapshot>> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        let node_list = nodes
            .list(&ListParams::default())
            .await
            .context("Failed to list nodes. Check RBAC permissions.")?;

        let snapshots: Vec<NodeSnapshot> = node_list.items.iter().map(NodeSnapshot::from).collect();
        info!(count = snapshots.len(), "nodes_listed");
        Ok(snapshots)
    }

    pub async fn list_pods(&self) -> anyhow::Result<Vec<PodSnapshot>> {
        let pods: Api<Pod> = Api::all(self.client.clone());
        let pod_list = pods
            .list(&ListParams::default())
            .await
            .context("Failed to list pods. Check RBAC permissions.")?;

        let snapshots: Vec<PodSnapshot> = pod_list.items.iter().map(PodSnapshot::from).collect();
        info!(count = snapshots.len(), "pods_listed");
        Ok(snapshots)
    }
}
