use std::path::PathBuf;

use anyhow::Context;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::debug;

/// Selects the cluster to report on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterConfig {
    /// Explicit kubeconfig file. When unset, `KUBECONFIG`, `~/.kube/config`
    /// and the in-cluster environment are tried in that order.
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
}

impl ClusterConfig {
    fn options(&self) -> KubeConfigOptions {
        KubeConfigOptions {
            context: self.context.clone(),
            ..Default::default()
        }
    }

    pub async fn load(&self) -> anyhow::Result<Config> {
        match (&self.kubeconfig, &self.context) {
            (Some(path), _) => {
                debug!(path = %path.display(), "kubeconfig_explicit");
                let kubeconfig = Kubeconfig::read_from(path)
                    .with_context(|| format!("Cannot read kubeconfig '{}'", path.display()))?;
                Config::from_custom_kubeconfig(kubeconfig, &self.options())
                    .await
                    .context("Invalid kubeconfig")
            }
            (None, Some(context)) => {
                debug!(context = %context, "kubeconfig_context");
                Config::from_kubeconfig(&self.options())
                    .await
                    .with_context(|| format!("Cannot load kubeconfig context '{context}'"))
            }
            (None, None) => Config::infer()
                .await
                .context("Cannot infer cluster configuration. Is your kubeconfig valid?"),
        }
    }

    pub async fn client(&self) -> anyhow::Result<Client> {
        let config = self.load().await?;
        Client::try_from(config)
            .context("Failed to connect to Kubernetes cluster. Is your kubeconfig valid?")
    }
}
