use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::{Node, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;

/* ============================= NODES ============================= */

/// Taint effect as reported by the API server.
///
/// Values the API server may add in the future are kept verbatim in `Other`
/// so they can still be displayed, but they never satisfy a toleration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaintEffect {
    NoSchedule,
    PreferNoSchedule,
    NoExecute,
    Other(String),
}

impl TaintEffect {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "NoSchedule" => TaintEffect::NoSchedule,
            "PreferNoSchedule" => TaintEffect::PreferNoSchedule,
            "NoExecute" => TaintEffect::NoExecute,
            other => TaintEffect::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaintEffect::NoSchedule => "NoSchedule",
            TaintEffect::PreferNoSchedule => "PreferNoSchedule",
            TaintEffect::NoExecute => "NoExecute",
            TaintEffect::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taint {
    pub key: String,
    pub value: String,
    pub effect: TaintEffect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSnapshot {
    pub name: String,
    pub taints: Vec<Taint>,
}

impl From<&Node> for NodeSnapshot {
    fn from(node: &Node) -> Self {
        let taints = node
            .spec
            .as_ref()
            .and_then(|s| s.taints.as_ref())
            .map(|taints| {
                taints
                    .iter()
                    .map(|t| Taint {
                        key: t.key.clone(),
                        value: t.value.clone().unwrap_or_default(),
                        effect: TaintEffect::parse(&t.effect),
                    })
                    .collect()
            })
            .unwrap_or_default();

        NodeSnapshot {
            name: node.metadata.name.clone().unwrap_or_default(),
            taints,
        }
    }
}

/* ============================= PODS ============================= */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl PodPhase {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("Pending") => PodPhase::Pending,
            Some("Running") => PodPhase::Running,
            Some("Succeeded") => PodPhase::Succeeded,
            Some("Failed") => PodPhase::Failed,
            _ => PodPhase::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PodPhase::Pending => "Pending",
            PodPhase::Running => "Running",
            PodPhase::Succeeded => "Succeeded",
            PodPhase::Failed => "Failed",
            PodPhase::Unknown => "Unknown",
        }
    }
}

/// Toleration operator. An omitted operator means `Equal`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TolerationOperator {
    Exists,
    Equal,
    Other(String),
}

impl TolerationOperator {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None | Some("") | Some("Equal") => TolerationOperator::Equal,
            Some("Exists") => TolerationOperator::Exists,
            Some(other) => TolerationOperator::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toleration {
    /// Empty matches every taint key.
    pub key: String,
    pub value: String,
    pub operator: TolerationOperator,
    /// `None` matches every taint effect.
    pub effect: Option<TaintEffect>,
}

/// Weak reference from an object to the controller managing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerRef {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub controller: bool,
}

impl From<&OwnerReference> for OwnerRef {
    fn from(r: &OwnerReference) -> Self {
        OwnerRef {
            api_version: r.api_version.clone(),
            kind: r.kind.clone(),
            name: r.name.clone(),
            controller: r.controller.unwrap_or(false),
        }
    }
}

pub fn owner_refs(refs: Option<&Vec<OwnerReference>>) -> Vec<OwnerRef> {
    refs.map(|refs| refs.iter().map(OwnerRef::from).collect())
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodSnapshot {
    pub name: String,
    pub namespace: String,
    /// Empty while the pod is unscheduled.
    pub node_name: String,
    pub status: PodPhase,
    pub start_time: Option<DateTime<Utc>>,
    pub tolerations: Vec<Toleration>,
    pub owner_refs: Vec<OwnerRef>,
}

impl From<&Pod> for PodSnapshot {
    fn from(pod: &Pod) -> Self {
        let spec = pod.spec.as_ref();
        let status = pod.status.as_ref();

        let tolerations = spec
            .and_then(|s| s.tolerations.as_ref())
            .map(|tols| {
                tols.iter()
                    .map(|t| Toleration {
                        key: t.key.clone().unwrap_or_default(),
                        value: t.value.clone().unwrap_or_default(),
                        operator: TolerationOperator::parse(t.operator.as_deref()),
                        effect: t
                            .effect
                            .as_deref()
                            .filter(|e| !e.is_empty())
                            .map(TaintEffect::parse),
                    })
                    .collect()
            })
            .unwrap_or_default();

        PodSnapshot {
            name: pod.metadata.name.clone().unwrap_or_default(),
            namespace: pod.metadata.namespace.clone().unwrap_or_default(),
            node_name: spec
                .and_then(|s| s.node_name.clone())
                .unwrap_or_default(),
            status: PodPhase::parse(status.and_then(|s| s.phase.as_deref())),
            start_time: status.and_then(|s| s.start_time.as_ref()).map(|t| t.0),
            tolerations,
            owner_refs: owner_refs(pod.metadata.owner_references.as_ref()),
        }
    }
}

/* ============================= OWNERS ============================= */

/// The parts of a fetched owner object the ownership walk needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerObject {
    pub kind: String,
    pub name: String,
    /// Empty for cluster-scoped objects.
    pub namespace: String,
    pub owner_refs: Vec<OwnerRef>,
}

/* ============================= SUMMARIES ============================= */

/// `key:value` pairs joined by `,`; entries with neither key nor value are skipped.
pub fn summarize_taints(taints: &[Taint]) -> String {
    join_pairs(taints.iter().map(|t| (t.key.as_str(), t.value.as_str())))
}

pub fn summarize_tolerations(tolerations: &[Toleration]) -> String {
    join_pairs(tolerations.iter().map(|t| (t.key.as_str(), t.value.as_str())))
}

fn join_pairs<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    pairs
        .filter(|(k, v)| !(k.is_empty() && v.is_empty()))
        .map(|(k, v)| format!("{k}:{v}"))
        .collect::<Vec<_>>()
        .join(",")
}

/* ============================= TESTS ============================= */
