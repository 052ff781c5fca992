use std::collections::HashMap;

use k8s_openapi::api::core::v1::{
    Node, NodeSpec, Pod, PodSpec, PodStatus, Taint, Toleration,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube_node_pod::model::{OwnerObject, OwnerRef, owner_refs};
use kube_node_pod::ownership::OwnerFetcher;

#[allow(dead_code)]
pub fn make_test_node(name: &str, taints: &[(&str, &str, &str)]) -> Node {
    let taints: Vec<Taint> = taints
        .iter()
        .map(|(key, value, effect)| Taint {
            key: key.to_string(),
            value: Some(value.to_string()),
            effect: effect.to_string(),
            ..Default::default()
        })
        .collect();

    Node {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        spec: Some(NodeSpec {
            taints: if taints.is_empty() { None } else { Some(taints) },
            ..Default::default()
        }),
        status: None,
    }
}

/// Toleration tuple: (key, operator, value, effect).
#[allow(dead_code)]
pub fn make_test_pod(
    name: &str,
    namespace: &str,
    node_name: &str,
    tolerations: &[(&str, &str, &str, &str)],
) -> Pod {
    let tolerations: Vec<Toleration> = tolerations
        .iter()
        .map(|(key, operator, value, effect)| Toleration {
            key: Some(key.to_string()),
            operator: Some(operator.to_string()),
            value: Some(value.to_string()),
            effect: Some(effect.to_string()),
            ..Default::default()
        })
        .collect();

    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec: Some(PodSpec {
            node_name: if node_name.is_empty() { None } else { Some(node_name.to_string()) },
            tolerations: Some(tolerations),
            ..Default::default()
        }),
        status: Some(PodStatus {
            phase: Some("Running".to_string()),
            ..Default::default()
        }),
    }
}

#[allow(dead_code)]
pub fn owner_reference(api_version: &str, kind: &str, name: &str) -> OwnerReference {
    OwnerReference {
        api_version: api_version.to_string(),
        kind: kind.to_string(),
        name: name.to_string(),
        uid: format!("{}-uid", name),
        controller: Some(true),
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn with_owner(mut pod: Pod, owner: OwnerReference) -> Pod {
    pod.metadata
        .owner_references
        .get_or_insert_with(Vec::new)
        .push(owner);
    pod
}

/// In-memory owner store keyed by (namespace, kind, name).
#[allow(dead_code)]
#[derive(Default)]
pub struct FakeOwners {
    objects: HashMap<(String, String, String), OwnerObject>,
    failing_kinds: Vec<String>,
}

#[allow(dead_code)]
impl FakeOwners {
    pub fn insert(
        mut self,
        namespace: &str,
        kind: &str,
        name: &str,
        owners: Vec<OwnerReference>,
    ) -> Self {
        self.objects.insert(
            (namespace.to_string(), kind.to_string(), name.to_string()),
            OwnerObject {
                kind: kind.to_string(),
                name: name.to_string(),
                namespace: namespace.to_string(),
                owner_refs: owner_refs(Some(&owners)),
            },
        );
        self
    }

    /// Lookups of this kind fail as if the kind had no REST mapping.
    pub fn failing(mut self, kind: &str) -> Self {
        self.failing_kinds.push(kind.to_string());
        self
    }
}

impl OwnerFetcher for FakeOwners {
    async fn fetch(
        &self,
        owner: &OwnerRef,
        namespace: &str,
    ) -> anyhow::Result<Option<OwnerObject>> {
        if self.failing_kinds.contains(&owner.kind) {
            anyhow::bail!("no matches for kind \"{}\" in version \"{}\"", owner.kind, owner.api_version);
        }
        Ok(self
            .objects
            .get(&(namespace.to_string(), owner.kind.clone(), owner.name.clone()))
            .cloned())
    }
}
