use std::collections::HashMap;

use anyhow::Context;
use kube::api::{Api, DynamicObject};
use kube::core::GroupVersionKind;
use kube::discovery::{self, ApiResource, Scope};
use kube::Client;
use tokio::sync::Mutex;
use tracing::debug;

use crate::model::{OwnerObject, OwnerRef, owner_refs};
use crate::ownership::OwnerFetcher;

/* ============================= API VERSION ============================= */

/// Split an `apiVersion` such as `apps/v1` into `(group, version)`.
///
/// The core group has no prefix, so `v1` yields `("", "v1")`.
pub fn parse_api_version(api_version: &str) -> anyhow::Result<(String, String)> {
    let mut parts = api_version.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(version), None, None) => Ok((String::new(), version.to_string())),
        (Some(group), Some(version), None) => Ok((group.to_string(), version.to_string())),
        _ => anyhow::bail!("unexpected apiVersion '{api_version}'"),
    }
}

/* ============================= FETCHER ============================= */

/// Resolves owner references against the live cluster.
///
/// Kinds are mapped to REST resources through API discovery once per
/// group/version/kind and reused for the rest of the run.
pub struct KubeOwnerFetcher {
    client: Client,
    mappings: Mutex<HashMap<(String, String, String), (ApiResource, bool)>>,
}

impl KubeOwnerFetcher {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            mappings: Mutex::new(HashMap::new()),
        }
    }

    async fn mapping(&self, owner: &OwnerRef) -> anyhow::Result<(ApiResource, bool)> {
        let (group, version) = parse_api_version(&owner.api_version)?;
        let key = (group.clone(), version.clone(), owner.kind.clone());

        let mut mappings = self.mappings.lock().await;
        if let Some(found) = mappings.get(&key) {
            return Ok(found.clone());
        }

        let gvk = GroupVersionKind::gvk(&group, &version, &owner.kind);
        let (resource, caps) = discovery::pinned_kind(&self.client, &gvk)
            .await
            .with_context(|| {
                format!(
                    "No resource mapping for kind '{}' in '{}'",
                    owner.kind, owner.api_version
                )
            })?;
        let namespaced = matches!(caps.scope, Scope::Namespaced);

        debug!(
            api_version = %owner.api_version,
            kind = %owner.kind,
            plural = %resource.plural,
            namespaced,
            "resource_mapped"
        );

        mappings.insert(key, (resource.clone(), namespaced));
        Ok((resource, namespaced))
    }
}

impl OwnerFetcher for KubeOwnerFetcher {
    async fn fetch(
        &self,
        owner: &OwnerRef,
        namespace: &str,
    ) -> anyhow::Result<Option<OwnerObject>> {
        let (resource, namespaced) = self.mapping(owner).await?;

        let api: Api<DynamicObject> = if namespaced {
            if namespace.is_empty() {
                anyhow::bail!(
                    "{} '{}' is namespaced but was referenced without a namespace",
                    owner.kind,
                    owner.name
                );
            }
            Api::namespaced_with(self.client.clone(), namespace, &resource)
        } else {
            Api::all_with(self.client.clone(), &resource)
        };

        let obj = api
            .get_opt(&owner.name)
            .await
            .with_context(|| format!("Failed to get {} '{}'", owner.kind, owner.name))?;

        Ok(obj.map(|obj| OwnerObject {
            kind: obj
                .types
                .as_ref()
                .map(|t| t.kind.clone())
                .filter(|k| !k.is_empty())
                .unwrap_or_else(|| resource.kind.clone()),
            name: obj.metadata.name.clone().unwrap_or_default(),
            namespace: obj.metadata.namespace.clone().unwrap_or_default(),
            owner_refs: owner_refs(obj.metadata.owner_references.as_ref()),
        }))
    }
}

/* ============================= TESTS ============================= */

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Request, Response};
    use hyper::Body;
    use serde_json::{Value, json};
    use tower_test::mock;

    type ApiServer = mock::Handle<Request<Body>, Response<Body>>;

    fn mock_fetcher() -> (KubeOwnerFetcher, ApiServer) {
        let (service, handle) = mock::pair::<Request<Body>, Response<Body>>();
        (KubeOwnerFetcher::new(Client::new(service, "default")), handle)
    }

    async fn expect_get(server: &mut ApiServer, path: &str, status: u16, body: Value) {
        let (request, send) = server.next_request().await.expect("request expected");
        assert_eq!(request.method(), http::Method::GET);
        assert_eq!(request.uri().path(), path);
        send.send_response(
            Response::builder()
                .status(status)
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        );
    }

    fn apps_v1_resources() -> Value {
        json!({
            "kind": "APIResourceList",
            "apiVersion": "v1",
            "groupVersion": "apps/v1",
            "resources": [
                { "name": "replicasets", "singularName": "replicaset", "namespaced": true,
                  "kind": "ReplicaSet", "verbs": ["get", "list"] },
                { "name": "replicasets/status", "singularName": "", "namespaced": true,
                  "kind": "ReplicaSet", "verbs": ["get"] },
                { "name": "deployments", "singularName": "deployment", "namespaced": true,
                  "kind": "Deployment", "verbs": ["get", "list"] }
            ]
        })
    }

    fn core_v1_resources() -> Value {
        json!({
            "kind": "APIResourceList",
            "groupVersion": "v1",
            "resources": [
                { "name": "nodes", "singularName": "node", "namespaced": false,
                  "kind": "Node", "verbs": ["get", "list"] }
            ]
        })
    }

    fn replica_set(name: &str) -> Value {
        json!({
            "apiVersion": "apps/v1",
            "kind": "ReplicaSet",
            "metadata": {
                "name": name,
                "namespace": "prod",
                "ownerReferences": [{
                    "apiVersion": "apps/v1",
                    "kind": "Deployment",
                    "name": "web",
                    "uid": "dep-uid",
                    "controller": true
                }]
            }
        })
    }

    fn not_found(name: &str) -> Value {
        json!({
            "kind": "Status",
            "apiVersion": "v1",
            "metadata": {},
            "status": "Failure",
            "message": format!("replicasets.apps \"{name}\" not found"),
            "reason": "NotFound",
            "code": 404
        })
    }

    fn owner(api_version: &str, kind: &str, name: &str) -> OwnerRef {
        OwnerRef {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            name: name.to_string(),
            controller: true,
        }
    }

    #[tokio::test]
    async fn test_namespaced_owner_fetched_from_namespace_endpoint() {
        let (fetcher, mut server) = mock_fetcher();
        let api = tokio::spawn(async move {
            expect_get(&mut server, "/apis/apps/v1", 200, apps_v1_resources()).await;
            expect_get(
                &mut server,
                "/apis/apps/v1/namespaces/prod/replicasets/web-5d4f8b9c7f",
                200,
                replica_set("web-5d4f8b9c7f"),
            )
            .await;
        });

        let obj = fetcher
            .fetch(&owner("apps/v1", "ReplicaSet", "web-5d4f8b9c7f"), "prod")
            .await
            .unwrap()
            .expect("owner exists");
        api.await.unwrap();

        assert_eq!(obj.kind, "ReplicaSet");
        assert_eq!(obj.namespace, "prod");
        assert_eq!(obj.owner_refs.len(), 1);
        assert_eq!(obj.owner_refs[0].kind, "Deployment");
        assert!(obj.owner_refs[0].controller);
    }

    #[tokio::test]
    async fn test_cluster_scoped_owner_ignores_namespace() {
        let (fetcher, mut server) = mock_fetcher();
        let api = tokio::spawn(async move {
            expect_get(&mut server, "/api/v1", 200, core_v1_resources()).await;
            expect_get(
                &mut server,
                "/api/v1/nodes/n1",
                200,
                json!({ "apiVersion": "v1", "kind": "Node", "metadata": { "name": "n1" } }),
            )
            .await;
        });

        let obj = fetcher
            .fetch(&owner("v1", "Node", "n1"), "prod")
            .await
            .unwrap()
            .expect("owner exists");
        api.await.unwrap();

        assert_eq!(obj.kind, "Node");
        assert_eq!(obj.namespace, "");
        assert!(obj.owner_refs.is_empty());
    }

    #[tokio::test]
    async fn test_missing_owner_is_absent() {
        let (fetcher, mut server) = mock_fetcher();
        let api = tokio::spawn(async move {
            expect_get(&mut server, "/apis/apps/v1", 200, apps_v1_resources()).await;
            expect_get(
                &mut server,
                "/apis/apps/v1/namespaces/prod/replicasets/gone",
                404,
                not_found("gone"),
            )
            .await;
        });

        let obj = fetcher
            .fetch(&owner("apps/v1", "ReplicaSet", "gone"), "prod")
            .await
            .unwrap();
        api.await.unwrap();

        assert!(obj.is_none());
    }

    #[tokio::test]
    async fn test_mapping_discovered_once_per_kind() {
        let (fetcher, mut server) = mock_fetcher();
        let api = tokio::spawn(async move {
            expect_get(&mut server, "/apis/apps/v1", 200, apps_v1_resources()).await;
            expect_get(
                &mut server,
                "/apis/apps/v1/namespaces/prod/replicasets/rs-a",
                200,
                replica_set("rs-a"),
            )
            .await;
            expect_get(
                &mut server,
                "/apis/apps/v1/namespaces/prod/replicasets/rs-b",
                200,
                replica_set("rs-b"),
            )
            .await;
            assert!(server.next_request().await.is_none());
        });

        let a = fetcher
            .fetch(&owner("apps/v1", "ReplicaSet", "rs-a"), "prod")
            .await
            .unwrap();
        let b = fetcher
            .fetch(&owner("apps/v1", "ReplicaSet", "rs-b"), "prod")
            .await
            .unwrap();
        drop(fetcher);
        api.await.unwrap();

        assert_eq!(a.map(|o| o.name).as_deref(), Some("rs-a"));
        assert_eq!(b.map(|o| o.name).as_deref(), Some("rs-b"));
    }

    #[tokio::test]
    async fn test_namespaced_owner_without_namespace_is_rejected() {
        let (fetcher, mut server) = mock_fetcher();
        let api = tokio::spawn(async move {
            expect_get(&mut server, "/apis/apps/v1", 200, apps_v1_resources()).await;
            assert!(server.next_request().await.is_none());
        });

        let err = fetcher
            .fetch(&owner("apps/v1", "ReplicaSet", "rs1"), "")
            .await
            .unwrap_err();
        drop(fetcher);
        api.await.unwrap();

        assert!(err.to_string().contains("without a namespace"));
    }

    #[tokio::test]
    async fn test_unknown_kind_has_no_mapping() {
        let (fetcher, mut server) = mock_fetcher();
        let api = tokio::spawn(async move {
            expect_get(&mut server, "/apis/apps/v1", 200, apps_v1_resources()).await;
        });

        let err = fetcher
            .fetch(&owner("apps/v1", "Widget", "w1"), "prod")
            .await
            .unwrap_err();
        api.await.unwrap();

        assert!(err.to_string().contains("No resource mapping for kind 'Widget'"));
    }

    #[test]
    fn test_parse_grouped_api_version() {
        let (group, version) = parse_api_version("apps/v1").unwrap();
        assert_eq!(group, "apps");
        assert_eq!(version, "v1");
    }

    #[test]
    fn test_parse_core_api_version() {
        let (group, version) = parse_api_version("v1").unwrap();
        assert_eq!(group, "");
        assert_eq!(version, "v1");
    }

    #[test]
    fn test_parse_crd_api_version() {
        let (group, version) = parse_api_version("batch.volcano.sh/v1alpha1").unwrap();
        assert_eq!(group, "batch.volcano.sh");
        assert_eq!(version, "v1alpha1");
    }

    #[test]
    fn test_parse_rejects_extra_segments() {
        assert!(parse_api_version("a/b/c").is_err());
    }
}
