use std::collections::HashSet;
use std::future::Future;

use thiserror::Error;
use tracing::debug;

use crate::model::{OwnerObject, OwnerRef, PodSnapshot};

/* ============================= CONFIG ============================= */

pub const DEFAULT_MAX_OWNER_DEPTH: usize = 16;

/// Which owner reference to follow when an object lists several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OwnerSelection {
    /// Follow the first listed reference.
    #[default]
    First,
    /// Follow the reference flagged `controller: true`, falling back to the first.
    PreferController,
}

impl OwnerSelection {
    pub fn select<'a>(&self, owners: &'a [OwnerRef]) -> Option<&'a OwnerRef> {
        match self {
            OwnerSelection::First => owners.first(),
            OwnerSelection::PreferController => owners
                .iter()
                .find(|o| o.controller)
                .or_else(|| owners.first()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    pub selection: OwnerSelection,
    pub max_depth: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            selection: OwnerSelection::First,
            max_depth: DEFAULT_MAX_OWNER_DEPTH,
        }
    }
}

/* ============================= ERRORS ============================= */

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to fetch owner {kind}/{name}")]
    Fetch {
        kind: String,
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("owner chain exceeds {limit} levels")]
    TooDeep { limit: usize },

    #[error("owner chain loops back to {kind}/{name}")]
    Cycle { kind: String, name: String },
}

/* ============================= FETCH CAPABILITY ============================= */

/// Looks up the object an owner reference points to.
///
/// `Ok(None)` means the object does not exist (e.g. it was deleted) and ends
/// the walk. Any `Err` aborts resolution for the pod.
pub trait OwnerFetcher {
    fn fetch(
        &self,
        owner: &OwnerRef,
        namespace: &str,
    ) -> impl Future<Output = anyhow::Result<Option<OwnerObject>>> + Send;
}

/* ============================= RESOLUTION ============================= */

/// Walk a pod's owner references up to the root and return the root's kind.
///
/// Returns `""` for a pod without owners. When an owner in the chain no
/// longer exists the last kind that could be fetched is returned.
pub async fn resolve_root_kind<F: OwnerFetcher>(
    pod: &PodSnapshot,
    fetcher: &F,
    opts: &ResolveOptions,
) -> Result<String, ResolveError> {
    let mut owners = pod.owner_refs.clone();
    let mut namespace = pod.namespace.clone();
    let mut kind = String::new();
    let mut visited: HashSet<(String, String, String, String)> = HashSet::new();
    let mut depth = 0;

    while let Some(owner) = opts.selection.select(&owners) {
        let identity = (
            owner.api_version.clone(),
            owner.kind.clone(),
            namespace.clone(),
            owner.name.clone(),
        );
        if !visited.insert(identity) {
            return Err(ResolveError::Cycle {
                kind: owner.kind.clone(),
                name: owner.name.clone(),
            });
        }

        debug!(
            pod = %pod.name,
            kind = %owner.kind,
            name = %owner.name,
            namespace = %namespace,
            "owner_fetch"
        );

        let fetched = fetcher
            .fetch(owner, &namespace)
            .await
            .map_err(|source| ResolveError::Fetch {
                kind: owner.kind.clone(),
                name: owner.name.clone(),
                source,
            })?;

        let Some(obj) = fetched else {
            debug!(pod = %pod.name, kind = %owner.kind, name = %owner.name, "owner_absent");
            break;
        };

        depth += 1;
        if depth > opts.max_depth {
            return Err(ResolveError::TooDeep {
                limit: opts.max_depth,
            });
        }

        kind = obj.kind;
        owners = obj.owner_refs;
        namespace = obj.namespace;
    }

    Ok(kind)
}

/* ============================= TESTS ============================= */
