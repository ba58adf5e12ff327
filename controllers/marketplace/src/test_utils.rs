//! Test helpers shared by the controller unit tests.

use crate::cluster::{ClusterClient, ClusterError};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use crds::{
    CatalogSourceConfig, ObjectPhase, OperatorSource, OperatorSourceSpec, OperatorSourceStatus, Phase, PhaseName,
};
use k8s_openapi::api::core::v1::ConfigMap;
use kube::ResourceExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Registry endpoint used by test objects
pub const TEST_ENDPOINT: &str = "https://quay.io/cnr";

/// Fixed "now" for deterministic timestamps
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

/// An hour before [`fixed_now`]
pub fn earlier() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 11, 0, 0).unwrap()
}

/// OperatorSource with a uid, pointing at `TEST_ENDPOINT`, recorded in `phase`.
/// `Initial` yields an object without status.
pub fn operator_source(namespace: &str, name: &str, phase: PhaseName) -> OperatorSource {
    let mut opsrc = OperatorSource::new(
        name,
        OperatorSourceSpec {
            source_type: "appregistry".to_string(),
            endpoint: TEST_ENDPOINT.to_string(),
            registry_namespace: "community".to_string(),
            display_name: Some("Community Operators".to_string()),
            publisher: Some("Red Hat".to_string()),
        },
    );
    opsrc.metadata.namespace = Some(namespace.to_string());
    opsrc.metadata.uid = Some(format!("uid-{namespace}-{name}"));
    if phase != PhaseName::Initial {
        opsrc.status = Some(OperatorSourceStatus {
            current_phase: ObjectPhase {
                phase: Phase::new(phase),
                last_transition_time: Some(earlier()),
                last_update_time: Some(earlier()),
            },
        });
    }
    opsrc
}

fn key(namespace: &str, name: &str) -> String {
    format!("{namespace}/{name}")
}

#[derive(Debug, Default)]
struct ClusterState {
    operator_sources: HashMap<String, OperatorSource>,
    catalog_source_configs: HashMap<String, CatalogSourceConfig>,
    config_maps: HashMap<String, ConfigMap>,
    status_updates: usize,
    fail_status_update: bool,
    conflicting_status_updates: usize,
    fail_get_csc: bool,
    fail_create_csc: bool,
    fail_create_config_map: bool,
    failing_config_map_deletes: usize,
}

/// In-memory [`ClusterClient`]. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockClusterClient {
    state: Arc<Mutex<ClusterState>>,
}

impl MockClusterClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `opsrc`, giving it resource version "1" unless it has one.
    pub fn insert_operator_source(&self, mut opsrc: OperatorSource) {
        let key = key(&opsrc.namespace().unwrap_or_default(), &opsrc.name_any());
        opsrc.metadata.resource_version.get_or_insert_with(|| "1".to_string());
        self.state.lock().unwrap().operator_sources.insert(key, opsrc);
    }

    /// Put a ConfigMap in place without going through `create_config_map`.
    pub fn insert_config_map(&self, config_map: ConfigMap) {
        let key = key(&config_map.namespace().unwrap_or_default(), &config_map.name_any());
        self.state.lock().unwrap().config_maps.insert(key, config_map);
    }

    pub fn operator_source(&self, namespace: &str, name: &str) -> Option<OperatorSource> {
        self.state
            .lock()
            .unwrap()
            .operator_sources
            .get(&key(namespace, name))
            .cloned()
    }

    pub fn catalog_source_config(&self, namespace: &str, name: &str) -> Option<CatalogSourceConfig> {
        self.state
            .lock()
            .unwrap()
            .catalog_source_configs
            .get(&key(namespace, name))
            .cloned()
    }

    pub fn config_map(&self, namespace: &str, name: &str) -> Option<ConfigMap> {
        self.state.lock().unwrap().config_maps.get(&key(namespace, name)).cloned()
    }

    pub fn status_updates(&self) -> usize {
        self.state.lock().unwrap().status_updates
    }

    pub fn fail_status_updates(&self) {
        self.state.lock().unwrap().fail_status_update = true;
    }

    /// The next `count` status updates fail as if another writer got there first.
    pub fn conflict_status_updates(&self, count: usize) {
        self.state.lock().unwrap().conflicting_status_updates = count;
    }

    pub fn fail_catalog_source_config_lookup(&self) {
        self.state.lock().unwrap().fail_get_csc = true;
    }

    pub fn fail_catalog_source_config_creates(&self) {
        self.state.lock().unwrap().fail_create_csc = true;
    }

    pub fn fail_config_map_creates(&self) {
        self.state.lock().unwrap().fail_create_config_map = true;
    }

    /// The next `count` ConfigMap deletes fail.
    pub fn fail_config_map_deletes(&self, count: usize) {
        self.state.lock().unwrap().failing_config_map_deletes = count;
    }
}

#[async_trait]
impl ClusterClient for MockClusterClient {
    async fn get_operator_source(&self, namespace: &str, name: &str) -> Result<OperatorSource, ClusterError> {
        self.operator_source(namespace, name).ok_or_else(|| ClusterError::NotFound {
            kind: "OperatorSource",
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
    }

    async fn update_operator_source_status(&self, opsrc: &OperatorSource) -> Result<(), ClusterError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_status_update {
            return Err(ClusterError::InvalidObject("status update rejected".to_string()));
        }
        let namespace = opsrc.namespace().unwrap_or_default();
        let name = opsrc.name_any();
        let conflict = || ClusterError::Conflict {
            kind: "OperatorSource",
            namespace: namespace.clone(),
            name: name.clone(),
        };
        if state.conflicting_status_updates > 0 {
            state.conflicting_status_updates -= 1;
            return Err(conflict());
        }

        let Some(stored) = state.operator_sources.get_mut(&key(&namespace, &name)) else {
            state.status_updates += 1;
            return Ok(());
        };
        // same optimistic concurrency as the API server: only a copy that
        // carries a resource version is checked
        if opsrc.metadata.resource_version.is_some()
            && opsrc.metadata.resource_version != stored.metadata.resource_version
        {
            return Err(conflict());
        }
        let next_version = stored
            .metadata
            .resource_version
            .as_deref()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0)
            + 1;
        stored.metadata.resource_version = Some(next_version.to_string());
        stored.status = opsrc.status.clone();
        state.status_updates += 1;
        Ok(())
    }

    async fn get_catalog_source_config(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<CatalogSourceConfig, ClusterError> {
        let state = self.state.lock().unwrap();
        if state.fail_get_csc {
            return Err(ClusterError::InvalidObject("lookup rejected".to_string()));
        }
        state
            .catalog_source_configs
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| ClusterError::NotFound {
                kind: "CatalogSourceConfig",
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn create_catalog_source_config(&self, csc: &CatalogSourceConfig) -> Result<(), ClusterError> {
        let namespace = csc.namespace().unwrap_or_default();
        let name = csc.name_any();
        let mut state = self.state.lock().unwrap();
        if state.fail_create_csc {
            return Err(ClusterError::InvalidObject("CatalogSourceConfig create rejected".to_string()));
        }
        let key = key(&namespace, &name);
        if state.catalog_source_configs.contains_key(&key) {
            return Err(ClusterError::AlreadyExists {
                kind: "CatalogSourceConfig",
                namespace,
                name,
            });
        }
        state.catalog_source_configs.insert(key, csc.clone());
        Ok(())
    }

    async fn delete_catalog_source_config(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        self.state
            .lock()
            .unwrap()
            .catalog_source_configs
            .remove(&key(namespace, name))
            .map(|_| ())
            .ok_or_else(|| ClusterError::NotFound {
                kind: "CatalogSourceConfig",
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn create_config_map(&self, config_map: &ConfigMap) -> Result<(), ClusterError> {
        let namespace = config_map.namespace().unwrap_or_default();
        let name = config_map.name_any();
        let mut state = self.state.lock().unwrap();
        if state.fail_create_config_map {
            return Err(ClusterError::InvalidObject("ConfigMap create rejected".to_string()));
        }
        let key = key(&namespace, &name);
        if state.config_maps.contains_key(&key) {
            return Err(ClusterError::AlreadyExists {
                kind: "ConfigMap",
                namespace,
                name,
            });
        }
        state.config_maps.insert(key, config_map.clone());
        Ok(())
    }

    async fn update_config_map_data(&self, config_map: &ConfigMap) -> Result<(), ClusterError> {
        let namespace = config_map.namespace().unwrap_or_default();
        let name = config_map.name_any();
        let mut state = self.state.lock().unwrap();
        let stored = state
            .config_maps
            .get_mut(&key(&namespace, &name))
            .ok_or_else(|| ClusterError::NotFound {
                kind: "ConfigMap",
                namespace: namespace.clone(),
                name: name.clone(),
            })?;
        stored.data = config_map.data.clone();
        Ok(())
    }

    async fn delete_config_map(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_config_map_deletes > 0 {
            state.failing_config_map_deletes -= 1;
            return Err(ClusterError::InvalidObject("ConfigMap delete rejected".to_string()));
        }
        state
            .config_maps
            .remove(&key(namespace, name))
            .map(|_| ())
            .ok_or_else(|| ClusterError::NotFound {
                kind: "ConfigMap",
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }
}

/// [`REDIS_MANIFEST`] with the channel head moved to `redis-operator.v2.0.0`.
pub fn redis_manifest_v2() -> String {
    REDIS_MANIFEST.replace("redis-operator.v1.0.0", "redis-operator.v2.0.0")
}

/// Single-package registry blob: package `redis`, one CSV owning one CRD.
pub const REDIS_MANIFEST: &str = r"publisher: redislabs
data:
  customResourceDefinitions: |
    - apiVersion: apiextensions.k8s.io/v1beta1
      kind: CustomResourceDefinition
      metadata:
        name: redisclusters.redis.example.com
      spec:
        group: redis.example.com
        version: v1alpha1
        scope: Namespaced
  clusterServiceVersions: |
    - apiVersion: operators.coreos.com/v1alpha1
      kind: ClusterServiceVersion
      metadata:
        name: redis-operator.v1.0.0
      spec:
        displayName: Redis
        customresourcedefinitions:
          owned:
            - name: redisclusters.redis.example.com
              kind: RedisCluster
              version: v1alpha1
  packages: |
    - packageName: redis
      channels:
        - name: stable
          currentCSV: redis-operator.v1.0.0
";
