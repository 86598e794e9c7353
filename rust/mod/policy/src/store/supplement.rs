use std::sync::Arc;

use insure_core::{merge_patch, ServiceError};
use insure_kv::{KVError, KVStore};
use tracing::debug;

use crate::model::{PolicySupplement, SupplementFields};

const PREFIX: &str = "policy:supplement:";

/// Zero-padded so a prefix scan returns supplements in policy_id order.
fn key(policy_id: i64) -> String {
    format!("{PREFIX}{policy_id:020}")
}

fn kv_err(e: KVError) -> ServiceError {
    match e {
        KVError::Storage(msg) => ServiceError::Storage(format!("document store: {msg}")),
        KVError::Serialization(msg) => ServiceError::Internal(msg),
    }
}

fn decode(bytes: &[u8]) -> Result<PolicySupplement, ServiceError> {
    serde_json::from_slice(bytes).map_err(|e| ServiceError::Internal(e.to_string()))
}

/// Document adapter for policy supplements, keyed by policy_id.
pub struct SupplementStore {
    kv: Arc<dyn KVStore>,
}

impl SupplementStore {
    pub fn new(kv: Arc<dyn KVStore>) -> Self {
        Self { kv }
    }

    /// Merge the supplied fields into the supplement for `policy_id`,
    /// creating it if absent. Fields left `None` keep their stored value;
    /// an explicit null clears it.
    ///
    /// Read and write happen in a single store update, so concurrent merges
    /// on the same policy do not lose each other's fields.
    pub fn upsert(
        &self,
        policy_id: i64,
        fields: &SupplementFields,
    ) -> Result<PolicySupplement, ServiceError> {
        let patch =
            serde_json::to_value(fields).map_err(|e| ServiceError::Internal(e.to_string()))?;

        let stored = self
            .kv
            .update(&key(policy_id), &mut |current| {
                let mut doc: serde_json::Value = match current {
                    Some(bytes) => serde_json::from_slice(bytes)
                        .map_err(|e| KVError::Serialization(e.to_string()))?,
                    None => serde_json::json!({ "policy_id": policy_id }),
                };
                merge_patch(&mut doc, &patch);
                serde_json::to_vec(&doc).map_err(|e| KVError::Serialization(e.to_string()))
            })
            .map_err(kv_err)?;

        debug!(policy_id, "supplement merged");
        decode(&stored)
    }

    pub fn get(&self, policy_id: i64) -> Result<Option<PolicySupplement>, ServiceError> {
        self.kv
            .get(&key(policy_id))
            .map_err(kv_err)?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    /// All supplements, ordered by policy_id.
    pub fn list_all(&self) -> Result<Vec<PolicySupplement>, ServiceError> {
        self.kv
            .scan(PREFIX)
            .map_err(kv_err)?
            .iter()
            .map(|(_, bytes)| decode(bytes))
            .collect()
    }

    /// Remove the supplement for `policy_id`. Returns whether one existed.
    pub fn delete(&self, policy_id: i64) -> Result<bool, ServiceError> {
        self.kv.delete(&key(policy_id)).map_err(kv_err)
    }
}
