use std::collections::HashMap;
use std::sync::Arc;

use insure_core::ServiceError;
use insure_kv::KVStore;
use insure_sql::SQLStore;
use tracing::{info, warn};

use crate::model::{
    CombinedPolicy, MissingSupplement, Policy, PolicyFields, PolicySupplement, StoreHalf,
    SupplementFields, WriteOutcome,
};
use crate::store::{PolicyTable, SupplementStore};

/// Policy service. Composes the relational and document stores into
/// unified views and sequences writes that touch both.
///
/// Writes are not atomic across the stores. The core row always goes
/// first; a failed supplement write after that is reported as
/// [`WriteOutcome::PartialSuccess`] and logged, never rolled back.
pub struct PolicyService {
    pub(crate) table: PolicyTable,
    pub(crate) supplements: SupplementStore,
    missing: MissingSupplement,
}

impl PolicyService {
    pub fn new(
        sql: Arc<dyn SQLStore>,
        kv: Arc<dyn KVStore>,
        missing: MissingSupplement,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            table: PolicyTable::new(sql)?,
            supplements: SupplementStore::new(kv),
            missing,
        })
    }

    // ── Reads ──

    pub fn list_core(&self) -> Result<Vec<Policy>, ServiceError> {
        self.table.list_all()
    }

    pub fn list_supplements(&self) -> Result<Vec<PolicySupplement>, ServiceError> {
        self.supplements.list_all()
    }

    /// Join every policy with its supplement, in policy order.
    ///
    /// Policies without a supplement are handled per [`MissingSupplement`].
    pub fn list_combined(&self) -> Result<Vec<CombinedPolicy>, ServiceError> {
        let policies = self.table.list_all()?;

        let mut by_id: HashMap<i64, PolicySupplement> = HashMap::new();
        for supplement in self.supplements.list_all()? {
            by_id.entry(supplement.policy_id).or_insert(supplement);
        }

        let combined = policies
            .into_iter()
            .filter_map(|policy| match by_id.remove(&policy.policy_id) {
                Some(supplement) => Some(CombinedPolicy::join(policy, Some(supplement))),
                None => match self.missing {
                    MissingSupplement::Omit => None,
                    MissingSupplement::IncludeEmpty => Some(CombinedPolicy::join(policy, None)),
                },
            })
            .collect();
        Ok(combined)
    }

    /// One policy joined with its supplement (null fields when it has none).
    pub fn get_combined(&self, policy_id: i64) -> Result<CombinedPolicy, ServiceError> {
        let policy = self
            .table
            .get(policy_id)?
            .ok_or_else(|| ServiceError::NotFound(format!("Policy {policy_id} not found")))?;
        let supplement = self.supplements.get(policy_id)?;
        Ok(CombinedPolicy::join(policy, supplement))
    }

    // ── Writes ──

    /// Create the core row, then the supplement when `want_supplement` is set.
    pub fn create_policy(
        &self,
        core: &PolicyFields,
        supplement: &SupplementFields,
        want_supplement: bool,
    ) -> Result<WriteOutcome, ServiceError> {
        let policy_id = self.table.create(core)?;
        info!(policy_id, policy_number = %core.policy_number, "policy created");

        if !want_supplement {
            return Ok(WriteOutcome::Complete { policy_id });
        }
        Ok(self.merge_supplement(policy_id, supplement, "create"))
    }

    /// Overwrite core fields, then merge whichever supplement fields were
    /// supplied. Unknown ids fail before the document store is touched.
    pub fn update_policy(
        &self,
        policy_id: i64,
        core: &PolicyFields,
        supplement: &SupplementFields,
    ) -> Result<WriteOutcome, ServiceError> {
        self.table.update(policy_id, core)?;
        info!(policy_id, "policy updated");

        if supplement.is_empty() {
            return Ok(WriteOutcome::Complete { policy_id });
        }
        Ok(self.merge_supplement(policy_id, supplement, "update"))
    }

    /// Delete the core row, then its supplement if there is one.
    pub fn delete_policy(&self, policy_id: i64) -> Result<WriteOutcome, ServiceError> {
        self.table.delete(policy_id)?;
        info!(policy_id, "policy deleted");

        match self.supplements.delete(policy_id) {
            Ok(existed) => {
                if existed {
                    info!(policy_id, "supplement deleted");
                }
                Ok(WriteOutcome::Complete { policy_id })
            }
            Err(error) => {
                warn!(
                    policy_id,
                    op = "delete",
                    failed = "supplement",
                    %error,
                    "core row deleted but supplement delete failed; supplement is orphaned"
                );
                Ok(WriteOutcome::PartialSuccess {
                    policy_id,
                    failed: StoreHalf::Supplement,
                    error,
                })
            }
        }
    }

    fn merge_supplement(
        &self,
        policy_id: i64,
        supplement: &SupplementFields,
        op: &str,
    ) -> WriteOutcome {
        match self.supplements.upsert(policy_id, supplement) {
            Ok(_) => WriteOutcome::Complete { policy_id },
            Err(error) => {
                warn!(
                    policy_id,
                    op,
                    failed = "supplement",
                    %error,
                    "core row written but supplement write failed; retry the supplement"
                );
                WriteOutcome::PartialSuccess {
                    policy_id,
                    failed: StoreHalf::Supplement,
                    error,
                }
            }
        }
    }
}
