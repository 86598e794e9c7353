use serde::{Deserialize, Deserializer, Serialize};

use insure_core::ServiceError;

/// Core policy record, owned by the relational store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub policy_id: i64,
    pub policy_number: String,
    pub policy_holder_name: String,
    pub coverage_amount: f64,
    pub premium_amount: f64,
}

/// Writable core fields: everything except the store-assigned id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyFields {
    pub policy_number: String,
    pub policy_holder_name: String,
    pub coverage_amount: f64,
    pub premium_amount: f64,
}

/// Supplement fields as supplied by a caller.
///
/// `None` means "not supplied": it is skipped when serialized so a merge
/// leaves the stored value alone. `Some(None)` is an explicit null and
/// clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplementFields {
    #[serde(
        default,
        deserialize_with = "supplied",
        skip_serializing_if = "Option::is_none"
    )]
    pub claims_info: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "supplied",
        skip_serializing_if = "Option::is_none"
    )]
    pub policy_documents: Option<Option<String>>,
}

/// Deserialize a present field, null included, as `Some`. Combined with
/// `#[serde(default)]` an absent field stays `None`.
pub(crate) fn supplied<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl SupplementFields {
    pub fn is_empty(&self) -> bool {
        self.claims_info.is_none() && self.policy_documents.is_none()
    }
}

/// Supplementary document for a policy, owned by the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySupplement {
    pub policy_id: i64,
    #[serde(default)]
    pub claims_info: Option<String>,
    #[serde(default)]
    pub policy_documents: Option<String>,
}

/// Core fields joined with supplement fields for one policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedPolicy {
    #[serde(flatten)]
    pub policy: Policy,
    pub claims_info: Option<String>,
    pub policy_documents: Option<String>,
}

impl CombinedPolicy {
    pub fn join(policy: Policy, supplement: Option<PolicySupplement>) -> Self {
        let (claims_info, policy_documents) = match supplement {
            Some(s) => (s.claims_info, s.policy_documents),
            None => (None, None),
        };
        Self {
            policy,
            claims_info,
            policy_documents,
        }
    }
}

/// What the combined listing does with a policy that has no supplement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingSupplement {
    /// Leave the policy out of the combined listing.
    #[default]
    Omit,
    /// Include the policy with null supplement fields.
    IncludeEmpty,
}

/// The half of a dual-store write that did not land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreHalf {
    Supplement,
}

/// Result of a write that spans both stores.
///
/// The core row is always written first, so when only one half lands it is
/// the supplement that is missing. Supplement writes are keyed by
/// `policy_id`, which makes retrying them idempotent.
#[derive(Debug)]
pub enum WriteOutcome {
    Complete {
        policy_id: i64,
    },
    PartialSuccess {
        policy_id: i64,
        failed: StoreHalf,
        error: ServiceError,
    },
}

impl WriteOutcome {
    pub fn policy_id(&self) -> i64 {
        match self {
            WriteOutcome::Complete { policy_id } => *policy_id,
            WriteOutcome::PartialSuccess { policy_id, .. } => *policy_id,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, WriteOutcome::Complete { .. })
    }
}
