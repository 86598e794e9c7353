use axum::{
    Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    response::Response,
    routing::get,
    Json,
};
use serde::Deserialize;

use insure_core::{ListResult, ServiceError};

use super::{AppState, write_response};
use crate::model::{
    supplied, CombinedPolicy, Policy, PolicyFields, PolicySupplement, SupplementFields,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/policies", get(list_core).post(create_policy))
        .route("/policies/combined", get(list_combined))
        .route("/policies/supplements", get(list_supplements))
        .route(
            "/policies/{id}",
            get(get_policy).put(update_policy).delete(delete_policy),
        )
}

/// Request body for create and update. Core fields are required but
/// checked by hand so every missing one is reported at once.
///
/// Supplement fields and `add_to_mongodb` tell an absent key (`None`)
/// apart from an explicit null (`Some(None)`).
#[derive(Debug, Deserialize)]
struct PolicyBody {
    policy_number: Option<String>,
    policy_holder_name: Option<String>,
    coverage_amount: Option<f64>,
    premium_amount: Option<f64>,
    #[serde(default, deserialize_with = "supplied")]
    claims_info: Option<Option<String>>,
    #[serde(default, deserialize_with = "supplied")]
    policy_documents: Option<Option<String>>,
    /// Whether to write the supplement on create. Absent means true;
    /// null means false.
    #[serde(default, deserialize_with = "supplied")]
    add_to_mongodb: Option<Option<bool>>,
}

impl PolicyBody {
    fn into_parts(self) -> Result<(PolicyFields, SupplementFields, bool), ServiceError> {
        let mut missing = Vec::new();
        if self.policy_number.is_none() {
            missing.push("policy_number");
        }
        if self.policy_holder_name.is_none() {
            missing.push("policy_holder_name");
        }
        if self.coverage_amount.is_none() {
            missing.push("coverage_amount");
        }
        if self.premium_amount.is_none() {
            missing.push("premium_amount");
        }

        match (
            self.policy_number,
            self.policy_holder_name,
            self.coverage_amount,
            self.premium_amount,
        ) {
            (Some(policy_number), Some(policy_holder_name), Some(coverage), Some(premium)) => Ok((
                PolicyFields {
                    policy_number,
                    policy_holder_name,
                    coverage_amount: coverage,
                    premium_amount: premium,
                },
                SupplementFields {
                    claims_info: self.claims_info,
                    policy_documents: self.policy_documents,
                },
                self.add_to_mongodb.map_or(true, |flag| flag.unwrap_or(false)),
            )),
            _ => Err(ServiceError::Validation(format!(
                "missing required field(s): {}",
                missing.join(", ")
            ))),
        }
    }
}

fn body(
    body: Result<Json<PolicyBody>, JsonRejection>,
) -> Result<(PolicyFields, SupplementFields, bool), ServiceError> {
    let Json(body) = body.map_err(|e| ServiceError::Validation(e.body_text()))?;
    body.into_parts()
}

fn policy_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ServiceError> {
    path.map(|Path(id)| id)
        .map_err(|e| ServiceError::Validation(e.body_text()))
}

async fn list_core(
    State(svc): State<AppState>,
) -> Result<Json<ListResult<Policy>>, ServiceError> {
    Ok(Json(ListResult::new(svc.list_core()?)))
}

async fn list_combined(
    State(svc): State<AppState>,
) -> Result<Json<ListResult<CombinedPolicy>>, ServiceError> {
    Ok(Json(ListResult::new(svc.list_combined()?)))
}

async fn list_supplements(
    State(svc): State<AppState>,
) -> Result<Json<ListResult<PolicySupplement>>, ServiceError> {
    Ok(Json(ListResult::new(svc.list_supplements()?)))
}

async fn get_policy(
    State(svc): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<CombinedPolicy>, ServiceError> {
    Ok(Json(svc.get_combined(policy_id(path)?)?))
}

async fn create_policy(
    State(svc): State<AppState>,
    req: Result<Json<PolicyBody>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let (core, supplement, want_supplement) = body(req)?;
    write_response(
        svc.create_policy(&core, &supplement, want_supplement),
        "Policy added to database successfully",
    )
}

async fn update_policy(
    State(svc): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    req: Result<Json<PolicyBody>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let id = policy_id(path)?;
    let (core, supplement, _) = body(req)?;
    write_response(
        svc.update_policy(id, &core, &supplement),
        "Policy updated successfully",
    )
}

async fn delete_policy(
    State(svc): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Response, ServiceError> {
    write_response(
        svc.delete_policy(policy_id(path)?),
        "Policy deleted successfully",
    )
}
