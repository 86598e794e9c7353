use std::sync::Arc;

use insure_core::ServiceError;
use insure_sql::{Row, SQLStore, Value};
use tracing::debug;

use crate::model::{Policy, PolicyFields};

/// SQL schema for the policies table. AUTOINCREMENT keeps ids monotonic
/// and never hands out the id of a deleted row again.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS policies (
    policy_id           INTEGER PRIMARY KEY AUTOINCREMENT,
    policy_number       VARCHAR(50) NOT NULL,
    policy_holder_name  VARCHAR(100) NOT NULL,
    coverage_amount     REAL NOT NULL,
    premium_amount      REAL NOT NULL
);
";

const COLUMNS: &str = "policy_id, policy_number, policy_holder_name, coverage_amount, premium_amount";

/// Relational adapter for core policy records.
pub struct PolicyTable {
    db: Arc<dyn SQLStore>,
}

fn sql_err(e: insure_sql::SQLError) -> ServiceError {
    ServiceError::Storage(format!("relational store: {e}"))
}

fn not_found(policy_id: i64) -> ServiceError {
    ServiceError::NotFound(format!("Policy {policy_id} not found"))
}

fn field_params(fields: &PolicyFields) -> Vec<Value> {
    vec![
        Value::Text(fields.policy_number.clone()),
        Value::Text(fields.policy_holder_name.clone()),
        Value::Real(fields.coverage_amount),
        Value::Real(fields.premium_amount),
    ]
}

impl PolicyTable {
    /// Create the adapter and initialise the schema.
    pub fn new(db: Arc<dyn SQLStore>) -> Result<Self, ServiceError> {
        db.exec_batch(SCHEMA)
            .map_err(|e| ServiceError::Storage(format!("policy schema init: {e}")))?;
        Ok(Self { db })
    }

    /// Insert a policy and return the id the store assigned to it.
    pub fn create(&self, fields: &PolicyFields) -> Result<i64, ServiceError> {
        let rows = self
            .db
            .query(
                "INSERT INTO policies \
                 (policy_number, policy_holder_name, coverage_amount, premium_amount) \
                 VALUES (?1, ?2, ?3, ?4) RETURNING policy_id",
                &field_params(fields),
            )
            .map_err(sql_err)?;

        let policy_id = rows
            .first()
            .and_then(|r| r.get_i64("policy_id"))
            .ok_or_else(|| ServiceError::Internal("insert returned no policy_id".into()))?;
        debug!(policy_id, "policy row inserted");
        Ok(policy_id)
    }

    pub fn get(&self, policy_id: i64) -> Result<Option<Policy>, ServiceError> {
        let rows = self
            .db
            .query(
                &format!("SELECT {COLUMNS} FROM policies WHERE policy_id = ?1"),
                &[Value::Integer(policy_id)],
            )
            .map_err(sql_err)?;
        rows.first().map(row_to_policy).transpose()
    }

    /// All policies in insertion order.
    pub fn list_all(&self) -> Result<Vec<Policy>, ServiceError> {
        let rows = self
            .db
            .query(
                &format!("SELECT {COLUMNS} FROM policies ORDER BY policy_id ASC"),
                &[],
            )
            .map_err(sql_err)?;
        rows.iter().map(row_to_policy).collect()
    }

    /// Overwrite the core fields of an existing policy.
    pub fn update(&self, policy_id: i64, fields: &PolicyFields) -> Result<(), ServiceError> {
        let mut params = field_params(fields);
        params.push(Value::Integer(policy_id));

        let affected = self
            .db
            .exec(
                "UPDATE policies SET policy_number = ?1, policy_holder_name = ?2, \
                 coverage_amount = ?3, premium_amount = ?4 WHERE policy_id = ?5",
                &params,
            )
            .map_err(sql_err)?;

        if affected == 0 {
            return Err(not_found(policy_id));
        }
        Ok(())
    }

    pub fn delete(&self, policy_id: i64) -> Result<(), ServiceError> {
        let affected = self
            .db
            .exec(
                "DELETE FROM policies WHERE policy_id = ?1",
                &[Value::Integer(policy_id)],
            )
            .map_err(sql_err)?;

        if affected == 0 {
            return Err(not_found(policy_id));
        }
        Ok(())
    }
}

fn row_to_policy(row: &Row) -> Result<Policy, ServiceError> {
    let missing = |col: &str| ServiceError::Internal(format!("policies row missing {col}"));
    Ok(Policy {
        policy_id: row.get_i64("policy_id").ok_or_else(|| missing("policy_id"))?,
        policy_number: row
            .get_str("policy_number")
            .ok_or_else(|| missing("policy_number"))?
            .to_string(),
        policy_holder_name: row
            .get_str("policy_holder_name")
            .ok_or_else(|| missing("policy_holder_name"))?
            .to_string(),
        coverage_amount: row
            .get_f64("coverage_amount")
            .ok_or_else(|| missing("coverage_amount"))?,
        premium_amount: row
            .get_f64("premium_amount")
            .ok_or_else(|| missing("premium_amount"))?,
    })
}
