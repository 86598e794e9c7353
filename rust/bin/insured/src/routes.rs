//! Route registration — collects module routes and system endpoints.

use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

/// Build the complete router. Module routes carry absolute paths and are
/// merged at the root.
pub fn build_router(module_routes: Vec<(&str, Router)>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/version", get(version));

    for (_, router) in module_routes {
        app = app.merge(router);
    }
    app
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "insured",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use insure_core::Module;
    use insure_kv::RedbStore;
    use insure_sql::SqliteStore;
    use policy::model::MissingSupplement;
    use policy::service::PolicyService;
    use policy::PolicyModule;
    use tower::ServiceExt;

    use super::*;

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_system_endpoints() {
        let app = build_router(Vec::new());

        let (status, body) = get_json(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = get_json(&app, "/version").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "insured");
    }

    fn policy_service(dir: &tempfile::TempDir) -> PolicyService {
        PolicyService::new(
            Arc::new(SqliteStore::open_in_memory().unwrap()),
            Arc::new(RedbStore::open(&dir.path().join("docs.redb")).unwrap()),
            MissingSupplement::Omit,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_module_routes_mounted_at_root() {
        let dir = tempfile::tempdir().unwrap();
        let module = PolicyModule::new(policy_service(&dir));
        let app = build_router(vec![(module.name(), module.routes())]);

        let (status, body) = get_json(&app, "/policies").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 0);

        let (status, _) = get_json(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_configured_upload_limit_applies() {
        let dir = tempfile::tempdir().unwrap();
        let module = PolicyModule::new(policy_service(&dir)).with_upload_limit(1024);
        let app = build_router(vec![(module.name(), module.routes())]);

        let mut body = b"--b\r\nContent-Disposition: form-data; name=\"file\"; filename=\"x.csv\"\r\n\r\na\n".to_vec();
        body.extend(std::iter::repeat_n(b'1', 4096));
        body.extend_from_slice(b"\r\n--b--\r\n");
        let req = Request::builder()
            .method("POST")
            .uri("/upload")
            .header("content-type", "multipart/form-data; boundary=b")
            .body(Body::from(body))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
