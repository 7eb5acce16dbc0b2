// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! GET /health reports the loaded model and metadata

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use tower::util::ServiceExt;

use super::support::*;

#[tokio::test]
async fn test_health_reports_model_and_metadata() {
    let app = app_with_detections(vec![]);

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model"], STUB_MODEL_NAME);
    assert_eq!(body["classCount"], 31);
    assert_eq!(body["metadataVersion"], "2025.1");
    assert_eq!(body["version"], dentascan::version::VERSION);
}
