// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Route registration: methods, unknown paths and CORS

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use tower::util::ServiceExt;

use super::support::*;

#[tokio::test]
async fn test_predict_rejects_get() {
    let app = app_with_detections(vec![]);
    let response = app
        .oneshot(Request::get("/predict").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = app_with_detections(vec![]);
    let response = app
        .oneshot(json_request(Method::POST, "/v1/predict", "{}".to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_preflight_is_allowed() {
    let app = app_with_detections(vec![]);
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/predict")
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(response.status().is_success());
    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));
}
