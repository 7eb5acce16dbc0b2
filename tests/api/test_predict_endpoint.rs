// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /predict end to end over the router, with a scripted detector

use axum::http::{Method, StatusCode};
use dentascan::ClassTable;
use image::ImageFormat;
use serde_json::json;
use tower::util::ServiceExt;

use super::support::*;

fn predict_body(image: &str) -> String {
    json!({ "image": image }).to_string()
}

#[tokio::test]
async fn test_single_caries_detection() {
    let app = app_with_detections(vec![detection(0, 0.91, 320.0, 240.0, 100.0, 50.0)]);
    let image = encoded_image(640, 480, ImageFormat::Png);

    let response = app
        .oneshot(json_request(Method::POST, "/predict", predict_body(&image)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["classes"]["0"], "Caries");
    assert_eq!(body["classes"].as_object().unwrap().len(), 31);

    let labels = body["labels"].as_array().unwrap();
    assert_eq!(labels.len(), 1);

    let label = &labels[0];
    assert_eq!(label["id"], 1);
    assert_eq!(label["classId"], 0);
    assert_eq!(label["name"], "Caries");
    assert!((label["confidence"].as_f64().unwrap() - 0.91).abs() < 1e-6);

    let bbox = &label["bbox"];
    assert_eq!(bbox["classId"], 0);
    assert_eq!(bbox["x"].as_f64().unwrap(), 0.5);
    assert_eq!(bbox["y"].as_f64().unwrap(), 0.5);
    assert_eq!(bbox["width"].as_f64().unwrap(), 0.15625);
    assert!((bbox["height"].as_f64().unwrap() - 0.104167).abs() < 1e-9);

    assert_eq!(label["treatment"]["title"], "Active Carious Lesion Detected");
    assert!(!label["treatment"]["description"]
        .as_str()
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_labels_keep_detector_order() {
    let app = app_with_detections(vec![
        detection(30, 0.88, 100.0, 100.0, 40.0, 40.0),
        detection(0, 0.75, 200.0, 150.0, 20.0, 30.0),
        detection(30, 0.60, 500.0, 300.0, 40.0, 40.0),
    ]);
    let image = encoded_image(640, 480, ImageFormat::Jpeg);

    let response = app
        .oneshot(json_request(Method::POST, "/predict", predict_body(&image)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let labels = body["labels"].as_array().unwrap();
    let ids: Vec<u64> = labels.iter().map(|l| l["id"].as_u64().unwrap()).collect();
    let classes: Vec<u64> = labels
        .iter()
        .map(|l| l["classId"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(classes, vec![30, 0, 30]);
    assert_eq!(labels[0]["name"], "Primary Teeth");
}

#[tokio::test]
async fn test_zero_detections_returns_empty_labels() {
    let app = app_with_detections(vec![]);
    let image = encoded_image(64, 64, ImageFormat::Png);

    let response = app
        .oneshot(json_request(Method::POST, "/predict", predict_body(&image)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["labels"], json!([]));
    assert_eq!(body["classes"]["30"], "Primary Teeth");
}

#[tokio::test]
async fn test_data_url_prefix_is_accepted() {
    let app = app_with_detections(vec![detection(1, 0.5, 10.0, 10.0, 4.0, 4.0)]);
    let image = format!(
        "data:image/png;base64,{}",
        encoded_image(32, 32, ImageFormat::Png)
    );

    let response = app
        .oneshot(json_request(Method::POST, "/predict", predict_body(&image)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["labels"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_image_is_bad_request() {
    let app = app_with_detections(vec![]);
    let response = app
        .oneshot(json_request(Method::POST, "/predict", "{}".to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("image"));
}

#[tokio::test]
async fn test_present_but_unusable_image_is_server_error() {
    let cases = [
        (r#"{"image": ""}"#, "empty"),
        (r#"{"image": null}"#, "base64 string"),
        (r#"{"image": 123}"#, "base64 string"),
    ];
    for (body, message) in cases {
        let app = app_with_detections(vec![]);
        let response = app
            .oneshot(json_request(Method::POST, "/predict", body.to_string()))
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::INTERNAL_SERVER_ERROR,
            "body: {}",
            body
        );

        let json = body_json(response).await;
        assert!(
            json["error"].as_str().unwrap().contains(message),
            "body: {} error: {}",
            body,
            json["error"]
        );
        assert!(json.get("labels").is_none());
    }
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = app_with_detections(vec![]);
    let response = app
        .oneshot(json_request(Method::POST, "/predict", "{not json".to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_invalid_base64_is_server_error() {
    let app = app_with_detections(vec![detection(0, 0.9, 1.0, 1.0, 1.0, 1.0)]);
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/predict",
            predict_body("%%% definitely not base64 %%%"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("base64"));
    assert!(json.get("labels").is_none());
}

#[tokio::test]
async fn test_valid_base64_non_image_is_server_error() {
    let app = app_with_detections(vec![]);
    // "hello world"
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/predict",
            predict_body("aGVsbG8gd29ybGQ="),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_metadata_gap_fails_whole_request() {
    let classes = dentascan::ClinicalMetadata::embedded()
        .unwrap()
        .canonical_names();
    let mut extra_classes = ClassTable::new();
    extra_classes.insert(42, "Unlisted".to_string());

    let app = app_with_source(ScriptedSource {
        classes,
        extra_classes,
        detections: vec![
            detection(0, 0.9, 10.0, 10.0, 5.0, 5.0),
            detection(42, 0.8, 20.0, 20.0, 5.0, 5.0),
        ],
    });
    let image = encoded_image(64, 64, ImageFormat::Png);

    let response = app
        .oneshot(json_request(Method::POST, "/predict", predict_body(&image)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("42"));
    assert!(json.get("labels").is_none());
}
