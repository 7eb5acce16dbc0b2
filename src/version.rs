// Version information for the dentascan service

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-radiograph-annotation";

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "onnx-yolo-detection",
    "clinical-annotations",
    "data-url-payloads",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("dentascan {} ({})", VERSION_NUMBER, VERSION)
}
