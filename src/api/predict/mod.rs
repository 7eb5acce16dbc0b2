// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Prediction API endpoint module
//!
//! Provides POST /predict for annotating dental radiographs.

pub mod handler;
pub mod request;

pub use handler::predict_handler;
pub use request::PredictRequest;
