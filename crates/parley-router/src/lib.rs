// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent classification and model routing for the Parley pipeline.
//!
//! This crate provides:
//! - [`IntentClassifier`]: an ordered list of keyword rules mapping text to an [`Intent`]
//! - [`ModelRouter`]: resolves an explicit selection or an intent into a [`RoutedModel`]
//!
//! [`Intent`]: parley_core::Intent
//! [`RoutedModel`]: parley_core::RoutedModel

pub mod classifier;
pub mod router;

pub use classifier::{Classification, IntentClassifier, IntentRule, detect_intent};
pub use router::{AUTO_MODEL_KEY, CUSTOM_MODEL_KEY, ModelRouter, RoutingDecision, parse_model_override};
