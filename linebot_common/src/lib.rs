//! Linebot Common Library
//!
//! Shared definitions for the linebot workspace crates.
//!
//! # Module Structure
//!
//! - [`consts`] - Calibration constants and domain conversions
//! - [`hal`] - Board trait, channel identifiers and HAL errors
//! - [`config`] - Calibration configuration types with validation

pub mod config;
pub mod consts;
pub mod hal;
