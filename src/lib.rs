//! Smart Bin Monitor Library
//!
//! Core of a smart waste-bin fleet dashboard: latest-reading resolution,
//! daily fleet KPIs, bin registry operations, and the pan/zoom map with
//! draggable bin markers.

pub mod constants;
pub mod domain;
pub mod error;
pub mod helpers;
pub mod services;
pub mod state;
