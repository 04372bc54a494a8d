//! Command dispatch, validation and decal placement core for a 4x4 vehicle
//! configurator.
//!
//! Agent output and UI actions both land in [`handlers::SceneHandlers`], the
//! only writer of the vehicle configuration. [`orchestrator::Orchestrator`]
//! turns structured agent responses into handler calls, and
//! [`decals::DecalEngine`] projects uploaded images onto the body mesh.

pub mod catalog;
pub mod commands;
pub mod config;
pub mod decals;
pub mod handlers;
pub mod notify;
pub mod orchestrator;
pub mod render;
pub mod scene;
pub mod validation;
