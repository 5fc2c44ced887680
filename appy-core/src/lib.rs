//! Core view-model for the Appy booking calendar.
//!
//! This crate holds everything the calendar frontend needs that is not UI:
//! - `datasource` and `tracker`: client-side mirrors of remote collections,
//!   kept in sync by add/update/delete notifications
//! - `service`: the per-entity model service that wires an API client to
//!   the tracker
//! - `interval` and `day_view`: projecting appointments, working hours and
//!   free time onto a bounded day window
//! - `smart_cache` and `tween`: sliding per-date data cache and animated
//!   window transitions
//!
//! All asynchronous work is spawned with `tokio::task::spawn_local`, so the
//! datasources and caches must be driven from inside a `tokio::task::LocalSet`.

pub mod api;
pub mod config;
pub mod datasource;
pub mod day_view;
pub mod entity;
pub mod error;
pub mod interval;
pub mod models;
pub mod notify;
pub mod service;
pub mod smart_cache;
pub mod tracker;
pub mod tween;
pub mod validation;

mod task;

pub use entity::Entity;
pub use error::{AppyError, AppyResult};
