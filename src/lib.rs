//! One-way directory mirroring.
//!
//! [`filesystem::scan`] takes a snapshot of a tree, [`reconciler::reconcile`]
//! makes a replica match a source snapshot, and [`scheduler::Scheduler`]
//! repeats that cycle on a fixed period.

#![allow(clippy::enum_variant_names)]

pub mod application;
pub mod cli;
pub mod config;
pub mod filesystem;
pub mod reconciler;
pub mod scheduler;
