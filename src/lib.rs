//! `Flashover` - Hazard incident engine for destroyed cargo vehicles
//!
//! This library turns "cargo X was destroyed at fill level F" into a
//! multi-phase hazard incident: a profile catalog, fill-level scaling,
//! a concurrent timeline scheduler with randomized chain bursts, and a
//! registry of lingering hazard zones with damage-over-time.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod incident;
pub mod observability;
pub mod profile;
pub mod scale;
pub mod zone;
