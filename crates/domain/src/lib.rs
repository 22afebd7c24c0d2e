//! # growhub-domain
//!
//! Pure domain model for the growhub automation core.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps, wall-clock times
//! - Define **Rules** (conditions or schedule → then/else actions, priority, cooldown)
//! - Define **Sensor snapshots** (the immutable readings one tick observes)
//! - Define **Device commands** (the resolved instruction for one actuator)
//! - Define **Trigger events** (the audit record of every rule that matched)
//! - Evaluate conditions, enforce cooldowns and resolve per-device conflicts
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod command;
pub mod resolution;
pub mod rule;
pub mod snapshot;
pub mod trigger_event;
