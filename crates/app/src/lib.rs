//! # growhub-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `RuleRepository`: durable CRUD for rules, plus trigger bookkeeping
//!   - `TriggerHistory`: append-only trigger audit log
//!   - `SensorSource`: one consistent sensor snapshot per tick
//!   - `DeviceChannel`: idempotent delivery of device commands
//!   - `Clock`: current instant and local UTC offset
//! - Define **driving/inbound ports** as use-case structs/traits:
//!   - `RuleService`: create, update, toggle, list, delete rules
//!   - `RuleEngine` / `TickRunner`: evaluate one tick end to end
//!   - `Scheduler`: drive ticks on an interval without overlap
//! - Orchestrate domain objects without knowing *how* persistence or IO works
//!
//! ## Dependency rule
//! Depends on `growhub-domain` only (plus `tokio` for timers and sync).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod clock;
pub mod ports;
pub mod rule_engine;
pub mod scheduler;
pub mod services;

#[cfg(test)]
pub(crate) mod fakes;
