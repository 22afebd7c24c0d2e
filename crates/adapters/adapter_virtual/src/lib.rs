//! # growhub-adapter-virtual
//!
//! Virtual grow tent: in-memory sensors and actuators for demos and tests.
//!
//! ## Provided ports
//!
//! | Type | Port | Behaviour |
//! |------|------|-----------|
//! | [`VirtualSensors`] | `SensorSource` | Readings set by hand (HTTP, config, tests) |
//! | [`VirtualActuators`] | `DeviceChannel` | Remembers the last command per device; repeats are no-ops |
//!
//! ## Dependency rule
//!
//! Depends on `growhub-app` (port traits) and `growhub-domain` only.

mod actuators;
mod error;
mod sensors;

pub use actuators::{ActuatorState, VirtualActuators};
pub use error::VirtualError;
pub use sensors::VirtualSensors;
