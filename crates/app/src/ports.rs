//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod clock;
pub mod device_channel;
pub mod rule_repo;
pub mod sensor_source;
pub mod trigger_history;

pub use clock::Clock;
pub use device_channel::DeviceChannel;
pub use rule_repo::RuleRepository;
pub use sensor_source::SensorSource;
pub use trigger_history::TriggerHistory;
