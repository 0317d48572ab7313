// Alert pipeline: turns sensor readings into notifications and fans them out.
//
// Architecture:
// - model.rs: Notification, anomaly and severity types
// - triggers.rs: Threshold checks for falls, vitals, inactivity and location
// - push.rs: Push permission and surface seams
// - bus.rs: Subscriber registry, ordered dispatch and contact fan-out

pub mod bus;
pub mod model;
pub mod push;
pub mod triggers;
