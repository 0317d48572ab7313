pub mod alerts;
pub mod analysis;
pub mod clock;
pub mod config;
pub mod contacts;
pub mod coordinator;
pub mod error;
pub mod geofence;
pub mod inbox;
pub mod model;

#[cfg(test)]
mod test_support;
