// Contact directory and external channel routing.
//
// Architecture:
// - model.rs: Contacts, channels and the injected directory
// - router.rs: Severity-gated fan-out through a ChannelTransport

pub mod model;
pub mod router;
