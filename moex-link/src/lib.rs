pub mod link;
pub mod moose;

pub use link::{DEFAULT_PORT, DeviceLink, LinkError};
pub use moose::{DeviceEvent, ListenerId, Moose};
