//! Entity aggregators: each consumes [`Event`](crate::event::Event)s for
//! its target kind and maintains its own fields, statistics, and danger
//! contribution.

pub mod connection;
pub mod danger;
pub mod device;
pub mod peer_device;
pub mod resource;

pub use connection::Connection;
pub use device::{DevVolume, Device};
pub use peer_device::{PeerDevVol, PeerDevice};
pub use resource::Resource;
