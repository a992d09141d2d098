pub mod data;
pub mod error;
pub mod network;
pub mod port;

pub use data::DataChannel;
pub use error::{DataChannelError, PortError};
pub use port::DataAddress;
