pub mod errors;
pub mod events;

pub use errors::{ConfigError, HarborError};
pub use events::{host_channel, HostEvent, HostEventReceiver, HostEventSender, QuitRequest};

pub type Result<T> = std::result::Result<T, HarborError>;
