pub mod types;
pub mod clock;
pub mod cursor;
pub mod config;
pub mod error;

pub use error::CoreError;
pub use types::filename::LogFileName;
pub use types::message::Message;
pub use clock::{OrderKeyGenerator, SystemTimeSource, TimeSource};
pub use cursor::{find_cursor, plan_delivery};
pub use config::{load_config, save_config, Author, BrokerConfig, Credentials};
