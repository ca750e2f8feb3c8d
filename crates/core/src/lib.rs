pub mod config;
pub mod error;
pub mod identity;
pub mod record;

pub use config::Config;
pub use error::*;
pub use identity::*;
pub use record::*;
