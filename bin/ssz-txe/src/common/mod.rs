mod config;
mod error;
mod hex;
mod logging;
mod output;

pub use config::*;
pub use error::*;
pub use hex::*;
pub use logging::*;
pub use output::*;
