//! Configuration, filesystem paths and logging bootstrap for Loop Social.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, DataMode, DEFAULT_LOG_LEVEL, DEFAULT_SUPABASE_ANON_KEY, DEFAULT_SUPABASE_URL,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
