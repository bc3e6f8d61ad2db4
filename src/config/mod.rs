mod loader;
mod types;

pub use loader::{CONFIG_FILE, load, parse};
pub use types::Config;
