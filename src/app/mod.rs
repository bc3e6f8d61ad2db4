mod actions;
mod state;

pub use state::{App, Panel, Status};
