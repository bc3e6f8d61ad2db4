mod containers;
mod output;
mod workloads;

pub use containers::draw_containers;
pub use output::draw_output;
pub use workloads::draw_workloads;
