pub mod pipeline;

pub use pipeline::{run, run_with};
