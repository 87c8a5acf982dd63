pub mod cli;
pub mod crop;
pub mod display;
pub mod pipeline;
pub mod run_context;
pub mod source;
pub mod video;
