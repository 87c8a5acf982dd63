// Per-frame detection pipeline

pub mod annotate;
pub mod control;
pub mod detection;
pub mod fps;
pub mod orchestrator;
#[cfg(test)]
pub(crate) mod stubs;
