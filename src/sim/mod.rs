pub mod event;
pub mod orchestrator;
pub mod screen;
