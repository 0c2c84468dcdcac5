pub mod clinic_tools;
pub mod model;
pub mod orchestrator;
pub mod prompt;
pub mod session;
pub mod tools;
