mod demo;
mod jobs;
mod llm;

pub use demo::*;
pub use jobs::*;
pub use llm::*;
