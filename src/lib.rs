pub mod completion;
pub mod config;
pub mod document;
pub mod errors;
pub mod exchange;
pub mod pipeline;
pub mod prompts;
pub mod roles;
pub mod stream;
pub mod tools;
pub mod ui;
