pub mod abstractive;
pub mod client;
pub mod prompts;

pub use abstractive::*;
pub use client::*;
pub use prompts::*;
