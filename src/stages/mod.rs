pub mod stage0_preprocess;
pub mod stage1_summarize;
pub mod stage2_actions;
pub mod stage3_followup;

pub use stage0_preprocess::*;
pub use stage1_summarize::*;
pub use stage2_actions::*;
pub use stage3_followup::*;
