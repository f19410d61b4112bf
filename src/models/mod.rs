pub mod minutes;
pub mod reminder;
pub mod transcript;

pub use minutes::*;
pub use reminder::*;
pub use transcript::*;
