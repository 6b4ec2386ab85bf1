pub mod break_reminder;
pub mod sedentary;

pub use break_reminder::BreakReminder;
pub use sedentary::{SedentaryMonitor, SedentaryState};
