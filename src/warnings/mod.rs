pub mod arbiter;
pub mod notice;

pub use arbiter::{ActiveWarning, WarningArbiter};
pub use notice::WarningNotice;
