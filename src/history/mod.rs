pub mod aggregate;
pub mod recorder;
pub mod store;

pub use aggregate::{
    format_minutes, ranked_summary_for_day, recent_days, summary_for_day, summary_for_last_n_days,
};
pub use recorder::{RecordOutcome, SessionRecorder};
pub use store::{PostureHistory, RecordChange};
