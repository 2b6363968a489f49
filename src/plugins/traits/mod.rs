pub mod notifier;
pub mod source;

pub use notifier::{NotificationResult, NotifierPlugin};
pub use source::{CycleOutcome, CycleProgress, CycleReport, CycleState, SourceAdapter};
