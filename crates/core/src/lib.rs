pub mod centers;
pub mod clock;
pub mod dialogue;
pub mod error;
pub mod intent;
pub mod models;
pub mod onboarding;
pub mod predict;
pub mod schedule;

pub use centers::service_centers;
pub use clock::{Clock, FixedClock, SystemClock};
pub use dialogue::{Branch, DialogueEngine, DialogueOutcome};
pub use error::CompanionError;
pub use intent::{classify, extract_center, extract_slot, IntentFlags, SlotSelection};
pub use models::*;
pub use onboarding::OnboardingRecord;
pub use predict::{predict_issues, prioritize};
pub use schedule::{compute_schedule, interval_table, Interval, IntervalKind};
