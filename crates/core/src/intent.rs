use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TIME: &str = "14:15";

fn pattern(expr: &str) -> Regex {
    Regex::new(expr).expect("valid intent regex")
}

// Substring tests on purpose: "book" also trips `confirm` through "ok",
// and there is no negation handling, so "don't book" is still a booking.
static BOOKING: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)book|schedule|appointment|slot|reserve"));
static EXPLAIN: Lazy<Regex> =
    Lazy::new(|| pattern(r"(?i)why|explain|how|reason|what happened|details"));
static CONFIRM: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)yes|ok|sure|works|fine|go ahead"));
static URGENT: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)now|asap|emergency|urgent|immediately"));
static BATTERY: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)battery|12v|charge|power"));
static TIRE: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)tire|tyre|pressure|wheel"));
static ENGINE: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)engine|heat|coil|temperature"));
static BRAKE: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)brake|stopping"));
static TRUST: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)safe|serious|danger|risk"));

static TIME_TOKEN: Lazy<Regex> = Lazy::new(|| pattern(r"\d{1,2}:\d{2}"));
static DATE_TOKEN: Lazy<Regex> = Lazy::new(|| pattern(r"\d{4}-\d{2}-\d{2}"));
static TOMORROW: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)tomorrow"));
static TODAY: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)today"));
static CENTER: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)\bbook\s+(.+?)\s+at\b"));

/// Independent keyword classifications of one utterance. Several flags may
/// be set at once; branch selection decides which one wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentFlags {
    pub booking: bool,
    pub explain: bool,
    pub confirm: bool,
    pub urgent: bool,
    pub battery: bool,
    pub tire: bool,
    pub engine: bool,
    pub brake: bool,
    pub trust: bool,
}

impl IntentFlags {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

pub fn classify(text: &str) -> IntentFlags {
    IntentFlags {
        booking: BOOKING.is_match(text),
        explain: EXPLAIN.is_match(text),
        confirm: CONFIRM.is_match(text),
        urgent: URGENT.is_match(text),
        battery: BATTERY.is_match(text),
        tire: TIRE.is_match(text),
        engine: ENGINE.is_match(text),
        brake: BRAKE.is_match(text),
        trust: TRUST.is_match(text),
    }
}

/// Date and time picked out of an utterance, with defaults already applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSelection {
    pub time: String,
    pub date: String,
    pub explicit_time: bool,
    pub explicit_date: bool,
    pub mentions_tomorrow: bool,
    pub mentions_today: bool,
}

impl SlotSelection {
    /// True when the user named any concrete time or day.
    pub fn has_scheduling_hint(&self) -> bool {
        self.explicit_time || self.explicit_date || self.mentions_tomorrow || self.mentions_today
    }
}

pub fn extract_slot(text: &str) -> SlotSelection {
    let time = TIME_TOKEN.find(text).map(|m| m.as_str().to_string());
    let date = DATE_TOKEN.find(text).map(|m| m.as_str().to_string());
    let mentions_tomorrow = TOMORROW.is_match(text);
    let mentions_today = TODAY.is_match(text);

    SlotSelection {
        explicit_time: time.is_some(),
        explicit_date: date.is_some(),
        time: time.unwrap_or_else(|| DEFAULT_TIME.to_string()),
        date: date.unwrap_or_else(|| {
            if mentions_tomorrow {
                "tomorrow".to_string()
            } else {
                "today".to_string()
            }
        }),
        mentions_tomorrow,
        mentions_today,
    }
}

/// The center named in "Book <center> at ...", if any.
pub fn extract_center(text: &str) -> Option<String> {
    CENTER
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|center| !center.is_empty())
}
