use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleType {
    Car,
    Bike,
    #[serde(rename = "SUV")]
    Suv,
    Truck,
    Electric,
    /// Anything outside the recognized set. Scheduling and prediction fall
    /// back to the generic (Car-equivalent) rules for it.
    #[serde(other)]
    Other,
}

impl VehicleType {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "car" => Self::Car,
            "bike" | "motorcycle" | "motorbike" => Self::Bike,
            "suv" => Self::Suv,
            "truck" | "commercial" => Self::Truck,
            "electric" | "ev" => Self::Electric,
            _ => Self::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Car => "Car",
            Self::Bike => "Bike",
            Self::Suv => "SUV",
            Self::Truck => "Truck",
            Self::Electric => "Electric",
            Self::Other => "Other",
        }
    }

    pub fn is_recognized(self) -> bool {
        self != Self::Other
    }

    /// Average distance driven per day, used to turn km into days.
    pub fn avg_daily_km(self) -> u32 {
        match self {
            Self::Bike => 30,
            Self::Truck => 80,
            _ => 42,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Climate {
    Hot,
    Cold,
    Humid,
    Mixed,
}

impl Climate {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "hot" | "hot & dry" => Some(Self::Hot),
            "cold" | "cold & snowy" => Some(Self::Cold),
            "humid" | "hot & humid" => Some(Self::Humid),
            "mixed" | "temperate" => Some(Self::Mixed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hot => "hot",
            Self::Cold => "cold",
            Self::Humid => "humid",
            Self::Mixed => "mixed",
        }
    }

    pub fn is_heat_stressing(self) -> bool {
        matches!(self, Self::Hot | Self::Humid)
    }
}

/// Onboarding offers conservative/balanced/aggressive while the assistant
/// speaks of calm/moderate/aggressive; both spellings map here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrivingStyle {
    #[serde(alias = "conservative")]
    Calm,
    #[serde(alias = "balanced")]
    Moderate,
    Aggressive,
}

impl DrivingStyle {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "calm" | "conservative" => Some(Self::Calm),
            "moderate" | "balanced" => Some(Self::Moderate),
            "aggressive" => Some(Self::Aggressive),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Calm => "calm",
            Self::Moderate => "moderate",
            Self::Aggressive => "aggressive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleProfile {
    pub vehicle_type: VehicleType,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub odometer_km: u32,
    pub climate: Climate,
    pub driving_style: DrivingStyle,
}

impl VehicleProfile {
    pub fn avg_daily_km(&self) -> u32 {
        self.vehicle_type.avg_daily_km()
    }

    pub fn age(&self, current_year: i32) -> i32 {
        current_year - self.year
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.make, self.model)
    }

    /// Snapshot used when no onboarding record exists.
    pub fn demo() -> Self {
        Self {
            vehicle_type: VehicleType::Bike,
            make: "Hero".to_string(),
            model: "Xpulse 200".to_string(),
            year: 2022,
            odometer_km: 18_420,
            climate: Climate::Hot,
            driving_style: DrivingStyle::Moderate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferredTone {
    Friendly,
    Professional,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverProfile {
    pub name: String,
    pub driving_style: DrivingStyle,
    pub avg_daily_km: u32,
    pub preferred_tone: PreferredTone,
    pub last_service_km: u32,
}

impl Default for DriverProfile {
    fn default() -> Self {
        Self {
            name: "there".to_string(),
            driving_style: DrivingStyle::Moderate,
            avg_daily_km: 42,
            preferred_tone: PreferredTone::Friendly,
            last_service_km: 8_200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDueItem {
    pub label: String,
    pub kind: crate::schedule::IntervalKind,
    pub interval_km: u32,
    pub next_km: i64,
    pub km_remaining: i64,
    pub days_remaining: i64,
    pub is_overdue: bool,
    pub is_near: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSchedule {
    pub services: Vec<ServiceDueItem>,
    pub next_service: ServiceDueItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictedIssue {
    pub component: String,
    pub risk: RiskLevel,
    pub eta_km: u32,
    pub eta_days: u32,
    pub action: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Battery,
    Tire,
    Engine,
    Booking,
}

pub const INITIAL_TRUST_LEVEL: f64 = 0.72;

/// Cross-turn memory for one conversation. `trust_level` only ever grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueState {
    pub last_topic: Option<Topic>,
    pub trust_level: f64,
}

impl Default for DialogueState {
    fn default() -> Self {
        Self {
            last_topic: None,
            trust_level: INITIAL_TRUST_LEVEL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Calm,
    Concern,
    Urgent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            sentiment: None,
        }
    }

    pub fn assistant(text: impl Into<String>, sentiment: Sentiment) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            sentiment: Some(sentiment),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "confirmed" => Some(Self::Confirmed),
            "completed" => Some(Self::Completed),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub center: String,
    pub date: String,
    pub time: String,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCenter {
    pub name: String,
    pub eta_minutes: u32,
    pub rating: f32,
    pub badge: String,
    pub slots: Vec<String>,
}
