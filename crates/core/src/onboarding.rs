use serde::{Deserialize, Serialize};

use crate::models::{
    Climate, DriverProfile, DrivingStyle, PreferredTone, VehicleProfile, VehicleType,
};

/// Gap assumed between the reported odometer and the last workshop visit.
const LAST_SERVICE_GAP_KM: u32 = 10_220;

/// Onboarding form as stored by the app: every field is free text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OnboardingRecord {
    pub name: String,
    pub email: String,
    pub role: String,
    pub vehicle: String,
    pub vehicle_type: String,
    pub vehicle_make: String,
    pub vehicle_model: String,
    pub vehicle_year: String,
    pub odometer: String,
    pub climate: String,
    pub driving_style: String,
}

impl OnboardingRecord {
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn vehicle_profile(&self, current_year: i32) -> VehicleProfile {
        let vehicle_type = if self.vehicle_type.trim().is_empty() {
            VehicleType::Car
        } else {
            VehicleType::parse(&self.vehicle_type)
        };

        VehicleProfile {
            vehicle_type,
            make: non_empty_or(&self.vehicle_make, "Unknown"),
            model: non_empty_or(&self.vehicle_model, "Vehicle"),
            year: self.vehicle_year.trim().parse().unwrap_or(current_year),
            odometer_km: self.odometer_km().unwrap_or(0),
            climate: Climate::parse(&self.climate).unwrap_or(Climate::Mixed),
            driving_style: self.driving_style(),
        }
    }

    pub fn driver_profile(&self) -> DriverProfile {
        let defaults = DriverProfile::default();
        DriverProfile {
            name: non_empty_or(&self.name, &defaults.name),
            driving_style: self.driving_style(),
            avg_daily_km: defaults.avg_daily_km,
            preferred_tone: PreferredTone::Friendly,
            last_service_km: self
                .odometer_km()
                .unwrap_or(defaults.last_service_km)
                .saturating_sub(LAST_SERVICE_GAP_KM),
        }
    }

    fn odometer_km(&self) -> Option<u32> {
        self.odometer.trim().parse().ok()
    }

    fn driving_style(&self) -> DrivingStyle {
        DrivingStyle::parse(&self.driving_style).unwrap_or(DrivingStyle::Moderate)
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}
