use crate::models::{Climate, PredictedIssue, RiskLevel, VehicleProfile, VehicleType};

/// Evaluates the expert rule set against a profile. Rules run in a fixed
/// order and that order is the list order; nothing is re-ranked here.
pub fn predict_issues(profile: &VehicleProfile, current_year: i32) -> Vec<PredictedIssue> {
    let age = profile.age(current_year);
    let vehicle_type = profile.vehicle_type;
    let is_bike = vehicle_type == VehicleType::Bike;

    let mut issues = Vec::new();

    if vehicle_type != VehicleType::Electric && (profile.climate.is_heat_stressing() || age > 3) {
        issues.push(PredictedIssue {
            component: "12V Battery".to_string(),
            risk: if profile.climate == Climate::Hot {
                RiskLevel::High
            } else {
                RiskLevel::Medium
            },
            eta_km: if is_bike { 600 } else { 900 },
            eta_days: if is_bike { 10 } else { 14 },
            action: "Schedule battery health test".to_string(),
        });
    }

    let tire_threshold = match vehicle_type {
        VehicleType::Bike => 10_000,
        VehicleType::Truck => 25_000,
        _ => 15_000,
    };
    if profile.odometer_km > tire_threshold {
        let (eta_km, eta_days) = match vehicle_type {
            VehicleType::Bike => (300, 5),
            VehicleType::Truck => (800, 10),
            _ => (450, 7),
        };
        issues.push(PredictedIssue {
            component: if is_bike { "Front Tire" } else { "Front-right Tire" }.to_string(),
            risk: RiskLevel::Medium,
            eta_km,
            eta_days,
            action: if is_bike {
                "Check tread and pressure"
            } else {
                "Rebalance and inflate"
            }
            .to_string(),
        });
    }

    if vehicle_type != VehicleType::Electric && profile.climate.is_heat_stressing() && age > 2 {
        issues.push(PredictedIssue {
            component: if is_bike { "Engine Temperature" } else { "Engine Coil" }.to_string(),
            risk: if is_bike { RiskLevel::Medium } else { RiskLevel::Low },
            eta_km: if is_bike { 800 } else { 1_500 },
            eta_days: if is_bike { 12 } else { 21 },
            action: if is_bike {
                "Check coolant and oil"
            } else {
                "Monitor thermal patterns"
            }
            .to_string(),
        });
    }

    if vehicle_type == VehicleType::Electric {
        issues.push(PredictedIssue {
            component: "Battery Pack Health".to_string(),
            risk: RiskLevel::Low,
            eta_km: 3_000,
            eta_days: 45,
            action: "Monitor charging efficiency and range".to_string(),
        });
    }

    if vehicle_type == VehicleType::Truck {
        issues.push(PredictedIssue {
            component: "Brake Pads (Heavy Load)".to_string(),
            risk: RiskLevel::Medium,
            eta_km: 1_200,
            eta_days: 15,
            action: "Inspect brake wear due to load stress".to_string(),
        });
    }

    issues
}

/// Caller-side ranking: highest risk first, then soonest by distance.
pub fn prioritize(issues: &mut [PredictedIssue]) {
    issues.sort_by(|a, b| b.risk.cmp(&a.risk).then(a.eta_km.cmp(&b.eta_km)));
}
