use serde::{Deserialize, Serialize};

use crate::models::{ServiceDueItem, ServiceSchedule, VehicleProfile, VehicleType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalKind {
    General,
    Inspection,
    Oil,
    Brakes,
    Chain,
    Suspension,
    Clutch,
    Cooling,
    Battery,
    Major,
}

impl IntervalKind {
    /// Fraction of the interval inside which an item counts as near-due.
    /// Chains wear faster than the rest, so they get a wider window.
    pub fn near_threshold(self) -> f64 {
        match self {
            Self::Chain => 0.15,
            _ => 0.10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interval {
    Km(u32),
    Months(u32),
}

impl Interval {
    pub fn km(self) -> Option<u32> {
        match self {
            Self::Km(km) => Some(km),
            Self::Months(_) => None,
        }
    }
}

type IntervalTable = &'static [(IntervalKind, Interval)];

const BIKE: IntervalTable = &[
    (IntervalKind::General, Interval::Km(4_000)),
    (IntervalKind::Oil, Interval::Km(3_500)),
    (IntervalKind::Brakes, Interval::Km(5_000)),
    (IntervalKind::Chain, Interval::Km(600)),
    (IntervalKind::Major, Interval::Km(22_000)),
];

const CAR: IntervalTable = &[
    (IntervalKind::General, Interval::Km(11_000)),
    (IntervalKind::Oil, Interval::Km(10_000)),
    (IntervalKind::Brakes, Interval::Km(20_000)),
    (IntervalKind::Battery, Interval::Months(12)),
    (IntervalKind::Major, Interval::Km(50_000)),
];

const SUV: IntervalTable = &[
    (IntervalKind::General, Interval::Km(10_000)),
    (IntervalKind::Oil, Interval::Km(10_000)),
    (IntervalKind::Brakes, Interval::Km(20_000)),
    (IntervalKind::Suspension, Interval::Km(20_000)),
    (IntervalKind::Major, Interval::Km(60_000)),
];

const TRUCK: IntervalTable = &[
    (IntervalKind::General, Interval::Km(17_500)),
    (IntervalKind::Oil, Interval::Km(15_000)),
    (IntervalKind::Brakes, Interval::Km(12_500)),
    (IntervalKind::Clutch, Interval::Km(30_000)),
    (IntervalKind::Major, Interval::Km(100_000)),
];

const ELECTRIC: IntervalTable = &[
    (IntervalKind::Inspection, Interval::Km(12_500)),
    (IntervalKind::Battery, Interval::Months(12)),
    (IntervalKind::Brakes, Interval::Km(20_000)),
    (IntervalKind::Cooling, Interval::Km(20_000)),
    (IntervalKind::Major, Interval::Km(80_000)),
];

const FALLBACK: IntervalTable = &[
    (IntervalKind::General, Interval::Km(11_000)),
    (IntervalKind::Oil, Interval::Km(10_000)),
    (IntervalKind::Brakes, Interval::Km(20_000)),
    (IntervalKind::Major, Interval::Km(50_000)),
];

pub fn interval_table(vehicle_type: VehicleType) -> &'static [(IntervalKind, Interval)] {
    match vehicle_type {
        VehicleType::Bike => BIKE,
        VehicleType::Car => CAR,
        VehicleType::Suv => SUV,
        VehicleType::Truck => TRUCK,
        VehicleType::Electric => ELECTRIC,
        VehicleType::Other => FALLBACK,
    }
}

/// The interval kinds that are tracked by distance for a vehicle type.
/// Never empty.
fn scheduled_kinds(vehicle_type: VehicleType) -> &'static [IntervalKind] {
    match vehicle_type {
        VehicleType::Electric => &[
            IntervalKind::Inspection,
            IntervalKind::Brakes,
            IntervalKind::Cooling,
        ],
        VehicleType::Bike => &[IntervalKind::General, IntervalKind::Oil, IntervalKind::Chain],
        VehicleType::Suv => &[
            IntervalKind::General,
            IntervalKind::Oil,
            IntervalKind::Brakes,
            IntervalKind::Suspension,
        ],
        VehicleType::Truck => &[
            IntervalKind::General,
            IntervalKind::Oil,
            IntervalKind::Brakes,
            IntervalKind::Clutch,
        ],
        VehicleType::Car | VehicleType::Other => {
            &[IntervalKind::General, IntervalKind::Oil, IntervalKind::Brakes]
        }
    }
}

fn service_label(vehicle_type: VehicleType, kind: IntervalKind) -> &'static str {
    match (kind, vehicle_type) {
        (IntervalKind::General, _) => "General Service",
        (IntervalKind::Inspection, _) => "General Inspection",
        (IntervalKind::Oil, VehicleType::Bike) => "Engine Oil Change",
        (IntervalKind::Oil, _) => "Engine Oil & Filter",
        (IntervalKind::Brakes, VehicleType::Electric) => "Brake Check (Regen Wear)",
        (IntervalKind::Brakes, VehicleType::Truck) => "Brake System Check",
        (IntervalKind::Brakes, _) => "Brake Inspection",
        (IntervalKind::Chain, _) => "Chain Lubrication",
        (IntervalKind::Suspension, _) => "Suspension & Alignment",
        (IntervalKind::Clutch, _) => "Clutch Inspection",
        (IntervalKind::Cooling, _) => "Cooling System Check",
        (IntervalKind::Battery, _) => "Battery Health Check",
        (IntervalKind::Major, _) => "Major Service",
    }
}

pub fn compute_schedule(profile: &VehicleProfile) -> ServiceSchedule {
    let table = interval_table(profile.vehicle_type);
    let odometer = i64::from(profile.odometer_km);
    let avg_daily_km = profile.avg_daily_km();

    let mut services = scheduled_kinds(profile.vehicle_type)
        .iter()
        .filter_map(|kind| {
            let interval = table
                .iter()
                .find(|(entry_kind, _)| entry_kind == kind)
                .and_then(|(_, interval)| interval.km())?;
            Some(due_item(
                service_label(profile.vehicle_type, *kind),
                *kind,
                interval,
                odometer,
                avg_daily_km,
            ))
        })
        .collect::<Vec<_>>();

    // Stable, so equal distances keep table order.
    services.sort_by_key(|item| item.km_remaining);

    let next_service = services[0].clone();
    ServiceSchedule {
        services,
        next_service,
    }
}

fn due_item(
    label: &str,
    kind: IntervalKind,
    interval_km: u32,
    odometer: i64,
    avg_daily_km: u32,
) -> ServiceDueItem {
    let interval = i64::from(interval_km);
    let next_km = (odometer / interval) * interval + interval;
    let km_remaining = next_km - odometer;
    let days_remaining = (km_remaining as f64 / f64::from(avg_daily_km)).ceil() as i64;
    let is_overdue = km_remaining < 0;
    let is_near = !is_overdue && (km_remaining as f64) < interval as f64 * kind.near_threshold();

    ServiceDueItem {
        label: label.to_string(),
        kind,
        interval_km,
        next_km,
        km_remaining,
        days_remaining,
        is_overdue,
        is_near,
    }
}
