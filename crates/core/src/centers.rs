use crate::models::ServiceCenter;

fn center(name: &str, eta_minutes: u32, rating: f32, badge: &str, slots: &[&str]) -> ServiceCenter {
    ServiceCenter {
        name: name.to_string(),
        eta_minutes,
        rating,
        badge: badge.to_string(),
        slots: slots.iter().map(|slot| slot.to_string()).collect(),
    }
}

/// Nearby service centers, closest first.
pub fn service_centers() -> Vec<ServiceCenter> {
    vec![
        center(
            "Pulse AutoCare Downtown",
            12,
            4.8,
            "OEM Certified",
            &["09:30", "11:00", "14:15", "16:40"],
        ),
        center(
            "Neon Garage East",
            18,
            4.6,
            "EV Specialist",
            &["10:10", "12:45", "15:20"],
        ),
        center(
            "Astra Motors Lab",
            22,
            4.9,
            "Diagnostics Lab",
            &["08:50", "13:05", "17:00"],
        ),
    ]
}
