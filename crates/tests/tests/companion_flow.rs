use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use pulse_agents::{CompanionAgent, OPENING_LINE};
use pulse_core::{
    Appointment, AppointmentStatus, Branch, Climate, Clock, CompanionError, DriverProfile,
    DrivingStyle, FixedClock, Role, Sentiment, Topic, VehicleProfile, VehicleType,
    INITIAL_TRUST_LEVEL,
};
use pulse_observability::AppMetrics;
use pulse_storage::{AppointmentRepository, MemoryStore, Store};

struct RejectingStore;

impl AppointmentRepository for RejectingStore {
    async fn append(&self, _appointment: &Appointment) -> Result<()> {
        Err(anyhow!("disk full"))
    }

    async fn list(&self) -> Result<Vec<Appointment>> {
        Ok(Vec::new())
    }

    async fn set_status(&self, _id: &str, _status: AppointmentStatus) -> Result<bool> {
        Ok(false)
    }
}

struct SteppingClock {
    at: Mutex<DateTime<Utc>>,
}

impl SteppingClock {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            at: Mutex::new(Utc.with_ymd_and_hms(2025, 12, 18, 10, 0, 0).unwrap()),
        })
    }

    fn advance(&self, by: Duration) {
        *self.at.lock() += by;
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        *self.at.lock()
    }
}

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2025, 12, 18, 10, 0, 0).unwrap(),
    ))
}

fn vehicle() -> VehicleProfile {
    VehicleProfile {
        vehicle_type: VehicleType::Car,
        make: "Hyundai".to_string(),
        model: "i20".to_string(),
        year: 2020,
        odometer_km: 10_000,
        climate: Climate::Hot,
        driving_style: DrivingStyle::Moderate,
    }
}

fn driver() -> DriverProfile {
    DriverProfile {
        name: "Alex".to_string(),
        ..DriverProfile::default()
    }
}

fn agent_with<S: AppointmentRepository>(store: S) -> CompanionAgent<S> {
    CompanionAgent::new(
        vehicle(),
        driver(),
        Arc::new(store),
        clock(),
        AppMetrics::shared(),
    )
}

#[tokio::test]
async fn booking_with_explicit_slot_is_persisted() {
    let agent = agent_with(MemoryStore::new());

    let reply = agent
        .handle_message(
            Some("s1".to_string()),
            "Book Pulse AutoCare Downtown at 14:15 on 2025-12-20",
        )
        .await
        .expect("booking should succeed");

    assert_eq!(reply.branch, Branch::BookingConfirmed);
    assert!(reply.turn.text.contains("Pulse AutoCare Downtown"));

    let appointments = agent.appointments().await.unwrap();
    assert_eq!(appointments.len(), 1);
    assert_eq!(appointments[0].center, "Pulse AutoCare Downtown");
    assert_eq!(appointments[0].time, "14:15");
    assert_eq!(appointments[0].date, "2025-12-20");
    assert_eq!(appointments[0].status, AppointmentStatus::Confirmed);

    let state = agent.dialogue_state("s1").await.unwrap();
    assert_eq!(state.last_topic, Some(Topic::Booking));
    assert!((state.trust_level - (INITIAL_TRUST_LEVEL + 0.05)).abs() < 1e-9);
    assert_eq!(agent.metrics().bookings_total, 1);
}

#[tokio::test]
async fn failed_write_does_not_confirm_or_raise_trust() {
    let agent = agent_with(RejectingStore);

    let err = agent
        .handle_message(Some("s1".to_string()), "book tomorrow at 09:30")
        .await
        .expect_err("store rejects every write");
    assert!(matches!(err, CompanionError::PersistenceFailure { .. }));

    let state = agent.dialogue_state("s1").await.unwrap();
    assert!((state.trust_level - INITIAL_TRUST_LEVEL).abs() < 1e-9);
    assert_eq!(state.last_topic, None);

    let transcript = agent.transcript("s1").await;
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[1].role, Role::User);
    assert!(transcript.iter().all(|turn| !turn.text.contains("All set")));
    assert_eq!(agent.metrics().persistence_failures_total, 1);
}

#[tokio::test]
async fn non_booking_turns_survive_a_broken_store() {
    let agent = agent_with(RejectingStore);
    let reply = agent
        .handle_message(None, "what can you do")
        .await
        .expect("no write needed");
    assert_eq!(reply.branch, Branch::Greeting);
    assert!(reply.turn.text.contains("Alex"));
}

#[tokio::test]
async fn battery_follow_up_uses_session_memory() {
    let agent = agent_with(Store::memory());

    let first = agent
        .handle_message(Some("s1".to_string()), "why is my battery flagged")
        .await
        .unwrap();
    assert_eq!(first.branch, Branch::BatteryDiagnosis);
    assert!(first.turn.text.contains("Hyundai i20 (2020)"));

    let second = agent
        .handle_message(Some("s1".to_string()), "yes, go ahead")
        .await
        .unwrap();
    assert_eq!(second.branch, Branch::BatteryTestAcknowledged);
    assert!((second.state.trust_level - (INITIAL_TRUST_LEVEL + 0.08)).abs() < 1e-9);

    // A fresh session has no battery context.
    let other = agent
        .handle_message(Some("s2".to_string()), "yes, go ahead")
        .await
        .unwrap();
    assert_eq!(other.branch, Branch::Greeting);

    let transcript = agent.transcript("s1").await;
    assert_eq!(transcript.len(), 5);
    assert_eq!(transcript[0].text, OPENING_LINE);
    assert_eq!(transcript[4].role, Role::Assistant);
    assert_eq!(transcript[4].sentiment, Some(Sentiment::Calm));
    assert!(agent.appointments().await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_sessions_keep_independent_state() {
    let agent = agent_with(MemoryStore::new());

    let (a, b) = tokio::join!(
        agent.handle_message(Some("a".to_string()), "book today"),
        agent.handle_message(Some("b".to_string()), "tire pressure"),
    );
    assert_eq!(a.unwrap().branch, Branch::BookingConfirmed);
    assert_eq!(b.unwrap().branch, Branch::TireDiagnosis);

    let a_state = agent.dialogue_state("a").await.unwrap();
    let b_state = agent.dialogue_state("b").await.unwrap();
    assert_eq!(a_state.last_topic, Some(Topic::Booking));
    assert_eq!(b_state.last_topic, Some(Topic::Tire));
    assert!((b_state.trust_level - INITIAL_TRUST_LEVEL).abs() < 1e-9);
}

#[tokio::test]
async fn appointments_can_be_cancelled_and_completed() {
    let agent = agent_with(Store::sqlite("sqlite::memory:").await.unwrap());

    agent
        .handle_message(None, "book at 09:30 today")
        .await
        .unwrap();
    agent
        .handle_message(None, "Book Neon Garage East at 12:45 tomorrow")
        .await
        .unwrap();

    let appointments = agent.appointments().await.unwrap();
    assert_eq!(appointments.len(), 2);
    assert_eq!(appointments[0].center, "Neon Garage East");
    assert_eq!(appointments[0].date, "tomorrow");

    assert!(agent.cancel_appointment(&appointments[0].id).await.unwrap());
    assert!(agent.complete_appointment(&appointments[1].id).await.unwrap());
    assert!(!agent.cancel_appointment("missing").await.unwrap());

    let appointments = agent.appointments().await.unwrap();
    assert_eq!(appointments[0].status, AppointmentStatus::Cancelled);
    assert_eq!(appointments[1].status, AppointmentStatus::Completed);
}

#[tokio::test]
async fn schedule_and_predictions_follow_the_profile() {
    let agent = agent_with(MemoryStore::new());

    let schedule = agent.maintenance_schedule();
    assert_eq!(schedule.next_service.label, "General Service");
    assert_eq!(schedule.next_service.next_km, 11_000);
    assert_eq!(schedule.next_service.km_remaining, 1_000);
    assert!(!schedule.next_service.is_overdue);

    let issues = agent.predicted_issues(false);
    assert_eq!(issues.len(), 2);
    assert_eq!(issues[0].component, "12V Battery");
    assert_eq!(issues[1].component, "Engine Coil");

    agent.update_profile(
        VehicleProfile {
            vehicle_type: VehicleType::Electric,
            climate: Climate::Mixed,
            year: 2024,
            ..vehicle()
        },
        driver(),
    );
    let issues = agent.predicted_issues(true);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].component, "Battery Pack Health");
    assert_eq!(agent.maintenance_schedule().services.len(), 3);

    let snapshot = agent.metrics();
    assert_eq!(snapshot.schedules_total, 2);
    assert_eq!(snapshot.predictions_total, 2);
}

#[tokio::test]
async fn split_confirmation_phrase_is_not_a_yes() {
    let agent = agent_with(MemoryStore::new());

    let first = agent
        .handle_message(Some("s1".to_string()), "my battery seems weak")
        .await
        .unwrap();
    assert_eq!(first.branch, Branch::BatteryDiagnosis);

    let second = agent
        .handle_message(Some("s1".to_string()), "go\nahead")
        .await
        .unwrap();
    assert_eq!(second.branch, Branch::Greeting);
    assert!((second.state.trust_level - INITIAL_TRUST_LEVEL).abs() < 1e-9);

    let transcript = agent.transcript("s1").await;
    assert_eq!(transcript[3].role, Role::User);
    assert_eq!(transcript[3].text, "go\nahead");
}

#[tokio::test]
async fn transcript_keeps_the_message_as_typed() {
    let agent = agent_with(MemoryStore::new());
    agent
        .handle_message(Some("s1".to_string()), "  tire   pressure?  ")
        .await
        .unwrap();

    let transcript = agent.transcript("s1").await;
    assert_eq!(transcript[1].text, "  tire   pressure?  ");
}

#[tokio::test]
async fn idle_sessions_are_purged_and_can_be_ended() {
    let clock = SteppingClock::new();
    let agent = CompanionAgent::new(
        vehicle(),
        driver(),
        Arc::new(MemoryStore::new()),
        clock.clone(),
        AppMetrics::shared(),
    );

    agent.handle_message(Some("s1".to_string()), "hello").await.unwrap();
    agent.handle_message(Some("s2".to_string()), "hello").await.unwrap();
    assert_eq!(agent.session_count(), 2);

    clock.advance(Duration::minutes(20));
    agent
        .handle_message(Some("s2".to_string()), "tire pressure")
        .await
        .unwrap();

    clock.advance(Duration::minutes(15));
    assert_eq!(agent.purge_expired_sessions(Duration::minutes(30)), 1);
    assert_eq!(agent.session_count(), 1);
    assert!(agent.transcript("s1").await.is_empty());
    assert_eq!(
        agent.dialogue_state("s2").await.unwrap().last_topic,
        Some(Topic::Tire)
    );

    assert!(agent.end_session("s2"));
    assert!(!agent.end_session("s2"));
    assert_eq!(agent.session_count(), 0);

    // A purged id starts over from the greeting.
    agent.handle_message(Some("s1".to_string()), "hello").await.unwrap();
    let transcript = agent.transcript("s1").await;
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[0].text, OPENING_LINE);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sessions_run_on_spawned_tasks() {
    let agent = Arc::new(agent_with(Store::memory()));

    let handles: Vec<_> = ["a", "b", "c"]
        .into_iter()
        .map(|id| {
            let agent = Arc::clone(&agent);
            tokio::spawn(async move {
                agent
                    .handle_message(Some(id.to_string()), "book today")
                    .await
            })
        })
        .collect();

    for handle in handles {
        let reply = handle.await.unwrap().unwrap();
        assert_eq!(reply.branch, Branch::BookingConfirmed);
    }
    assert_eq!(agent.appointments().await.unwrap().len(), 3);
}
