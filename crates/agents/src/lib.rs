use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use pulse_core::{
    compute_schedule, predict_issues, prioritize, Appointment, AppointmentStatus,
    Branch, Clock, CompanionError, ConversationTurn, DialogueEngine, DialogueState, DriverProfile,
    PredictedIssue, Sentiment, ServiceSchedule, VehicleProfile,
};
use pulse_observability::{AppMetrics, MetricsSnapshot};
use pulse_storage::AppointmentRepository;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

pub const OPENING_LINE: &str =
    "I monitor your vehicle quietly and speak up before issues grow. How can I help?";

#[derive(Debug, Clone, Serialize)]
pub struct AssistantReply {
    pub session_id: String,
    pub branch: Branch,
    pub turn: ConversationTurn,
    pub state: DialogueState,
    pub appointment: Option<Appointment>,
}

#[derive(Debug)]
struct Session {
    state: DialogueState,
    transcript: Vec<ConversationTurn>,
    last_active: DateTime<Utc>,
}

impl Session {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            state: DialogueState::default(),
            transcript: vec![ConversationTurn::assistant(OPENING_LINE, Sentiment::Calm)],
            last_active: now,
        }
    }
}

#[derive(Debug, Clone)]
struct ProfileContext {
    vehicle: VehicleProfile,
    driver: DriverProfile,
}

pub struct CompanionAgent<S>
where
    S: AppointmentRepository,
{
    engine: DialogueEngine,
    context: RwLock<ProfileContext>,
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    metrics: Arc<AppMetrics>,
}

impl<S> CompanionAgent<S>
where
    S: AppointmentRepository,
{
    pub fn new(
        vehicle: VehicleProfile,
        driver: DriverProfile,
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            engine: DialogueEngine::new(),
            context: RwLock::new(ProfileContext { vehicle, driver }),
            sessions: RwLock::new(HashMap::new()),
            store,
            clock,
            metrics,
        }
    }

    /// Runs one utterance to completion. Turns of the same session are
    /// serialized on the session lock; distinct sessions proceed freely.
    ///
    /// A confirmed booking is written to the store before the new dialogue
    /// state and the assistant turn are committed. If the write fails the
    /// caller gets `PersistenceFailure` and the session keeps its old state.
    #[instrument(skip(self, text))]
    pub async fn handle_message(
        &self,
        session_id: Option<String>,
        text: &str,
    ) -> Result<AssistantReply, CompanionError> {
        let started = Instant::now();
        self.metrics.inc_message();

        let session_id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let session = self.session(&session_id);
        let mut session = session.lock().await;
        session.last_active = self.clock.now();
        session.transcript.push(ConversationTurn::user(text));

        let ProfileContext { vehicle, driver } = self.context.read().clone();
        let outcome = self.engine.respond(
            text,
            &session.state,
            &vehicle,
            &driver,
            self.clock.as_ref(),
        );

        if let Some(appointment) = &outcome.appointment {
            if let Err(source) = self.store.append(appointment).await {
                self.metrics.inc_persistence_failure();
                error!(
                    session_id = %session_id,
                    center = %appointment.center,
                    error = %source,
                    "appointment write failed"
                );
                return Err(CompanionError::PersistenceFailure {
                    center: appointment.center.clone(),
                    source,
                });
            }

            self.metrics.inc_booking();
            info!(
                session_id = %session_id,
                appointment_id = %appointment.id,
                center = %appointment.center,
                date = %appointment.date,
                time = %appointment.time,
                "appointment confirmed"
            );
        }

        session.state = outcome.state.clone();
        session.transcript.push(outcome.turn.clone());

        self.metrics.observe_latency(started.elapsed());
        info!(
            session_id = %session_id,
            branch = ?outcome.branch,
            sentiment = ?outcome.turn.sentiment,
            trust_level = outcome.state.trust_level,
            "message handled"
        );

        Ok(AssistantReply {
            session_id,
            branch: outcome.branch,
            turn: outcome.turn,
            state: outcome.state,
            appointment: outcome.appointment,
        })
    }

    pub fn maintenance_schedule(&self) -> ServiceSchedule {
        self.metrics.inc_schedule();
        let vehicle = self.vehicle();
        self.warn_on_fallback(&vehicle);
        compute_schedule(&vehicle)
    }

    /// Issues in rule order, or ranked by risk then distance when `ranked`.
    pub fn predicted_issues(&self, ranked: bool) -> Vec<PredictedIssue> {
        self.metrics.inc_prediction();
        let vehicle = self.vehicle();
        self.warn_on_fallback(&vehicle);

        let mut issues = predict_issues(&vehicle, self.clock.current_year());
        if ranked {
            prioritize(&mut issues);
        }
        issues
    }

    pub fn vehicle(&self) -> VehicleProfile {
        self.context.read().vehicle.clone()
    }

    pub fn driver(&self) -> DriverProfile {
        self.context.read().driver.clone()
    }

    pub fn update_profile(&self, vehicle: VehicleProfile, driver: DriverProfile) {
        info!(
            vehicle_type = vehicle.vehicle_type.as_str(),
            odometer_km = vehicle.odometer_km,
            "profile updated"
        );
        *self.context.write() = ProfileContext { vehicle, driver };
    }

    pub async fn transcript(&self, session_id: &str) -> Vec<ConversationTurn> {
        let Some(session) = self.existing_session(session_id) else {
            return Vec::new();
        };
        let transcript = session.lock().await.transcript.clone();
        transcript
    }

    pub async fn dialogue_state(&self, session_id: &str) -> Option<DialogueState> {
        let session = self.existing_session(session_id)?;
        let state = session.lock().await.state.clone();
        Some(state)
    }

    /// Most recent first.
    pub async fn appointments(&self) -> Result<Vec<Appointment>> {
        let mut appointments = self.store.list().await?;
        appointments.reverse();
        Ok(appointments)
    }

    pub async fn cancel_appointment(&self, id: &str) -> Result<bool> {
        self.set_appointment_status(id, AppointmentStatus::Cancelled)
            .await
    }

    pub async fn complete_appointment(&self, id: &str) -> Result<bool> {
        self.set_appointment_status(id, AppointmentStatus::Completed)
            .await
    }

    /// Drops the session's state and transcript. Returns false for unknown ids.
    pub fn end_session(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().remove(session_id).is_some();
        if removed {
            info!(session_id = %session_id, "session ended");
        }
        removed
    }

    /// Drops every session idle for longer than `ttl`. Sessions with a turn
    /// in flight are kept.
    pub fn purge_expired_sessions(&self, ttl: Duration) -> usize {
        let cutoff = self.clock.now() - ttl;
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, session| match session.try_lock() {
            Ok(guard) => guard.last_active >= cutoff,
            Err(_) => true,
        });

        let purged = before - sessions.len();
        if purged > 0 {
            info!(purged, remaining = sessions.len(), "expired sessions purged");
        }
        purged
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn set_appointment_status(&self, id: &str, status: AppointmentStatus) -> Result<bool> {
        let updated = self.store.set_status(id, status).await?;
        if updated {
            info!(appointment_id = %id, status = status.as_str(), "appointment status changed");
        } else {
            warn!(appointment_id = %id, "no appointment with that id");
        }
        Ok(updated)
    }

    fn session(&self, session_id: &str) -> Arc<Mutex<Session>> {
        if let Some(session) = self.existing_session(session_id) {
            return session;
        }

        self.sessions
            .write()
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Session::new(self.clock.now()))))
            .clone()
    }

    fn existing_session(&self, session_id: &str) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().get(session_id).cloned()
    }

    fn warn_on_fallback(&self, vehicle: &VehicleProfile) {
        if !vehicle.vehicle_type.is_recognized() {
            warn!(
                make = %vehicle.make,
                model = %vehicle.model,
                "unrecognized vehicle type, using generic service rules"
            );
        }
    }
}
