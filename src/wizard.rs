// src/wizard.rs

//! Appointment completion wizard.
//!
//! A fixed six-step sequence. Each transition submits a step-scoped payload to
//! `POST /citas/{id}/completar-wizard`; the last step resubmits everything the
//! user entered and marks the appointment as attended. The session itself is a
//! plain value owned by the caller and only mutated after a successful submit.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::backend::{Backend, BackendError, endpoints};
use crate::query::ListKind;

const REASON_MAX_LEN: usize = 500;
const NOTES_MAX_LEN: usize = 2000;
const DIAGNOSIS_MAX_LEN: usize = 2000;
/// Shorter diagnosis text counts as "no diagnosis entered".
pub const DIAGNOSIS_MIN_LEN: usize = 10;

/// Appointment states the wizard may be opened for.
const COMPLETABLE_STATES: &[&str] = &["pendiente", "no_asistio"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Asistencia,
    SignosVitales,
    Observaciones,
    Diagnostico,
    PlanMedicacion,
    Finalizar,
}

pub const STEPS: [WizardStep; 6] = [
    WizardStep::Asistencia,
    WizardStep::SignosVitales,
    WizardStep::Observaciones,
    WizardStep::Diagnostico,
    WizardStep::PlanMedicacion,
    WizardStep::Finalizar,
];

const LAST_STEP: usize = STEPS.len() - 1;

impl WizardStep {
    pub fn as_str(self) -> &'static str {
        match self {
            WizardStep::Asistencia => "asistencia",
            WizardStep::SignosVitales => "signos_vitales",
            WizardStep::Observaciones => "observaciones",
            WizardStep::Diagnostico => "diagnostico",
            WizardStep::PlanMedicacion => "plan_medicacion",
            WizardStep::Finalizar => "finalizar",
        }
    }

    pub fn is_skippable(self) -> bool {
        matches!(
            self,
            WizardStep::SignosVitales | WizardStep::Diagnostico | WizardStep::PlanMedicacion
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("appointment id must be a positive integer")]
    InvalidIdentifier,

    #[error("step '{}' cannot be skipped", .0.as_str())]
    SkipNotAllowed(WizardStep),

    #[error("the appointment wizard has already been completed")]
    AlreadyCompleted,

    #[error("appointment in state '{0}' cannot be completed")]
    NotCompletable(String),

    #[error(transparent)]
    Submission(#[from] BackendError),
}

/// Vital signs exactly as typed in the form; parsed only when submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalsInput {
    pub weight_kg: Option<String>,
    pub height_m: Option<String>,
    pub systolic: Option<String>,
    pub diastolic: Option<String>,
    pub glucose_mg_dl: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardSession {
    pub appointment_id: i64,
    #[serde(default)]
    pub current_step_index: usize,
    #[serde(default)]
    pub attendance: bool,
    #[serde(default)]
    pub attendance_reason: Option<String>,
    #[serde(default)]
    pub vitals: VitalsInput,
    #[serde(default)]
    pub consult_notes: Option<String>,
    #[serde(default)]
    pub diagnosis_text: Option<String>,
    #[serde(default)]
    pub medication_plan_notes: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

impl WizardSession {
    pub fn new(appointment_id: i64) -> Result<Self, WizardError> {
        if appointment_id <= 0 {
            return Err(WizardError::InvalidIdentifier);
        }
        Ok(Self {
            appointment_id,
            current_step_index: 0,
            attendance: true,
            attendance_reason: None,
            vitals: VitalsInput::default(),
            consult_notes: None,
            diagnosis_text: None,
            medication_plan_notes: None,
            completed: false,
        })
    }

    pub fn current_step(&self) -> WizardStep {
        STEPS[self.current_step_index.min(LAST_STEP)]
    }

    /// Moves one step back without contacting the backend. Floors at the
    /// first step; a completed session stays where it is.
    pub fn back(&mut self) {
        if self.completed {
            return;
        }
        self.current_step_index = self.current_step_index.min(LAST_STEP).saturating_sub(1);
    }
}

/* ============================================================
   Payload assembly
   ============================================================ */

fn bounded(value: &str, max_len: usize) -> String {
    value.trim().chars().take(max_len).collect()
}

fn non_empty(value: Option<&String>, max_len: usize) -> Option<String> {
    value
        .map(|v| bounded(v, max_len))
        .filter(|v| !v.is_empty())
}

fn parse_float(value: Option<&String>) -> Option<Value> {
    let f = value?.trim().replace(',', ".").parse::<f64>().ok()?;
    f.is_finite().then(|| json!(f))
}

fn parse_int(value: Option<&String>) -> Option<Value> {
    value?.trim().parse::<i64>().ok().map(|n| json!(n))
}

fn attendance_fields(session: &WizardSession, map: &mut Map<String, Value>) {
    map.insert("asistencia".into(), json!(session.attendance));
    if let Some(reason) = non_empty(session.attendance_reason.as_ref(), REASON_MAX_LEN) {
        map.insert("motivo_no_asistencia".into(), json!(reason));
    }
}

/// Only the fields the user filled; `None` when nothing usable remains.
pub fn vitals_payload(vitals: &VitalsInput) -> Option<Value> {
    let fields = [
        ("peso_kg", parse_float(vitals.weight_kg.as_ref())),
        ("talla_m", parse_float(vitals.height_m.as_ref())),
        ("presion_sistolica", parse_int(vitals.systolic.as_ref())),
        ("presion_diastolica", parse_int(vitals.diastolic.as_ref())),
        ("glucosa_mg_dl", parse_float(vitals.glucose_mg_dl.as_ref())),
        (
            "observaciones",
            non_empty(vitals.notes.as_ref(), NOTES_MAX_LEN).map(Value::String),
        ),
    ];

    let map: Map<String, Value> = fields
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k.to_string(), v)))
        .collect();

    (!map.is_empty()).then_some(Value::Object(map))
}

pub fn diagnosis_payload(text: Option<&String>) -> Option<Value> {
    let text = text?.trim();
    if text.chars().count() < DIAGNOSIS_MIN_LEN {
        return None;
    }
    Some(json!({ "descripcion": bounded(text, DIAGNOSIS_MAX_LEN) }))
}

pub fn medication_plan_payload(notes: Option<&String>) -> Option<Value> {
    let notes = notes?.trim();
    if notes.is_empty() {
        return None;
    }
    Some(json!({ "observaciones": notes, "medicamentos": [] }))
}

/// Payload for one step. `skipped` drops the step's optional fields.
pub fn step_payload(session: &WizardSession, step: WizardStep, skipped: bool) -> Value {
    if step == WizardStep::Finalizar {
        return finalize_payload(session);
    }

    let mut map = Map::new();
    map.insert("paso".into(), json!(step.as_str()));

    match step {
        WizardStep::Asistencia => attendance_fields(session, &mut map),
        WizardStep::SignosVitales if !skipped => {
            if let Some(v) = vitals_payload(&session.vitals) {
                map.insert("signos_vitales".into(), v);
            }
        }
        WizardStep::Observaciones => {
            let notes = session
                .consult_notes
                .as_deref()
                .map(|n| bounded(n, NOTES_MAX_LEN))
                .unwrap_or_default();
            map.insert("observaciones".into(), json!(notes));
        }
        WizardStep::Diagnostico if !skipped => {
            if let Some(d) = diagnosis_payload(session.diagnosis_text.as_ref()) {
                map.insert("diagnostico".into(), d);
            }
        }
        WizardStep::PlanMedicacion if !skipped => {
            if let Some(p) = medication_plan_payload(session.medication_plan_notes.as_ref()) {
                map.insert("plan_medicacion".into(), p);
            }
        }
        _ => {}
    }

    Value::Object(map)
}

/// Full resubmission of everything entered so far.
pub fn finalize_payload(session: &WizardSession) -> Value {
    let mut map = Map::new();
    map.insert("paso".into(), json!(WizardStep::Finalizar.as_str()));
    attendance_fields(session, &mut map);

    if let Some(notes) = non_empty(session.consult_notes.as_ref(), NOTES_MAX_LEN) {
        map.insert("observaciones".into(), json!(notes));
    }
    if let Some(v) = vitals_payload(&session.vitals) {
        map.insert("signos_vitales".into(), v);
    }
    if let Some(d) = diagnosis_payload(session.diagnosis_text.as_ref()) {
        map.insert("diagnostico".into(), d);
    }
    if let Some(p) = medication_plan_payload(session.medication_plan_notes.as_ref()) {
        map.insert("plan_medicacion".into(), p);
    }
    map.insert("marcar_como_atendida".into(), json!(true));

    Value::Object(map)
}

/* ============================================================
   Sequencer
   ============================================================ */

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum Transition {
    Advanced { step: WizardStep, appointment: Value },
    Completed { appointment: Value },
    /// Skip pressed on the final step: nothing submitted.
    Ignored,
}

pub struct WizardSequencer<'a> {
    backend: &'a dyn Backend,
    token: &'a str,
}

impl<'a> WizardSequencer<'a> {
    pub fn new(backend: &'a dyn Backend, token: &'a str) -> Self {
        Self { backend, token }
    }

    /// Starts a session for an appointment that is still pending or was missed.
    pub async fn open(&self, appointment_id: i64) -> Result<WizardSession, WizardError> {
        let session = WizardSession::new(appointment_id)?;

        let appointment =
            endpoints::fetch_one(self.backend, self.token, ListKind::Appointments, appointment_id).await?;
        let status = appointment
            .get("estado")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if !COMPLETABLE_STATES.contains(&status) {
            return Err(WizardError::NotCompletable(status.to_string()));
        }

        tracing::info!(appointment_id, "appointment wizard opened");
        Ok(session)
    }

    pub async fn advance(&self, session: &mut WizardSession) -> Result<Transition, WizardError> {
        self.submit(session, false).await
    }

    pub async fn skip(&self, session: &mut WizardSession) -> Result<Transition, WizardError> {
        if session.completed {
            return Err(WizardError::AlreadyCompleted);
        }
        match session.current_step() {
            WizardStep::Finalizar => Ok(Transition::Ignored),
            step if !step.is_skippable() => Err(WizardError::SkipNotAllowed(step)),
            _ => self.submit(session, true).await,
        }
    }

    async fn submit(&self, session: &mut WizardSession, skipped: bool) -> Result<Transition, WizardError> {
        if session.appointment_id <= 0 {
            return Err(WizardError::InvalidIdentifier);
        }
        if session.completed {
            return Err(WizardError::AlreadyCompleted);
        }

        let step = session.current_step();
        let payload = step_payload(session, step, skipped);

        let appointment = endpoints::complete_wizard_step(
            self.backend,
            self.token,
            session.appointment_id,
            &payload,
        )
        .await
        .map_err(|e| {
            tracing::warn!(
                appointment_id = session.appointment_id,
                step = step.as_str(),
                error = %e,
                "wizard step submission failed"
            );
            WizardError::Submission(e)
        })?;

        tracing::info!(
            appointment_id = session.appointment_id,
            step = step.as_str(),
            skipped,
            "wizard step submitted"
        );

        if step == WizardStep::Finalizar {
            session.completed = true;
            return Ok(Transition::Completed { appointment });
        }

        session.current_step_index = session.current_step_index.min(LAST_STEP) + 1;
        Ok(Transition::Advanced {
            step: session.current_step(),
            appointment,
        })
    }
}
