//! In-memory student roster for the current session.
//!
//! The roster is `Empty` until a session loads it and goes back to `Empty` on
//! logout. It only changes in response to results the [`StudentStore`] has
//! confirmed. The lock is never held across a store call, so concurrent
//! operations proceed independently.

mod error;

pub use error::*;

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::models::{CreateStudentRequest, HoursInput, Identity, StudentDraft, StudentRecord};

/// External document store holding student records.
pub trait StudentStore: Send + Sync + 'static {
    /// Persist a new record with zero hours, owned by `owner`.
    fn create_record(
        &self,
        draft: &StudentDraft,
        owner: &Identity,
    ) -> impl Future<Output = Result<StudentRecord, StorageFailure>> + Send;

    /// All records owned by `owner`, newest first.
    fn list_records(
        &self,
        owner: &Identity,
    ) -> impl Future<Output = Result<Vec<StudentRecord>, StorageFailure>> + Send;

    /// Atomically add `delta` to the stored total.
    fn increment_hours(
        &self,
        id: &str,
        delta: f64,
    ) -> impl Future<Output = Result<(), StorageFailure>> + Send;

    fn get_record(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<StudentRecord>, StorageFailure>> + Send;
}

enum RosterState {
    Empty,
    Loaded {
        owner: Identity,
        records: Vec<StudentRecord>,
    },
}

/// Result of a confirmed hours increment.
#[derive(Debug, Clone, PartialEq)]
pub struct HoursUpdate {
    pub record: StudentRecord,
    pub added: f64,
}

pub struct Roster<S> {
    store: Arc<S>,
    state: RwLock<RosterState>,
    /// Bumped on every load and clear; stale results are dropped.
    epoch: AtomicU64,
}

impl<S: StudentStore> Roster<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            state: RwLock::new(RosterState::Empty),
            epoch: AtomicU64::new(0),
        }
    }

    pub async fn is_loaded(&self) -> bool {
        matches!(*self.state.read().await, RosterState::Loaded { .. })
    }

    /// Whether the roster currently holds the students of `uid`.
    pub async fn is_loaded_for(&self, uid: &str) -> bool {
        matches!(&*self.state.read().await, RosterState::Loaded { owner, .. } if owner.uid == uid)
    }

    /// Run `f` over the loaded records.
    pub async fn with_records<R>(
        &self,
        f: impl FnOnce(&[StudentRecord]) -> R,
    ) -> Result<R, RosterError> {
        match &*self.state.read().await {
            RosterState::Loaded { records, .. } => Ok(f(records)),
            RosterState::Empty => Err(RosterError::NotLoaded),
        }
    }

    /// Fetch the roster for `identity`, replacing whatever was loaded.
    ///
    /// On failure the roster stays empty.
    pub async fn load(&self, identity: &Identity) -> Result<usize, RosterError> {
        let epoch = {
            let mut state = self.state.write().await;
            *state = RosterState::Empty;
            self.epoch.fetch_add(1, Ordering::SeqCst) + 1
        };

        let records = self.store.list_records(identity).await?;

        let mut state = self.state.write().await;
        if self.epoch.load(Ordering::SeqCst) != epoch {
            debug!(uid = %identity.uid, "Discarding roster load from a previous session");
            return Err(RosterError::SessionChanged);
        }

        let count = records.len();
        *state = RosterState::Loaded {
            owner: identity.clone(),
            records,
        };
        info!(uid = %identity.uid, count, "Roster loaded");
        Ok(count)
    }

    /// Drop the roster from memory.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if matches!(*state, RosterState::Loaded { .. }) {
            info!("Roster cleared");
        }
        *state = RosterState::Empty;
    }

    /// Add a student and prepend the stored record.
    pub async fn add(&self, request: CreateStudentRequest) -> Result<StudentRecord, RosterError> {
        let draft = validate_candidate(request)?;

        let (owner, epoch) = {
            let state = self.state.read().await;
            match &*state {
                RosterState::Loaded { owner, .. } => {
                    (owner.clone(), self.epoch.load(Ordering::SeqCst))
                }
                RosterState::Empty => return Err(RosterError::NotLoaded),
            }
        };

        let record = self.store.create_record(&draft, &owner).await?;

        let mut state = self.state.write().await;
        match &mut *state {
            RosterState::Loaded { records, .. } if self.epoch.load(Ordering::SeqCst) == epoch => {
                records.insert(0, record.clone());
                debug!(id = %record.id, "Student added to roster");
                Ok(record)
            }
            _ => Err(RosterError::SessionChanged),
        }
    }

    /// Add hours to a student.
    ///
    /// The store performs the addition. Afterwards the record is re-read
    /// and the stored total replaces the local one, unless it is lower: a
    /// re-read that finishes after a newer increment's must not roll the
    /// total back. If the re-read fails the delta is added locally instead.
    pub async fn increment_hours(
        &self,
        id: &str,
        input: &HoursInput,
    ) -> Result<HoursUpdate, RosterError> {
        let delta = parse_delta(input)?;

        let epoch = {
            let state = self.state.read().await;
            match &*state {
                RosterState::Loaded { records, .. } => {
                    if !records.iter().any(|r| r.id == id) {
                        return Err(RosterError::NotFound(id.to_string()));
                    }
                    self.epoch.load(Ordering::SeqCst)
                }
                RosterState::Empty => return Err(RosterError::NotLoaded),
            }
        };

        self.store.increment_hours(id, delta).await?;

        let refreshed = match self.store.get_record(id).await {
            Ok(Some(record)) => Some(record),
            Ok(None) => {
                warn!(id, "Student vanished after increment; adding delta locally");
                None
            }
            Err(e) => {
                warn!(id, error = %e, "Re-read after increment failed; adding delta locally");
                None
            }
        };

        let mut state = self.state.write().await;
        let records = match &mut *state {
            RosterState::Loaded { records, .. } if self.epoch.load(Ordering::SeqCst) == epoch => {
                records
            }
            _ => {
                warn!(id, delta, "Hours were saved but the session changed before the roster was updated");
                return Err(RosterError::SessionChanged);
            }
        };

        let local = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| RosterError::NotFound(id.to_string()))?;

        match refreshed {
            Some(record) if record.total_hours >= local.total_hours => *local = record,
            Some(stale) => {
                debug!(
                    id,
                    stale = stale.total_hours,
                    local = local.total_hours,
                    "Ignoring re-read older than the local total"
                );
            }
            None => local.total_hours += delta,
        }

        Ok(HoursUpdate {
            record: local.clone(),
            added: delta,
        })
    }
}

/// Check that name, class and joined year are all present.
pub fn validate_candidate(request: CreateStudentRequest) -> Result<StudentDraft, RosterError> {
    let name = request.name.trim();
    let class = request.class.trim();

    match request.joined_year {
        Some(joined_year) if !name.is_empty() && !class.is_empty() => Ok(StudentDraft {
            name: name.to_string(),
            class: class.to_string(),
            joined_year,
        }),
        _ => Err(RosterError::Validation(
            "Please fill in all student details".to_string(),
        )),
    }
}

/// Parse an hours increment; it must be a finite number above zero.
pub fn parse_delta(input: &HoursInput) -> Result<f64, RosterError> {
    let value = match input {
        HoursInput::Number(value) => *value,
        HoursInput::Text(raw) => raw.trim().parse::<f64>().unwrap_or(f64::NAN),
    };

    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(RosterError::Validation(
            "Please enter hours greater than 0".to_string(),
        ))
    }
}
