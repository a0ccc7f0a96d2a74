//! Database repository for accounts and student records.
//!
//! `Repository` is the shipped implementation of both the identity provider
//! and the student store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{SecondsFormat, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::{Identity, StudentDraft, StudentRecord};
use crate::roster::{StorageFailure, StudentStore};
use crate::session::policy::MIN_PASSWORD_LEN;
use crate::session::{IdentityProvider, ProviderError};

/// Consecutive wrong passwords before an email is locked.
const MAX_FAILED_LOGINS: u32 = 5;
const LOGIN_LOCKOUT: Duration = Duration::from_secs(60);

const STUDENT_COLUMNS: &str = "id, name, class, joined_year, total_hours, owner_id, owner_email, created_at, updated_at";

#[derive(Debug, Default)]
struct FailedLogins {
    count: u32,
    locked_until: Option<Instant>,
}

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
    failed_logins: Arc<Mutex<HashMap<String, FailedLogins>>>,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            failed_logins: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn failed_logins(&self) -> MutexGuard<'_, HashMap<String, FailedLogins>> {
        self.failed_logins
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_locked(&self, email: &str) -> bool {
        let mut failed = self.failed_logins();
        match failed.get(email).and_then(|f| f.locked_until) {
            Some(until) if until > Instant::now() => true,
            Some(_) => {
                failed.remove(email);
                false
            }
            None => false,
        }
    }

    fn record_failed_login(&self, email: &str) {
        let mut failed = self.failed_logins();
        let entry = failed.entry(email.to_string()).or_default();
        entry.count += 1;
        if entry.count >= MAX_FAILED_LOGINS {
            tracing::warn!(email, "Too many failed logins; locking account");
            entry.count = 0;
            entry.locked_until = Some(Instant::now() + LOGIN_LOCKOUT);
        }
    }

    fn clear_failed_logins(&self, email: &str) {
        self.failed_logins().remove(email);
    }
}

// ==================== ACCOUNT OPERATIONS ====================

impl IdentityProvider for Repository {
    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Identity, ProviderError> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(ProviderError::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ProviderError::WeakPassword);
        }

        let existing = sqlx::query("SELECT id FROM accounts WHERE email = ?")
            .bind(&email)
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(ProviderError::EmailAlreadyInUse);
        }

        let id = Uuid::new_v4().to_string();
        let password_hash = hash_password(password)?;

        sqlx::query(
            "INSERT INTO accounts (id, email, password_hash, display_name, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&email)
        .bind(&password_hash)
        .bind(display_name)
        .bind(timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ProviderError::EmailAlreadyInUse
            } else {
                e.into()
            }
        })?;

        Ok(Identity {
            uid: id,
            email,
            display_name: display_name.map(str::to_string),
        })
    }

    async fn login(&self, email: &str, password: &str) -> Result<Identity, ProviderError> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(ProviderError::InvalidEmail);
        }
        if self.is_locked(&email) {
            return Err(ProviderError::TooManyRequests);
        }

        let row = sqlx::query(
            "SELECT id, email, password_hash, display_name FROM accounts WHERE email = ?",
        )
        .bind(&email)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Err(ProviderError::UserNotFound);
        };

        let password_hash: String = row.get("password_hash");
        if !verify_password(password, &password_hash)? {
            self.record_failed_login(&email);
            return Err(ProviderError::WrongPassword);
        }
        self.clear_failed_logins(&email);

        Ok(Identity {
            uid: row.get("id"),
            email: row.get("email"),
            display_name: row.get("display_name"),
        })
    }

    async fn logout(&self, identity: &Identity) -> Result<(), ProviderError> {
        tracing::debug!(uid = %identity.uid, "Session ended");
        Ok(())
    }
}

// ==================== STUDENT OPERATIONS ====================

impl StudentStore for Repository {
    async fn create_record(
        &self,
        draft: &StudentDraft,
        owner: &Identity,
    ) -> Result<StudentRecord, StorageFailure> {
        let id = Uuid::new_v4().to_string();
        let now = timestamp();

        sqlx::query(
            "INSERT INTO students (id, name, class, joined_year, total_hours, owner_id, owner_email, created_at, updated_at) VALUES (?, ?, ?, ?, 0, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&draft.name)
        .bind(&draft.class)
        .bind(draft.joined_year)
        .bind(&owner.uid)
        .bind(&owner.email)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(StudentRecord {
            id,
            name: draft.name.clone(),
            class: draft.class.clone(),
            joined_year: draft.joined_year,
            total_hours: 0.0,
            owner_id: owner.uid.clone(),
            owner_email: Some(owner.email.clone()),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    async fn list_records(&self, owner: &Identity) -> Result<Vec<StudentRecord>, StorageFailure> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM students WHERE owner_id = ? ORDER BY created_at DESC, rowid DESC",
            STUDENT_COLUMNS
        ))
        .bind(&owner.uid)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(student_from_row).collect())
    }

    async fn increment_hours(&self, id: &str, delta: f64) -> Result<(), StorageFailure> {
        let result = sqlx::query(
            "UPDATE students SET total_hours = COALESCE(total_hours, 0) + ?, updated_at = ? WHERE id = ?",
        )
        .bind(delta)
        .bind(timestamp())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageFailure::new("Student not found"));
        }
        Ok(())
    }

    async fn get_record(&self, id: &str) -> Result<Option<StudentRecord>, StorageFailure> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM students WHERE id = ?",
            STUDENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(student_from_row))
    }
}

// Helper functions

fn student_from_row(row: &sqlx::sqlite::SqliteRow) -> StudentRecord {
    let total_hours: Option<f64> = row.get("total_hours");
    StudentRecord {
        id: row.get("id"),
        name: row.get("name"),
        class: row.get("class"),
        joined_year: row.get("joined_year"),
        total_hours: total_hours.unwrap_or(0.0),
        owner_id: row.get("owner_id"),
        owner_email: row.get("owner_email"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Fixed-width UTC timestamp so that text order matches time order.
fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
        && !email.chars().any(char::is_whitespace)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

fn hash_password(password: &str) -> Result<String, ProviderError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!("Password hashing failed: {}", e);
            ProviderError::Other("Password hashing failed".to_string())
        })
}

fn verify_password(password: &str, hash: &str) -> Result<bool, ProviderError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|_| ProviderError::Other("Invalid password hash format".to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
