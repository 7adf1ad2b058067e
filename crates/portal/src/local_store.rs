//! Persisted local state.
//!
//! Small JSON documents kept under a local directory, one file per
//! [`StoreKey`]. Sign-out clears every key.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Appointment;

/// Errors from the local store.
#[derive(Debug, Error)]
pub enum LocalStoreError {
    #[error("local state I/O error for {key}: {source}")]
    Io {
        key: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt local state for {key}: {source}")]
    Corrupt {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// The fixed set of persisted entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    AuthSession,
    ScheduleCache,
    UiPreferences,
}

impl StoreKey {
    pub const ALL: [Self; 3] = [Self::AuthSession, Self::ScheduleCache, Self::UiPreferences];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthSession => "salon-auth-session",
            Self::ScheduleCache => "salon-schedule-cache",
            Self::UiPreferences => "salon-ui-preferences",
        }
    }
}

/// Calendar layout preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarView {
    #[default]
    Day,
    Week,
}

/// Per-device UI preferences.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UiPreferences {
    pub sidebar_collapsed: bool,
    pub calendar_view: CalendarView,
    pub last_selected_date: Option<NaiveDate>,
}

/// Last fetched schedule for one day, for offline display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleCache {
    pub date: NaiveDate,
    pub fetched_at: DateTime<Utc>,
    pub appointments: Vec<Appointment>,
}

/// JSON files under one directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: StoreKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }

    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `LocalStoreError` if the file cannot be read or parsed.
    pub async fn load<T: DeserializeOwned>(
        &self,
        key: StoreKey,
    ) -> Result<Option<T>, LocalStoreError> {
        let bytes = match tokio::fs::read(self.path(key)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(LocalStoreError::Io {
                    key: key.as_str(),
                    source,
                });
            }
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| LocalStoreError::Corrupt {
                key: key.as_str(),
                source,
            })
    }

    /// Write `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `LocalStoreError` if the directory or file cannot be written.
    pub async fn save<T: Serialize + Sync>(
        &self,
        key: StoreKey,
        value: &T,
    ) -> Result<(), LocalStoreError> {
        let io_err = |source| LocalStoreError::Io {
            key: key.as_str(),
            source,
        };
        let bytes = serde_json::to_vec_pretty(value).map_err(|source| LocalStoreError::Corrupt {
            key: key.as_str(),
            source,
        })?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(io_err)?;
        // Write then rename so a crash never leaves a half-written file.
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &path).await.map_err(io_err)?;
        Ok(())
    }

    /// Delete the value under `key`. Missing values are fine.
    ///
    /// # Errors
    ///
    /// Returns `LocalStoreError::Io` if the file exists but cannot be removed.
    pub async fn remove(&self, key: StoreKey) -> Result<(), LocalStoreError> {
        match tokio::fs::remove_file(self.path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(LocalStoreError::Io {
                key: key.as_str(),
                source,
            }),
        }
    }

    /// Remove every key, as on sign-out.
    ///
    /// # Errors
    ///
    /// Returns the first failure; remaining keys are still attempted.
    pub async fn clear_all(&self) -> Result<(), LocalStoreError> {
        let mut first_error = None;
        for key in StoreKey::ALL {
            if let Err(e) = self.remove(key).await {
                tracing::warn!(error = %e, "Failed to clear local state");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let prefs: Option<UiPreferences> = store.load(StoreKey::UiPreferences).await.unwrap();
        assert!(prefs.is_none());
    }

    #[tokio::test]
    async fn test_save_and_load_preferences() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("nested"));
        let prefs = UiPreferences {
            sidebar_collapsed: true,
            calendar_view: CalendarView::Week,
            last_selected_date: NaiveDate::from_ymd_opt(2026, 10, 17),
        };

        store.save(StoreKey::UiPreferences, &prefs).await.unwrap();

        let loaded: Option<UiPreferences> = store.load(StoreKey::UiPreferences).await.unwrap();
        assert_eq!(loaded, Some(prefs));
        assert!(
            dir.path()
                .join("nested/salon-ui-preferences.json")
                .exists()
        );
    }

    #[tokio::test]
    async fn test_clear_all_removes_every_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        store
            .save(StoreKey::UiPreferences, &UiPreferences::default())
            .await
            .unwrap();
        store
            .save(StoreKey::AuthSession, &serde_json::json!({"token": "t"}))
            .await
            .unwrap();

        store.clear_all().await.unwrap();
        store.clear_all().await.unwrap();

        for key in StoreKey::ALL {
            let value: Option<serde_json::Value> = store.load(key).await.unwrap();
            assert!(value.is_none(), "{key:?} survived clear_all");
        }
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        tokio::fs::write(dir.path().join("salon-schedule-cache.json"), b"{not json")
            .await
            .unwrap();

        let result: Result<Option<ScheduleCache>, _> = store.load(StoreKey::ScheduleCache).await;
        assert!(matches!(result, Err(LocalStoreError::Corrupt { .. })));
    }
}
