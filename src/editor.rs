use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::bridge::{HostBridge, PublishOutcome, PublishRequest, PublishTarget};
use crate::mapping::{form_from_record, record_from_form};
use crate::types::{CatalogStats, GameRecord, GamesDocument};

pub const DEFAULT_COMMIT_MESSAGE: &str = "Update games catalog";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("editing is unavailable without a privileged host bridge")]
    ReadOnly,
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("no game with id {0}")]
    UnknownRecord(String),
}

/// Editable form state. `id` is `None` for a record not saved yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameForm {
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub version: String,
    pub download_url: String,
    pub size: String,
    pub coming_soon: bool,
    pub image: Option<String>,
}

impl GameForm {
    fn validate(&self) -> Result<(), EditorError> {
        if self.name.trim().is_empty() { return Err(EditorError::MissingField("name")); }
        if self.description.trim().is_empty() { return Err(EditorError::MissingField("description")); }
        if self.download_url.trim().is_empty() { return Err(EditorError::MissingField("downloadUrl")); }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub id: String,
    pub stats: CatalogStats,
    /// Set when persisting failed; the in-memory change is kept.
    pub notice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(EditOutcome),
    Cancelled,
}

/// Owns the working list for one admin session.
pub struct MetadataEditor {
    records: Vec<GameRecord>,
    form: GameForm,
    bridge: Option<Arc<dyn HostBridge>>,
}

impl MetadataEditor {
    pub fn new(records: Vec<GameRecord>, bridge: Option<Arc<dyn HostBridge>>) -> Self {
        Self { records, form: GameForm::default(), bridge }
    }

    /// Mutating affordances exist only when a bridge was injected.
    pub fn can_edit(&self) -> bool { self.bridge.is_some() }

    pub fn records(&self) -> &[GameRecord] { &self.records }
    pub fn form(&self) -> &GameForm { &self.form }
    pub fn form_mut(&mut self) -> &mut GameForm { &mut self.form }

    pub fn stats(&self) -> CatalogStats { CatalogStats::from_flags(self.records.iter().map(|r| r.coming_soon)) }

    pub fn select(&mut self, id: &str) -> Option<&GameForm> {
        let record = self.records.iter().find(|r| r.id == id)?;
        self.form = form_from_record(record);
        Some(&self.form)
    }

    pub fn reset(&mut self) { self.form = GameForm::default(); }

    /// Validate the form, upsert it by id, then persist. Validation failures
    /// leave the working list untouched.
    pub async fn save(&mut self) -> Result<EditOutcome, EditorError> {
        let bridge = self.bridge.clone().ok_or(EditorError::ReadOnly)?;
        self.form.validate()?;
        let id = match self.form.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => uuid::Uuid::new_v4().to_string(),
        };
        let record = record_from_form(&id, &self.form);
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
        info!(id = %id, "saved game");
        self.reset();
        let notice = self.persist(bridge.as_ref()).await;
        Ok(EditOutcome { id, stats: self.stats(), notice })
    }

    /// Remove a record once `confirm` agrees. The callback sees the record
    /// about to go.
    pub async fn delete<F>(&mut self, id: &str, confirm: F) -> Result<DeleteOutcome, EditorError>
    where
        F: FnOnce(&GameRecord) -> bool,
    {
        let bridge = self.bridge.clone().ok_or(EditorError::ReadOnly)?;
        let idx = self.records.iter().position(|r| r.id == id).ok_or_else(|| EditorError::UnknownRecord(id.to_string()))?;
        if !confirm(&self.records[idx]) { return Ok(DeleteOutcome::Cancelled); }
        self.records.remove(idx);
        if self.form.id.as_deref() == Some(id) { self.reset(); }
        info!(id, "deleted game");
        let notice = self.persist(bridge.as_ref()).await;
        Ok(DeleteOutcome::Deleted(EditOutcome { id: id.to_string(), stats: self.stats(), notice }))
    }

    /// Hand the working list to the bridge's publisher. The outcome is
    /// returned as-is; the working list is never modified.
    pub async fn publish(&self, target: PublishTarget, token: &str, message: &str) -> Result<PublishOutcome, EditorError> {
        let bridge = self.bridge.clone().ok_or(EditorError::ReadOnly)?;
        if target.owner.trim().is_empty() { return Err(EditorError::MissingField("owner")); }
        if target.repo.trim().is_empty() { return Err(EditorError::MissingField("repo")); }
        if target.file_path.trim().is_empty() { return Err(EditorError::MissingField("filePath")); }
        if token.trim().is_empty() { return Err(EditorError::MissingField("token")); }
        let message = if message.trim().is_empty() { DEFAULT_COMMIT_MESSAGE } else { message };
        let request = PublishRequest {
            target,
            token: token.to_string(),
            message: message.to_string(),
            payload: GamesDocument { games: self.records.clone() },
        };
        let outcome = bridge.publish_games(request).await;
        if let Some(err) = &outcome.error { warn!(error = %err, "publish failed"); }
        Ok(outcome)
    }

    async fn persist(&self, bridge: &dyn HostBridge) -> Option<String> {
        match bridge.save_games(&self.records).await {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "persisting games failed");
                Some(format!("Could not save games: {e:#}"))
            }
        }
    }
}
