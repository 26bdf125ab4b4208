//! Content card store.
//!
//! Layout under the base directory, one subdirectory per spec:
//!
//! ```text
//! <base>/<spec_id>/cards/<card_id>.json
//! <base>/<spec_id>/logs.jsonl
//! <base>/<spec_id>/index.json
//! ```
//!
//! `index.json` holds the spec's monotonic revision counter; the
//! current ETag is always `W/"content-<revision>"`. Every mutation
//! appends a log entry in the same call.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use deckgen_core::content::{
    CardStatus, ContentReviewLogEntry, ContentSlide, ReviewAction,
};
use deckgen_core::hashing;
use deckgen_core::CoreError;

use crate::etag::{format_etag, parse_etag};
use crate::StoreError;

const ETAG_KIND: &str = "content";
const DEFAULT_LOG_LIMIT: usize = 50;

/// Persisted state of one card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardRecord {
    pub card: ContentSlide,
    /// Spec revision at this card's last change.
    pub revision: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Partial overlay applied by `update`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentUpdate {
    pub title: Option<String>,
    pub body: Option<Vec<String>>,
    pub table_data: Option<serde_json::Value>,
    pub note: Option<String>,
    pub intent: Option<String>,
    pub type_hint: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateOutcome {
    pub etag: String,
    pub revision: u64,
    pub content_hash: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApproveOutcome {
    pub etag: String,
    pub revision: u64,
    pub status: CardStatus,
    pub locked_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CardView {
    pub record: CardRecord,
    pub history: Vec<ContentReviewLogEntry>,
    pub etag: String,
}

/// Filters and pagination for the audit log.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub action: Option<ReviewAction>,
    pub since: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogPage {
    pub items: Vec<ContentReviewLogEntry>,
    pub next_offset: Option<usize>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SpecIndex {
    revision: u64,
}

/// File-backed content card store; one mutation at a time.
pub struct ContentStore {
    base: PathBuf,
    write_lock: Mutex<()>,
}

fn validate_id(kind: &str, id: &str) -> Result<(), CoreError> {
    if id.trim().is_empty()
        || id.contains('/')
        || id.contains('\\')
        || id.contains("..")
    {
        return Err(CoreError::SchemaValidation(format!(
            "invalid {kind} id '{id}'"
        )));
    }
    Ok(())
}

impl ContentStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn spec_dir(&self, spec_id: &str) -> PathBuf {
        self.base.join(spec_id)
    }

    fn card_path(&self, spec_id: &str, card_id: &str) -> PathBuf {
        self.spec_dir(spec_id).join("cards").join(format!("{card_id}.json"))
    }

    fn index_path(&self, spec_id: &str) -> PathBuf {
        self.spec_dir(spec_id).join("index.json")
    }

    fn logs_path(&self, spec_id: &str) -> PathBuf {
        self.spec_dir(spec_id).join("logs.jsonl")
    }

    fn load_index(&self, spec_id: &str) -> Result<SpecIndex, StoreError> {
        let path = self.index_path(spec_id);
        if !path.exists() {
            return Err(CoreError::NotFound {
                entity: "spec",
                id: spec_id.to_string(),
            }
            .into());
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    fn save_index(&self, spec_id: &str, index: &SpecIndex) -> Result<(), StoreError> {
        fs::write(
            self.index_path(spec_id),
            serde_json::to_string_pretty(index)?,
        )?;
        Ok(())
    }

    fn load_card(&self, spec_id: &str, card_id: &str) -> Result<CardRecord, StoreError> {
        let path = self.card_path(spec_id, card_id);
        if !path.exists() {
            return Err(CoreError::NotFound {
                entity: "card",
                id: card_id.to_string(),
            }
            .into());
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    fn save_card(&self, spec_id: &str, record: &CardRecord) -> Result<(), StoreError> {
        fs::write(
            self.card_path(spec_id, &record.card.id),
            serde_json::to_string_pretty(record)?,
        )?;
        Ok(())
    }

    fn append_log(&self, spec_id: &str, entry: &ContentReviewLogEntry) -> Result<(), StoreError> {
        use std::io::Write;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.logs_path(spec_id))?;
        writeln!(file, "{}", serde_json::to_string(entry)?)?;
        Ok(())
    }

    fn read_logs(&self, spec_id: &str) -> Result<Vec<ContentReviewLogEntry>, StoreError> {
        let path = self.logs_path(spec_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for line in fs::read_to_string(path)?.lines() {
            if line.trim().is_empty() {
                continue;
            }
            entries.push(serde_json::from_str(line)?);
        }
        Ok(entries)
    }

    fn check_etag(&self, spec_id: &str, expected: &str) -> Result<SpecIndex, StoreError> {
        let index = self.load_index(spec_id)?;
        let presented = parse_etag(ETAG_KIND, expected)?;
        if presented != index.revision {
            return Err(CoreError::RevisionMismatch(format!(
                "expected revision {presented}, current is {}",
                index.revision
            ))
            .into());
        }
        Ok(index)
    }

    /// Create a spec's card set. Fails on an empty card list, blank
    /// text fields, duplicate ids, or an already-existing spec.
    pub fn create(
        &self,
        spec_id: &str,
        cards: Vec<ContentSlide>,
        actor: &str,
    ) -> Result<String, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        validate_id("spec", spec_id)?;
        if cards.is_empty() {
            return Err(CoreError::SchemaValidation(
                "card list must not be empty".to_string(),
            )
            .into());
        }
        let mut seen = std::collections::HashSet::new();
        for card in &cards {
            validate_id("card", &card.id)?;
            if !seen.insert(card.id.clone()) {
                return Err(CoreError::SchemaValidation(format!(
                    "duplicate card id '{}'",
                    card.id
                ))
                .into());
            }
            if matches!(&card.elements.title, Some(t) if t.trim().is_empty()) {
                return Err(CoreError::SchemaValidation(format!(
                    "card '{}' has a blank title",
                    card.id
                ))
                .into());
            }
            if card.elements.body.iter().any(|line| line.trim().is_empty()) {
                return Err(CoreError::SchemaValidation(format!(
                    "card '{}' has a blank body line",
                    card.id
                ))
                .into());
            }
            card.elements.validate()?;
        }
        if self.index_path(spec_id).exists() {
            return Err(CoreError::Conflict(format!(
                "content for spec '{spec_id}' already exists"
            ))
            .into());
        }

        fs::create_dir_all(self.spec_dir(spec_id).join("cards"))?;
        let now = Utc::now();
        for card in cards {
            let entry = ContentReviewLogEntry {
                slide_id: card.id.clone(),
                action: ReviewAction::Create,
                actor: actor.to_string(),
                timestamp: now,
                notes: None,
                applied_autofix: Vec::new(),
                ai_grade: card.ai_review,
            };
            let record = CardRecord {
                card,
                revision: 1,
                content_hash: None,
                locked_at: None,
                updated_at: now,
            };
            self.save_card(spec_id, &record)?;
            self.append_log(spec_id, &entry)?;
        }
        let index = SpecIndex { revision: 1 };
        self.save_index(spec_id, &index)?;
        debug!(spec_id, "content card set created");
        Ok(format_etag(ETAG_KIND, index.revision))
    }

    /// Overlay fields onto a card. Approved cards reject edits.
    pub fn update(
        &self,
        spec_id: &str,
        card_id: &str,
        update: ContentUpdate,
        expected_etag: &str,
        actor: &str,
    ) -> Result<UpdateOutcome, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        validate_id("card", card_id)?;
        let mut index = self.check_etag(spec_id, expected_etag)?;
        let mut record = self.load_card(spec_id, card_id)?;
        if record.card.status == CardStatus::Approved {
            return Err(CoreError::ResourceLocked(format!(
                "card '{card_id}' is approved"
            ))
            .into());
        }

        if let Some(title) = update.title {
            record.card.elements.title = Some(title);
        }
        if let Some(body) = update.body {
            record.card.elements.body = body;
        }
        if let Some(table_data) = update.table_data {
            record.card.elements.table_data = Some(table_data);
        }
        if let Some(note) = update.note {
            record.card.elements.note = Some(note);
        }
        if let Some(intent) = update.intent {
            record.card.intent = Some(intent);
        }
        if let Some(type_hint) = update.type_hint {
            record.card.type_hint = Some(type_hint);
        }
        record.card.elements.validate()?;

        let content_hash = hashing::content_hash(&record.card.elements)?;
        index.revision += 1;
        record.revision = index.revision;
        record.content_hash = Some(content_hash.clone());
        record.updated_at = Utc::now();

        self.save_card(spec_id, &record)?;
        self.append_log(
            spec_id,
            &ContentReviewLogEntry {
                slide_id: card_id.to_string(),
                action: ReviewAction::Update,
                actor: actor.to_string(),
                timestamp: record.updated_at,
                notes: None,
                applied_autofix: Vec::new(),
                ai_grade: record.card.ai_review,
            },
        )?;
        self.save_index(spec_id, &index)?;
        debug!(spec_id, card_id, revision = index.revision, "card updated");
        Ok(UpdateOutcome {
            etag: format_etag(ETAG_KIND, index.revision),
            revision: index.revision,
            content_hash,
        })
    }

    /// Approve a card, locking it against further edits.
    ///
    /// Re-approving with the same autofix set is a no-op that returns
    /// the current revision without logging.
    pub fn approve(
        &self,
        spec_id: &str,
        card_id: &str,
        expected_etag: &str,
        notes: Option<String>,
        applied_autofix: Vec<String>,
        actor: &str,
    ) -> Result<ApproveOutcome, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        validate_id("card", card_id)?;
        let mut index = self.check_etag(spec_id, expected_etag)?;
        let mut record = self.load_card(spec_id, card_id)?;

        if record.card.status == CardStatus::Approved {
            let same_autofix = {
                let mut a = record.card.applied_autofix.clone();
                let mut b = applied_autofix.clone();
                a.sort();
                b.sort();
                a == b
            };
            if same_autofix {
                let locked_at = record.locked_at.unwrap_or(record.updated_at);
                return Ok(ApproveOutcome {
                    etag: format_etag(ETAG_KIND, index.revision),
                    revision: index.revision,
                    status: CardStatus::Approved,
                    locked_at,
                });
            }
        }

        let now = Utc::now();
        record.card.status = CardStatus::Approved;
        for id in &applied_autofix {
            if !record.card.applied_autofix.contains(id) {
                record.card.applied_autofix.push(id.clone());
            }
        }
        record.locked_at = Some(now);
        record.updated_at = now;
        index.revision += 1;
        record.revision = index.revision;

        self.save_card(spec_id, &record)?;
        self.append_log(
            spec_id,
            &ContentReviewLogEntry {
                slide_id: card_id.to_string(),
                action: ReviewAction::Approve,
                actor: actor.to_string(),
                timestamp: now,
                notes,
                applied_autofix,
                ai_grade: record.card.ai_review,
            },
        )?;
        self.save_index(spec_id, &index)?;
        debug!(spec_id, card_id, revision = index.revision, "card approved");
        Ok(ApproveOutcome {
            etag: format_etag(ETAG_KIND, index.revision),
            revision: index.revision,
            status: CardStatus::Approved,
            locked_at: now,
        })
    }

    /// Send a card back to its author with a reason.
    pub fn return_card(
        &self,
        spec_id: &str,
        card_id: &str,
        expected_etag: &str,
        reason: Option<String>,
        actor: &str,
    ) -> Result<UpdateOutcome, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        validate_id("card", card_id)?;
        let mut index = self.check_etag(spec_id, expected_etag)?;
        let mut record = self.load_card(spec_id, card_id)?;
        if record.card.status == CardStatus::Approved {
            return Err(CoreError::ResourceLocked(format!(
                "card '{card_id}' is approved"
            ))
            .into());
        }

        let now = Utc::now();
        record.card.status = CardStatus::Returned;
        record.updated_at = now;
        index.revision += 1;
        record.revision = index.revision;
        let content_hash = hashing::content_hash(&record.card.elements)?;
        record.content_hash = Some(content_hash.clone());

        self.save_card(spec_id, &record)?;
        self.append_log(
            spec_id,
            &ContentReviewLogEntry {
                slide_id: card_id.to_string(),
                action: ReviewAction::Return,
                actor: actor.to_string(),
                timestamp: now,
                notes: reason,
                applied_autofix: Vec::new(),
                ai_grade: record.card.ai_review,
            },
        )?;
        self.save_index(spec_id, &index)?;
        Ok(UpdateOutcome {
            etag: format_etag(ETAG_KIND, index.revision),
            revision: index.revision,
            content_hash,
        })
    }

    /// Fetch a card with its history, oldest first.
    pub fn get(&self, spec_id: &str, card_id: &str) -> Result<CardView, StoreError> {
        validate_id("card", card_id)?;
        let index = self.load_index(spec_id)?;
        let record = self.load_card(spec_id, card_id)?;
        let history = self
            .read_logs(spec_id)?
            .into_iter()
            .filter(|entry| entry.slide_id == card_id)
            .collect();
        Ok(CardView {
            record,
            history,
            etag: format_etag(ETAG_KIND, index.revision),
        })
    }

    /// All cards of a spec, ordered by id.
    pub fn list_cards(&self, spec_id: &str) -> Result<Vec<CardRecord>, StoreError> {
        self.load_index(spec_id)?;
        let dir = self.spec_dir(spec_id).join("cards");
        let mut records = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                records.push(serde_json::from_str(&fs::read_to_string(path)?)?);
            }
        }
        records.sort_by(|a: &CardRecord, b: &CardRecord| a.card.id.cmp(&b.card.id));
        Ok(records)
    }

    /// Offset-paginated slice of the audit log.
    pub fn list_logs(&self, spec_id: &str, query: &LogQuery) -> Result<LogPage, StoreError> {
        self.load_index(spec_id)?;
        let mut entries = self.read_logs(spec_id)?;
        if let Some(action) = query.action {
            entries.retain(|entry| entry.action == action);
        }
        if let Some(since) = query.since {
            entries.retain(|entry| entry.timestamp >= since);
        }
        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT);
        let total = entries.len();
        let items: Vec<ContentReviewLogEntry> =
            entries.into_iter().skip(offset).take(limit).collect();
        let consumed = offset + items.len();
        let next_offset = if consumed < total { Some(consumed) } else { None };
        Ok(LogPage { items, next_offset })
    }

    /// Assemble the approval document the pipeline consumes.
    pub fn export_document(
        &self,
        spec_id: &str,
    ) -> Result<deckgen_core::content::ContentApprovalDocument, StoreError> {
        let slides = self
            .list_cards(spec_id)?
            .into_iter()
            .map(|record| record.card)
            .collect();
        Ok(deckgen_core::content::ContentApprovalDocument { slides })
    }
}

impl std::fmt::Debug for ContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStore").field("base", &self.base).finish()
    }
}

/// Check a path points at a store base directory that exists or can be
/// created.
pub fn ensure_base_dir(path: &Path) -> Result<(), StoreError> {
    fs::create_dir_all(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn store() -> (tempfile::TempDir, ContentStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::new(dir.path());
        (dir, store)
    }

    fn card(id: &str) -> ContentSlide {
        let mut card = ContentSlide::new(id);
        card.elements.title = Some("Agenda".to_string());
        card.elements.body = vec!["First point".to_string()];
        card
    }

    #[test]
    fn create_returns_first_etag() {
        let (_dir, store) = store();
        let etag = store.create("spec-1", vec![card("agenda")], "alice").unwrap();
        assert_eq!(etag, "W/\"content-1\"");
    }

    #[test]
    fn create_rejects_empty_card_list() {
        let (_dir, store) = store();
        let err = store.create("spec-1", vec![], "alice").unwrap_err();
        assert_matches!(err.into_core(), CoreError::SchemaValidation(_));
    }

    #[test]
    fn create_rejects_duplicate_spec() {
        let (_dir, store) = store();
        store.create("spec-1", vec![card("agenda")], "alice").unwrap();
        let err = store
            .create("spec-1", vec![card("agenda")], "alice")
            .unwrap_err();
        assert_matches!(err.into_core(), CoreError::Conflict(_));
    }

    #[test]
    fn create_rejects_blank_body_line() {
        let (_dir, store) = store();
        let mut bad = card("agenda");
        bad.elements.body.push("   ".to_string());
        let err = store.create("spec-1", vec![bad], "alice").unwrap_err();
        assert_matches!(err.into_core(), CoreError::SchemaValidation(_));
    }

    #[test]
    fn update_bumps_revision_and_hashes_content() {
        let (_dir, store) = store();
        let etag = store.create("spec-1", vec![card("agenda")], "alice").unwrap();
        let outcome = store
            .update(
                "spec-1",
                "agenda",
                ContentUpdate {
                    title: Some("Agenda v2".to_string()),
                    ..ContentUpdate::default()
                },
                &etag,
                "alice",
            )
            .unwrap();
        assert_eq!(outcome.revision, 2);
        assert_eq!(outcome.etag, "W/\"content-2\"");
        assert!(outcome.content_hash.starts_with("sha256:"));
    }

    #[test]
    fn update_with_stale_etag_leaves_card_unchanged() {
        let (_dir, store) = store();
        let etag = store.create("spec-1", vec![card("agenda")], "alice").unwrap();
        store
            .update(
                "spec-1",
                "agenda",
                ContentUpdate {
                    title: Some("Agenda v2".to_string()),
                    ..ContentUpdate::default()
                },
                &etag,
                "alice",
            )
            .unwrap();
        let before = store.get("spec-1", "agenda").unwrap();
        let err = store
            .update(
                "spec-1",
                "agenda",
                ContentUpdate {
                    title: Some("stale write".to_string()),
                    ..ContentUpdate::default()
                },
                &etag,
                "bob",
            )
            .unwrap_err();
        assert_matches!(err.into_core(), CoreError::RevisionMismatch(_));
        let after = store.get("spec-1", "agenda").unwrap();
        assert_eq!(
            serde_json::to_string(&before.record).unwrap(),
            serde_json::to_string(&after.record).unwrap()
        );
    }

    #[test]
    fn approve_locks_the_card() {
        let (_dir, store) = store();
        let etag = store.create("spec-1", vec![card("agenda")], "alice").unwrap();
        let outcome = store
            .approve("spec-1", "agenda", &etag, None, vec![], "reviewer")
            .unwrap();
        assert_eq!(outcome.status, CardStatus::Approved);

        let view = store.get("spec-1", "agenda").unwrap();
        assert_eq!(view.record.card.status, CardStatus::Approved);
        assert!(view.record.locked_at.is_some());
        assert_eq!(view.history.last().unwrap().action, ReviewAction::Approve);

        let err = store
            .update(
                "spec-1",
                "agenda",
                ContentUpdate::default(),
                &outcome.etag,
                "alice",
            )
            .unwrap_err();
        assert_matches!(err.into_core(), CoreError::ResourceLocked(_));
    }

    #[test]
    fn approve_is_idempotent_for_same_autofix_set() {
        let (_dir, store) = store();
        let etag = store.create("spec-1", vec![card("agenda")], "alice").unwrap();
        let first = store
            .approve("spec-1", "agenda", &etag, None, vec!["fx-1".into()], "reviewer")
            .unwrap();
        let logs_before = store.list_logs("spec-1", &LogQuery::default()).unwrap();
        let second = store
            .approve(
                "spec-1",
                "agenda",
                &first.etag,
                None,
                vec!["fx-1".into()],
                "reviewer",
            )
            .unwrap();
        assert_eq!(second.revision, first.revision);
        let logs_after = store.list_logs("spec-1", &LogQuery::default()).unwrap();
        assert_eq!(logs_before.items.len(), logs_after.items.len());
    }

    #[test]
    fn approve_with_new_autofix_bumps_revision() {
        let (_dir, store) = store();
        let etag = store.create("spec-1", vec![card("agenda")], "alice").unwrap();
        let first = store
            .approve("spec-1", "agenda", &etag, None, vec![], "reviewer")
            .unwrap();
        let second = store
            .approve(
                "spec-1",
                "agenda",
                &first.etag,
                None,
                vec!["fx-9".into()],
                "reviewer",
            )
            .unwrap();
        assert_eq!(second.revision, first.revision + 1);
    }

    #[test]
    fn return_card_sets_returned_status_and_logs() {
        let (_dir, store) = store();
        let etag = store.create("spec-1", vec![card("agenda")], "alice").unwrap();
        store
            .return_card(
                "spec-1",
                "agenda",
                &etag,
                Some("needs numbers".to_string()),
                "reviewer",
            )
            .unwrap();
        let view = store.get("spec-1", "agenda").unwrap();
        assert_eq!(view.record.card.status, CardStatus::Returned);
        let last = view.history.last().unwrap();
        assert_eq!(last.action, ReviewAction::Return);
        assert_eq!(last.notes.as_deref(), Some("needs numbers"));
    }

    #[test]
    fn list_logs_paginates_with_next_offset() {
        let (_dir, store) = store();
        let cards = vec![card("a"), card("b"), card("c")];
        store.create("spec-1", cards, "alice").unwrap();
        let page = store
            .list_logs(
                "spec-1",
                &LogQuery {
                    limit: Some(2),
                    ..LogQuery::default()
                },
            )
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.next_offset, Some(2));
        let rest = store
            .list_logs(
                "spec-1",
                &LogQuery {
                    limit: Some(2),
                    offset: Some(2),
                    ..LogQuery::default()
                },
            )
            .unwrap();
        assert_eq!(rest.items.len(), 1);
        assert_eq!(rest.next_offset, None);
    }

    #[test]
    fn list_logs_filters_by_action() {
        let (_dir, store) = store();
        let etag = store.create("spec-1", vec![card("agenda")], "alice").unwrap();
        store
            .approve("spec-1", "agenda", &etag, None, vec![], "reviewer")
            .unwrap();
        let page = store
            .list_logs(
                "spec-1",
                &LogQuery {
                    action: Some(ReviewAction::Approve),
                    ..LogQuery::default()
                },
            )
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].action, ReviewAction::Approve);
    }

    #[test]
    fn get_missing_card_is_not_found() {
        let (_dir, store) = store();
        store.create("spec-1", vec![card("agenda")], "alice").unwrap();
        let err = store.get("spec-1", "missing").unwrap_err();
        assert_matches!(err.into_core(), CoreError::NotFound { .. });
    }

    #[test]
    fn card_view_serializes_for_the_http_boundary() {
        let (_dir, store) = store();
        store.create("spec-1", vec![card("agenda")], "alice").unwrap();
        let view = store.get("spec-1", "agenda").unwrap();

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["record"]["card"]["id"], "agenda");
        assert_eq!(json["history"][0]["action"], "create");
        assert_eq!(json["etag"], "W/\"content-1\"");
    }
}
