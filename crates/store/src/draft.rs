//! Draft board store.
//!
//! One board per spec, stored as `board.json` next to `logs.jsonl` and
//! `index.json`. Section approval locks every slide in the section;
//! locked slides reject hint, move, and appendix mutations.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use deckgen_core::draft::{DraftDocument, DraftLogEntry, DraftSlideStatus, LayoutCandidate};
use deckgen_core::CoreError;

use crate::etag::{format_etag, parse_etag};
use crate::StoreError;

const ETAG_KIND: &str = "draft";
const DEFAULT_LOG_LIMIT: usize = 50;

#[derive(Debug, Default, Serialize, Deserialize)]
struct BoardIndex {
    revision: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DraftLogQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub action: Option<String>,
    pub since: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DraftLogPage {
    pub items: Vec<DraftLogEntry>,
    pub next_offset: Option<usize>,
}

/// File-backed draft board store; one mutation at a time.
pub struct DraftStore {
    base: PathBuf,
    write_lock: Mutex<()>,
}

impl DraftStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn spec_dir(&self, spec_id: &str) -> PathBuf {
        self.base.join(spec_id)
    }

    fn board_path(&self, spec_id: &str) -> PathBuf {
        self.spec_dir(spec_id).join("board.json")
    }

    fn index_path(&self, spec_id: &str) -> PathBuf {
        self.spec_dir(spec_id).join("index.json")
    }

    fn logs_path(&self, spec_id: &str) -> PathBuf {
        self.spec_dir(spec_id).join("logs.jsonl")
    }

    fn load_index(&self, spec_id: &str) -> Result<BoardIndex, StoreError> {
        let path = self.index_path(spec_id);
        if !path.exists() {
            return Err(CoreError::NotFound {
                entity: "board",
                id: spec_id.to_string(),
            }
            .into());
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    fn load_board(&self, spec_id: &str) -> Result<DraftDocument, StoreError> {
        let path = self.board_path(spec_id);
        if !path.exists() {
            return Err(CoreError::NotFound {
                entity: "board",
                id: spec_id.to_string(),
            }
            .into());
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    fn persist(
        &self,
        spec_id: &str,
        board: &DraftDocument,
        index: &BoardIndex,
        entry: &DraftLogEntry,
    ) -> Result<(), StoreError> {
        use std::io::Write;
        fs::write(
            self.board_path(spec_id),
            serde_json::to_string_pretty(board)?,
        )?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.logs_path(spec_id))?;
        writeln!(file, "{}", serde_json::to_string(entry)?)?;
        fs::write(
            self.index_path(spec_id),
            serde_json::to_string_pretty(index)?,
        )?;
        Ok(())
    }

    fn check_etag(&self, spec_id: &str, expected: &str) -> Result<BoardIndex, StoreError> {
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

    fn log_entry(target: &str, action: &str, actor: &str, notes: Option<String>) -> DraftLogEntry {
        DraftLogEntry {
            target: target.to_string(),
            action: action.to_string(),
            actor: actor.to_string(),
            timestamp: Utc::now(),
            notes,
        }
    }

    pub fn create_board(
        &self,
        spec_id: &str,
        board: DraftDocument,
        actor: &str,
    ) -> Result<String, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        if self.index_path(spec_id).exists() {
            return Err(CoreError::Conflict(format!(
                "draft board for spec '{spec_id}' already exists"
            ))
            .into());
        }
        fs::create_dir_all(self.spec_dir(spec_id))?;
        let index = BoardIndex { revision: 1 };
        self.persist(
            spec_id,
            &board,
            &index,
            &Self::log_entry("board", "create", actor, None),
        )?;
        debug!(spec_id, "draft board created");
        Ok(format_etag(ETAG_KIND, index.revision))
    }

    /// Replace the board with a fresh proposal, resetting the revision.
    pub fn overwrite_board(
        &self,
        spec_id: &str,
        board: DraftDocument,
        actor: &str,
    ) -> Result<String, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        fs::create_dir_all(self.spec_dir(spec_id))?;
        let index = BoardIndex { revision: 1 };
        self.persist(
            spec_id,
            &board,
            &index,
            &Self::log_entry("board", "overwrite", actor, None),
        )?;
        Ok(format_etag(ETAG_KIND, index.revision))
    }

    pub fn get_board(&self, spec_id: &str) -> Result<(DraftDocument, String), StoreError> {
        let index = self.load_index(spec_id)?;
        let board = self.load_board(spec_id)?;
        Ok((board, format_etag(ETAG_KIND, index.revision)))
    }

    fn locate_mutable(
        board: &DraftDocument,
        slide_id: &str,
    ) -> Result<(usize, usize), StoreError> {
        board
            .locate_slide(slide_id)
            .ok_or_else(|| {
                StoreError::from(CoreError::NotFound {
                    entity: "slide",
                    id: slide_id.to_string(),
                })
            })
    }

    fn reject_locked(
        board: &DraftDocument,
        section_index: usize,
        slide_index: usize,
    ) -> Result<(), StoreError> {
        let section = &board.sections[section_index];
        let slide = &section.slides[slide_index];
        if slide.locked || section.status == "approved" {
            return Err(CoreError::ResourceLocked(format!(
                "slide '{}' in section '{}' is locked",
                slide.ref_id, section.name
            ))
            .into());
        }
        Ok(())
    }

    pub fn update_layout_hint(
        &self,
        spec_id: &str,
        slide_id: &str,
        layout_hint: &str,
        notes: Option<String>,
        expected_etag: &str,
        actor: &str,
    ) -> Result<String, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut index = self.check_etag(spec_id, expected_etag)?;
        let mut board = self.load_board(spec_id)?;
        let (si, ki) = Self::locate_mutable(&board, slide_id)?;
        Self::reject_locked(&board, si, ki)?;

        let slide = &mut board.sections[si].slides[ki];
        slide.layout_hint = Some(layout_hint.to_string());
        if !slide
            .layout_candidates
            .iter()
            .any(|candidate| candidate.layout_id == layout_hint)
        {
            slide.layout_candidates.push(LayoutCandidate {
                layout_id: layout_hint.to_string(),
                score: 1.0,
            });
        }

        index.revision += 1;
        self.persist(
            spec_id,
            &board,
            &index,
            &Self::log_entry(slide_id, "update_hint", actor, notes),
        )?;
        Ok(format_etag(ETAG_KIND, index.revision))
    }

    /// Move a slide to `position` (1-based) in `target_section`,
    /// renumbering both sections densely from 1.
    pub fn move_slide(
        &self,
        spec_id: &str,
        slide_id: &str,
        target_section: &str,
        position: usize,
        expected_etag: &str,
        actor: &str,
        notes: Option<String>,
    ) -> Result<String, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut index = self.check_etag(spec_id, expected_etag)?;
        let mut board = self.load_board(spec_id)?;
        let (si, ki) = Self::locate_mutable(&board, slide_id)?;
        Self::reject_locked(&board, si, ki)?;

        let target_index = board
            .sections
            .iter()
            .position(|section| section.name == target_section)
            .ok_or_else(|| {
                StoreError::from(CoreError::NotFound {
                    entity: "section",
                    id: target_section.to_string(),
                })
            })?;
        if board.sections[target_index].status == "approved" {
            return Err(CoreError::ResourceLocked(format!(
                "section '{target_section}' is approved"
            ))
            .into());
        }

        let slide = board.sections[si].slides.remove(ki);
        board.sections[si].renumber();
        let target = &mut board.sections[target_index];
        let insert_at = position.saturating_sub(1).min(target.slides.len());
        target.slides.insert(insert_at, slide);
        target.renumber();

        index.revision += 1;
        self.persist(
            spec_id,
            &board,
            &index,
            &Self::log_entry(slide_id, "move", actor, notes),
        )?;
        Ok(format_etag(ETAG_KIND, index.revision))
    }

    pub fn set_appendix(
        &self,
        spec_id: &str,
        slide_id: &str,
        appendix: bool,
        expected_etag: &str,
        actor: &str,
        notes: Option<String>,
    ) -> Result<String, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut index = self.check_etag(spec_id, expected_etag)?;
        let mut board = self.load_board(spec_id)?;
        let (si, ki) = Self::locate_mutable(&board, slide_id)?;
        Self::reject_locked(&board, si, ki)?;

        board.sections[si].slides[ki].appendix = appendix;
        index.revision += 1;
        self.persist(
            spec_id,
            &board,
            &index,
            &Self::log_entry(slide_id, "set_appendix", actor, notes),
        )?;
        Ok(format_etag(ETAG_KIND, index.revision))
    }

    /// Approve a whole section: every slide becomes approved and
    /// locked, and the section status flips to `approved`.
    pub fn approve_section(
        &self,
        spec_id: &str,
        section_name: &str,
        expected_etag: &str,
        actor: &str,
        notes: Option<String>,
    ) -> Result<String, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut index = self.check_etag(spec_id, expected_etag)?;
        let mut board = self.load_board(spec_id)?;
        let section = board
            .sections
            .iter_mut()
            .find(|section| section.name == section_name)
            .ok_or_else(|| {
                StoreError::from(CoreError::NotFound {
                    entity: "section",
                    id: section_name.to_string(),
                })
            })?;
        for slide in &mut section.slides {
            slide.status = DraftSlideStatus::Approved;
            slide.locked = true;
        }
        section.status = "approved".to_string();

        index.revision += 1;
        self.persist(
            spec_id,
            &board,
            &index,
            &Self::log_entry(section_name, "approve_section", actor, notes),
        )?;
        debug!(spec_id, section_name, "section approved");
        Ok(format_etag(ETAG_KIND, index.revision))
    }

    pub fn list_logs(
        &self,
        spec_id: &str,
        query: &DraftLogQuery,
    ) -> Result<DraftLogPage, StoreError> {
        self.load_index(spec_id)?;
        let path = self.logs_path(spec_id);
        let mut entries: Vec<DraftLogEntry> = Vec::new();
        if path.exists() {
            for line in fs::read_to_string(path)?.lines() {
                if line.trim().is_empty() {
                    continue;
                }
                entries.push(serde_json::from_str(line)?);
            }
        }
        if let Some(action) = &query.action {
            entries.retain(|entry| &entry.action == action);
        }
        if let Some(since) = query.since {
            entries.retain(|entry| entry.timestamp >= since);
        }
        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT);
        let total = entries.len();
        let items: Vec<DraftLogEntry> = entries.into_iter().skip(offset).take(limit).collect();
        let consumed = offset + items.len();
        let next_offset = if consumed < total { Some(consumed) } else { None };
        Ok(DraftLogPage { items, next_offset })
    }
}

impl std::fmt::Debug for DraftStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftStore").field("base", &self.base).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use deckgen_core::draft::{DraftMeta, DraftSection, DraftSlideCard};

    fn card(ref_id: &str, order: u32) -> DraftSlideCard {
        DraftSlideCard {
            ref_id: ref_id.to_string(),
            order,
            layout_hint: None,
            layout_candidates: vec![],
            status: DraftSlideStatus::Proposed,
            locked: false,
            appendix: false,
        }
    }

    fn two_section_board() -> DraftDocument {
        DraftDocument {
            sections: vec![
                DraftSection {
                    name: "A".to_string(),
                    status: "open".to_string(),
                    slides: vec![card("s1", 1), card("s2", 2)],
                },
                DraftSection {
                    name: "B".to_string(),
                    status: "open".to_string(),
                    slides: vec![card("s3", 1)],
                },
            ],
            meta: DraftMeta::default(),
        }
    }

    fn store() -> (tempfile::TempDir, DraftStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = DraftStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn create_returns_first_etag_and_rejects_duplicates() {
        let (_dir, store) = store();
        let etag = store.create_board("spec-1", two_section_board(), "alice").unwrap();
        assert_eq!(etag, "W/\"draft-1\"");
        let err = store
            .create_board("spec-1", two_section_board(), "alice")
            .unwrap_err();
        assert_matches!(err.into_core(), CoreError::Conflict(_));
    }

    #[test]
    fn overwrite_resets_revision() {
        let (_dir, store) = store();
        let etag = store.create_board("spec-1", two_section_board(), "alice").unwrap();
        store
            .update_layout_hint("spec-1", "s1", "Title Only", None, &etag, "alice")
            .unwrap();
        let etag = store
            .overwrite_board("spec-1", two_section_board(), "pipeline")
            .unwrap();
        assert_eq!(etag, "W/\"draft-1\"");
    }

    #[test]
    fn hint_update_adds_candidate_once() {
        let (_dir, store) = store();
        let etag = store.create_board("spec-1", two_section_board(), "alice").unwrap();
        let etag = store
            .update_layout_hint("spec-1", "s1", "Title Only", None, &etag, "alice")
            .unwrap();
        store
            .update_layout_hint("spec-1", "s1", "Title Only", None, &etag, "alice")
            .unwrap();
        let (board, _) = store.get_board("spec-1").unwrap();
        let slide = board.slide("s1").unwrap();
        assert_eq!(slide.layout_hint.as_deref(), Some("Title Only"));
        assert_eq!(slide.layout_candidates.len(), 1);
        assert!((slide.layout_candidates[0].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn move_slide_renumbers_both_sections() {
        let (_dir, store) = store();
        let etag = store.create_board("spec-1", two_section_board(), "alice").unwrap();
        store
            .move_slide("spec-1", "s1", "B", 1, &etag, "alice", None)
            .unwrap();
        let (board, _) = store.get_board("spec-1").unwrap();
        let a = board.section("A").unwrap();
        let b = board.section("B").unwrap();
        assert_eq!(
            a.slides.iter().map(|s| s.order).collect::<Vec<_>>(),
            vec![1]
        );
        assert_eq!(
            b.slides.iter().map(|s| (s.ref_id.as_str(), s.order)).collect::<Vec<_>>(),
            vec![("s1", 1), ("s3", 2)]
        );
    }

    #[test]
    fn approve_section_locks_every_slide() {
        let (_dir, store) = store();
        let etag = store.create_board("spec-1", two_section_board(), "alice").unwrap();
        let etag = store
            .approve_section("spec-1", "A", &etag, "reviewer", None)
            .unwrap();

        let (board, _) = store.get_board("spec-1").unwrap();
        let section = board.section("A").unwrap();
        assert_eq!(section.status, "approved");
        assert!(section
            .slides
            .iter()
            .all(|s| s.locked && s.status == DraftSlideStatus::Approved));

        let before = serde_json::to_string(&board).unwrap();
        let err = store
            .update_layout_hint("spec-1", "s1", "Title Only", None, &etag, "alice")
            .unwrap_err();
        assert_matches!(err.into_core(), CoreError::ResourceLocked(_));
        let (after, _) = store.get_board("spec-1").unwrap();
        assert_eq!(before, serde_json::to_string(&after).unwrap());
    }

    #[test]
    fn approval_writes_exactly_one_log_entry() {
        let (_dir, store) = store();
        let etag = store.create_board("spec-1", two_section_board(), "alice").unwrap();
        store
            .approve_section("spec-1", "A", &etag, "reviewer", None)
            .unwrap();
        let page = store
            .list_logs(
                "spec-1",
                &DraftLogQuery {
                    action: Some("approve_section".to_string()),
                    ..DraftLogQuery::default()
                },
            )
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].target, "A");
    }

    #[test]
    fn stale_etag_is_rejected() {
        let (_dir, store) = store();
        let etag = store.create_board("spec-1", two_section_board(), "alice").unwrap();
        store
            .update_layout_hint("spec-1", "s1", "Title Only", None, &etag, "alice")
            .unwrap();
        let err = store
            .set_appendix("spec-1", "s2", true, &etag, "alice", None)
            .unwrap_err();
        assert_matches!(err.into_core(), CoreError::RevisionMismatch(_));
    }

    #[test]
    fn set_appendix_toggles_flag() {
        let (_dir, store) = store();
        let etag = store.create_board("spec-1", two_section_board(), "alice").unwrap();
        store
            .set_appendix("spec-1", "s3", true, &etag, "alice", None)
            .unwrap();
        let (board, _) = store.get_board("spec-1").unwrap();
        assert!(board.slide("s3").unwrap().appendix);
    }
}
