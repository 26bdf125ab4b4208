//! `prepare`: turn a brief into a content approval document.
//!
//! Each brief card becomes one content card: the message is the title,
//! the narrative plus supporting statements become the body (clamped to
//! the card limits), and the story arc lands in the speaker note.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use deckgen_core::brief::{BriefCard, BriefDocument};
use deckgen_core::content::{
    normalize_body, normalize_title, CardStatus, ContentApprovalDocument, ContentElements,
    ContentSlide,
};
use deckgen_core::CoreError;

#[derive(Debug, Parser)]
pub struct PrepareArgs {
    /// Brief document (JSON).
    pub brief: PathBuf,

    /// Output path for the content approval document.
    #[arg(long, short = 'o', default_value = "content_approval.json")]
    pub output: PathBuf,

    /// Only prepare the first N cards.
    #[arg(long)]
    pub card_limit: Option<usize>,

    /// Mark every prepared card as approved (unattended runs).
    #[arg(long)]
    pub approved: bool,
}

fn story_note(card: &BriefCard) -> Option<String> {
    let story = card.story.as_ref()?;
    let mut parts = Vec::new();
    if let Some(goal) = &story.goal {
        parts.push(format!("Goal: {goal}"));
    }
    if let Some(tension) = &story.tension {
        parts.push(format!("Tension: {tension}"));
    }
    if let Some(resolution) = &story.resolution {
        parts.push(format!("Resolution: {resolution}"));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

/// Convert one brief card into a draft content card, returning the
/// truncation warnings alongside it.
fn card_to_slide(card: &BriefCard, approved: bool) -> (ContentSlide, Vec<String>) {
    let mut body_lines: Vec<String> = card.narrative.clone();
    body_lines.extend(
        card.supporting_points
            .iter()
            .map(|point| point.statement.clone()),
    );
    let (body, warnings) = normalize_body(&body_lines);

    let mut slide = ContentSlide::new(card.card_id.clone());
    slide.intent = card.intent_tags.first().cloned();
    slide.elements = ContentElements {
        title: Some(normalize_title(&card.message)),
        body,
        table_data: None,
        note: story_note(card),
    };
    if approved {
        slide.status = CardStatus::Approved;
    }
    (slide, warnings)
}

pub fn prepare(args: &PrepareArgs) -> Result<()> {
    let source = std::fs::read_to_string(&args.brief).map_err(|e| {
        CoreError::SchemaValidation(format!("cannot read brief {}: {e}", args.brief.display()))
    })?;
    let brief = BriefDocument::from_json(&source)?;

    let limit = args.card_limit.unwrap_or(brief.cards.len());
    let mut document = ContentApprovalDocument::default();
    for card in brief.cards.iter().take(limit) {
        let (slide, warnings) = card_to_slide(card, args.approved);
        for warning in warnings {
            warn!(card_id = %card.card_id, warning, "brief content clamped");
        }
        document.slides.push(slide);
    }

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&args.output, serde_json::to_vec_pretty(&document)?)?;
    info!(
        brief_id = %brief.brief_id,
        cards = document.slides.len(),
        path = %args.output.display(),
        "content approval document prepared"
    );
    println!("{}", args.output.display());
    Ok(())
}
