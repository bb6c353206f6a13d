use crate::db::{Database, NoteKind, NoteRecord};
use crate::error::CaseworkError;

use super::require_case;

#[derive(Debug)]
pub enum NoteOutcome {
    Created(NoteRecord),
    /// Blank body; nothing was written.
    NoContent,
}

pub async fn add_case_note(
    db: &dyn Database,
    case_id: i64,
    body: Option<&str>,
) -> Result<NoteOutcome, CaseworkError> {
    let case = require_case(db, case_id).await?;
    let text = body.unwrap_or_default().trim();
    if text.is_empty() {
        return Ok(NoteOutcome::NoContent);
    }

    let note = db.create_note(NoteKind::Case, case.id, text).await?;
    tracing::info!(case_id = case.id, note_id = note.id, "Case note added");
    Ok(NoteOutcome::Created(note))
}
