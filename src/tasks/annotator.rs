use crate::domain::{Annotation, ClassificationResult, Tier};

const BORDER_WIDTH_PX: u8 = 5;

/// Builds the visual cue for a scored comment: a colored left border plus a
/// short "Rating: n/10" label with the note appended when there is one.
pub fn render(result: &ClassificationResult) -> Annotation {
    let tier = Tier::from_score(result.score);
    let mut label = format!("Rating: {}/10", result.score);
    if !result.note.is_empty() {
        label.push_str(" | 🔍 ");
        label.push_str(&result.note);
    }
    Annotation {
        tier,
        border: format!("{BORDER_WIDTH_PX}px solid {}", tier.color()),
        label,
    }
}
