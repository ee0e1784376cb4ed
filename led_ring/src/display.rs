// ════════════════════════════════════════════════════════════════════════════
// DisplayState: what the ring should be showing right now
// ════════════════════════════════════════════════════════════════════════════

use finger_stream::Digit;

/// The single piece of state shared between recognition and rendering.
///
/// Each variant carries exactly the payload its pattern needs, so a
/// sequence length can never be paired with a digit-display tag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DisplayState {
    /// Waiting for a hand.
    #[default]
    Idle,
    /// A hand is in view showing this many fingers.
    ShowingDigit(Digit),
    /// No hand, but a partial attempt is in progress.
    ShowingSequence(Vec<Digit>),
    /// Sequence accepted; flash `flashes` frames then fall back to idle.
    SuccessFlash { flashes: u8 },
}

impl DisplayState {
    pub fn name(&self) -> &'static str {
        match self {
            DisplayState::Idle               => "idle",
            DisplayState::ShowingDigit(_)    => "digit",
            DisplayState::ShowingSequence(_) => "sequence",
            DisplayState::SuccessFlash { .. } => "success",
        }
    }
}

/// A published [`DisplayState`] tagged with the order it was written in.
///
/// The generation increases by one on every publish, so a reader can tell
/// "same state again" apart from "new write that happens to be equal".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplaySnapshot {
    pub generation: u64,
    pub state:      DisplayState,
}
