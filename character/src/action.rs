//! One-shot playback state per body region
//!
//! Non-looping clips (attacks, jumps, gestures) play once and then either
//! return to the region's base clip or chain into a queued follow-up
//! (jump into land). The transitions are an explicit state machine so a
//! chained request can never be lost between ticks.

/// One-shot tracking state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionState {
    /// The region is on its looping base clip
    Idle,
    /// A one-shot clip is playing; `return_to` resumes afterwards
    Playing { clip: String, return_to: String },
    /// A one-shot is playing with a follow-up queued behind it
    ChainPending {
        clip: String,
        next: String,
        return_to: String,
    },
}

/// What happened when a one-shot finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// No one-shot was in flight
    None,
    /// Finished; resume the named base clip
    Resume(String),
    /// Finished; the queued one-shot starts now
    Chain(String),
}

impl ActionState {
    /// Request a one-shot. While one is playing the request queues behind
    /// it; a queued request is replaced by a newer one.
    pub fn play(self, clip: &str, base_clip: &str) -> Self {
        match self {
            Self::Idle => Self::Playing {
                clip: clip.to_string(),
                return_to: base_clip.to_string(),
            },
            Self::Playing {
                clip: current,
                return_to,
            }
            | Self::ChainPending {
                clip: current,
                return_to,
                ..
            } => Self::ChainPending {
                clip: current,
                next: clip.to_string(),
                return_to,
            },
        }
    }

    /// The current one-shot reached its last frame
    pub fn complete(self) -> (Self, Completion) {
        match self {
            Self::Idle => (Self::Idle, Completion::None),
            Self::Playing { return_to, .. } => (Self::Idle, Completion::Resume(return_to)),
            Self::ChainPending {
                next, return_to, ..
            } => (
                Self::Playing {
                    clip: next.clone(),
                    return_to,
                },
                Completion::Chain(next),
            ),
        }
    }

    /// Name of the one-shot currently playing, if any
    pub fn playing(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Playing { clip, .. } | Self::ChainPending { clip, .. } => Some(clip),
        }
    }
}
