/// Upper bound on how far playback may grab, as an explicit tri-state
/// instead of an integer with a magic "unbounded" maximum.
///
/// `Paused` holds position once `current >= until`. `Playing` is
/// free-run: grabs are attempted every tick with no bound.
/// `SteppingOne` is the transient armed by a seek or skip — exactly one
/// grab is let through, after which it collapses back to `Paused`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayBound {
    Paused { until: i64 },
    Playing,
    SteppingOne { until: i64 },
}

impl PlayBound {
    /// Whether a grab may be attempted at position `current`.
    pub fn allows(self, current: i64) -> bool {
        match self {
            PlayBound::Paused { until } | PlayBound::SteppingOne { until } => current < until,
            PlayBound::Playing => true,
        }
    }

    /// State after a successful grab advanced the position to
    /// `current`: a spent single-step collapses to `Paused`.
    pub fn settled(self, current: i64) -> Self {
        match self {
            PlayBound::SteppingOne { until } if current >= until => PlayBound::Paused { until },
            other => other,
        }
    }

    /// Play/pause toggle: a bound that still lets grabs through is
    /// clamped to the current position; a spent bound enters free-run.
    pub fn toggled(self, current: i64) -> Self {
        if self.allows(current) {
            PlayBound::Paused { until: current }
        } else {
            PlayBound::Playing
        }
    }
}
