//! Cue catalog shared by the generator, the matcher and playback implementations.
//!
//! Every round is scored against the same constants, so the catalog is a
//! compile-time table rather than something derived at runtime.

use core::{fmt, time::Duration};

use rand::{
    Rng,
    distributions::{Distribution, Standard},
};

/// Number of distinct [`CueType`] variants.
pub const CUE_KIND_COUNT: usize = 3;

/// Tactile cue the device plays and the player reproduces.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CueType {
    Short,
    Medium,
    Long,
}

impl CueType {
    /// Every cue in catalog order.
    pub const ALL: [CueType; CUE_KIND_COUNT] = [CueType::Short, CueType::Medium, CueType::Long];

    /// Deterministic index for lookups into [`CUE_CATALOG`].
    #[must_use]
    pub const fn as_index(self) -> usize {
        match self {
            CueType::Short => 0,
            CueType::Medium => 1,
            CueType::Long => 2,
        }
    }

    /// Attempts to construct a [`CueType`] from a raw index.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(CueType::Short),
            1 => Some(CueType::Medium),
            2 => Some(CueType::Long),
            _ => None,
        }
    }

    /// Returns the catalog entry for this cue.
    #[must_use]
    pub const fn profile(self) -> CueProfile {
        CUE_CATALOG[self.as_index()]
    }

    /// How long the device plays the cue.
    #[must_use]
    pub const fn playback_duration(self) -> Duration {
        self.profile().playback
    }

    /// How long the player should hold the matching button.
    #[must_use]
    pub const fn target_hold(self) -> Duration {
        self.profile().target_hold
    }

    /// Accepted deviation either side of [`CueType::target_hold`].
    #[must_use]
    pub const fn tolerance(self) -> Duration {
        self.profile().tolerance
    }

    /// Playback strength in `0.0..=1.0`. Not used for scoring.
    #[must_use]
    pub const fn intensity(self) -> f32 {
        self.profile().intensity
    }

    /// Short lowercase name used in logs and UI labels.
    #[must_use]
    pub const fn label(self) -> &'static str {
        self.profile().label
    }
}

impl fmt::Display for CueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Distribution<CueType> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> CueType {
        CueType::ALL[rng.gen_range(0..CUE_KIND_COUNT)]
    }
}

/// Immutable timing and playback attributes of a cue.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CueProfile {
    pub cue: CueType,
    pub label: &'static str,
    pub playback: Duration,
    pub target_hold: Duration,
    pub tolerance: Duration,
    pub intensity: f32,
    pub sharpness: f32,
}

impl CueProfile {
    #[must_use]
    pub const fn new(
        cue: CueType,
        label: &'static str,
        playback: Duration,
        target_hold: Duration,
        tolerance: Duration,
        intensity: f32,
        sharpness: f32,
    ) -> Self {
        Self {
            cue,
            label,
            playback,
            target_hold,
            tolerance,
            intensity,
            sharpness,
        }
    }
}

/// Compile-time catalog of every cue, indexed by [`CueType::as_index`].
///
/// Target holds sit slightly above the playback length so a press that
/// mirrors the vibration feels natural.
pub const CUE_CATALOG: [CueProfile; CUE_KIND_COUNT] = [
    CueProfile::new(
        CueType::Short,
        "short",
        Duration::from_millis(150),
        Duration::from_millis(180),
        Duration::from_millis(150),
        0.5,
        0.9,
    ),
    CueProfile::new(
        CueType::Medium,
        "medium",
        Duration::from_millis(400),
        Duration::from_millis(450),
        Duration::from_millis(220),
        0.7,
        0.4,
    ),
    CueProfile::new(
        CueType::Long,
        "long",
        Duration::from_millis(800),
        Duration::from_millis(850),
        Duration::from_millis(300),
        1.0,
        0.4,
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_indexed_by_cue() {
        for cue in CueType::ALL {
            assert_eq!(cue.profile().cue, cue);
            assert_eq!(CueType::from_index(cue.as_index()), Some(cue));
        }
        assert_eq!(CueType::from_index(CUE_KIND_COUNT), None);
    }

    #[test]
    fn medium_cue_matches_reference_timings() {
        let medium = CueType::Medium.profile();
        assert_eq!(medium.label, "medium");
        assert_eq!(medium.playback, Duration::from_millis(400));
        assert_eq!(medium.target_hold, Duration::from_millis(450));
        assert_eq!(medium.tolerance, Duration::from_millis(220));
    }

    #[test]
    fn target_hold_exceeds_playback_for_every_cue() {
        for cue in CueType::ALL {
            assert!(cue.target_hold() > cue.playback_duration(), "{cue}");
        }
    }
}
