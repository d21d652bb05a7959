//! Score popup shown after each release.
//!
//! Only one popup is visible at a time. Each carries its own id and expiry so
//! a dismissal or expiry aimed at an older popup leaves a newer one alone.

use crate::matcher::Judgement;
use crate::time::GameInstant;

/// Identifies one shown popup.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PopupId(u32);

impl PopupId {
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

/// Popup currently on screen.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ScorePopup<I> {
    pub id: PopupId,
    pub judgement: Judgement,
    pub expires_at: I,
}

/// Tracks the visible popup.
#[derive(Clone, Debug)]
pub struct PopupTracker<I> {
    active: Option<ScorePopup<I>>,
    next_id: u32,
}

impl<I: GameInstant> PopupTracker<I> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            active: None,
            next_id: 0,
        }
    }

    /// Replaces the visible popup.
    pub fn show(&mut self, judgement: Judgement, expires_at: I) -> PopupId {
        let id = PopupId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.active = Some(ScorePopup {
            id,
            judgement,
            expires_at,
        });
        id
    }

    /// Hides the popup only if it is still the one named by `id`.
    pub fn dismiss(&mut self, id: PopupId) -> bool {
        if self.active.is_some_and(|popup| popup.id == id) {
            self.active = None;
            return true;
        }
        false
    }

    /// Hides the popup once its own expiry has passed.
    pub fn expire(&mut self, now: I) -> Option<PopupId> {
        let popup = self.active.filter(|popup| popup.expires_at <= now)?;
        self.active = None;
        Some(popup.id)
    }

    #[must_use]
    pub const fn active(&self) -> Option<&ScorePopup<I>> {
        self.active.as_ref()
    }

    /// When the visible popup should disappear.
    #[must_use]
    pub fn next_expiry(&self) -> Option<I> {
        self.active.map(|popup| popup.expires_at)
    }

    pub fn clear(&mut self) {
        self.active = None;
    }
}

impl<I: GameInstant> Default for PopupTracker<I> {
    fn default() -> Self {
        Self::new()
    }
}
