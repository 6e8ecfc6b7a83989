//! Debounce for outgoing display updates.

/// An update the presentation sink should receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    /// The current line changed
    Changed {
        prev: Option<String>,
        current: String,
        next: Option<String>,
    },
    /// Nothing should be shown
    Cleared,
}

/// Suppresses updates whose current line equals the last one emitted.
///
/// Both the self-driven and the externally driven paths submit through the
/// same gate, so there is exactly one notion of "what is on screen".
#[derive(Debug, Default)]
pub struct ChangeGate {
    last_emitted: Option<String>,
    /// Whether the sink is currently showing something
    visible: bool,
}

impl ChangeGate {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_emitted: None,
            visible: false,
        }
    }

    #[must_use]
    pub fn last_emitted(&self) -> Option<&str> {
        self.last_emitted.as_deref()
    }

    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Forget the last emitted text so the next real line always emits.
    ///
    /// Visibility is kept: a following `None` submission still clears a
    /// display that is showing stale text.
    pub fn forget(&mut self) {
        self.last_emitted = None;
    }

    /// Offer a `(prev, current, next)` triple and get back what, if anything,
    /// the sink should be told.
    pub fn submit(
        &mut self,
        prev: Option<&str>,
        current: Option<&str>,
        next: Option<&str>,
    ) -> Option<Emission> {
        let Some(current) = current else {
            self.last_emitted = None;
            if self.visible {
                self.visible = false;
                return Some(Emission::Cleared);
            }
            return None;
        };

        if self.last_emitted.as_deref() == Some(current) {
            return None;
        }

        self.last_emitted = Some(current.to_string());
        self.visible = true;
        Some(Emission::Changed {
            prev: prev.map(str::to_string),
            current: current.to_string(),
            next: next.map(str::to_string),
        })
    }
}
