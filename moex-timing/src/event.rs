use std::fmt;

/// Semantic input events that occur repeatedly within a trial; the
/// ledger keeps the first and the last occurrence of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Move,
    ViewportEnter,
    ViewportExit,
    Zoom,
    Pan,
    FocusEnter,
    FocusExit,
}

impl EventKind {
    pub fn key(self) -> &'static str {
        match self {
            EventKind::Move => "move",
            EventKind::ViewportEnter => "viewport_enter",
            EventKind::ViewportExit => "viewport_exit",
            EventKind::Zoom => "zoom",
            EventKind::Pan => "pan",
            EventKind::FocusEnter => "focus_enter",
            EventKind::FocusExit => "focus_exit",
        }
    }
}

/// Closed vocabulary of ledger entries: the once-per-trial markers plus
/// the derived first/last pair for each [`EventKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKey {
    TrialOpen,
    TrialClose,
    SpacePress,
    First(EventKind),
    Last(EventKind),
}

impl EventKey {
    pub fn name(self) -> String {
        match self {
            EventKey::TrialOpen => "trial_open".to_owned(),
            EventKey::TrialClose => "trial_close".to_owned(),
            EventKey::SpacePress => "space_press".to_owned(),
            EventKey::First(kind) => format!("first_{}", kind.key()),
            EventKey::Last(kind) => format!("last_{}", kind.key()),
        }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paired_names_follow_the_first_last_rule() {
        assert_eq!(EventKey::First(EventKind::Zoom).name(), "first_zoom");
        assert_eq!(EventKey::Last(EventKind::Zoom).name(), "last_zoom");
        assert_eq!(
            EventKey::First(EventKind::ViewportEnter).name(),
            "first_viewport_enter"
        );
        assert_eq!(EventKey::TrialOpen.name(), "trial_open");
    }
}
