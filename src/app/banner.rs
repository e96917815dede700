use std::sync::Arc;

use tokio::sync::watch;

pub const SUCCESS_MESSAGE: &str = "Class added successfully!";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BannerState {
    #[default]
    Hidden,
    Visible,
}

/// Dismissible "class added" banner. Clones share state.
#[derive(Debug, Clone)]
pub struct SuccessBanner {
    state: Arc<watch::Sender<BannerState>>,
}

impl Default for SuccessBanner {
    fn default() -> Self {
        Self::new()
    }
}

impl SuccessBanner {
    pub fn new() -> Self {
        let (state, _) = watch::channel(BannerState::Hidden);
        Self {
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> BannerState {
        *self.state.borrow()
    }

    pub fn is_visible(&self) -> bool {
        self.state() == BannerState::Visible
    }

    /// Returns false when the banner was already showing.
    pub fn show(&self) -> bool {
        self.transition(BannerState::Visible)
    }

    /// Returns false when the banner was already hidden.
    pub fn dismiss(&self) -> bool {
        self.transition(BannerState::Hidden)
    }

    pub fn subscribe(&self) -> watch::Receiver<BannerState> {
        self.state.subscribe()
    }

    fn transition(&self, next: BannerState) -> bool {
        self.state.send_if_modified(|state| {
            if *state == next {
                return false;
            }
            *state = next;
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_hidden() {
        assert_eq!(SuccessBanner::new().state(), BannerState::Hidden);
    }

    #[test]
    fn repeated_show_is_a_no_op() {
        let banner = SuccessBanner::new();
        let mut rx = banner.subscribe();

        assert!(banner.show());
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        assert!(!banner.show());
        assert!(!rx.has_changed().unwrap());
        assert!(banner.is_visible());
    }

    #[test]
    fn dismiss_always_hides() {
        let banner = SuccessBanner::new();
        assert!(!banner.dismiss());
        assert_eq!(banner.state(), BannerState::Hidden);

        banner.show();
        assert!(banner.dismiss());
        assert_eq!(banner.state(), BannerState::Hidden);
    }
}
