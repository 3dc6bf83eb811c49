//! Vertical page-scroll collaborator.

/// Receives touch timing for vertical gestures so the host page can scroll.
pub trait PageScroller {
    /// A touch sequence started.
    fn on_touch_start(&self, time_stamp: f64, client_y: f64);

    /// A vertical touch moved.
    fn on_touch_move(&self, time_stamp: f64, client_y: f64);

    /// A touch sequence ended without a horizontal swipe.
    fn on_touch_end(&self, time_stamp: f64);
}
