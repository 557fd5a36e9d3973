use crate::constants::{INITIAL_HEIGHT, INITIAL_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u16,
    pub height: u16,
    pub bar_height: u16,
}

#[derive(Debug, Clone, Copy)]
pub struct FrameState {
    running: bool,
    keep_focus_next: bool,
    geometry: Geometry,
}

impl FrameState {
    pub fn new(bar_height: u16) -> Self {
        Self {
            running: true,
            keep_focus_next: false,
            geometry: Geometry {
                width: INITIAL_WIDTH,
                height: INITIAL_HEIGHT,
                bar_height,
            },
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    /// Terminal transition; there is no way back.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Keep the current selection when the next window is embedded.
    pub fn set_keep_focus_next(&mut self) {
        self.keep_focus_next = true;
    }

    /// Consume the one-shot flag; `true` means the new window may take focus.
    pub fn take_focus_permission(&mut self) -> bool {
        !std::mem::take(&mut self.keep_focus_next)
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Record a new frame size. Returns `true` if it differs from the last.
    pub fn resize(&mut self, width: u16, height: u16) -> bool {
        if self.geometry.width == width && self.geometry.height == height {
            return false;
        }
        self.geometry.width = width;
        self.geometry.height = height;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keep_focus_flag_is_one_shot() {
        let mut s = FrameState::new(17);
        assert!(s.take_focus_permission());
        s.set_keep_focus_next();
        assert!(!s.take_focus_permission());
        // consumed
        assert!(s.take_focus_permission());
    }

    #[test]
    fn resize_reports_changes_only() {
        let mut s = FrameState::new(17);
        assert!(!s.resize(INITIAL_WIDTH, INITIAL_HEIGHT));
        assert!(s.resize(1024, 768));
        assert_eq!(
            s.geometry(),
            Geometry {
                width: 1024,
                height: 768,
                bar_height: 17
            }
        );
    }

    #[test]
    fn stop_is_terminal() {
        let mut s = FrameState::new(17);
        assert!(s.running());
        s.stop();
        assert!(!s.running());
    }
}
