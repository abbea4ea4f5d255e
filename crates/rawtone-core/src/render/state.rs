//! Progress of the incremental render pass.

/// Progress of the current pass over the working image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderState {
    /// The last pass reached the bottom of the image.
    pub done: bool,
    /// Next row the pass will render.
    pub last_row: usize,
    /// Clipping warnings are composited into the preview.
    pub overlay_enabled: bool,
}

/// Where the renderer stands between two steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
    /// Nothing to render.
    Idle,
    /// A full pass is required and has not started.
    Dirty,
    /// A pass was interrupted and will resume at `last_row`.
    Running,
}

/// Outcome of one call to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// Work remains; call again when the host is idle.
    Pending,
    Done,
}

impl RenderState {
    /// Require a new full pass from the top.
    pub fn invalidate(&mut self) {
        self.done = false;
        self.last_row = 0;
    }

    pub fn phase(&self) -> RenderPhase {
        match (self.done, self.last_row) {
            (true, _) => RenderPhase::Idle,
            (false, 0) => RenderPhase::Dirty,
            (false, _) => RenderPhase::Running,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phases() {
        let mut state = RenderState::default();
        assert_eq!(state.phase(), RenderPhase::Dirty);
        state.last_row = 3;
        assert_eq!(state.phase(), RenderPhase::Running);
        state.done = true;
        state.last_row = 0;
        assert_eq!(state.phase(), RenderPhase::Idle);
        state.invalidate();
        assert_eq!(state.phase(), RenderPhase::Dirty);
    }

    #[test]
    fn test_invalidate_keeps_overlay_flag() {
        let mut state = RenderState {
            done: true,
            last_row: 0,
            overlay_enabled: true,
        };
        state.invalidate();
        assert!(state.overlay_enabled);
        assert!(!state.done);
    }
}
