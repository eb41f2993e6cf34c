use std::sync::Arc;

use parking_lot::Mutex;

use super::Frame;

/// The ordered stack of active frames, shared by every script thread.
///
/// The bottom frame is the global frame and lives as long as the runtime.
/// Threads push and pop their call frames here under one mutex; a pop
/// removes the given frame even when another thread pushed after it.
#[derive(Debug)]
pub struct FrameStack {
    global: Frame,
    frames: Mutex<Vec<Frame>>,
}

impl FrameStack {
    pub fn new() -> Self {
        let global = Frame::new("main");
        Self {
            frames: Mutex::new(vec![global.clone()]),
            global,
        }
    }

    #[inline]
    pub fn global(&self) -> &Frame {
        &self.global
    }

    pub fn push_frame(&self, frame: Frame) {
        self.frames.lock().push(frame);
    }

    /// Remove `frame`, searching from the top.
    pub fn pop_frame(&self, frame: &Frame) {
        let mut frames = self.frames.lock();
        if let Some(i) = frames.iter().rposition(|f| f.ptr_eq(frame)) {
            // The global frame is never popped.
            if i > 0 {
                frames.remove(i);
            }
        }
    }

    /// Number of active frames, the global frame included.
    pub fn depth(&self) -> usize {
        self.frames.lock().len()
    }

    /// Snapshot of the active frames, bottom first.
    ///
    /// Holding the snapshot keeps every frame (and so every binding) alive,
    /// which makes them collector roots for the duration of a run.
    pub fn roots(&self) -> Arc<[Frame]> {
        self.frames.lock().iter().cloned().collect()
    }
}

impl Default for FrameStack {
    fn default() -> Self {
        Self::new()
    }
}
