use crate::classifier::{ClassifierLink, WorkerCommand};
use crate::error::SkResult;
use crate::sketch::SketchPad;

/// Admission control for the classifier: at most one request in flight
/// system-wide, submissions only when the worker is ready and ink has
/// changed since the last submission.
///
/// This is the sole backpressure mechanism between the game and a worker
/// that can only serve one inference at a time.
#[derive(Debug, Default)]
pub struct ClassifyGate {
    ready: bool,
    dirty: bool,
    in_flight: Option<u64>,
}

impl ClassifyGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Worker signalled ready; submissions may start
    pub fn mark_ready(&mut self) {
        self.ready = true;
    }

    /// Worker went away; refuse further submissions
    pub fn mark_unavailable(&mut self) {
        self.ready = false;
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Note new ink since the last submission
    pub fn note_sketch_changed(&mut self) {
        self.dirty = true;
    }

    /// The sketch was wiped; pending dirtiness means nothing now
    pub fn note_sketch_cleared(&mut self) {
        self.dirty = false;
    }

    pub fn has_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Poll-tick entry point: submit a crop when ready, dirty and idle.
    /// Records `generation` as the outstanding request's token and returns
    /// whether a submission happened. Not ready, busy or unchanged are all
    /// quiet refusals, never errors.
    pub fn poll(
        &mut self,
        generation: u64,
        pad: &SketchPad,
        link: &dyn ClassifierLink,
    ) -> SkResult<bool> {
        if !self.ready || self.in_flight.is_some() || !self.dirty {
            return Ok(false);
        }
        match pad.cropped_image() {
            Some(image) => {
                link.send(WorkerCommand::Classify { image })?;
                self.in_flight = Some(generation);
                self.dirty = false;
                Ok(true)
            }
            None => {
                // dirty with no ink happens right after a wipe; drop it
                self.dirty = false;
                Ok(false)
            }
        }
    }

    /// A result (or worker failure) arrived: clear the outstanding flag and
    /// hand back the token it was submitted under, if any.
    pub fn settle(&mut self) -> Option<u64> {
        self.in_flight.take()
    }
}
