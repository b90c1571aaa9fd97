//! Frame clocks that drive walking and attack sprite playback.

use std::time::Duration;

/// Frame index within a sheet part at which damage resolution is evaluated.
pub(crate) const HIT_FRAME: u32 = 4;

/// Fixed-cadence frame cursor over a sprite sheet split into equal parts.
///
/// Sheets arrive from the animator tool as `frame_count` frames divided into
/// `parts` variants of equal length. Playback is one-shot: a running track
/// halts on the last frame of its first part, and [`AnimationTrack::reset`]
/// rewinds only once the cursor has reached the end of the sheet.
#[derive(Clone, Debug)]
pub(crate) struct AnimationTrack {
    frame_count: u32,
    parts: u32,
    frame_duration: Duration,
    current_frame: u32,
    accumulated: Duration,
    playing: bool,
}

impl AnimationTrack {
    /// Creates a new track over the described sheet.
    ///
    /// # Panics
    ///
    /// Panics when `parts` is zero or `frame_count` does not divide evenly
    /// into `parts`. Sheet descriptions are construction-time configuration;
    /// a malformed one must abort setup before the simulation runs.
    #[must_use]
    pub(crate) fn new(frame_count: u32, parts: u32, frame_duration: Duration) -> Self {
        assert!(parts > 0, "animation track requires at least one part");
        assert!(
            frame_count >= parts && frame_count % parts == 0,
            "frame count {frame_count} does not divide into {parts} parts"
        );

        Self {
            frame_count,
            parts,
            frame_duration,
            current_frame: 0,
            accumulated: Duration::ZERO,
            playing: false,
        }
    }

    /// Advances the cursor by the provided simulated time.
    pub(crate) fn advance(&mut self, dt: Duration) {
        if !self.playing || self.frame_duration.is_zero() {
            return;
        }

        self.accumulated = self.accumulated.saturating_add(dt);
        while self.accumulated >= self.frame_duration {
            self.accumulated -= self.frame_duration;
            self.current_frame = (self.current_frame + 1).min(self.frame_count - 1);
            if self.current_frame == self.part_length() - 1 {
                self.playing = false;
            }
        }
    }

    /// Starts playback, rewinding when the cursor sits on the final frame.
    pub(crate) fn reset(&mut self) {
        if self.current_frame == self.frame_count - 1 {
            self.current_frame = 0;
        }
        self.playing = true;
    }

    /// Halts playback without moving the cursor.
    pub(crate) fn stop(&mut self) {
        self.playing = false;
    }

    /// Which sheet part the cursor currently sits in.
    #[must_use]
    pub(crate) fn phase(&self) -> u32 {
        self.current_frame / self.part_length()
    }

    /// Moves the cursor to the last frame of the provided part.
    ///
    /// # Panics
    ///
    /// Panics when `phase` is not below the declared part count.
    pub(crate) fn set_phase(&mut self, phase: u32) {
        assert!(
            phase < self.parts,
            "animation phase {phase} out of range for {} parts",
            self.parts
        );
        self.current_frame = self.part_length() * (phase + 1) - 1;
    }

    /// Reports whether the cursor sits on the contact frame of its part.
    #[must_use]
    pub(crate) fn is_hit_frame(&self) -> bool {
        self.current_frame % self.part_length() == HIT_FRAME
    }

    /// Zero-based index of the frame the cursor sits on.
    #[must_use]
    pub(crate) fn current_frame(&self) -> u32 {
        self.current_frame
    }

    fn part_length(&self) -> u32 {
        self.frame_count / self.parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME_TIME: Duration = Duration::from_millis(50);

    #[test]
    fn advances_only_while_playing() {
        let mut track = AnimationTrack::new(16, 2, FRAME_TIME);
        track.advance(FRAME_TIME);
        assert_eq!(track.current_frame(), 0);

        track.reset();
        track.advance(FRAME_TIME);
        assert_eq!(track.current_frame(), 1);
    }

    #[test]
    fn halts_on_last_frame_of_first_part() {
        let mut track = AnimationTrack::new(16, 2, FRAME_TIME);
        track.reset();
        track.advance(FRAME_TIME * 20);
        assert_eq!(track.current_frame(), 7);

        track.advance(FRAME_TIME * 20);
        assert_eq!(track.current_frame(), 7, "halted track must not creep");
    }

    #[test]
    fn hit_frame_is_relative_to_the_part() {
        let mut track = AnimationTrack::new(16, 2, FRAME_TIME);
        track.set_phase(1);
        assert_eq!(track.current_frame(), 15);
        assert!(!track.is_hit_frame());

        track.reset();
        assert_eq!(track.current_frame(), 0);
        track.advance(FRAME_TIME * 4);
        assert_eq!(track.current_frame(), 4);
        assert!(track.is_hit_frame());
    }

    #[test]
    fn phase_tracks_sheet_parts() {
        let mut track = AnimationTrack::new(16, 2, FRAME_TIME);
        assert_eq!(track.phase(), 0);
        track.set_phase(1);
        assert_eq!(track.phase(), 1);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn set_phase_rejects_indices_beyond_part_count() {
        let mut track = AnimationTrack::new(8, 2, FRAME_TIME);
        track.set_phase(2);
    }

    #[test]
    #[should_panic(expected = "does not divide")]
    fn construction_rejects_ragged_sheets() {
        let _ = AnimationTrack::new(9, 2, FRAME_TIME);
    }
}
