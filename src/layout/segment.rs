//! A single music cue on the main timeline.

use std::path::PathBuf;

use crate::error::LayoutError;

pub const DEFAULT_OFFSET: f64 = 0.0;
pub const DEFAULT_VOLUME: f64 = 0.25;
pub const DEFAULT_FADE_IN: f64 = 3.0;
pub const DEFAULT_FADE_OUT: f64 = 3.0;

/// One BGM cue.
///
/// Times are seconds. `timeline_*` positions are on the main track,
/// `source_offset` is where reading starts inside `source`.
#[derive(Debug, Clone, PartialEq)]
pub struct BgmSegment {
    /// Absolute path of the music file.
    pub source: PathBuf,

    pub timeline_start: f64,
    pub timeline_end: f64,
    pub source_offset: f64,

    /// Linear volume multiplier.
    pub gain: f64,

    pub fade_in: f64,
    pub fade_out: f64,
}

impl BgmSegment {
    /// Create a segment with default offset, gain and fades.
    pub fn new(source: impl Into<PathBuf>, timeline_start: f64, timeline_end: f64) -> Self {
        Self {
            source: source.into(),
            timeline_start,
            timeline_end,
            source_offset: DEFAULT_OFFSET,
            gain: DEFAULT_VOLUME,
            fade_in: DEFAULT_FADE_IN,
            fade_out: DEFAULT_FADE_OUT,
        }
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.source_offset = offset;
        self
    }

    pub fn with_gain(mut self, gain: f64) -> Self {
        self.gain = gain;
        self
    }

    pub fn with_fades(mut self, fade_in: f64, fade_out: f64) -> Self {
        self.fade_in = fade_in;
        self.fade_out = fade_out;
        self
    }

    pub fn duration(&self) -> f64 {
        self.timeline_end - self.timeline_start
    }

    /// Fade-in length, never longer than the segment.
    pub fn effective_fade_in(&self) -> f64 {
        self.fade_in.min(self.duration())
    }

    /// Fade-out length, never longer than the segment.
    pub fn effective_fade_out(&self) -> f64 {
        self.fade_out.min(self.duration())
    }

    /// Segment-local time at which the fade-out begins.
    pub fn fade_out_start(&self) -> f64 {
        (self.duration() - self.effective_fade_out()).max(0.0)
    }

    /// Delay that places the segment at its timeline position.
    pub fn delay_ms(&self) -> u64 {
        (self.timeline_start * 1000.0).round() as u64
    }

    /// Check the value invariants. `index` is 1-based and only used for messages.
    pub(crate) fn check(&self, index: usize) -> Result<(), LayoutError> {
        if self.timeline_start < 0.0 || self.timeline_end <= self.timeline_start {
            return Err(LayoutError::InvalidTiming {
                index,
                start: self.timeline_start,
                end: self.timeline_end,
            });
        }
        if self.source_offset < 0.0 {
            return Err(LayoutError::InvalidOffset {
                index,
                offset: self.source_offset,
            });
        }
        if self.gain < 0.0 {
            return Err(LayoutError::InvalidVolume {
                index,
                volume: self.gain,
            });
        }
        if self.fade_in < 0.0 || self.fade_out < 0.0 {
            return Err(LayoutError::InvalidFade {
                index,
                fade_in: self.fade_in,
                fade_out: self.fade_out,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use test_case::test_case;

    #[test]
    fn test_fades_clamped_to_duration() {
        let seg = BgmSegment::new("/bgm.wav", 10.0, 12.0).with_fades(5.0, 3.0);

        assert_relative_eq!(seg.duration(), 2.0);
        assert_relative_eq!(seg.effective_fade_in(), 2.0);
        assert_relative_eq!(seg.effective_fade_out(), 2.0);
        assert_relative_eq!(seg.fade_out_start(), 0.0);
    }

    #[test]
    fn test_fade_out_start() {
        let seg = BgmSegment::new("/bgm.wav", 0.0, 20.0).with_fades(1.0, 4.5);
        assert_relative_eq!(seg.fade_out_start(), 15.5);
    }

    #[test_case(0.0, 0 ; "origin")]
    #[test_case(1.5, 1500 ; "whole millis")]
    #[test_case(2.0004, 2000 ; "rounds down")]
    #[test_case(2.0006, 2001 ; "rounds up")]
    #[test_case(61.2346, 61235 ; "long position")]
    fn test_delay_ms(start: f64, expected: u64) {
        let seg = BgmSegment::new("/bgm.wav", start, start + 1.0);
        assert_eq!(seg.delay_ms(), expected);
    }

    #[test_case(5.0, 5.0 ; "empty")]
    #[test_case(5.0, 4.0 ; "reversed")]
    #[test_case(-1.0, 4.0 ; "negative start")]
    fn test_bad_timing_rejected(start: f64, end: f64) {
        let seg = BgmSegment::new("/bgm.wav", start, end);
        assert!(matches!(
            seg.check(1),
            Err(LayoutError::InvalidTiming { index: 1, .. })
        ));
    }

    #[test]
    fn test_negative_values_rejected() {
        let base = BgmSegment::new("/bgm.wav", 0.0, 1.0);

        assert!(matches!(
            base.clone().with_offset(-0.1).check(2),
            Err(LayoutError::InvalidOffset { index: 2, .. })
        ));
        assert!(matches!(
            base.clone().with_gain(-1.0).check(2),
            Err(LayoutError::InvalidVolume { .. })
        ));
        assert!(matches!(
            base.clone().with_fades(0.0, -2.0).check(2),
            Err(LayoutError::InvalidFade { .. })
        ));
        assert!(base.with_gain(0.0).with_fades(0.0, 0.0).check(2).is_ok());
    }
}
