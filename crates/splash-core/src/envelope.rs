//! Attack/decay/sustain/release amplitude envelope.
//!
//! An [`Envelope`] is immutable once built and is shared between every note
//! that uses it. All times are in seconds relative to the note's start.

use thiserror::Error;

/// Interpolation shape of one envelope segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Curve {
    Linear,
    /// `out_min * (out_max / out_min) ^ progress`; both levels must be positive.
    Exponential,
}

impl Curve {
    /// Map `value` from `[in_min, in_max]` onto `[out_min, out_max]`.
    ///
    /// Returns `out_min` at `in_min` and `out_max` at `in_max`. A zero-width
    /// input range yields `out_max`.
    ///
    /// # Panics
    ///
    /// Panics when an exponential curve is evaluated with a non-positive level.
    pub fn apply(self, value: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
        let span = in_max - in_min;
        if span <= 0.0 {
            return out_max;
        }
        let progress = ((value - in_min) / span).clamp(0.0, 1.0);
        match self {
            Curve::Linear => out_min + (out_max - out_min) * progress,
            Curve::Exponential => {
                assert!(
                    out_min > 0.0 && out_max > 0.0,
                    "exponential curve needs positive levels, got {out_min} -> {out_max}"
                );
                out_min * (out_max / out_min).powf(progress)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub duration: f64,
    /// Level reached at the end of the segment.
    pub level: f64,
    pub curve: Curve,
}

impl Segment {
    pub fn new(duration: f64, level: f64, curve: Curve) -> Self {
        Self {
            duration,
            level,
            curve,
        }
    }
}

/// Release always falls to zero, so it only carries a duration and a shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Release {
    pub duration: f64,
    pub curve: Curve,
}

#[derive(Debug, Error, PartialEq)]
pub enum EnvelopeError {
    #[error("invalid {segment} duration {value}")]
    InvalidDuration { segment: &'static str, value: f64 },
    #[error("{segment} level must be finite and non-negative, got {value}")]
    InvalidLevel { segment: &'static str, value: f64 },
    #[error("{segment} uses an exponential curve between {from} and {to}; both levels must be > 0")]
    ExponentialThroughZero {
        segment: &'static str,
        from: f64,
        to: f64,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    attack: Segment,
    decay: Segment,
    sustain_duration: f64,
    release: Release,
}

impl Envelope {
    /// Build an envelope, rejecting shapes that cannot be evaluated.
    ///
    /// Attack starts from zero and release ends at zero, so neither may be
    /// exponential. Decay may be exponential when the peak and sustain levels
    /// are both positive.
    pub fn new(
        attack: Segment,
        decay: Segment,
        sustain_duration: f64,
        release: Release,
    ) -> Result<Self, EnvelopeError> {
        check_duration("attack", attack.duration)?;
        check_duration("decay", decay.duration)?;
        check_sustain(sustain_duration)?;
        check_duration("release", release.duration)?;
        check_level("attack", attack.level)?;
        check_level("decay", decay.level)?;
        check_curve("attack", attack.curve, 0.0, attack.level)?;
        check_curve("decay", decay.curve, attack.level, decay.level)?;
        check_curve("release", release.curve, decay.level, 0.0)?;
        Ok(Self {
            attack,
            decay,
            sustain_duration,
            release,
        })
    }

    pub fn peak_level(&self) -> f64 {
        self.attack.level
    }

    pub fn sustain_level(&self) -> f64 {
        self.decay.level
    }

    pub fn release_duration(&self) -> f64 {
        self.release.duration
    }

    /// Attack + decay + sustain: the latest point a note can enter release.
    pub fn gate_duration(&self) -> f64 {
        self.attack.duration + self.decay.duration + self.sustain_duration
    }

    /// Amplitude `elapsed` seconds after note start, given the time the note
    /// was released (`f64::INFINITY` while it is still gated).
    pub fn value_at(&self, elapsed: f64, release_time: f64) -> f64 {
        if elapsed <= 0.0 {
            return 0.0;
        }
        let effective_release = release_time.min(self.gate_duration());
        if elapsed < effective_release {
            return self.gated_value(elapsed);
        }
        let since_release = elapsed - effective_release;
        if since_release >= self.release.duration {
            return 0.0;
        }
        let from = self.gated_value(effective_release);
        self.release
            .curve
            .apply(since_release, 0.0, self.release.duration, from, 0.0)
    }

    /// True once the release segment has fully elapsed.
    pub fn is_over(&self, elapsed: f64, release_time: f64) -> bool {
        elapsed - release_time.min(self.gate_duration()) > self.release.duration
    }

    // Attack then decay, holding the sustain level once both are spent.
    fn gated_value(&self, elapsed: f64) -> f64 {
        let mut remaining = elapsed;
        let mut source = 0.0;
        for segment in [&self.attack, &self.decay] {
            if remaining <= segment.duration {
                return segment
                    .curve
                    .apply(remaining, 0.0, segment.duration, source, segment.level);
            }
            remaining -= segment.duration;
            source = segment.level;
        }
        self.decay.level
    }
}

impl Default for Envelope {
    /// Short linear attack, long exponential decay to 0.4, no sustain hold
    /// and a linear 0.7 s release.
    fn default() -> Self {
        Self {
            attack: Segment::new(0.01, 1.0, Curve::Linear),
            decay: Segment::new(2.0, 0.4, Curve::Exponential),
            sustain_duration: 0.0,
            release: Release {
                duration: 0.7,
                curve: Curve::Linear,
            },
        }
    }
}

fn check_duration(segment: &'static str, value: f64) -> Result<(), EnvelopeError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(EnvelopeError::InvalidDuration { segment, value })
    }
}

// Sustain alone may be infinite: the note then holds until it is released.
fn check_sustain(value: f64) -> Result<(), EnvelopeError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(EnvelopeError::InvalidDuration {
            segment: "sustain",
            value,
        })
    }
}

fn check_level(segment: &'static str, value: f64) -> Result<(), EnvelopeError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(EnvelopeError::InvalidLevel { segment, value })
    }
}

fn check_curve(segment: &'static str, curve: Curve, from: f64, to: f64) -> Result<(), EnvelopeError> {
    match curve {
        Curve::Exponential if from <= 0.0 || to <= 0.0 => {
            Err(EnvelopeError::ExponentialThroughZero { segment, from, to })
        }
        _ => Ok(()),
    }
}
