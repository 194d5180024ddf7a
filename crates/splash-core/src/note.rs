use std::sync::Arc;

use crate::constants::MIDI_MAX_VALUE;
use crate::envelope::Envelope;

/// Where a note is in its gate/release lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteState {
    Active,
    /// Note-off received but a hold or sostenuto pedal keeps it open.
    ReleasePending,
    Released,
}

/// One sounding MIDI note.
///
/// Times passed in are readings of the host's monotonic clock in seconds.
/// The release time is stored relative to the note start and is written at
/// most once.
#[derive(Clone, Debug)]
pub struct Note {
    pitch: u8,
    velocity: u8,
    envelope: Arc<Envelope>,
    start_time: f64,
    release_time: f64,
    held: bool,
    sustained: bool,
    should_release: bool,
}

impl Note {
    pub fn new(pitch: u8, velocity: u8, envelope: Arc<Envelope>, now: f64) -> Self {
        Self {
            pitch,
            velocity,
            envelope,
            start_time: now,
            release_time: f64::INFINITY,
            held: false,
            sustained: false,
            should_release: false,
        }
    }

    pub fn pitch(&self) -> u8 {
        self.pitch
    }

    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Release time relative to the note start; infinite while gated.
    pub fn release_time(&self) -> f64 {
        self.release_time
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn elapsed(&self, now: f64) -> f64 {
        now - self.start_time
    }

    pub fn state(&self) -> NoteState {
        if self.is_off() {
            NoteState::Released
        } else if self.should_release {
            NoteState::ReleasePending
        } else {
            NoteState::Active
        }
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn is_sustained(&self) -> bool {
        self.sustained
    }

    pub fn should_release(&self) -> bool {
        self.should_release
    }

    pub fn is_off(&self) -> bool {
        self.release_time.is_finite()
    }

    /// Note-off: release now unless a pedal keeps the note open.
    pub fn off(&mut self, now: f64) {
        self.should_release = true;
        if !self.held && !self.sustained && !self.is_off() {
            self.force_off(now);
        }
    }

    /// Hold (damper) pedal. Lifting it finalizes a pending release unless
    /// sostenuto still holds the note.
    pub fn hold(&mut self, enable: bool, now: f64) {
        if !enable && self.held && self.should_release && !self.sustained && !self.is_off() {
            self.force_off(now);
        }
        self.held = enable;
    }

    /// Sostenuto pedal, tracked independently of hold.
    pub fn sustain(&mut self, enable: bool, now: f64) {
        if !enable && self.sustained && self.should_release && !self.held && !self.is_off() {
            self.force_off(now);
        }
        self.sustained = enable;
    }

    /// Freeze the release time at the current elapsed time, ignoring pedals.
    /// Has no effect once the note is already released.
    pub fn force_off(&mut self, now: f64) {
        if self.is_off() {
            log::trace!("[note] {} already released", self.pitch);
            return;
        }
        self.release_time = self.elapsed(now);
    }

    /// Velocity-scaled envelope amplitude.
    pub fn volume(&self, now: f64) -> f64 {
        let amplitude = self.envelope.value_at(self.elapsed(now), self.release_time);
        f64::from(self.velocity) / f64::from(MIDI_MAX_VALUE) * amplitude
    }

    pub fn is_over(&self, now: f64) -> bool {
        self.envelope.is_over(self.elapsed(now), self.release_time)
    }
}
