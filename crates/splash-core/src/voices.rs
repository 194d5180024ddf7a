//! Per-channel tracking of sounding notes and their splashes.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use smallvec::SmallVec;

use crate::color::random_color;
use crate::config::SimConfig;
use crate::constants::{
    CC_ALL_CONTROLLERS_OFF, CC_ALL_NOTES_OFF, CC_ALL_SOUNDS_OFF, CC_HOLD, CC_SOSTENUTO,
    MIDI_CHANNELS, PEDAL_THRESHOLD,
};
use crate::envelope::Envelope;
use crate::midi::{MidiMessage, VelocityMap};
use crate::note::Note;
use crate::splash::Splash;
use crate::splat::SplatQueue;

type VoiceList = SmallVec<[Splash; 8]>;

#[derive(Debug, Default)]
struct Channel {
    voices: VoiceList,
    hold: bool,
    sustain: bool,
}

/// Owns every active voice, grouped by MIDI channel (0–15).
///
/// All mutators take the current clock reading `now` in seconds. Splashes
/// only enqueue splats; nothing here touches GPU state.
pub struct VoiceRegistry {
    channels: [Channel; MIDI_CHANNELS],
    envelopes: [Arc<Envelope>; MIDI_CHANNELS],
    velocity_map: VelocityMap,
    rng: StdRng,
}

impl VoiceRegistry {
    /// One envelope shared by all sixteen channels.
    pub fn new(envelope: Envelope, seed: u64) -> Self {
        let shared = Arc::new(envelope);
        Self {
            channels: Default::default(),
            envelopes: std::array::from_fn(|_| Arc::clone(&shared)),
            velocity_map: VelocityMap::default(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Give one channel its own envelope.
    pub fn set_envelope(&mut self, channel: u8, envelope: Envelope) {
        if let Some(slot) = self.envelopes.get_mut(usize::from(channel)) {
            *slot = Arc::new(envelope);
        }
    }

    pub fn set_velocity_map(&mut self, map: VelocityMap) {
        self.velocity_map = map;
    }

    fn channel_mut(&mut self, channel: u8) -> Option<&mut Channel> {
        let slot = self.channels.get_mut(usize::from(channel));
        if slot.is_none() {
            log::warn!("[voices] channel {channel} out of range");
        }
        slot
    }

    /// Active voices on a channel, oldest first.
    pub fn voices(&self, channel: u8) -> &[Splash] {
        self.channels
            .get(usize::from(channel))
            .map_or(&[], |c| c.voices.as_slice())
    }

    /// Voices for `pitch` that have not been released yet.
    pub fn gated_voices(&self, channel: u8, pitch: u8) -> usize {
        self.voices(channel)
            .iter()
            .filter(|s| s.note().pitch() == pitch && !s.note().is_off())
            .count()
    }

    pub fn voice_count(&self) -> usize {
        self.channels.iter().map(|c| c.voices.len()).sum()
    }

    pub fn is_held(&self, channel: u8) -> bool {
        self.channels
            .get(usize::from(channel))
            .is_some_and(|c| c.hold)
    }

    pub fn is_sustained(&self, channel: u8) -> bool {
        self.channels
            .get(usize::from(channel))
            .is_some_and(|c| c.sustain)
    }

    pub fn set_hold(&mut self, channel: u8, value: u8, now: f64) {
        let hold = value >= PEDAL_THRESHOLD;
        if let Some(ch) = self.channel_mut(channel) {
            ch.hold = hold;
            for voice in ch.voices.iter_mut() {
                voice.note_mut().hold(hold, now);
            }
        }
    }

    pub fn set_sostenuto(&mut self, channel: u8, value: u8, now: f64) {
        let sustain = value >= PEDAL_THRESHOLD;
        if let Some(ch) = self.channel_mut(channel) {
            ch.sustain = sustain;
            for voice in ch.voices.iter_mut() {
                voice.note_mut().sustain(sustain, now);
            }
        }
    }

    /// Hard cut: release every voice now, ignoring pedals.
    pub fn all_sounds_off(&mut self, channel: u8, now: f64) {
        if let Some(ch) = self.channel_mut(channel) {
            for voice in ch.voices.iter_mut() {
                voice.note_mut().force_off(now);
            }
        }
    }

    /// Note-off for every voice; pedals still apply.
    pub fn all_notes_off(&mut self, channel: u8, now: f64) {
        if let Some(ch) = self.channel_mut(channel) {
            for voice in ch.voices.iter_mut() {
                voice.note_mut().off(now);
            }
        }
    }

    pub fn all_controllers_off(&mut self, channel: u8, now: f64) {
        if let Some(ch) = self.channel_mut(channel) {
            ch.hold = false;
            ch.sustain = false;
            for voice in ch.voices.iter_mut() {
                voice.note_mut().hold(false, now);
            }
            for voice in ch.voices.iter_mut() {
                voice.note_mut().sustain(false, now);
            }
        }
    }

    /// Start a voice. A voice already sounding the same pitch is cut first,
    /// so a pitch never stacks.
    pub fn add_note(&mut self, channel: u8, pitch: u8, velocity: u8, now: f64) {
        let Some(envelope) = self.envelopes.get(usize::from(channel)).cloned() else {
            log::warn!("[voices] channel {channel} out of range");
            return;
        };
        self.release_matching(channel, pitch, now, true);
        let color = random_color(&mut self.rng, 1.0, 1.0);
        if let Some(ch) = self.channel_mut(channel) {
            let mut note = Note::new(pitch, velocity, envelope, now);
            note.hold(ch.hold, now);
            ch.voices.push(Splash::new(note, color));
            log::debug!(
                "[voices] ch{} note {} vel {} ({} voices)",
                channel + 1,
                pitch,
                velocity,
                ch.voices.len()
            );
        }
    }

    pub fn release_note(&mut self, channel: u8, pitch: u8, now: f64) {
        self.release_matching(channel, pitch, now, false);
    }

    fn release_matching(&mut self, channel: u8, pitch: u8, now: f64, force: bool) {
        if let Some(ch) = self.channel_mut(channel) {
            for voice in ch.voices.iter_mut().filter(|s| s.note().pitch() == pitch) {
                if force {
                    voice.note_mut().force_off(now);
                } else {
                    voice.note_mut().off(now);
                }
            }
        }
    }

    /// Update every splash once and drop the voices whose release has ended.
    pub fn tick(&mut self, now: f64, config: &SimConfig, queue: &mut SplatQueue) {
        for ch in self.channels.iter_mut() {
            for i in (0..ch.voices.len()).rev() {
                ch.voices[i].update(now, config, queue);
                if ch.voices[i].note().is_over(now) {
                    let done = ch.voices.remove(i);
                    log::trace!("[voices] note {} finished", done.note().pitch());
                }
            }
        }
    }

    /// Controllers off, then sounds off, on all sixteen channels.
    pub fn reset(&mut self, now: f64) {
        log::info!("[voices] reset");
        for channel in 0..MIDI_CHANNELS as u8 {
            self.all_controllers_off(channel, now);
            self.all_sounds_off(channel, now);
        }
    }

    /// Apply one decoded message.
    pub fn handle(&mut self, message: MidiMessage, now: f64) {
        match message {
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => {
                let velocity = self.velocity_map.apply(velocity);
                self.add_note(channel, note, velocity, now);
            }
            MidiMessage::NoteOff { channel, note, .. } => self.release_note(channel, note, now),
            MidiMessage::ControlChange {
                channel,
                controller,
                value,
            } => match controller {
                CC_HOLD => self.set_hold(channel, value, now),
                CC_SOSTENUTO => self.set_sostenuto(channel, value, now),
                CC_ALL_SOUNDS_OFF => self.all_sounds_off(channel, now),
                CC_ALL_NOTES_OFF => self.all_notes_off(channel, now),
                CC_ALL_CONTROLLERS_OFF => self.all_controllers_off(channel, now),
                _ => log::trace!("[voices] ignoring controller {controller}"),
            },
            MidiMessage::SystemReset => self.reset(now),
            MidiMessage::PolyPressure { .. }
            | MidiMessage::ProgramChange { .. }
            | MidiMessage::ChannelPressure { .. }
            | MidiMessage::PitchBend { .. } => {}
        }
    }
}
