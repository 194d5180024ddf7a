//! Raw MIDI bytes to typed messages.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::constants::{DEFAULT_CHANNEL_MASK, MIDI_CHANNELS, MIDI_MAX_VALUE};

/// Which of the 16 channels are processed. Bit 0 is channel 1.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelMask(u16);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChannelMaskError {
    #[error("channel mask must have 16 digits, got {0}")]
    Length(usize),
    #[error("channel mask may only contain 0 and 1, found {0:?}")]
    Digit(char),
}

impl ChannelMask {
    pub const ALL: ChannelMask = ChannelMask(DEFAULT_CHANNEL_MASK);

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    /// `channel` is zero based.
    pub fn allows(self, channel: u8) -> bool {
        usize::from(channel) < MIDI_CHANNELS && self.0 & (1 << channel) != 0
    }

    /// Parse a mask, logging malformed input and falling back to all channels.
    pub fn parse_or_default(text: &str) -> Self {
        text.parse().unwrap_or_else(|e| {
            log::error!("[midi] invalid channel mask {text:?}: {e}; using all channels");
            Self::ALL
        })
    }
}

impl Default for ChannelMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl FromStr for ChannelMask {
    type Err = ChannelMaskError;

    /// Sixteen `0`/`1` digits, rightmost is channel 1.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let len = text.chars().count();
        if len != MIDI_CHANNELS {
            return Err(ChannelMaskError::Length(len));
        }
        text.chars().try_fold(0u16, |bits, c| match c {
            '0' => Ok(bits << 1),
            '1' => Ok(bits << 1 | 1),
            other => Err(ChannelMaskError::Digit(other)),
        })
        .map(ChannelMask)
    }
}

impl fmt::Debug for ChannelMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelMask({:016b})", self.0)
    }
}

/// Decoded MIDI message. Channels are zero based.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOff { channel: u8, note: u8, velocity: u8 },
    NoteOn { channel: u8, note: u8, velocity: u8 },
    PolyPressure { channel: u8, note: u8, pressure: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    ChannelPressure { channel: u8, pressure: u8 },
    PitchBend { channel: u8, value: u16 },
    SystemReset,
}

impl MidiMessage {
    pub fn channel(&self) -> Option<u8> {
        match *self {
            MidiMessage::NoteOff { channel, .. }
            | MidiMessage::NoteOn { channel, .. }
            | MidiMessage::PolyPressure { channel, .. }
            | MidiMessage::ControlChange { channel, .. }
            | MidiMessage::ProgramChange { channel, .. }
            | MidiMessage::ChannelPressure { channel, .. }
            | MidiMessage::PitchBend { channel, .. } => Some(channel),
            MidiMessage::SystemReset => None,
        }
    }
}

const SYSTEM_RESET: u8 = 0x0F;

/// Decode one complete message. Returns `None` for data without a status
/// byte, truncated messages, unhandled system messages and channel messages
/// outside `mask`.
///
/// A note-on with velocity 0 decodes as a note-off.
pub fn decode(bytes: &[u8], mask: ChannelMask) -> Option<MidiMessage> {
    let (&status, data) = bytes.split_first()?;
    if status & 0x80 == 0 {
        log::trace!("[midi] ignoring data byte without status: {status:#04x}");
        return None;
    }
    let kind = status >> 4;
    if !(0x8..=0xE).contains(&kind) {
        return match status & 0x0F {
            SYSTEM_RESET => Some(MidiMessage::SystemReset),
            _ => None,
        };
    }
    let channel = status & 0x0F;
    if !mask.allows(channel) {
        return None;
    }
    let byte = |i: usize| data.get(i).map(|b| b & 0x7F);
    let message = match kind & 0x07 {
        0 => MidiMessage::NoteOff {
            channel,
            note: byte(0)?,
            velocity: byte(1)?,
        },
        1 => match (byte(0)?, byte(1)?) {
            (note, 0) => MidiMessage::NoteOff {
                channel,
                note,
                velocity: 0,
            },
            (note, velocity) => MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            },
        },
        2 => MidiMessage::PolyPressure {
            channel,
            note: byte(0)?,
            pressure: byte(1)?,
        },
        3 => MidiMessage::ControlChange {
            channel,
            controller: byte(0)?,
            value: byte(1)?,
        },
        4 => MidiMessage::ProgramChange {
            channel,
            program: byte(0)?,
        },
        5 => MidiMessage::ChannelPressure {
            channel,
            pressure: byte(0)?,
        },
        _ => MidiMessage::PitchBend {
            channel,
            value: u16::from(byte(0)?) | u16::from(byte(1)?) << 7,
        },
    };
    Some(message)
}

/// Linear remap applied to incoming note velocities.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VelocityMap {
    pub offset: f32,
    pub factor: f32,
}

impl Default for VelocityMap {
    fn default() -> Self {
        Self {
            offset: 0.0,
            factor: 1.0,
        }
    }
}

impl VelocityMap {
    /// `offset + factor * velocity`, clamped to `1..=127` so a note-on never
    /// turns into silence.
    pub fn apply(&self, velocity: u8) -> u8 {
        let mapped = self.offset + self.factor * f32::from(velocity);
        mapped.round().clamp(1.0, MIDI_MAX_VALUE) as u8
    }
}
