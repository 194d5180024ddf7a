//! Maps a note's envelope onto a moving splat source.
//!
//! Each note gets a direction on a slowly rotating ring (pitch class picks
//! one of twelve spokes). The injection point starts on the far side of the
//! active region and glides toward the centre, faster for louder notes, while
//! the envelope volume scales both the injected force and the splat radius.

use std::f64::consts::TAU;

use glam::{DVec2, Vec2};

use crate::color::Rgb;
use crate::config::SimConfig;
use crate::constants::{
    MIDI_MAX_VALUE, SECONDS_PER_ROTATION, SPLASH_ATTENUATION, SPLASH_FORCE_SCALE,
    SPLASH_MIN_RIM_INSET, SPLASH_RADIUS_EXPONENT,
};
use crate::note::Note;
use crate::splat::{Splat, SplatQueue};

const CENTER: DVec2 = DVec2::new(0.5, 0.5);

#[derive(Clone, Debug)]
pub struct Splash {
    note: Note,
    angle_offset: f64,
    color: Rgb,
    last_point: Option<Vec2>,
}

impl Splash {
    /// The spoke angle is fixed from the note's start time.
    pub fn new(note: Note, color: Rgb) -> Self {
        let angle_offset = note.start_time() * TAU / SECONDS_PER_ROTATION;
        Self {
            note,
            angle_offset,
            color,
            last_point: None,
        }
    }

    pub fn note(&self) -> &Note {
        &self.note
    }

    pub fn note_mut(&mut self) -> &mut Note {
        &mut self.note
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    /// Point of the previous update, if any.
    pub fn last_point(&self) -> Option<Vec2> {
        self.last_point
    }

    /// Spoke direction for this note's pitch class.
    pub fn direction(&self) -> DVec2 {
        let angle = self.angle_offset + TAU * f64::from(self.note.pitch()) / 12.0;
        DVec2::from_angle(angle)
    }

    /// Blend factor between the rim point and the centre: 2 at note start,
    /// approaching 1 as the note ages.
    fn glide(&self, now: f64) -> f64 {
        let speed = f64::from(self.note.velocity()) / f64::from(MIDI_MAX_VALUE);
        let t = self.note.elapsed(now).max(0.0);
        1.0 / (1.0 + speed * t).powi(2) + 1.0
    }

    /// Injection point at time `now`.
    pub fn point(&self, now: f64, config: &SimConfig) -> Vec2 {
        let inset = f64::from(SPLASH_MIN_RIM_INSET.max(config.splat_radius)) * 0.5;
        let rim = CENTER + self.direction() * (f64::from(config.radius) - inset);
        rim.lerp(CENTER, self.glide(now)).as_vec2()
    }

    /// Enqueue this frame's splat and remember its position. The first call
    /// is preceded by the onset splat, so force is measured from the start
    /// position from the first frame on.
    pub fn update(&mut self, now: f64, config: &SimConfig, queue: &mut SplatQueue) {
        if self.last_point.is_none() {
            self.emit(self.note.start_time(), config, queue);
        }
        self.emit(now, config, queue);
    }

    // The onset lands where the splash starts, with no force and (at zero
    // envelope) no radius.
    fn emit(&mut self, now: f64, config: &SimConfig, queue: &mut SplatQueue) {
        let volume = self.note.volume(now) as f32;
        let p = self.point(now, config);
        let last = self.last_point.unwrap_or(p);
        let force = (p - last) * SPLASH_FORCE_SCALE * volume;
        let radius = config.splat_radius * (1.0 - (1.0 - volume).powi(SPLASH_RADIUS_EXPONENT));
        queue.push(
            Splat::new(p, force, self.color)
                .with_attenuation(SPLASH_ATTENUATION)
                .with_radius(radius),
        );
        self.last_point = Some(p);
    }
}
