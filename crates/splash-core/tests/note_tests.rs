mod common;

use common::{approx, note};
use splash_core::note::NoteState;

#[test]
fn fresh_note_is_gated() {
    let n = note(60, 100, 5.0);
    assert_eq!(n.state(), NoteState::Active);
    assert!(!n.is_off());
    assert!(n.release_time().is_infinite());
    assert!(approx(n.elapsed(5.5), 0.5));
}

#[test]
fn note_off_releases_immediately_without_pedals() {
    let mut n = note(60, 100, 1.0);
    n.off(1.25);
    assert_eq!(n.state(), NoteState::Released);
    assert!(approx(n.release_time(), 0.25));
}

#[test]
fn hold_defers_release_until_lifted() {
    let mut n = note(60, 100, 0.0);
    n.hold(true, 0.0);
    n.off(0.5);
    assert_eq!(n.state(), NoteState::ReleasePending);
    assert!(n.release_time().is_infinite());

    n.hold(false, 1.5);
    assert_eq!(n.state(), NoteState::Released);
    assert!(approx(n.release_time(), 1.5));
}

#[test]
fn lifting_hold_without_note_off_keeps_note() {
    let mut n = note(60, 100, 0.0);
    n.hold(true, 0.0);
    n.hold(false, 1.0);
    assert_eq!(n.state(), NoteState::Active);
}

#[test]
fn hold_and_sostenuto_must_both_lift() {
    let mut n = note(64, 90, 0.0);
    n.hold(true, 0.0);
    n.sustain(true, 0.0);
    n.off(0.2);

    n.hold(false, 0.4);
    assert_eq!(n.state(), NoteState::ReleasePending);
    assert!(n.is_sustained());

    n.sustain(false, 0.9);
    assert_eq!(n.state(), NoteState::Released);
    assert!(approx(n.release_time(), 0.9));
}

#[test]
fn force_off_ignores_pedals_and_writes_once() {
    let mut n = note(60, 100, 0.0);
    n.hold(true, 0.0);
    n.force_off(0.3);
    assert!(approx(n.release_time(), 0.3));

    n.force_off(0.8);
    n.off(0.9);
    n.hold(false, 1.0);
    assert!(approx(n.release_time(), 0.3));
}

#[test]
fn volume_scales_envelope_by_velocity() {
    let full = note(60, 127, 0.0);
    assert!(approx(full.volume(0.01), 1.0));

    let soft = note(60, 64, 0.0);
    assert!(approx(soft.volume(0.01), 64.0 / 127.0));
    assert_eq!(soft.volume(0.0), 0.0);
}

#[test]
fn note_is_over_after_release_duration() {
    let mut n = note(60, 100, 2.0);
    n.off(2.5);
    assert!(!n.is_over(3.1));
    assert!(n.is_over(3.3));
    assert_eq!(n.volume(3.3), 0.0);
}
