mod common;

use common::MockBackend;
use glam::Vec2;
use splash_core::config::SimConfig;
use splash_core::constants::MAX_FRAME_DT;
use splash_core::frame::{FrameDriver, PlayState};
use splash_core::gpu::{GpuError, ProgramKind};
use splash_core::midi::MidiMessage;
use splash_core::options::Options;
use splash_core::pointer::MOUSE_POINTER_ID;

fn options() -> Options {
    Options {
        seed: Some(7),
        ..Options::default()
    }
}

fn driver_with(config: SimConfig) -> (MockBackend, FrameDriver<MockBackend>) {
    let mut backend = MockBackend::new(800, 600);
    let driver = FrameDriver::new(&mut backend, config, options()).unwrap();
    (backend, driver)
}

fn driver() -> (MockBackend, FrameDriver<MockBackend>) {
    driver_with(SimConfig::default())
}

#[test]
fn does_nothing_until_started() {
    let (mut backend, mut driver) = driver();
    assert_eq!(driver.state(), PlayState::Stopped);
    assert!(driver.tick(1.0, &mut backend).is_none());
    assert!(backend.blits.is_empty());
}

#[test]
fn first_frame_allocates_and_renders() {
    let (mut backend, mut driver) = driver();
    driver.start(10.0);
    let report = driver.tick(10.0, &mut backend).unwrap();
    assert!(report.resized);
    assert!(report.stepped);
    assert_eq!(report.dt, 0.0);

    let last = backend.blits.last().unwrap();
    assert_eq!(last.kind, ProgramKind::Display);
    assert_eq!(last.dest, None);
    assert_eq!(backend.count(ProgramKind::Color), 1);
    assert_eq!(backend.count(ProgramKind::Curl), 1);
}

#[test]
fn long_frames_are_clamped() {
    let (mut backend, mut driver) = driver();
    driver.start(0.0);
    driver.tick(0.0, &mut backend);
    let report = driver.tick(0.5, &mut backend).unwrap();
    assert_eq!(report.dt, MAX_FRAME_DT);
    assert!(!report.resized);

    let report = driver.tick(0.51, &mut backend).unwrap();
    assert!((report.dt - 0.01).abs() < 1e-4);
}

#[test]
fn pause_excludes_time() {
    let (mut backend, mut driver) = driver();
    driver.start(0.0);
    driver.tick(1.0, &mut backend);
    driver.set_playing(false);
    assert_eq!(driver.state(), PlayState::Paused);
    backend.take_blits();
    assert!(driver.tick(3.0, &mut backend).is_none());
    assert!(backend.blits.is_empty());

    driver.set_playing(true);
    let report = driver.tick(5.0, &mut backend).unwrap();
    assert_eq!(report.dt, 0.0);
    assert!((driver.elapsed() - 1.0).abs() < 1e-9);
    driver.tick(5.25, &mut backend);
    assert!((driver.elapsed() - 1.25).abs() < 1e-9);
}

#[test]
fn stop_and_resume_rules() {
    let (mut backend, mut driver) = driver();
    driver.set_playing(true);
    assert_eq!(driver.state(), PlayState::Stopped);

    driver.start(0.0);
    assert!(driver.is_playing());
    driver.stop();
    assert_eq!(driver.state(), PlayState::Stopped);
    assert!(driver.tick(1.0, &mut backend).is_none());
}

#[test]
fn idle_pauses_and_activity_resumes() {
    let (mut backend, mut driver) = driver();
    driver.start(0.0);
    driver.tick(0.0, &mut backend);
    assert!(driver.tick(61.0, &mut backend).is_none());
    assert_eq!(driver.state(), PlayState::Paused);

    driver.notify_activity(62.0);
    assert_eq!(driver.state(), PlayState::Playing);
    assert!(driver.tick(62.0, &mut backend).is_some());
}

#[test]
fn midi_wakes_an_idle_driver() {
    let (mut backend, mut driver) = driver();
    driver.start(0.0);
    driver.tick(0.0, &mut backend);
    assert!(driver.tick(61.0, &mut backend).is_none());
    assert_eq!(driver.state(), PlayState::Paused);

    // Filtered bytes are not activity.
    assert_eq!(driver.handle_midi_bytes(&[0xF8], 62.0), None);
    assert_eq!(driver.state(), PlayState::Paused);

    driver.handle_midi_bytes(&[0x90, 64, 90], 63.0);
    assert_eq!(driver.state(), PlayState::Playing);
    let report = driver.tick(63.0, &mut backend).unwrap();
    // Onset and first frame of the new voice.
    assert_eq!(report.splats.records, 2);
    // The idle timeout restarts from the note.
    assert!(driver.tick(120.0, &mut backend).is_some());
}

#[test]
fn midi_note_reaches_fields() {
    let (mut backend, mut driver) = driver();
    let message = driver.handle_midi_bytes(&[0x90, 60, 100], 0.0);
    assert_eq!(
        message,
        Some(MidiMessage::NoteOn {
            channel: 0,
            note: 60,
            velocity: 100
        })
    );
    assert_eq!(driver.registry().voice_count(), 1);

    driver.start(0.0);
    let report = driver.tick(0.0, &mut backend).unwrap();
    assert_eq!(report.splats.records, 2);
    assert_eq!(backend.count(ProgramKind::Splat), 2);
    assert!(driver.queue().is_empty());
}

#[test]
fn masked_midi_is_dropped() {
    let mut backend = MockBackend::new(800, 600);
    let options = Options::from_pairs([("midiChannelMask", "0000000000000001"), ("seed", "1")]);
    let mut driver = FrameDriver::new(&mut backend, SimConfig::default(), options).unwrap();
    assert_eq!(driver.handle_midi_bytes(&[0x95, 60, 100], 0.0), None);
    assert_eq!(driver.registry().voice_count(), 0);
}

#[test]
fn random_burst_is_applied_once() {
    let (mut backend, mut driver) = driver();
    driver.start(0.0);
    driver.request_random_splats(0.0);
    let report = driver.tick(0.0, &mut backend).unwrap();
    assert!((5..25).contains(&report.splats.records), "{}", report.splats.records);

    let report = driver.tick(0.01, &mut backend).unwrap();
    assert_eq!(report.splats.records, 0);
}

#[test]
fn pointer_drag_injects_splat() {
    let (mut backend, mut driver) = driver();
    driver.start(0.0);
    driver.pointer_down(MOUSE_POINTER_ID, Vec2::new(100.0, 100.0), (800, 600), 0.0);
    driver.pointer_move(MOUSE_POINTER_ID, Vec2::new(160.0, 100.0), (800, 600), 0.0);
    let report = driver.tick(0.0, &mut backend).unwrap();
    assert_eq!(report.splats.records, 1);

    driver.pointer_up(MOUSE_POINTER_ID, 0.01);
    driver.pointer_move(MOUSE_POINTER_ID, Vec2::new(200.0, 100.0), (800, 600), 0.01);
    let report = driver.tick(0.01, &mut backend).unwrap();
    assert_eq!(report.splats.records, 0);
}

#[test]
fn paused_simulation_still_renders() {
    let (mut backend, mut driver) = driver();
    driver.start(0.0);
    driver.toggle_paused(0.0);
    assert!(driver.config.paused);
    let report = driver.tick(0.0, &mut backend).unwrap();
    assert!(!report.stepped);
    assert_eq!(backend.count(ProgramKind::Curl), 0);
    assert_eq!(backend.count(ProgramKind::Display), 1);
}

#[test]
fn screen_or_config_change_reallocates() {
    let (mut backend, mut driver) = driver();
    driver.start(0.0);
    driver.tick(0.0, &mut backend);

    backend.size = (1024, 768);
    assert!(driver.tick(0.01, &mut backend).unwrap().resized);
    assert!(!driver.tick(0.02, &mut backend).unwrap().resized);

    driver.config.sim_resolution = 64;
    assert!(driver.tick(0.03, &mut backend).unwrap().resized);
    assert_eq!(driver.solver().fields().unwrap().sim_size(), (85, 64));
}

#[test]
fn bloom_chain_and_checkerboard() {
    let config = SimConfig {
        bloom: true,
        transparent: true,
        ..SimConfig::default()
    };
    let (mut backend, mut driver) = driver_with(config);
    driver.start(0.0);
    driver.tick(0.0, &mut backend);

    // 341x256 halves down to seven levels of at least 2x2.
    assert_eq!(driver.compositor().targets().unwrap().bloom_levels.len(), 7);
    assert_eq!(backend.count(ProgramKind::BloomPrefilter), 1);
    assert_eq!(backend.count(ProgramKind::BloomBlur), 13);
    assert_eq!(backend.count(ProgramKind::BloomFinal), 1);
    assert_eq!(backend.count(ProgramKind::Checkerboard), 1);
    assert_eq!(backend.count(ProgramKind::Color), 0);
}

#[test]
fn display_variants_compile_on_demand() {
    let (mut backend, mut driver) = driver();
    assert_eq!(driver.compositor().display_variants(), 1);
    driver.start(0.0);
    driver.config.shading = false;
    driver.tick(0.0, &mut backend);
    assert_eq!(driver.compositor().display_variants(), 2);
    driver.config.shading = true;
    driver.tick(0.01, &mut backend);
    assert_eq!(driver.compositor().display_variants(), 2);
}

#[test]
fn degraded_provider_drops_expensive_effects() {
    let mut backend = MockBackend::new(800, 600).without_linear_filtering();
    let driver = FrameDriver::new(&mut backend, SimConfig::default(), options()).unwrap();
    assert_eq!(driver.config.dye_resolution, 512);
    assert!(!driver.config.shading);
    assert!(!driver.config.sunrays);
}

#[test]
fn program_failure_is_fatal() {
    let mut backend = MockBackend::new(800, 600);
    backend.fail_on = Some(ProgramKind::Vorticity);
    let err = FrameDriver::new(&mut backend, SimConfig::default(), options()).err();
    assert!(matches!(
        err,
        Some(GpuError::Compile {
            program: "vorticity",
            ..
        })
    ));
}
