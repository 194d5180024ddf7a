mod common;

use common::{MockBackend, MockTarget};
use glam::Vec2;
use splash_core::color::Rgb;
use splash_core::config::SimConfig;
use splash_core::gpu::{FieldFormat, Filtering, Output, ProgramKind, RenderBackend, Target};
use splash_core::solver::FluidSolver;
use splash_core::splat::{Splat, SplatQueue};
use splash_core::targets::{get_resolution, DoubleTarget};
use splash_core::uniforms::SplatUniforms;

fn solver(backend: &mut MockBackend) -> FluidSolver<MockBackend> {
    let caps = backend.capabilities();
    FluidSolver::new(backend, &caps).unwrap()
}

fn ready(width: u32, height: u32) -> (MockBackend, FluidSolver<MockBackend>) {
    let mut backend = MockBackend::new(width, height);
    let mut solver = solver(&mut backend);
    solver.init_fields(&mut backend, &SimConfig::default());
    backend.take_blits();
    (backend, solver)
}

#[test]
fn fields_follow_screen_aspect() {
    let (_, solver) = ready(800, 600);
    let fields = solver.fields().unwrap();
    assert_eq!(fields.sim_size(), (341, 256));
    assert_eq!(fields.dye_size(), (1365, 1024));
    assert_eq!(fields.divergence.format, FieldFormat::R16F);
    assert_eq!(fields.velocity.read().format, FieldFormat::Rg16F);
    assert_eq!(fields.dye.read().format, FieldFormat::Rgba16F);
}

#[test]
fn step_runs_passes_in_order() {
    let (mut backend, mut solver) = ready(800, 600);
    let mut config = SimConfig::default();
    config.pressure_iterations = 20;
    solver.step(&mut backend, &config, 0.016);

    let mut expected = vec![
        ProgramKind::Curl,
        ProgramKind::Vorticity,
        ProgramKind::Divergence,
        ProgramKind::Clear,
    ];
    expected.extend(std::iter::repeat(ProgramKind::Pressure).take(20));
    expected.extend([
        ProgramKind::GradientSubtract,
        ProgramKind::Advection,
        ProgramKind::Advection,
    ]);
    assert_eq!(backend.kinds(), expected);
}

#[test]
fn no_pass_reads_its_own_destination() {
    let (mut backend, mut solver) = ready(640, 480);
    let mut queue = SplatQueue::new();
    queue.push(Splat::new(Vec2::splat(0.5), Vec2::X, Rgb::new(1.0, 1.0, 1.0)));
    let config = SimConfig::default();
    solver.apply_splats(&mut backend, &mut queue, 64, &config);
    solver.step(&mut backend, &config, 0.016);

    for blit in &backend.blits {
        if let Some(dest) = blit.dest {
            assert!(!blit.sources.contains(&dest), "{:?} reads {dest}", blit.kind);
        }
    }
}

#[test]
fn jacobi_iterations_sample_divergence() {
    let (mut backend, mut solver) = ready(256, 256);
    let mut config = SimConfig::default();
    config.pressure_iterations = 7;
    solver.step(&mut backend, &config, 0.016);

    let divergence = solver.fields().unwrap().divergence.id;
    let jacobi: Vec<_> = backend
        .blits
        .iter()
        .filter(|b| b.kind == ProgramKind::Pressure)
        .collect();
    assert_eq!(jacobi.len(), 7);
    for pair in jacobi.windows(2) {
        assert_eq!(pair[0].sources[1], divergence);
        // Each iteration reads what the previous one wrote.
        assert_eq!(Some(pair[1].sources[0]), pair[0].dest);
    }
}

#[test]
fn dye_survives_resize_other_fields_restart() {
    let (mut backend, mut solver) = ready(800, 600);
    let old_dye = solver.fields().unwrap().dye.read().id;
    let old_velocity = solver.fields().unwrap().velocity.read().id;

    backend.size = (600, 800);
    solver.init_fields(&mut backend, &SimConfig::default());

    let copies: Vec<_> = backend
        .blits
        .iter()
        .filter(|b| b.kind == ProgramKind::Copy)
        .collect();
    assert_eq!(copies.len(), 1);
    assert_eq!(copies[0].sources, vec![old_dye]);
    let fields = solver.fields().unwrap();
    assert_eq!(copies[0].dest, Some(fields.dye.read().id));
    assert_eq!(fields.dye_size(), (1024, 1365));
    assert_ne!(fields.velocity.read().id, old_velocity);
}

#[test]
fn same_size_reinit_skips_copy() {
    let (mut backend, mut solver) = ready(800, 600);
    solver.init_fields(&mut backend, &SimConfig::default());
    assert_eq!(backend.count(ProgramKind::Copy), 0);
}

#[test]
fn splats_wait_for_fields() {
    let mut backend = MockBackend::new(800, 600);
    let mut solver = solver(&mut backend);
    let mut queue = SplatQueue::new();
    queue.enqueue(0.5, 0.5, 1.0, 0.0, Rgb::BLACK, None, None);
    let stats = solver.apply_splats(&mut backend, &mut queue, 64, &SimConfig::default());
    assert_eq!(stats.records, 0);
    assert_eq!(queue.len(), 1);
    assert!(backend.blits.is_empty());
}

#[test]
fn splats_are_batched_per_field() {
    let (mut backend, mut solver) = ready(800, 600);
    let mut queue = SplatQueue::new();
    for i in 0..130 {
        queue.enqueue(i as f32 / 130.0, 0.5, 1.0, 0.0, Rgb::BLACK, None, None);
    }
    let stats = solver.apply_splats(&mut backend, &mut queue, 64, &SimConfig::default());
    assert_eq!(stats.records, 130);
    assert!(queue.is_empty());

    let outputs: Vec<_> = backend.blits.iter().map(|b| b.output).collect();
    assert_eq!(
        outputs,
        vec![
            Output::Field(FieldFormat::Rg16F),
            Output::Field(FieldFormat::Rg16F),
            Output::Field(FieldFormat::Rg16F),
            Output::Field(FieldFormat::Rgba16F),
            Output::Field(FieldFormat::Rgba16F),
            Output::Field(FieldFormat::Rgba16F),
        ]
    );
    let counts: Vec<u32> = backend
        .blits
        .iter()
        .map(|b| bytemuck::pod_read_unaligned::<SplatUniforms>(&b.uniforms).count)
        .collect();
    assert_eq!(counts, vec![64, 64, 2, 64, 64, 2]);
}

#[test]
fn missing_linear_filtering_switches_to_manual() {
    let mut backend = MockBackend::new(800, 600).without_linear_filtering();
    let mut solver = solver(&mut backend);
    solver.init_fields(&mut backend, &SimConfig::default());

    let advection = backend.programs_of(ProgramKind::Advection);
    assert_eq!(advection.len(), 2);
    for program in advection {
        assert!(program
            .keywords
            .iter()
            .any(|k| k.name == "MANUAL_FILTERING" && k.enabled));
    }
    assert!(backend.targets.iter().all(|t| t.filtering == Filtering::Nearest));
}

#[test]
fn resolution_keeps_short_side() {
    for (w, h) in [(800, 600), (600, 800), (1920, 1080), (500, 500), (1, 4000)] {
        let (a, b) = get_resolution(128, w, h);
        assert_eq!(a.min(b), 128, "{w}x{h}");
        if w > h {
            assert!(a >= b);
        } else {
            assert!(b >= a);
        }
        let aspect = w.max(h) as f32 / w.min(h) as f32;
        assert!((a.max(b) as f32 - 128.0 * aspect).abs() <= 0.5);
    }
}

#[test]
fn double_target_swaps_roles() {
    let a = MockTarget {
        id: 0,
        label: "a",
        width: 4,
        height: 2,
        format: FieldFormat::R16F,
    };
    let b = MockTarget { id: 1, ..a };
    let mut pair = DoubleTarget::from_pair(a, b);
    assert_eq!((pair.read().id, pair.write().id), (0, 1));
    pair.swap();
    assert_eq!((pair.read().id, pair.write().id), (1, 0));
    assert_eq!(pair.texel_size(), [0.25, 0.5]);
    assert_eq!(pair.read().texel_size(), [0.25, 0.5]);
}
