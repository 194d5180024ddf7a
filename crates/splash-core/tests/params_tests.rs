use splash_core::config::SimConfig;
use splash_core::params::{ParameterAnimator, ParameterSet, PRESETS};

#[test]
fn starts_on_a_preset() {
    let mut config = SimConfig::default();
    let animator = ParameterAnimator::new(&mut config, PRESETS.to_vec(), 3);
    let index = animator.current_index().unwrap();
    assert_eq!(ParameterSet::from_config(&config), PRESETS[index]);
}

#[test]
fn holds_then_tweens_toward_next_preset() {
    let mut config = SimConfig::default();
    let mut animator = ParameterAnimator::new(&mut config, PRESETS.to_vec(), 11).with_timing(1.0, 1.0);
    let first = ParameterSet::from_config(&config);
    let first_index = animator.current_index().unwrap();

    animator.update(0.5, &mut config);
    assert_eq!(ParameterSet::from_config(&config), first);

    animator.update(2.5, &mut config);
    let next_index = animator.current_index().unwrap();
    assert_ne!(next_index, first_index);
    assert_eq!(ParameterSet::from_config(&config), first);

    animator.update(3.5, &mut config);
    let halfway = first.lerp(&PRESETS[next_index], 0.5);
    assert_eq!(ParameterSet::from_config(&config), halfway);
}

#[test]
fn never_repeats_a_preset_back_to_back() {
    let mut config = SimConfig::default();
    let mut animator = ParameterAnimator::new(&mut config, PRESETS.to_vec(), 5).with_timing(1.0, 1.0);
    let mut previous = animator.current_index();
    for cycle in 1..50 {
        animator.update(cycle as f64 * 2.0 + 0.1, &mut config);
        let current = animator.current_index();
        assert_ne!(current, previous, "cycle {cycle}");
        previous = current;
    }
}

#[test]
fn untouched_fields_are_left_alone() {
    let mut config = SimConfig {
        sim_resolution: 99,
        ..SimConfig::default()
    };
    let mut animator = ParameterAnimator::new(&mut config, PRESETS.to_vec(), 1);
    animator.update(40.0, &mut config);
    assert_eq!(config.sim_resolution, 99);
    assert_eq!(config.pressure_iterations, 20);
}

#[test]
fn empty_preset_list_is_inert() {
    let mut config = SimConfig::default();
    let before = config.clone();
    let mut animator = ParameterAnimator::new(&mut config, Vec::new(), 1);
    animator.update(100.0, &mut config);
    assert_eq!(config, before);
    assert_eq!(animator.current_index(), None);
}
