use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use splash_core::pointer::{correct_delta, Pointers, MOUSE_POINTER_ID};
use splash_core::splat::SplatQueue;

#[test]
fn pointer_delta_is_aspect_corrected() {
    let wide = correct_delta(Vec2::new(0.1, 0.1), (200, 100));
    assert!((wide - Vec2::new(0.1, 0.05)).length() < 1e-6);
    let tall = correct_delta(Vec2::new(0.1, 0.1), (100, 200));
    assert!((tall - Vec2::new(0.05, 0.1)).length() < 1e-6);
    let square = correct_delta(Vec2::new(0.1, 0.1), (100, 100));
    assert_eq!(square, Vec2::new(0.1, 0.1));
}

#[test]
fn texcoords_point_up() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut pointers = Pointers::new();
    pointers.down(MOUSE_POINTER_ID, Vec2::new(25.0, 0.0), (100, 200), &mut rng);
    let p = pointers.get(MOUSE_POINTER_ID).unwrap();
    assert!((p.texcoord - Vec2::new(0.25, 1.0)).length() < 1e-6);
    assert!(p.down && !p.moved);

    pointers.moved(MOUSE_POINTER_ID, Vec2::new(25.0, 200.0), (100, 200));
    let p = pointers.get(MOUSE_POINTER_ID).unwrap();
    assert!((p.texcoord - Vec2::new(0.25, 0.0)).length() < 1e-6);
    assert!(p.moved);
}

#[test]
fn moves_without_press_are_ignored() {
    let mut rng = StdRng::seed_from_u64(4);
    let mut pointers = Pointers::new();
    pointers.moved(7, Vec2::new(10.0, 10.0), (100, 100));
    assert!(pointers.get(7).is_none());

    pointers.down(7, Vec2::new(10.0, 10.0), (100, 100), &mut rng);
    pointers.up(7);
    pointers.moved(7, Vec2::new(40.0, 10.0), (100, 100));
    let mut queue = SplatQueue::new();
    pointers.flush_moves(1000.0, &mut queue);
    assert!(queue.is_empty());
}

#[test]
fn touches_keep_separate_slots() {
    let mut rng = StdRng::seed_from_u64(0);
    let mut pointers = Pointers::new();
    pointers.down(1, Vec2::new(10.0, 10.0), (100, 100), &mut rng);
    pointers.down(2, Vec2::new(50.0, 50.0), (100, 100), &mut rng);
    assert_eq!(pointers.iter().count(), 2);

    let p = pointers.get(2).unwrap();
    assert!((p.texcoord - Vec2::new(0.5, 0.5)).length() < 1e-6);

    pointers.moved(1, Vec2::new(20.0, 10.0), (100, 100));
    let mut queue = SplatQueue::new();
    pointers.flush_moves(1000.0, &mut queue);
    assert_eq!(queue.len(), 1);
    assert!((queue.pending()[0].force - Vec2::new(100.0, 0.0)).length() < 1e-3);

    // One splat per move, not per frame.
    pointers.flush_moves(1000.0, &mut queue);
    assert_eq!(queue.len(), 1);

    // A released slot is reused by the next new touch.
    pointers.up(1);
    pointers.down(3, Vec2::ZERO, (100, 100), &mut rng);
    assert_eq!(pointers.iter().count(), 2);
    assert!(pointers.get(1).is_none());
}
