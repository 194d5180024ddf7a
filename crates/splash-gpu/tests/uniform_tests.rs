use splash_gpu::uniforms::{padded_size, UniformSlots, UNIFORM_BLOCK};

#[test]
fn blocks_round_up_to_sixteen_bytes() {
    assert_eq!(padded_size(0), UNIFORM_BLOCK);
    assert_eq!(padded_size(4), 16);
    assert_eq!(padded_size(16), 16);
    assert_eq!(padded_size(17), 32);
    assert_eq!(padded_size(2064), 2064);
}

#[test]
fn each_blit_in_a_frame_gets_its_own_slot() {
    let mut slots = UniformSlots::default();
    // A blur pair and a second pass with the same block size.
    assert_eq!(slots.claim(16), 0);
    assert_eq!(slots.claim(16), 1);
    assert_eq!(slots.claim(16), 2);
    // Other sizes count separately.
    assert_eq!(slots.claim(64), 0);
    assert_eq!(slots.claim(64), 1);
}

#[test]
fn slots_are_reused_after_the_frame() {
    let mut slots = UniformSlots::default();
    for _ in 0..3 {
        slots.claim(32);
    }
    slots.reset();
    assert_eq!(slots.claim(32), 0);
    assert_eq!(slots.claim(48), 0);
}
