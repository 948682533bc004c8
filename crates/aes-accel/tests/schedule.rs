//! Property-based tests for the controller schedule

use aes_accel::regs::{CIPHERTEXT_OFFSET, CTRL_OFFSET, CTRL_START, KEY_OFFSET, PLAINTEXT_OFFSET};
use aes_accel::{Controller, ControllerState, LATENCY_STEPS};
use aes_core::{block_to_words, encrypt_block, expand_key, words_to_block, Aes128Key, Block};
use proptest::prelude::*;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

fn load(ctrl: &mut Controller, key: &Block, plain: &Block) {
    for (i, word) in block_to_words(key).into_iter().enumerate() {
        ctrl.write(KEY_OFFSET + 4 * i as u32, word).unwrap();
    }
    for (i, word) in block_to_words(plain).into_iter().enumerate() {
        ctrl.write(PLAINTEXT_OFFSET + 4 * i as u32, word).unwrap();
    }
}

fn ciphertext(ctrl: &Controller) -> Block {
    let words: [u32; 4] =
        std::array::from_fn(|i| ctrl.read(CIPHERTEXT_OFFSET + 4 * i as u32).unwrap());
    words_to_block(&words)
}

fn reference(key: &Block, plain: &Block) -> Block {
    encrypt_block(plain, &expand_key(&Aes128Key::from(*key)))
}

proptest! {
    #[test]
    fn matches_reference_in_fixed_time(key in any::<[u8; 16]>(), plain in any::<[u8; 16]>()) {
        let mut ctrl = Controller::new();
        load(&mut ctrl, &key, &plain);
        ctrl.write(CTRL_OFFSET, CTRL_START).unwrap();
        ctrl.tick();

        let mut ticks = 0u64;
        while !ctrl.is_done() {
            prop_assert!(ticks < LATENCY_STEPS);
            ctrl.tick();
            ticks += 1;
        }
        prop_assert_eq!(ticks, LATENCY_STEPS);
        prop_assert_eq!(ciphertext(&ctrl), reference(&key, &plain));
    }

    #[test]
    fn restart_while_busy_never_changes_result(
        key in any::<[u8; 16]>(),
        plain in any::<[u8; 16]>(),
        other in any::<[u8; 16]>(),
        at in 0u64..LATENCY_STEPS,
    ) {
        let mut ctrl = Controller::new();
        load(&mut ctrl, &key, &plain);
        ctrl.write(CTRL_OFFSET, CTRL_START).unwrap();
        ctrl.tick();
        for _ in 0..at {
            ctrl.tick();
        }
        prop_assert!(ctrl.is_busy());
        load(&mut ctrl, &other, &other);
        ctrl.write(CTRL_OFFSET, CTRL_START).unwrap();
        while !ctrl.is_done() {
            ctrl.tick();
        }
        prop_assert_eq!(ciphertext(&ctrl), reference(&key, &plain));
    }
}

#[test]
fn back_to_back_operations() {
    let mut rng = ChaCha20Rng::from_seed([7u8; 32]);
    let mut ctrl = Controller::new();
    for _ in 0..16 {
        let mut key = [0u8; 16];
        let mut plain = [0u8; 16];
        rng.fill_bytes(&mut key);
        rng.fill_bytes(&mut plain);

        load(&mut ctrl, &key, &plain);
        ctrl.write(CTRL_OFFSET, CTRL_START).unwrap();
        ctrl.tick();
        for _ in 0..LATENCY_STEPS {
            ctrl.tick();
        }
        assert_eq!(ctrl.state(), ControllerState::Idle);
        assert_eq!(ciphertext(&ctrl), reference(&key, &plain));
    }
}
