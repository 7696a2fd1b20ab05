use rand::Rng;

use crate::keystroke::KeystrokeTimer;
use crate::model::{
    ButtonState, InputAction, KeySpec, KeyState, MouseButton, TimedPoint, Trajectory,
};

/// Pause between a typo being typed and the typist noticing it.
const TYPO_NOTICE_MS: (u64, u64) = (150, 420);

/// Compose a trajectory and a click into transport primitives. Waits carry
/// the trajectory's pacing; the click gets a short settle pause and a
/// randomized hold.
pub fn click_actions(
    trajectory: &Trajectory,
    button: MouseButton,
    rng: &mut impl Rng,
) -> Vec<InputAction> {
    let mut actions = Vec::with_capacity(trajectory.len() * 2 + 4);

    let mut previous_elapsed = 0u64;
    for TimedPoint { x, y, elapsed_ms } in trajectory.points() {
        let wait = elapsed_ms.saturating_sub(previous_elapsed);
        if wait > 0 {
            actions.push(InputAction::Wait { ms: wait });
        }
        actions.push(InputAction::MoveTo { x: *x, y: *y });
        previous_elapsed = *elapsed_ms;
    }

    actions.push(InputAction::Wait {
        ms: rng.gen_range(30..=90),
    });
    actions.push(InputAction::Button {
        button,
        state: ButtonState::Pressed,
    });
    actions.push(InputAction::Wait {
        ms: rng.gen_range(35..=110),
    });
    actions.push(InputAction::Button {
        button,
        state: ButtonState::Released,
    });

    actions
}

fn key_spec_for_char(c: char) -> KeySpec {
    if c == '\n' {
        KeySpec::Enter
    } else {
        KeySpec::Char(c)
    }
}

fn press(actions: &mut Vec<InputAction>, key: KeySpec, rng: &mut impl Rng) {
    actions.push(InputAction::Key {
        key,
        state: KeyState::Pressed,
    });
    actions.push(InputAction::Wait {
        ms: rng.gen_range(18..=70),
    });
    actions.push(InputAction::Key {
        key,
        state: KeyState::Released,
    });
}

/// Compose humanized typing of `text` into transport primitives. Typos the
/// timer injects are typed, noticed after a pause, backspaced, and retyped
/// correctly.
pub fn type_actions(timer: &KeystrokeTimer, text: &str, rng: &mut impl Rng) -> Vec<InputAction> {
    let chars: Vec<char> = text.chars().collect();
    let word_flags = burst_flags(timer, &chars);

    let mut actions = Vec::new();
    let mut prev: Option<char> = None;

    for (i, &c) in chars.iter().enumerate() {
        let timing = timer.plan_key(c, prev, word_flags[i], rng);

        actions.push(InputAction::Wait {
            ms: timing.delay_ms,
        });
        press(&mut actions, key_spec_for_char(timing.typed), rng);

        if timing.is_typo {
            actions.push(InputAction::Wait {
                ms: rng.gen_range(TYPO_NOTICE_MS.0..=TYPO_NOTICE_MS.1),
            });
            press(&mut actions, KeySpec::Backspace, rng);

            let retry = timer.plan_key(c, Some(timing.typed), word_flags[i], rng);
            actions.push(InputAction::Wait { ms: retry.delay_ms });
            press(&mut actions, key_spec_for_char(c), rng);
        }

        prev = Some(c);
    }

    actions
}

/// Burst membership per character: true while inside a word found in the
/// timer's burst list.
fn burst_flags(timer: &KeystrokeTimer, chars: &[char]) -> Vec<bool> {
    let mut flags = vec![false; chars.len()];
    let mut i = 0;

    while i < chars.len() {
        if chars[i].is_ascii_alphabetic() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_alphabetic() {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            if timer.is_burst_word(&word) {
                for flag in &mut flags[start..i] {
                    *flag = true;
                }
            }
        } else {
            i += 1;
        }
    }

    flags
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ActionStats {
    pub actions: usize,
    pub moves: usize,
    pub key_events: usize,
    pub button_events: usize,
    pub total_wait_ms: u64,
}

pub fn stats(actions: &[InputAction]) -> ActionStats {
    let mut out = ActionStats {
        actions: actions.len(),
        ..Default::default()
    };

    for a in actions {
        match a {
            InputAction::Wait { ms } => {
                out.total_wait_ms = out.total_wait_ms.saturating_add(*ms);
            }
            InputAction::MoveTo { .. } => out.moves += 1,
            InputAction::Key { .. } => out.key_events += 1,
            InputAction::Button { .. } => out.button_events += 1,
        }
    }

    out
}
