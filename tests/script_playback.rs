use std::sync::atomic::AtomicBool;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;

use motoric::config::HumanizeConfig;
use motoric::keystroke::KeystrokeTimer;
use motoric::model::{
    ButtonState, InputAction, KeySpec, KeyState, MouseButton, Point,
};
use motoric::script::{click_actions, stats, type_actions};
use motoric::trajectory::plan_trajectory;
use motoric::transport::{run_actions, InputTransport};

#[derive(Debug, Default)]
struct Recorder {
    events: Vec<String>,
}

impl InputTransport for Recorder {
    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        self.events.push(format!("move {x},{y}"));
        Ok(())
    }

    fn button(&mut self, button: MouseButton, state: ButtonState) -> Result<()> {
        self.events.push(format!("button {button:?} {state:?}"));
        Ok(())
    }

    fn key(&mut self, key: KeySpec, state: KeyState) -> Result<()> {
        self.events.push(format!("key {key:?} {state:?}"));
        Ok(())
    }
}

fn timer_with(typo_rate: f64) -> KeystrokeTimer {
    let cfg = HumanizeConfig {
        typo_rate,
        ..HumanizeConfig::default()
    };
    KeystrokeTimer::from_config(&cfg)
}

#[test]
fn click_actions_move_along_trajectory_then_press_and_release() {
    let cfg = HumanizeConfig::default();
    let mut rng = StdRng::seed_from_u64(5);
    let trajectory = plan_trajectory(Point::new(0, 0), Point::new(400, 300), &cfg, 50, &mut rng);
    let actions = click_actions(&trajectory, MouseButton::Left, &mut rng);

    let first_move = actions
        .iter()
        .find(|a| matches!(a, InputAction::MoveTo { .. }))
        .expect("at least one move");
    assert_eq!(first_move, &InputAction::MoveTo { x: 0, y: 0 });

    let moves: Vec<&InputAction> = actions
        .iter()
        .filter(|a| matches!(a, InputAction::MoveTo { .. }))
        .collect();
    assert_eq!(
        moves.last().copied(),
        Some(&InputAction::MoveTo { x: 400, y: 300 })
    );

    let buttons: Vec<&InputAction> = actions
        .iter()
        .filter(|a| matches!(a, InputAction::Button { .. }))
        .collect();
    assert_eq!(
        buttons,
        vec![
            &InputAction::Button {
                button: MouseButton::Left,
                state: ButtonState::Pressed
            },
            &InputAction::Button {
                button: MouseButton::Left,
                state: ButtonState::Released
            },
        ]
    );
}

#[test]
fn typing_without_typos_produces_paired_key_events_in_order() {
    let timer = timer_with(0.0);
    let mut rng = StdRng::seed_from_u64(6);
    let actions = type_actions(&timer, "hi\n", &mut rng);

    let keys: Vec<(KeySpec, KeyState)> = actions
        .iter()
        .filter_map(|a| match a {
            InputAction::Key { key, state } => Some((*key, *state)),
            _ => None,
        })
        .collect();

    assert_eq!(
        keys,
        vec![
            (KeySpec::Char('h'), KeyState::Pressed),
            (KeySpec::Char('h'), KeyState::Released),
            (KeySpec::Char('i'), KeyState::Pressed),
            (KeySpec::Char('i'), KeyState::Released),
            (KeySpec::Enter, KeyState::Pressed),
            (KeySpec::Enter, KeyState::Released),
        ]
    );
}

#[test]
fn typos_are_backspaced_and_retyped() {
    let timer = timer_with(1.0);
    let mut rng = StdRng::seed_from_u64(7);
    let actions = type_actions(&timer, "a", &mut rng);

    let keys: Vec<KeySpec> = actions
        .iter()
        .filter_map(|a| match a {
            InputAction::Key {
                key,
                state: KeyState::Pressed,
            } => Some(*key),
            _ => None,
        })
        .collect();

    assert_eq!(keys.len(), 3, "typo, backspace, then the intended key");
    assert_ne!(keys[0], KeySpec::Char('a'));
    assert_eq!(keys[1], KeySpec::Backspace);
    assert_eq!(keys[2], KeySpec::Char('a'));
}

#[test]
fn run_actions_delivers_primitives_in_sequence() {
    let actions = vec![
        InputAction::MoveTo { x: 10, y: 20 },
        InputAction::Wait { ms: 1 },
        InputAction::Button {
            button: MouseButton::Left,
            state: ButtonState::Pressed,
        },
        InputAction::Button {
            button: MouseButton::Left,
            state: ButtonState::Released,
        },
        InputAction::Key {
            key: KeySpec::Char('x'),
            state: KeyState::Pressed,
        },
        InputAction::Key {
            key: KeySpec::Char('x'),
            state: KeyState::Released,
        },
    ];

    let mut recorder = Recorder::default();
    let stop = AtomicBool::new(false);
    run_actions(&mut recorder, &actions, &stop).expect("playback should succeed");

    assert_eq!(
        recorder.events,
        vec![
            "move 10,20",
            "button Left Pressed",
            "button Left Released",
            "key Char('x') Pressed",
            "key Char('x') Released",
        ]
    );
}

#[test]
fn stop_flag_aborts_playback_immediately() {
    let actions = vec![
        InputAction::MoveTo { x: 1, y: 1 },
        InputAction::MoveTo { x: 2, y: 2 },
    ];

    let mut recorder = Recorder::default();
    let stop = AtomicBool::new(true);
    run_actions(&mut recorder, &actions, &stop).expect("abort is not an error");
    assert!(recorder.events.is_empty());
}

#[test]
fn stats_count_waits_moves_and_key_events() {
    let timer = timer_with(0.0);
    let mut rng = StdRng::seed_from_u64(8);
    let actions = type_actions(&timer, "abc", &mut rng);

    let s = stats(&actions);
    assert_eq!(s.actions, actions.len());
    assert_eq!(s.key_events, 6);
    assert_eq!(s.button_events, 0);
    assert!(s.total_wait_ms > 0);
}
