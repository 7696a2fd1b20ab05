use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Result;

use crate::model::{ButtonState, InputAction, KeySpec, KeyState, MouseButton};

/// Input-injection collaborator: delivers primitives to the target machine.
/// Implementations report success or failure per primitive; the wire framing
/// underneath is out of scope.
pub trait InputTransport {
    fn move_to(&mut self, x: i32, y: i32) -> Result<()>;
    fn button(&mut self, button: MouseButton, state: ButtonState) -> Result<()>;
    fn key(&mut self, key: KeySpec, state: KeyState) -> Result<()>;
}

fn sleep_interruptible(stop: &AtomicBool, ms: u64) {
    let mut remaining = ms;
    while remaining > 0 {
        if stop.load(Ordering::SeqCst) {
            return;
        }
        let step = remaining.min(50);
        std::thread::sleep(Duration::from_millis(step));
        remaining -= step;
    }
}

/// Replay an action sequence against a transport, honoring waits. Checks
/// `stop` between actions and during waits so a caller can abort playback.
pub fn run_actions(
    transport: &mut dyn InputTransport,
    actions: &[InputAction],
    stop: &AtomicBool,
) -> Result<()> {
    for action in actions {
        if stop.load(Ordering::SeqCst) {
            return Ok(());
        }

        match action {
            InputAction::Wait { ms } => sleep_interruptible(stop, *ms),
            InputAction::MoveTo { x, y } => transport.move_to(*x, *y)?,
            InputAction::Button { button, state } => transport.button(*button, *state)?,
            InputAction::Key { key, state } => transport.key(*key, *state)?,
        }
    }

    Ok(())
}
