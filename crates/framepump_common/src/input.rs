use crate::engine::{Engine, LogicalKey};
use crate::key::Key;
use crate::scheduler::{FrameClock, Scheduler};

/// Maps physical key transitions onto the engine's keypad.
///
/// No queuing and no debouncing: each transition becomes at most one
/// `key_transition` call, issued before `forward` returns.
#[derive(Clone, Copy)]
pub struct InputForwarder {
    keymap: fn(Key) -> Option<LogicalKey>,
}

impl InputForwarder {
    pub fn new(keymap: fn(Key) -> Option<LogicalKey>) -> Self {
        Self { keymap }
    }

    /// Returns `false` for keys the engine has no use for.
    pub fn forward<E: Engine, C: FrameClock>(
        &self,
        scheduler: &mut Scheduler<E, C>,
        key: Key,
        pressed: bool,
    ) -> bool {
        match (self.keymap)(key) {
            Some(logical) => {
                log::trace!("{:?} -> key {:X} pressed={}", key, logical, pressed);
                scheduler.engine_mut().key_transition(logical, pressed);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::FrameBuffer;
    use crate::loader::ProgramImage;
    use crate::scheduler::{CadenceConfig, RefreshQueue};
    use crate::testing::{Call, RecordingEngine};

    fn keymap(key: Key) -> Option<LogicalKey> {
        match key {
            Key::X => Some(0x0),
            Key::Num1 => Some(0x1),
            _ => None,
        }
    }

    fn scheduler() -> Scheduler<RecordingEngine, RefreshQueue> {
        Scheduler::new(
            RecordingEngine::default(),
            RefreshQueue::default(),
            CadenceConfig::new(4).unwrap(),
        )
    }

    #[test]
    fn press_then_release_in_one_tick() {
        let mut sched = scheduler();
        let forwarder = InputForwarder::new(keymap);

        assert!(forwarder.forward(&mut sched, Key::Num1, true));
        assert!(forwarder.forward(&mut sched, Key::Num1, false));

        assert_eq!(
            sched.engine().calls(),
            vec![Call::Key(0x1, true), Call::Key(0x1, false)]
        );
    }

    #[test]
    fn unmapped_keys_are_dropped() {
        let mut sched = scheduler();
        let forwarder = InputForwarder::new(keymap);
        assert!(!forwarder.forward(&mut sched, Key::Escape, true));
        assert!(sched.engine().calls().is_empty());
    }

    #[test]
    fn transitions_interleave_with_iterations() {
        let mut sched = scheduler();
        let forwarder = InputForwarder::new(keymap);
        let mut fb = FrameBuffer::new(1, 1);
        sched.restart(ProgramImage::new(vec![1]).unwrap()).unwrap();
        sched.engine_mut().clear();

        forwarder.forward(&mut sched, Key::X, true);
        sched.pump(&mut fb);
        forwarder.forward(&mut sched, Key::X, false);

        let calls = sched.engine().calls();
        assert_eq!(calls.first(), Some(&Call::Key(0x0, true)));
        assert_eq!(calls.last(), Some(&Call::Key(0x0, false)));
        assert_eq!(sched.engine().count(&Call::Step), 4);
    }

    #[test]
    fn forwarding_works_without_a_running_program() {
        let mut sched = scheduler();
        let forwarder = InputForwarder::new(keymap);
        assert!(forwarder.forward(&mut sched, Key::X, true));
        assert_eq!(sched.engine().calls(), vec![Call::Key(0x0, true)]);
    }
}
