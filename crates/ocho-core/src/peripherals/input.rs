//! Input system.
//!
//! Keys:
//!     1 2 3 C
//!     4 5 6 D
//!     7 8 9 E
//!     A 0 B F
//!
//! The latch tracks two distinct things: the *hold* state of the sixteen keys
//! (read by the skip-if-key opcodes) and fresh *press edges* (consumed by the
//! wait-for-key opcode). Key sources publish press/release edges into a
//! bounded single-producer queue; the tick driver drains it at the start of
//! each tick. No other thread touches the hold state directly.

use std::fmt;
use std::sync::Arc;

use crossbeam_queue::ArrayQueue;

use crate::core::types::{C8Byte, C8RegIdx};

/// Input state count.
pub const INPUT_STATE_COUNT: usize = 16;
/// Capacity of the key event queue.
pub const EVENT_QUEUE_CAPACITY: usize = 64;

/// Key transition direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEdge {
    /// Key went down.
    Press,
    /// Key went up.
    Release,
}

/// A key transition published by a key source.
#[derive(Debug, Clone, Copy)]
pub struct KeyEvent {
    /// CHIP-8 key, 0x0..0xF.
    pub key: C8Byte,
    /// Transition direction.
    pub edge: KeyEdge,
}

/// Producer handle to the key event queue.
///
/// Cheap to clone; safe to hand to another thread. Events published while the
/// queue is full are dropped.
#[derive(Clone)]
pub struct KeyEventQueue(Arc<ArrayQueue<KeyEvent>>);

impl KeyEventQueue {
    fn new(capacity: usize) -> Self {
        KeyEventQueue(Arc::new(ArrayQueue::new(capacity)))
    }

    /// Publish a press edge for `key`.
    pub fn press(&self, key: C8Byte) {
        self.send(KeyEvent {
            key: key & 0x0F,
            edge: KeyEdge::Press,
        });
    }

    /// Publish a release edge for `key`.
    pub fn release(&self, key: C8Byte) {
        self.send(KeyEvent {
            key: key & 0x0F,
            edge: KeyEdge::Release,
        });
    }

    /// Publish a raw event.
    pub fn send(&self, event: KeyEvent) {
        if self.0.push(event).is_err() {
            tracing::warn!("key event queue full, dropping {:?}", event);
        }
    }

    fn pop(&self) -> Option<KeyEvent> {
        self.0.pop()
    }
}

/// Wait-for-key latch.
///
/// While active, the first fresh press edge is captured here; the tick driver
/// completes the wait by depositing the key into the target register.
#[derive(Clone, Debug, Default)]
struct InputLock {
    active: bool,
    register: C8RegIdx,
    key: Option<C8Byte>,
}

/// Keypad state.
#[derive(Clone)]
pub struct InputState {
    data: [C8Byte; INPUT_STATE_COUNT],
    lock: InputLock,
    events: KeyEventQueue,
}

impl Default for InputState {
    fn default() -> Self {
        InputState {
            data: [0; INPUT_STATE_COUNT],
            lock: InputLock::default(),
            events: KeyEventQueue::new(EVENT_QUEUE_CAPACITY),
        }
    }
}

impl InputState {
    /// Create new input state.
    pub fn new() -> Self {
        Default::default()
    }

    /// Get a producer handle for key sources.
    pub fn queue_handle(&self) -> KeyEventQueue {
        self.events.clone()
    }

    /// Drain queued key events into the latch.
    ///
    /// Called by the tick driver at the start of each tick.
    pub fn drain_events(&mut self) {
        while let Some(event) = self.events.pop() {
            self.apply_event(event);
        }
    }

    /// Apply one key transition to the latch.
    pub fn apply_event(&mut self, event: KeyEvent) {
        match event.edge {
            KeyEdge::Press => self.press(event.key),
            KeyEdge::Release => self.release(event.key),
        }
    }

    /// Press a key.
    ///
    /// A press of an already-held key is a repeat and is ignored, both for
    /// the hold state and for a pending wait.
    pub fn press(&mut self, key: C8Byte) {
        let idx = usize::from(key & 0x0F);
        if self.data[idx] == 1 {
            return;
        }

        self.data[idx] = 1;
        if self.lock.active && self.lock.key.is_none() {
            self.lock.key = Some(key & 0x0F);
        }
    }

    /// Release a key.
    pub fn release(&mut self, key: C8Byte) {
        self.data[usize::from(key & 0x0F)] = 0;
    }

    /// Get the hold state of a key (1 when held).
    pub fn get(&self, key: C8Byte) -> C8Byte {
        self.data[usize::from(key & 0x0F)]
    }

    /// Start waiting for a key press targeting `register`.
    pub fn wait_for_input(&mut self, register: C8RegIdx) {
        self.lock.active = true;
        self.lock.register = register;
        self.lock.key = None;
    }

    /// Check if a wait is pending.
    pub fn is_locked(&self) -> bool {
        self.lock.active
    }

    /// Resolve the wait if a fresh press arrived.
    ///
    /// Returns `(target register, key)` and clears the latch, or `None` while
    /// still waiting.
    pub fn complete_wait(&mut self) -> Option<(C8RegIdx, C8Byte)> {
        if !self.lock.active {
            return None;
        }

        let key = self.lock.key?;
        let register = self.lock.register;
        self.lock = InputLock::default();

        Some((register, key))
    }

    /// Reset input state. The event queue handle stays valid.
    pub fn reset(&mut self) {
        self.data = [0; INPUT_STATE_COUNT];
        self.lock = InputLock::default();
    }
}

impl fmt::Debug for InputState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, v) in self.data.iter().enumerate() {
            writeln!(f, "    K{:X}: {}", idx, v)?;
        }

        writeln!(f, "    LOCK: {:?}", self.lock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_release_edges() {
        let mut input = InputState::new();
        input.press(0x5);
        assert_eq!(input.get(0x5), 1);

        input.release(0x5);
        assert_eq!(input.get(0x5), 0);
    }

    #[test]
    fn test_queue_drain() {
        let mut input = InputState::new();
        let queue = input.queue_handle();

        queue.press(0xA);
        queue.release(0xA);
        queue.press(0x3);
        assert_eq!(input.get(0xA), 0);

        input.drain_events();
        assert_eq!(input.get(0xA), 0);
        assert_eq!(input.get(0x3), 1);
    }

    #[test]
    fn test_wait_captures_fresh_press_only() {
        let mut input = InputState::new();

        // A key held before the wait starts must not complete it.
        input.press(0x7);
        input.wait_for_input(0x2);
        assert_eq!(input.complete_wait(), None);

        // A repeat press of the held key is ignored.
        input.press(0x7);
        assert_eq!(input.complete_wait(), None);

        input.press(0x9);
        assert_eq!(input.complete_wait(), Some((0x2, 0x9)));
        assert!(!input.is_locked());
    }

    #[test]
    fn test_wait_keeps_first_press() {
        let mut input = InputState::new();
        input.wait_for_input(0x0);

        input.press(0x4);
        input.press(0x5);
        assert_eq!(input.complete_wait(), Some((0x0, 0x4)));
    }
}
