//! Crash-safe per-type sequence counter backing id allocation.
//!
//! One counter exists per dictionary-allocated type (URI, blank node,
//! literal). The live value is a lock-free atomic word; it is checkpointed
//! to the engine every [`CHECKPOINT_INTERVAL`] allocations and on graceful
//! shutdown. On restart the counter loads the last checkpoint and adds
//! [`SAFETY_MARGIN`] so that any id possibly allocated between the last
//! flush and a crash is never reused (P10).
use super::Error;
use crate::dict::id::Tag;
use crate::kve::{Cf, SledEngine};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

pub type Result<T> = core::result::Result<T, Error>;

/// Per-type counters produce values in `[1, 2^59 - 1]`.
pub const SEQ_MAX: u64 = (1u64 << 59) - 1;
const CHECKPOINT_INTERVAL: u64 = 1000;
const SAFETY_MARGIN: u64 = 1000;
const WARN_THRESHOLD: u64 = SEQ_MAX / 2;

/// `id2str` reserved keys are always 2 bytes (`0xFF`, tag); real allocated
/// ids are always the full 8-byte big-endian encoding, so the two spaces
/// never collide.
fn checkpoint_key(tag: Tag) -> [u8; 2] {
    [0xFF, tag.raw()]
}

pub struct SequenceCounter {
    tag: Tag,
    current: AtomicU64,
    warned: AtomicBool,
}

impl SequenceCounter {
    /// Loads the persisted checkpoint, if any, and jumps ahead by the safety
    /// margin: there is no prior allocation window to protect against on a
    /// store that has never been checkpointed, so a pristine store starts
    /// at zero instead of paying the margin on its very first id. `current`
    /// tracks the last value given out, so a checkpoint of 2000 sets
    /// `current` to `2000 + SAFETY_MARGIN - 1`, making the first
    /// post-restart allocation land exactly on `2000 + SAFETY_MARGIN`.
    pub fn load(engine: &SledEngine, tag: Tag) -> Result<Self> {
        let start = match engine.get(Cf::Id2Str, &checkpoint_key(tag))? {
            Some(bytes) => {
                let persisted = u64::from_be_bytes(bytes.try_into().unwrap_or([0; 8]));
                persisted.saturating_add(SAFETY_MARGIN - 1)
            }
            None => 0,
        };
        Ok(SequenceCounter {
            tag,
            current: AtomicU64::new(start),
            warned: AtomicBool::new(false),
        })
    }

    /// Allocates the next sequence value. Fails without wrapping once the
    /// per-type ceiling is reached.
    pub fn next(&self, engine: &SledEngine) -> Result<u64> {
        let value = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        if value > SEQ_MAX {
            // undo: leave the counter pinned at the ceiling, never wrap.
            self.current.store(SEQ_MAX, Ordering::SeqCst);
            return Err(Error::SequenceOverflow { tag: self.tag });
        }
        if value >= WARN_THRESHOLD && !self.warned.swap(true, Ordering::SeqCst) {
            log::warn!(
                "sequence counter for {:?} has reached 50% of its capacity",
                self.tag
            );
        }
        if value.is_multiple_of(CHECKPOINT_INTERVAL) {
            self.checkpoint(engine)?;
        }
        Ok(value)
    }

    /// Persists the current value. Called periodically during allocation
    /// and on graceful shutdown.
    pub fn checkpoint(&self, engine: &SledEngine) -> Result<()> {
        let value = self.current.load(Ordering::SeqCst);
        engine.put(Cf::Id2Str, &checkpoint_key(self.tag), &value.to_be_bytes())?;
        Ok(())
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_tmp() -> (tempfile::TempDir, SledEngine) {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = SledEngine::open(dir.path()).expect("open");
        (dir, engine)
    }

    #[test]
    fn fresh_counter_starts_at_one() {
        let (_dir, engine) = open_tmp();
        let counter = SequenceCounter::load(&engine, Tag::Uri).unwrap();
        assert_eq!(counter.next(&engine).unwrap(), 1);
    }

    #[test]
    fn restart_after_crash_jumps_past_last_checkpoint_plus_margin() {
        let (_dir, engine) = open_tmp();
        let counter = SequenceCounter::load(&engine, Tag::Uri).unwrap();
        for _ in 0..2500 {
            counter.next(&engine).unwrap();
        }
        // checkpoints happened at 1000 and 2000; simulate a crash by
        // letting `counter` go out of scope and reloading from the engine.
        let _ = counter;
        let restarted = SequenceCounter::load(&engine, Tag::Uri).unwrap();
        let next_value = restarted.next(&engine).unwrap();
        assert_eq!(next_value, 2000 + SAFETY_MARGIN);
        assert!(next_value > 2500);
    }

    #[test]
    fn overflow_does_not_wrap() {
        let (_dir, engine) = open_tmp();
        let counter = SequenceCounter {
            tag: Tag::Uri,
            current: AtomicU64::new(SEQ_MAX - 1),
            warned: AtomicBool::new(true),
        };
        assert_eq!(counter.next(&engine).unwrap(), SEQ_MAX);
        assert!(matches!(
            counter.next(&engine),
            Err(Error::SequenceOverflow { .. })
        ));
        assert!(matches!(
            counter.next(&engine),
            Err(Error::SequenceOverflow { .. })
        ));
        assert_eq!(counter.current(), SEQ_MAX);
    }
}
