//! Server-assigned document identifiers.
//!
//! 12 bytes rendered as 24 lowercase hex characters:
//!
//! ```text
//! [ 4 bytes: unix seconds ][ 3 bytes: counter ][ 5 bytes: per-process random ]
//! ```
//!
//! The timestamp prefix makes lexicographic order match creation order,
//! which is what the pizza listing relies on for newest-first sorting.
//! The counter starts at the current position within the second, so a
//! process started later in the same second (a quick restart) keeps sorting
//! after the one before it unless that one issued millions of ids already.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use chrono::Utc;
use rand::Rng;

const COUNTER_MASK: u32 = 0x00ff_ffff;
// Seeds stay in the lower half of the counter space so a burst within one
// second doesn't wrap.
const SEED_SPAN: u64 = 0x0080_0000;

static PROCESS_TAG: OnceLock<u64> = OnceLock::new();
static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

/// Generate a fresh identifier.
pub fn new_object_id() -> String {
    let now = Utc::now();
    let secs = now.timestamp().clamp(0, u32::MAX as i64) as u32;
    let tag = *PROCESS_TAG.get_or_init(|| rand::thread_rng().gen::<u64>());
    let counter = COUNTER.get_or_init(|| AtomicU32::new(counter_seed(now.timestamp_subsec_nanos())));
    let count = counter.fetch_add(1, Ordering::Relaxed);
    compose(secs, count, tag)
}

/// Map nanoseconds within the second onto `0..SEED_SPAN`.
fn counter_seed(subsec_nanos: u32) -> u32 {
    let nanos = u64::from(subsec_nanos.min(999_999_999));
    (nanos * SEED_SPAN / 1_000_000_000) as u32
}

fn compose(secs: u32, count: u32, tag: u64) -> String {
    format!(
        "{:08x}{:06x}{:010x}",
        secs,
        count & COUNTER_MASK,
        tag & 0xff_ffff_ffff
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape() {
        let id = new_object_id();
        assert_eq!(id.len(), 24);
        assert!(id.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
    }

    #[test]
    fn test_ids_are_unique_and_ordered() {
        let ids: Vec<String> = (0..1000).map(|_| new_object_id()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), ids.len());
        assert_eq!(sorted, ids);
    }

    #[test]
    fn test_later_process_in_same_second_sorts_after() {
        let secs = 1_700_000_000;
        // Old process: seeded early in the second, issued a few ids, high tag
        let old = compose(secs, counter_seed(100_000_000) + 50, 0xff_ffff_ffff);
        // Restarted process: seeded later in the same second, low tag
        let new = compose(secs, counter_seed(600_000_000), 0);
        assert!(new > old);
    }

    #[test]
    fn test_counter_seed_range() {
        assert_eq!(counter_seed(0), 0);
        assert!(counter_seed(999_999_999) < SEED_SPAN as u32);
        assert!(counter_seed(250_000_000) < counter_seed(750_000_000));
    }
}
