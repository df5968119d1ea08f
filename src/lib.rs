//! Snowflake is a unique ID generator that packs the current time, a
//! datacenter ID, a worker ID and a sequence value into one `u64`.
//!
//! IDs from a single generator are strictly increasing:
//! - **Temporal Ordering**: the timestamp occupies the high bits, so IDs
//!   generated later are numerically larger.
//! - **Same Timestamp**: within one millisecond the sequence number
//!   increments. When it is used up the generator waits for the next
//!   millisecond.
//! - **Clock Skew**: if the clock moves backwards the generator stalls until
//!   it has caught up again, and logs a warning through [`tracing`]. It never
//!   emits a lower ID.
//!
//! Default Snowflake ID structure:
//! - **Sign bit**: Always 0.
//! - **Timestamp**: 41 bits, milliseconds since the epoch (Twitter epoch by
//!   default).
//! - **Datacenter ID**: 5 bits.
//! - **Worker ID**: 5 bits.
//! - **Sequence**: 12 bits.
//! - **Total**: 64 bits.
//!
//! The datacenter, worker and sequence widths are configurable as long as they
//! sum to at most 63 bits; the timestamp gets whatever is left, which must be
//! wide enough to hold the current time relative to the epoch.
//!
//! # Examples
//!
//! ```
//! use snowflake::IdGenerator;
//!
//! // Worker 1 in datacenter 1, default layout
//! let generator = IdGenerator::new(1, 1).unwrap();
//!
//! let id = generator.next_id();
//! assert_eq!(generator.decode_worker_id(id), 1);
//! assert_eq!(generator.decode_datacenter_id(id), 1);
//! ```
//!
//! # Errors
//!
//! Only construction can fail:
//!
//! - [`ConfigurationError`](SnowflakeError::ConfigurationError): the bit
//!   widths exceed 63 bits, the remaining timestamp bits cannot hold the
//!   current time, or the worker ID, datacenter ID or initial sequence does
//!   not fit its width.
//! - [`InvalidEpoch`](SnowflakeError::InvalidEpoch): a custom epoch lies in
//!   the future.
//!
//! # Safety
//!
//! [`IdGenerator::next_id`] takes `&self` and serialises callers on an
//! internal lock, so one generator can be shared across threads behind an
//! [`Arc`](std::sync::Arc).

mod builder;
mod clock;

pub use {
    builder::IdGeneratorBuilder,
    clock::{Clock, SystemClock},
};

use {
    parking_lot::Mutex,
    std::{hint::spin_loop, thread, time::Duration},
    tracing::{trace, warn},
};

pub const TWEPOCH: u64 = 1288834974657; // 2010-11-04 01:42:54.657 UTC
pub const DEFAULT_WORKER_ID_BITS: u64 = 5;
pub const DEFAULT_DATACENTER_ID_BITS: u64 = 5;
pub const DEFAULT_SEQUENCE_BITS: u64 = 12;
pub const MAX_LAYOUT_BITS: u64 = 63;

const SPINS_PER_YIELD: u32 = 64;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SnowflakeError {
    #[error("configuration error: {0}")]
    ConfigurationError(String),
    #[error("epoch must not be later than the current time")]
    InvalidEpoch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Layout {
    pub(crate) worker_id_bits: u64,
    pub(crate) datacenter_id_bits: u64,
    pub(crate) sequence_bits: u64,
    pub(crate) worker_id_shift: u64,
    pub(crate) datacenter_id_shift: u64,
    pub(crate) timestamp_shift: u64,
    pub(crate) timestamp_mask: u64,
    pub(crate) max_worker_id: u64,
    pub(crate) max_datacenter_id: u64,
    pub(crate) sequence_mask: u64,
}

#[derive(Debug)]
struct State {
    last_timestamp: Option<u64>, // Unix millis of the most recent ID, None before the first
    sequence: u64,
}

/// The fields of a generated ID, as returned by [`IdGenerator::decompose`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnowflakeParts {
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub datacenter_id: u64,
    pub worker_id: u64,
    pub sequence: u64,
}

#[derive(Debug)]
pub struct IdGenerator<C = SystemClock> {
    layout: Layout,
    epoch: u64,
    worker_id: u64,
    datacenter_id: u64,
    state: Mutex<State>,
    clock: C,
}

impl IdGenerator<SystemClock> {
    /// Creates a generator with the conventional 5/5/12 layout and the
    /// Twitter epoch.
    pub fn new(worker_id: u64, datacenter_id: u64) -> Result<Self, SnowflakeError> {
        Self::builder()
            .with_worker_id(worker_id)
            .with_datacenter_id(datacenter_id)
            .build()
    }

    /// Creates a generator with an explicit layout and the Twitter epoch.
    ///
    /// Arguments are, in order: worker ID, datacenter ID, initial sequence,
    /// then the worker ID, datacenter ID and sequence bit widths.
    ///
    /// ```
    /// use snowflake::IdGenerator;
    ///
    /// let generator = IdGenerator::with_config(1, 1, 0, 5, 5, 12).unwrap();
    /// assert_eq!(generator.timestamp_bits(), 41);
    /// ```
    pub fn with_config(
        worker_id: u64,
        datacenter_id: u64,
        initial_sequence: u64,
        worker_id_bits: u64,
        datacenter_id_bits: u64,
        sequence_bits: u64,
    ) -> Result<Self, SnowflakeError> {
        Self::builder()
            .with_worker_id(worker_id)
            .with_datacenter_id(datacenter_id)
            .with_initial_sequence(initial_sequence)
            .with_worker_id_bits(worker_id_bits)
            .with_datacenter_id_bits(datacenter_id_bits)
            .with_sequence_bits(sequence_bits)
            .build()
    }

    /// Starts an [`IdGeneratorBuilder`] with the default layout, worker 0 and
    /// datacenter 0.
    pub fn builder() -> IdGeneratorBuilder<SystemClock> {
        IdGeneratorBuilder::default()
    }
}

impl<C: Clock> IdGenerator<C> {
    pub(crate) fn from_parts(
        layout: Layout,
        epoch: u64,
        worker_id: u64,
        datacenter_id: u64,
        initial_sequence: u64,
        clock: C,
    ) -> Self {
        Self {
            layout,
            epoch,
            worker_id,
            datacenter_id,
            state: Mutex::new(State {
                last_timestamp: None,
                sequence: initial_sequence,
            }),
            clock,
        }
    }

    /// Generates the next ID.
    ///
    /// Blocks while the clock is behind the last issued timestamp, and spins
    /// into the next millisecond once the sequence of the current one is used
    /// up.
    pub fn next_id(&self) -> u64 {
        let mut state = self.state.lock();
        let mut now = self.clock.now_millis();
        let last_timestamp = state.last_timestamp;

        match last_timestamp {
            Some(last) => {
                if now < last {
                    now = self.wait_for_clock(now, last);
                }
                if now == last {
                    // Multiple calls within the same millisecond increase sequence
                    state.sequence = (state.sequence + 1) & self.layout.sequence_mask;
                    if state.sequence == 0 {
                        trace!(last_timestamp = last, "sequence exhausted, waiting for the next millisecond");
                        now = self.til_next_millis(last);
                    }
                } else {
                    state.sequence = 0;
                }
            }
            None => state.sequence = 0,
        }

        state.last_timestamp = Some(now);
        self.compose(now, state.sequence)
    }

    #[cold]
    #[inline(never)]
    fn wait_for_clock(&self, mut now: u64, last: u64) -> u64 {
        // Sleeps are not exact, so measure again after every wake-up.
        while now < last {
            let wait_ms = last - now;
            warn!(last_timestamp = last, now, wait_ms, "clock moved backwards, waiting for it to catch up");
            self.clock.sleep(Duration::from_millis(wait_ms));
            now = self.clock.now_millis();
        }
        now
    }

    fn til_next_millis(&self, last: u64) -> u64 {
        let mut spins: u32 = 0;
        let mut now = self.clock.now_millis();
        while now <= last {
            spins = spins.wrapping_add(1);
            if spins % SPINS_PER_YIELD == 0 {
                thread::yield_now();
            } else {
                spin_loop();
            }
            now = self.clock.now_millis();
        }
        now
    }

    fn compose(&self, timestamp: u64, sequence: u64) -> u64 {
        // The builder checks the offset fits; the mask keeps bit 63 clear once
        // a long-lived generator runs past the end of its range.
        let offset = timestamp.saturating_sub(self.epoch) & self.layout.timestamp_mask;
        (offset << self.layout.timestamp_shift)
            | (self.datacenter_id << self.layout.datacenter_id_shift)
            | (self.worker_id << self.layout.worker_id_shift)
            | sequence
    }
}

/// Decoding is a pure function of the given ID and the generator's layout.
impl<C> IdGenerator<C> {
    /// Extracts the worker (machine) ID.
    pub fn decode_worker_id(&self, id: u64) -> u64 {
        (id >> self.layout.worker_id_shift) & self.layout.max_worker_id
    }

    pub fn decode_datacenter_id(&self, id: u64) -> u64 {
        (id >> self.layout.datacenter_id_shift) & self.layout.max_datacenter_id
    }

    /// Returns the embedded timestamp in milliseconds since the Unix epoch.
    ///
    /// IDs not produced by this layout may carry an offset that overflows
    /// when the epoch is added back; the result saturates at `u64::MAX`.
    pub fn decode_timestamp(&self, id: u64) -> u64 {
        (id >> self.layout.timestamp_shift).saturating_add(self.epoch)
    }

    pub fn decode_sequence(&self, id: u64) -> u64 {
        id & self.layout.sequence_mask
    }

    /// Splits an ID into all of its fields at once.
    ///
    /// ```
    /// use snowflake::IdGenerator;
    ///
    /// let generator = IdGenerator::new(4, 2).unwrap();
    /// let parts = generator.decompose(generator.next_id());
    /// assert_eq!((parts.worker_id, parts.datacenter_id), (4, 2));
    /// ```
    pub fn decompose(&self, id: u64) -> SnowflakeParts {
        SnowflakeParts {
            timestamp: self.decode_timestamp(id),
            datacenter_id: self.decode_datacenter_id(id),
            worker_id: self.decode_worker_id(id),
            sequence: self.decode_sequence(id),
        }
    }

    pub fn worker_id(&self) -> u64 {
        self.worker_id
    }

    pub fn datacenter_id(&self) -> u64 {
        self.datacenter_id
    }

    /// Milliseconds since the Unix epoch that timestamp zero stands for.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn worker_id_bits(&self) -> u64 {
        self.layout.worker_id_bits
    }

    pub fn datacenter_id_bits(&self) -> u64 {
        self.layout.datacenter_id_bits
    }

    pub fn sequence_bits(&self) -> u64 {
        self.layout.sequence_bits
    }

    /// Bits left for the timestamp, 41 with the default layout.
    pub fn timestamp_bits(&self) -> u64 {
        MAX_LAYOUT_BITS - self.layout.timestamp_shift
    }

    /// Where the worker ID starts; equal to the sequence bit width.
    pub fn worker_id_shift(&self) -> u64 {
        self.layout.worker_id_shift
    }

    pub fn datacenter_id_shift(&self) -> u64 {
        self.layout.datacenter_id_shift
    }

    /// Sum of the sequence, worker ID and datacenter ID widths.
    pub fn timestamp_shift(&self) -> u64 {
        self.layout.timestamp_shift
    }

    pub fn max_worker_id(&self) -> u64 {
        self.layout.max_worker_id
    }

    pub fn max_datacenter_id(&self) -> u64 {
        self.layout.max_datacenter_id
    }

    /// `2^sequence_bits - 1`, the last sequence number within a millisecond.
    pub fn sequence_mask(&self) -> u64 {
        self.layout.sequence_mask
    }
}
