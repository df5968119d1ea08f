use {
    crate::{
        clock::{Clock, SystemClock},
        IdGenerator, Layout, SnowflakeError, DEFAULT_DATACENTER_ID_BITS, DEFAULT_SEQUENCE_BITS,
        DEFAULT_WORKER_ID_BITS, MAX_LAYOUT_BITS, TWEPOCH,
    },
    tracing::debug,
};

/// Configures and validates an [`IdGenerator`].
///
/// ```
/// use snowflake::IdGenerator;
///
/// let generator = IdGenerator::builder()
///     .with_datacenter_id(3)
///     .with_worker_id(7)
///     .with_epoch(1609459200000) // 2021-01-01 00:00:00.000 UTC
///     .build()
///     .unwrap();
/// assert_eq!(generator.worker_id(), 7);
/// ```
#[derive(Debug, Clone)]
pub struct IdGeneratorBuilder<C = SystemClock> {
    worker_id: u64,
    datacenter_id: u64,
    initial_sequence: u64,
    worker_id_bits: u64,
    datacenter_id_bits: u64,
    sequence_bits: u64,
    epoch: Option<u64>,
    clock: C,
}

impl Default for IdGeneratorBuilder<SystemClock> {
    fn default() -> Self {
        Self {
            worker_id: 0,
            datacenter_id: 0,
            initial_sequence: 0,
            worker_id_bits: DEFAULT_WORKER_ID_BITS,
            datacenter_id_bits: DEFAULT_DATACENTER_ID_BITS,
            sequence_bits: DEFAULT_SEQUENCE_BITS,
            epoch: None,
            clock: SystemClock,
        }
    }
}

impl<C: Clock> IdGeneratorBuilder<C> {
    pub fn with_worker_id(mut self, worker_id: u64) -> Self {
        self.worker_id = worker_id;
        self
    }

    pub fn with_datacenter_id(mut self, datacenter_id: u64) -> Self {
        self.datacenter_id = datacenter_id;
        self
    }

    /// Seeds the sequence counter; must not exceed `2^sequence_bits - 1`.
    pub fn with_initial_sequence(mut self, initial_sequence: u64) -> Self {
        self.initial_sequence = initial_sequence;
        self
    }

    pub fn with_worker_id_bits(mut self, worker_id_bits: u64) -> Self {
        self.worker_id_bits = worker_id_bits;
        self
    }

    pub fn with_datacenter_id_bits(mut self, datacenter_id_bits: u64) -> Self {
        self.datacenter_id_bits = datacenter_id_bits;
        self
    }

    pub fn with_sequence_bits(mut self, sequence_bits: u64) -> Self {
        self.sequence_bits = sequence_bits;
        self
    }

    /// Sets the custom epoch in milliseconds since the Unix epoch. It must not
    /// lie in the future of the configured clock, and the time elapsed since
    /// it must fit the timestamp bits the layout leaves over.
    pub fn with_epoch(mut self, epoch: u64) -> Self {
        self.epoch = Some(epoch);
        self
    }

    /// Replaces the time source, e.g. with a simulated clock in tests.
    pub fn with_clock<T: Clock>(self, clock: T) -> IdGeneratorBuilder<T> {
        IdGeneratorBuilder {
            worker_id: self.worker_id,
            datacenter_id: self.datacenter_id,
            initial_sequence: self.initial_sequence,
            worker_id_bits: self.worker_id_bits,
            datacenter_id_bits: self.datacenter_id_bits,
            sequence_bits: self.sequence_bits,
            epoch: self.epoch,
            clock,
        }
    }

    /// Validates the configuration against the clock's current time.
    ///
    /// # Errors
    ///
    /// [`SnowflakeError::ConfigurationError`] for a layout wider than 63 bits,
    /// a layout whose timestamp bits cannot hold the time since the epoch, or
    /// an ID or initial sequence that does not fit its width.
    /// [`SnowflakeError::InvalidEpoch`] for an epoch in the future.
    pub fn build(self) -> Result<IdGenerator<C>, SnowflakeError> {
        let total_bits = self
            .worker_id_bits
            .checked_add(self.datacenter_id_bits)
            .and_then(|bits| bits.checked_add(self.sequence_bits))
            .filter(|bits| *bits <= MAX_LAYOUT_BITS)
            .ok_or_else(|| {
                SnowflakeError::ConfigurationError(format!(
                    "invalid layout: worker id bits(={}) + datacenter id bits(={}) + sequence bits(={}) \
                     must not exceed {MAX_LAYOUT_BITS}",
                    self.worker_id_bits, self.datacenter_id_bits, self.sequence_bits,
                ))
            })?;

        let layout = Layout {
            worker_id_bits: self.worker_id_bits,
            datacenter_id_bits: self.datacenter_id_bits,
            sequence_bits: self.sequence_bits,
            worker_id_shift: self.sequence_bits,
            datacenter_id_shift: self.sequence_bits + self.worker_id_bits,
            timestamp_shift: total_bits,
            timestamp_mask: low_bits(MAX_LAYOUT_BITS - total_bits),
            max_worker_id: low_bits(self.worker_id_bits),
            max_datacenter_id: low_bits(self.datacenter_id_bits),
            sequence_mask: low_bits(self.sequence_bits),
        };

        if self.worker_id > layout.max_worker_id {
            return Err(SnowflakeError::ConfigurationError(format!(
                "invalid worker id(={}), expected worker id ∈ [0,{}]",
                self.worker_id, layout.max_worker_id,
            )));
        }

        if self.datacenter_id > layout.max_datacenter_id {
            return Err(SnowflakeError::ConfigurationError(format!(
                "invalid datacenter id(={}), expected datacenter id ∈ [0,{}]",
                self.datacenter_id, layout.max_datacenter_id,
            )));
        }

        if self.initial_sequence > layout.sequence_mask {
            return Err(SnowflakeError::ConfigurationError(format!(
                "invalid initial sequence(={}), expected sequence ∈ [0,{}]",
                self.initial_sequence, layout.sequence_mask,
            )));
        }

        let now = self.clock.now_millis();
        let epoch = match self.epoch {
            Some(epoch) if epoch > now => return Err(SnowflakeError::InvalidEpoch),
            Some(epoch) => epoch,
            None => TWEPOCH,
        };

        let timestamp_bits = MAX_LAYOUT_BITS - total_bits;
        let offset = now.saturating_sub(epoch);
        if offset > layout.timestamp_mask {
            return Err(SnowflakeError::ConfigurationError(format!(
                "invalid layout: timestamp bits(={timestamp_bits}) cannot hold the current offset(={offset}ms) \
                 from epoch(={epoch}), expected offset ∈ [0,{}]",
                layout.timestamp_mask,
            )));
        }

        debug!(
            worker_id = self.worker_id,
            datacenter_id = self.datacenter_id,
            worker_id_bits = layout.worker_id_bits,
            datacenter_id_bits = layout.datacenter_id_bits,
            sequence_bits = layout.sequence_bits,
            epoch,
            "built snowflake id generator"
        );

        Ok(IdGenerator::from_parts(
            layout,
            epoch,
            self.worker_id,
            self.datacenter_id,
            self.initial_sequence,
            self.clock,
        ))
    }
}

/// `2^bits - 1`, saturating at `u64::MAX` for 64 bits.
fn low_bits(bits: u64) -> u64 {
    1u64.checked_shl(bits as u32).map_or(u64::MAX, |v| v - 1)
}
