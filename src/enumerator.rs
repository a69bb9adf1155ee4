//! Bus enumeration and address assignment.
//!
//! Two phases run in sequence over one [`Bus`]:
//!
//! 1. **Scan** — probe every address once, building a map of which
//!    address ranges are claimed by existing devices.
//! 2. **Learn loop** — poll the broadcast address for a device in learn
//!    mode; when one appears, find the lowest free range that fits it and
//!    assign it there.
//!
//! The enumerator owns the map exclusively and issues one exchange at a
//! time, so there is no locking anywhere in this module.

use tracing::{debug, info, warn};

use crate::error::{BuswireError, Result};
use crate::protocol::{hex, DeviceMessage, DiscoveryReply, BROADCAST};
use crate::transport::Transport;
use crate::Bus;

/// Size of the address space. Valid device addresses are `1..=254`;
/// slot 0 is the broadcast/unassigned address and never assignable.
pub const ADDRESS_SLOTS: usize = 255;

/// What is known about one bus address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Not yet probed.
    Unknown,
    /// Probed, nothing there.
    Free,
    /// Claimed by a discovered or assigned device.
    Occupied,
}

/// Sparse occupancy view of the address space.
///
/// Grows monotonically in certainty: slots move from `Unknown` to `Free`
/// or `Occupied` and never back. An unconfirmed assignment leaves its
/// tentatively reserved range `Occupied`; leaking a few addresses is
/// safer than offering the same range twice.
#[derive(Debug, Clone)]
pub struct UsageMap {
    slots: [SlotState; ADDRESS_SLOTS],
}

impl UsageMap {
    /// Fresh map with every probeable address unknown.
    pub fn new() -> Self {
        Self {
            slots: [SlotState::Unknown; ADDRESS_SLOTS],
        }
    }

    /// State of a single address.
    pub fn get(&self, address: u8) -> SlotState {
        self.slots[address as usize]
    }

    /// Lowest address (1 upward) that has not been probed yet.
    pub fn next_unprobed(&self) -> Option<u8> {
        (1..ADDRESS_SLOTS)
            .find(|&i| self.slots[i] == SlotState::Unknown)
            .map(|i| i as u8)
    }

    /// Record that nothing answered at `address`.
    pub fn mark_free(&mut self, address: u8) {
        self.slots[address as usize] = SlotState::Free;
    }

    /// Record a device spanning `size` addresses starting at `base`.
    pub fn claim(&mut self, base: u8, size: u8) {
        let start = base as usize;
        let end = (start + size as usize).min(ADDRESS_SLOTS);
        for slot in &mut self.slots[start..end] {
            *slot = SlotState::Occupied;
        }
    }

    /// First-fit search: the lowest address `i` such that the whole range
    /// `[i, i+size)` is not occupied. `Free` and `Unknown` both qualify
    /// as available.
    pub fn first_fit(&self, size: u8) -> Option<u8> {
        let size = size as usize;
        let upper = 254usize.checked_sub(size)?;
        (1..upper)
            .find(|&i| {
                self.slots[i..i + size]
                    .iter()
                    .all(|s| *s != SlotState::Occupied)
            })
            .map(|i| i as u8)
    }
}

impl Default for UsageMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one learn-loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearnOutcome {
    /// No device is currently in learn mode.
    Idle,
    /// A device was assigned an address.
    Assigned {
        /// Base address the device now occupies.
        address: u8,
        /// Number of consecutive addresses it spans.
        size: u8,
        /// Its model identifier.
        model: [u8; 4],
    },
    /// The device did not confirm the new address. Its tentative range
    /// stays reserved; the caller should simply try again.
    Ambiguous,
}

/// Stateful enumeration driver for one bus.
pub struct Enumerator<T: Transport> {
    bus: Bus<T>,
    map: UsageMap,
    learn_prompted: bool,
}

impl<T: Transport> Enumerator<T> {
    /// Create an enumerator over a connected bus.
    pub fn new(bus: Bus<T>) -> Self {
        Self {
            bus,
            map: UsageMap::new(),
            learn_prompted: false,
        }
    }

    /// Current occupancy view.
    pub fn map(&self) -> &UsageMap {
        &self.map
    }

    /// Phase A: probe every address once and record what answered.
    ///
    /// Probes the lowest unprobed address; a bus timeout marks it free,
    /// a discovery reply claims the whole reported range. Terminates once
    /// every address in `1..=254` is accounted for.
    ///
    /// # Errors
    ///
    /// A reply that does not echo the probed address, or that reports a
    /// zero size, is a fatal [`BuswireError::Contract`]. Transport and
    /// unexpected parse failures abort the scan unchanged.
    pub async fn scan(&mut self) -> Result<()> {
        info!("scanning the bus for devices with addresses");

        while let Some(address) = self.map.next_unprobed() {
            let probe = DeviceMessage::discovery_request(address);
            match self.bus.exchange::<DiscoveryReply>(&probe).await {
                Err(BuswireError::Timeout) => {
                    debug!(address, "no device");
                    self.map.mark_free(address);
                }
                Err(other) => return Err(other),
                Ok(reply) => {
                    if reply.reported_address != address {
                        return Err(BuswireError::Contract(format!(
                            "probe of address {address} answered by address {}",
                            reply.reported_address
                        )));
                    }
                    if reply.reported_size == 0 {
                        return Err(BuswireError::Contract(format!(
                            "device at address {address} reports size 0"
                        )));
                    }
                    info!(
                        "discovered at {}: device sized {}, model {}",
                        address,
                        reply.reported_size,
                        hex(&reply.model)
                    );
                    self.map.claim(address, reply.reported_size);
                }
            }
        }

        Ok(())
    }

    /// Phase B, one iteration: look for a learn-mode device and try to
    /// assign it the lowest free range that fits.
    ///
    /// The range is reserved in the map *before* the assignment command
    /// goes out, so a device showing up mid-flight can never be offered
    /// the same space. A confirmation echoing address 0 means the device
    /// did not adopt the address; the reservation is kept and
    /// [`LearnOutcome::Ambiguous`] returned.
    ///
    /// # Errors
    ///
    /// No fitting range is fatal [`BuswireError::CapacityExhausted`]; a
    /// confirmation naming an address that was never offered is fatal
    /// [`BuswireError::Contract`].
    pub async fn learn_step(&mut self) -> Result<LearnOutcome> {
        let probe = DeviceMessage::discovery_request(BROADCAST);
        let announce = match self.bus.exchange::<DiscoveryReply>(&probe).await {
            Err(BuswireError::Timeout) => return Ok(LearnOutcome::Idle),
            Err(other) => return Err(other),
            Ok(reply) => reply,
        };

        let size = announce.reported_size;
        info!(
            "a device is available in learn mode (model {}, size {})",
            hex(&announce.model),
            size
        );

        let base = self
            .map
            .first_fit(size)
            .ok_or(BuswireError::CapacityExhausted { size })?;

        // Optimistic reservation: hold the range before the two-message
        // assignment round trip completes.
        self.map.claim(base, size);

        let confirm = self
            .bus
            .exchange::<DiscoveryReply>(&DeviceMessage::assign_command(base))
            .await?;

        if confirm.reported_address == 0 {
            warn!(
                "assigning address {base} may not have worked, keeping the range reserved and retrying"
            );
            return Ok(LearnOutcome::Ambiguous);
        }
        if confirm.reported_address != base {
            return Err(BuswireError::Contract(format!(
                "assignment of address {base} confirmed as {}",
                confirm.reported_address
            )));
        }

        Ok(LearnOutcome::Assigned {
            address: base,
            size,
            model: announce.model,
        })
    }

    /// Full enumeration: scan, then poll for learn-mode devices until the
    /// process is stopped externally.
    pub async fn run(&mut self) -> Result<()> {
        self.scan().await?;
        info!("bus scan completed");

        loop {
            match self.learn_step().await? {
                LearnOutcome::Idle => {
                    if !self.learn_prompted {
                        info!("you may now put a device into learn mode to automatically assign an address");
                        self.learn_prompted = true;
                    }
                }
                LearnOutcome::Assigned { address, .. } => {
                    info!(
                        "the device was assigned bus address {address}; you may now put a further device into learn mode"
                    );
                }
                LearnOutcome::Ambiguous => {}
            }
        }
    }
}
