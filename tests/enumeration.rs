//! End-to-end enumeration tests against an in-process scripted bus.
//!
//! The fake gateway models a segment of addressed devices plus an
//! optional learn-mode device, and answers every request with either a
//! discovery reply or the timeout sentinel, exactly like the real one.

use async_trait::async_trait;

use buswire::enumerator::LearnOutcome;
use buswire::protocol::{
    DeviceMessage, DiscoveryReply, TimeoutIndicator, CLASS_ASSIGN, CLASS_DISCOVERY,
};
use buswire::{Bus, BuswireError, Enumerator, SlotState, Transport};

/// An addressed device sitting on the fake bus.
struct Device {
    address: u8,
    size: u8,
    model: [u8; 4],
    /// Respond to probes with an address other than the probed one,
    /// simulating a broken gateway.
    wrong_echo: bool,
}

/// A device waiting in learn mode at the broadcast address.
struct LearnDevice {
    size: u8,
    model: [u8; 4],
    /// Number of assignment attempts to answer with address 0 before
    /// actually adopting an address.
    ambiguous_replies: u8,
}

/// Scripted gateway: parses each request and answers like a real bus.
struct FakeBus {
    devices: Vec<Device>,
    learn: Option<LearnDevice>,
}

impl FakeBus {
    fn new(devices: Vec<Device>) -> Self {
        Self {
            devices,
            learn: None,
        }
    }

    fn with_learn(mut self, learn: LearnDevice) -> Self {
        self.learn = Some(learn);
        self
    }

    fn timeout_frame() -> Vec<u8> {
        TimeoutIndicator.to_message().serialize().to_vec()
    }

    fn reply_frame(address: u8, size: u8, model: [u8; 4]) -> Vec<u8> {
        DiscoveryReply {
            reported_address: address,
            reported_size: size,
            model,
        }
        .to_message()
        .serialize()
        .to_vec()
    }

    fn handle(&mut self, request: DeviceMessage) -> Vec<u8> {
        assert!(request.is_request, "gateway only accepts requests");

        match request.class_code {
            CLASS_DISCOVERY => {
                if request.address == 0 {
                    match &self.learn {
                        Some(learn) => Self::reply_frame(0, learn.size, learn.model),
                        None => Self::timeout_frame(),
                    }
                } else {
                    match self.devices.iter().find(|d| d.address == request.address) {
                        Some(device) => {
                            let echoed = if device.wrong_echo {
                                device.address.wrapping_add(1)
                            } else {
                                device.address
                            };
                            Self::reply_frame(echoed, device.size, device.model)
                        }
                        None => Self::timeout_frame(),
                    }
                }
            }
            CLASS_ASSIGN => match &mut self.learn {
                Some(learn) if learn.ambiguous_replies > 0 => {
                    learn.ambiguous_replies -= 1;
                    Self::reply_frame(0, learn.size, learn.model)
                }
                Some(learn) => {
                    let adopted = Device {
                        address: request.address,
                        size: learn.size,
                        model: learn.model,
                        wrong_echo: false,
                    };
                    let frame = Self::reply_frame(adopted.address, adopted.size, adopted.model);
                    self.devices.push(adopted);
                    self.learn = None;
                    frame
                }
                None => Self::timeout_frame(),
            },
            _ => Self::timeout_frame(),
        }
    }
}

#[async_trait]
impl Transport for FakeBus {
    async fn request(&mut self, frame: &[u8]) -> std::io::Result<Vec<u8>> {
        let request = DeviceMessage::parse(frame).expect("gateway received a malformed frame");
        Ok(self.handle(request))
    }
}

fn device(address: u8, size: u8) -> Device {
    Device {
        address,
        size,
        model: [0x0A, 0x0B, 0x0C, address],
        wrong_echo: false,
    }
}

#[tokio::test]
async fn test_scan_maps_devices_and_free_space() {
    let bus = FakeBus::new(vec![device(1, 2), device(5, 1)]);
    let mut enumerator = Enumerator::new(Bus::new(bus));

    enumerator.scan().await.unwrap();

    let map = enumerator.map();
    assert_eq!(map.get(1), SlotState::Occupied);
    assert_eq!(map.get(2), SlotState::Occupied);
    assert_eq!(map.get(5), SlotState::Occupied);
    for address in [3u8, 4] {
        assert_eq!(map.get(address), SlotState::Free, "address {address}");
    }
    for address in 6..=254u8 {
        assert_eq!(map.get(address), SlotState::Free, "address {address}");
    }
    // The scan covered everything: nothing left to probe.
    assert_eq!(map.next_unprobed(), None);
}

#[tokio::test]
async fn test_scan_aborts_on_wrong_echo() {
    let mut rogue = device(3, 1);
    rogue.wrong_echo = true;
    let bus = FakeBus::new(vec![rogue]);
    let mut enumerator = Enumerator::new(Bus::new(bus));

    let err = enumerator.scan().await.unwrap_err();
    assert!(matches!(err, BuswireError::Contract(_)));
}

#[tokio::test]
async fn test_learn_step_is_idle_without_learn_device() {
    let bus = FakeBus::new(vec![]);
    let mut enumerator = Enumerator::new(Bus::new(bus));

    enumerator.scan().await.unwrap();
    assert_eq!(enumerator.learn_step().await.unwrap(), LearnOutcome::Idle);
    // Polling again stays idle; nothing in the map moved.
    assert_eq!(enumerator.learn_step().await.unwrap(), LearnOutcome::Idle);
    assert_eq!(enumerator.map().get(1), SlotState::Free);
}

#[tokio::test]
async fn test_learn_device_gets_lowest_free_address() {
    let bus = FakeBus::new(vec![device(1, 3)]).with_learn(LearnDevice {
        size: 1,
        model: [0xDE, 0xAD, 0xBE, 0xEF],
        ambiguous_replies: 0,
    });
    let mut enumerator = Enumerator::new(Bus::new(bus));

    enumerator.scan().await.unwrap();

    // Addresses 1-3 are taken, so the lowest fit is 4.
    let outcome = enumerator.learn_step().await.unwrap();
    assert_eq!(
        outcome,
        LearnOutcome::Assigned {
            address: 4,
            size: 1,
            model: [0xDE, 0xAD, 0xBE, 0xEF],
        }
    );
    assert_eq!(enumerator.map().get(4), SlotState::Occupied);

    // The device has left learn mode; the loop goes back to polling.
    assert_eq!(enumerator.learn_step().await.unwrap(), LearnOutcome::Idle);
}

#[tokio::test]
async fn test_ambiguous_assignment_keeps_reservation_and_retries() {
    let bus = FakeBus::new(vec![device(1, 3)]).with_learn(LearnDevice {
        size: 1,
        model: [1, 2, 3, 4],
        ambiguous_replies: 1,
    });
    let mut enumerator = Enumerator::new(Bus::new(bus));

    enumerator.scan().await.unwrap();

    // First attempt: the confirmation echoes address 0, so no success is
    // reported and address 4 stays quarantined.
    assert_eq!(
        enumerator.learn_step().await.unwrap(),
        LearnOutcome::Ambiguous
    );
    assert_eq!(enumerator.map().get(4), SlotState::Occupied);

    // Second attempt must skip the dirty range and land on 5.
    let outcome = enumerator.learn_step().await.unwrap();
    assert!(
        matches!(outcome, LearnOutcome::Assigned { address: 5, .. }),
        "expected assignment at 5, got {outcome:?}"
    );
    assert_eq!(enumerator.map().get(5), SlotState::Occupied);
}

#[tokio::test]
async fn test_assignment_fails_when_no_space_fits() {
    let bus = FakeBus::new(vec![device(1, 254)]).with_learn(LearnDevice {
        size: 1,
        model: [9, 9, 9, 9],
        ambiguous_replies: 0,
    });
    let mut enumerator = Enumerator::new(Bus::new(bus));

    enumerator.scan().await.unwrap();
    let err = enumerator.learn_step().await.unwrap_err();
    assert!(matches!(
        err,
        BuswireError::CapacityExhausted { size: 1 }
    ));
}
