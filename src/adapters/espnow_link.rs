//! ESP-NOW link adapter.
//!
//! Implements [`LinkPort`] for a single fixed peer. Received frames arrive
//! on the WiFi task through the ESP-NOW receive callback and are pushed
//! into a static bounded `embassy-sync` channel; the node loop drains it
//! with [`LinkPort::try_recv`].
//!
//! ```text
//! ┌──────────────┐   Frame    ┌──────────────┐
//! │  WiFi task   │──────────▶│  Node loop   │
//! │ (recv cb)    │  INBOX(8)  │ (try_recv)   │
//! └──────────────┘            └──────────────┘
//! ```
//!
//! When the inbox is full the newest frame is dropped with a warning.
//! Frames longer than [`MAX_FRAME_LEN`] are rejected on both paths.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{info, warn};

use crate::app::ports::{LinkError, LinkPort};
use crate::protocol::{Frame, MAX_FRAME_LEN};

#[cfg(target_os = "espidf")]
use esp_idf_svc::espnow::{EspNow, PeerInfo};

/// Depth of the inbound frame queue.
const INBOX_DEPTH: usize = 8;

/// Frames received from the peer, waiting for the node loop.
static INBOX: Channel<CriticalSectionRawMutex, Frame, INBOX_DEPTH> = Channel::new();

/// Queue one received frame. Called from the radio callback.
fn enqueue(data: &[u8]) {
    let Ok(frame) = Frame::from_slice(data) else {
        warn!("ESP-NOW: dropping oversized frame ({} bytes)", data.len());
        return;
    };
    if INBOX.try_send(frame).is_err() {
        warn!("ESP-NOW: inbox full, dropping frame");
    }
}

/// Format a MAC as `AA:BB:CC:DD:EE:FF`.
pub fn format_mac(mac: &[u8; 6]) -> heapless::String<17> {
    use core::fmt::Write as _;

    let mut s = heapless::String::new();
    for (i, b) in mac.iter().enumerate() {
        if i > 0 {
            let _ = s.push(':');
        }
        let _ = write!(s, "{:02X}", b);
    }
    s
}

pub struct EspNowLink {
    peer: [u8; 6],
    #[cfg(target_os = "espidf")]
    espnow: EspNow<'static>,
    #[cfg(not(target_os = "espidf"))]
    sent: std::vec::Vec<Frame>,
    #[cfg(not(target_os = "espidf"))]
    fail_sends: bool,
}

impl EspNowLink {
    /// Take the ESP-NOW driver, register `peer` and install the receive
    /// callback. The WiFi radio must already be started.
    #[cfg(target_os = "espidf")]
    pub fn new(peer: [u8; 6]) -> anyhow::Result<Self> {
        let espnow = EspNow::take()?;
        espnow.add_peer(PeerInfo {
            peer_addr: peer,
            channel: 0,
            encrypt: false,
            ..Default::default()
        })?;
        espnow.register_recv_cb(|_info, data: &[u8]| enqueue(data))?;
        info!("ESP-NOW: peer {} registered", format_mac(&peer));
        Ok(Self { peer, espnow })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(peer: [u8; 6]) -> anyhow::Result<Self> {
        info!("ESP-NOW(sim): peer {} registered", format_mac(&peer));
        Ok(Self {
            peer,
            sent: std::vec::Vec::new(),
            fail_sends: false,
        })
    }

    pub fn peer(&self) -> &[u8; 6] {
        &self.peer
    }

    #[cfg(target_os = "espidf")]
    fn platform_send(&mut self, frame: &[u8]) -> Result<(), LinkError> {
        self.espnow.send(self.peer, frame).map_err(|e| {
            warn!("ESP-NOW: send error: {}", e);
            LinkError::SendFailed
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_send(&mut self, frame: &[u8]) -> Result<(), LinkError> {
        if self.fail_sends {
            return Err(LinkError::SendFailed);
        }
        self.sent
            .push(Frame::from_slice(frame).map_err(|_| LinkError::TooLong)?);
        Ok(())
    }

    /// Simulation: frames handed to the radio so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_sent(&self) -> &[Frame] {
        &self.sent
    }

    /// Simulation: make every subsequent send fail.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_fail_sends(&mut self, fail: bool) {
        self.fail_sends = fail;
    }
}

/// Simulation: deliver `data` as if it had arrived over the air.
#[cfg(not(target_os = "espidf"))]
pub fn sim_inject(data: &[u8]) {
    enqueue(data);
}

/// Simulation: discard everything queued in the inbox.
#[cfg(not(target_os = "espidf"))]
pub fn sim_drain() {
    while INBOX.try_receive().is_ok() {}
}

impl LinkPort for EspNowLink {
    fn send(&mut self, frame: &[u8]) -> Result<(), LinkError> {
        if frame.len() > MAX_FRAME_LEN {
            return Err(LinkError::TooLong);
        }
        self.platform_send(frame)
    }

    fn try_recv(&mut self) -> Option<Frame> {
        INBOX.try_receive().ok()
    }
}
