//! Reachability of the message form, shared between the Wi-Fi loop and the
//! HTTP server.
//!
//! The Wi-Fi loop publishes where the station is in its bring-up and, once a
//! lease is held, the address the form is served on. The HTTP server only
//! accepts while that address is published.

use core::{
    net::Ipv4Addr,
    sync::atomic::{AtomicU8, AtomicU32, Ordering},
};

pub const RETRY_BACKOFF_MIN_SECS: u64 = 2;
pub const RETRY_BACKOFF_MAX_SECS: u64 = 120;

/// Delay before the next association attempt.
pub fn retry_backoff_secs(consecutive_failures: u32) -> u64 {
    // 2, 4, 8, 16, 32, 64, 120, 120, ...
    let shift = consecutive_failures.min(6);
    RETRY_BACKOFF_MIN_SECS
        .saturating_mul(1u64 << shift)
        .min(RETRY_BACKOFF_MAX_SECS)
}

/// Wi-Fi credentials source.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WifiConfig {
    pub ssid: &'static str,
    pub password: &'static str,
}

impl WifiConfig {
    pub const fn new(ssid: &'static str, password: &'static str) -> Self {
        Self { ssid, password }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum LinkPhase {
    /// Not associated; waiting out a retry delay or not started yet.
    Offline = 0,
    /// Associating with the access point.
    Joining = 1,
    /// Associated, waiting for DHCP.
    AwaitingLease = 2,
    /// Lease held; the form is reachable.
    Serving = 3,
}

impl LinkPhase {
    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::Joining,
            2 => Self::AwaitingLease,
            3 => Self::Serving,
            _ => Self::Offline,
        }
    }
}

/// Lock-free record of the current phase and the form address.
#[derive(Debug)]
pub struct SignLink {
    phase: AtomicU8,
    address: AtomicU32,
}

impl SignLink {
    pub const fn new() -> Self {
        Self {
            phase: AtomicU8::new(LinkPhase::Offline as u8),
            address: AtomicU32::new(0),
        }
    }

    pub fn phase(&self) -> LinkPhase {
        LinkPhase::from_raw(self.phase.load(Ordering::Acquire))
    }

    /// Address the form is served on, only while a lease is held.
    pub fn form_address(&self) -> Option<Ipv4Addr> {
        if self.phase() != LinkPhase::Serving {
            return None;
        }
        Some(Ipv4Addr::from_bits(self.address.load(Ordering::Acquire)))
    }

    pub fn mark_joining(&self) {
        self.set_phase(LinkPhase::Joining);
    }

    pub fn mark_awaiting_lease(&self) {
        self.set_phase(LinkPhase::AwaitingLease);
    }

    /// Publishes `address`. Returns `true` when the form just became reachable
    /// or moved to a different address.
    pub fn mark_serving(&self, address: Ipv4Addr) -> bool {
        let previous = self.address.swap(address.to_bits(), Ordering::AcqRel);
        let was_serving = self.set_phase(LinkPhase::Serving) == LinkPhase::Serving;
        !was_serving || previous != address.to_bits()
    }

    /// Returns `true` when the form was reachable until now.
    pub fn mark_offline(&self) -> bool {
        self.set_phase(LinkPhase::Offline) == LinkPhase::Serving
    }

    fn set_phase(&self, next: LinkPhase) -> LinkPhase {
        LinkPhase::from_raw(self.phase.swap(next as u8, Ordering::AcqRel))
    }
}

impl Default for SignLink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEASE: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 40);

    #[test]
    fn form_address_is_published_only_while_serving() {
        let link = SignLink::new();
        assert_eq!(link.form_address(), None);

        link.mark_joining();
        assert_eq!(link.phase(), LinkPhase::Joining);
        assert_eq!(link.form_address(), None);

        link.mark_awaiting_lease();
        assert_eq!(link.form_address(), None);

        assert!(link.mark_serving(LEASE));
        assert_eq!(link.form_address(), Some(LEASE));

        assert!(link.mark_offline());
        assert_eq!(link.phase(), LinkPhase::Offline);
        assert_eq!(link.form_address(), None);
    }

    #[test]
    fn serving_reports_only_new_reachability() {
        let link = SignLink::new();
        assert!(link.mark_serving(LEASE));
        assert!(!link.mark_serving(LEASE));
        assert!(link.mark_serving(Ipv4Addr::new(192, 168, 1, 41)));
    }

    #[test]
    fn going_offline_reports_lost_form_once() {
        let link = SignLink::new();
        link.mark_joining();
        assert!(!link.mark_offline());

        link.mark_serving(LEASE);
        assert!(link.mark_offline());
        assert!(!link.mark_offline());
    }

    #[test]
    fn backoff_doubles_up_to_cap() {
        let delays: [u64; 8] = core::array::from_fn(|n| retry_backoff_secs(n as u32));
        assert_eq!(delays, [2, 4, 8, 16, 32, 64, 120, 120]);
        assert_eq!(retry_backoff_secs(u32::MAX), RETRY_BACKOFF_MAX_SECS);
    }
}
