//! In-memory switch fabric

use std::collections::VecDeque;
use std::io;

use crate::protocol::ptp::PtpTimestamp;
use crate::tc::{SwitchFabric, SwitchManagementEntry};

/// A [`SwitchFabric`] with a settable clock and scripted egress timestamps.
///
/// Egress polls consume queued results in order and report "nothing
/// captured" once the queue is empty.
#[derive(Debug, Default)]
pub struct MockSwitch {
    clock: PtpTimestamp,
    clock_error: Option<i32>,
    route_error: Option<i32>,
    egress: VecDeque<Result<Option<PtpTimestamp>, i32>>,
    routes: Vec<(SwitchManagementEntry, u8)>,
    egress_polls: Vec<(u8, u8, u32)>,
}

impl MockSwitch {
    /// A switch whose clock reads `clock`.
    #[must_use]
    pub fn new(clock: PtpTimestamp) -> Self {
        Self {
            clock,
            ..Self::default()
        }
    }

    /// Move the clock.
    pub fn set_clock(&mut self, clock: PtpTimestamp) {
        self.clock = clock;
    }

    /// Make clock reads fail with `errno`.
    pub fn fail_clock_read(&mut self, errno: i32) {
        self.clock_error = Some(errno);
    }

    /// Make route installs fail with `errno`.
    pub fn fail_route(&mut self, errno: i32) {
        self.route_error = Some(errno);
    }

    /// Queue the result of the next egress poll.
    pub fn push_egress(&mut self, ts: Option<PtpTimestamp>) {
        self.egress.push_back(Ok(ts));
    }

    /// Queue a failing egress poll.
    pub fn push_egress_error(&mut self, errno: i32) {
        self.egress.push_back(Err(errno));
    }

    /// Routes installed so far, with their slot.
    #[must_use]
    pub fn routes(&self) -> &[(SwitchManagementEntry, u8)] {
        &self.routes
    }

    /// `(port, ts_regid, attempts)` of every egress poll so far.
    #[must_use]
    pub fn egress_polls(&self) -> &[(u8, u8, u32)] {
        &self.egress_polls
    }
}

impl SwitchFabric for MockSwitch {
    fn clock_time(&mut self) -> io::Result<PtpTimestamp> {
        match self.clock_error {
            Some(errno) => Err(io::Error::from_raw_os_error(errno)),
            None => Ok(self.clock),
        }
    }

    fn set_mgmt_route(&mut self, entry: &SwitchManagementEntry, index: u8) -> io::Result<()> {
        if let Some(errno) = self.route_error {
            return Err(io::Error::from_raw_os_error(errno));
        }
        self.routes.push((*entry, index));
        Ok(())
    }

    fn poll_egress_timestamp(
        &mut self,
        port: u8,
        ts_regid: u8,
        attempts: u32,
    ) -> io::Result<Option<PtpTimestamp>> {
        self.egress_polls.push((port, ts_regid, attempts));
        match self.egress.pop_front() {
            Some(Ok(ts)) => Ok(ts),
            Some(Err(errno)) => Err(io::Error::from_raw_os_error(errno)),
            None => Ok(None),
        }
    }
}
