//! Scripted socket for exercising the timestamping layer without a kernel

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use nix::poll::PollFlags;

use crate::net::{HwTstampConfig, RecvMeta, SocketIo};
use crate::types::Address;

/// A packet the mock hands out on `recv_msg`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockPacket {
    /// Payload bytes.
    pub payload: Vec<u8>,
    /// Raw control buffer, as built by [`ControlBuilder`](super::ControlBuilder).
    pub control: Vec<u8>,
    /// Peer name.
    pub name: Address,
}

impl MockPacket {
    /// A packet with the given payload, no control data and no name.
    #[must_use]
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            ..Self::default()
        }
    }

    /// Attach control data.
    #[must_use]
    pub fn with_control(mut self, control: Vec<u8>) -> Self {
        self.control = control;
        self
    }

    /// Attach a peer name.
    #[must_use]
    pub fn with_name(mut self, name: Address) -> Self {
        self.name = name;
        self
    }
}

/// Socket options whose calls can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOption {
    /// `SO_TIMESTAMPING`
    Timestamping,
    /// `SO_SELECT_ERR_QUEUE`
    SelectErrQueue,
    /// `SO_TIMESTAMPNS`
    TimestampNs,
    /// Reading `IP_TOS`
    GetTos,
    /// Writing `IP_TOS`
    SetTos,
}

#[derive(Debug, Default)]
struct MockState {
    polls: VecDeque<Result<Option<PollFlags>, i32>>,
    recvs: VecDeque<Result<MockPacket, i32>>,
    hwtstamp_replies: VecDeque<Result<HwTstampConfig, i32>>,
    failures: Vec<(MockOption, i32)>,
    send_error: Option<i32>,

    poll_requests: Vec<(PollFlags, Duration)>,
    recv_calls: Vec<bool>,
    sent: Vec<Vec<u8>>,
    hwtstamp_requests: Vec<(String, HwTstampConfig)>,
    timestamping: Option<u32>,
    select_err_queue: Option<bool>,
    timestamp_ns: Option<bool>,
    tos: i32,
}

impl MockState {
    fn failure(&self, option: MockOption) -> Option<io::Error> {
        self.failures
            .iter()
            .find(|(o, _)| *o == option)
            .map(|(_, errno)| io::Error::from_raw_os_error(*errno))
    }
}

/// An in-memory [`SocketIo`].
///
/// Queued poll results, packets and driver replies are consumed in order.
/// With nothing queued, polls report ready, receives fail with `EAGAIN` and
/// the driver grants every `SIOCSHWTSTAMP` request unchanged. Every call is
/// recorded for later inspection.
#[derive(Debug, Default)]
pub struct MockSocket {
    state: RefCell<MockState>,
}

impl MockSocket {
    /// A mock with nothing queued.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a poll result; `None` is a timeout.
    pub fn push_poll(&self, revents: Option<PollFlags>) {
        self.state.borrow_mut().polls.push_back(Ok(revents));
    }

    /// Queue a failing poll.
    pub fn push_poll_error(&self, errno: i32) {
        self.state.borrow_mut().polls.push_back(Err(errno));
    }

    /// Queue a packet.
    pub fn push_recv(&self, packet: MockPacket) {
        self.state.borrow_mut().recvs.push_back(Ok(packet));
    }

    /// Queue a failing receive.
    pub fn push_recv_error(&self, errno: i32) {
        self.state.borrow_mut().recvs.push_back(Err(errno));
    }

    /// Queue what the driver grants for the next `SIOCSHWTSTAMP`.
    pub fn push_hwtstamp_reply(&self, granted: HwTstampConfig) {
        self.state.borrow_mut().hwtstamp_replies.push_back(Ok(granted));
    }

    /// Queue a rejected `SIOCSHWTSTAMP`.
    pub fn push_hwtstamp_error(&self, errno: i32) {
        self.state.borrow_mut().hwtstamp_replies.push_back(Err(errno));
    }

    /// Make every call touching `option` fail with `errno`.
    pub fn fail_option(&self, option: MockOption, errno: i32) {
        self.state.borrow_mut().failures.push((option, errno));
    }

    /// Make every send fail with `errno`.
    pub fn fail_send(&self, errno: i32) {
        self.state.borrow_mut().send_error = Some(errno);
    }

    /// Preset the `IP_TOS` value.
    pub fn set_tos_value(&self, tos: i32) {
        self.state.borrow_mut().tos = tos;
    }

    /// Current `IP_TOS` value.
    #[must_use]
    pub fn tos_value(&self) -> i32 {
        self.state.borrow().tos
    }

    /// Frames sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.state.borrow().sent.clone()
    }

    /// `(events, timeout)` of every poll so far.
    #[must_use]
    pub fn poll_requests(&self) -> Vec<(PollFlags, Duration)> {
        self.state.borrow().poll_requests.clone()
    }

    /// Error-queue flag of every receive so far.
    #[must_use]
    pub fn recv_calls(&self) -> Vec<bool> {
        self.state.borrow().recv_calls.clone()
    }

    /// Every `SIOCSHWTSTAMP` request so far.
    #[must_use]
    pub fn hwtstamp_requests(&self) -> Vec<(String, HwTstampConfig)> {
        self.state.borrow().hwtstamp_requests.clone()
    }

    /// Last `SO_TIMESTAMPING` value set.
    #[must_use]
    pub fn timestamping_flags(&self) -> Option<u32> {
        self.state.borrow().timestamping
    }

    /// Last `SO_SELECT_ERR_QUEUE` value set.
    #[must_use]
    pub fn select_err_queue(&self) -> Option<bool> {
        self.state.borrow().select_err_queue
    }

    /// Last `SO_TIMESTAMPNS` value set.
    #[must_use]
    pub fn timestamp_ns(&self) -> Option<bool> {
        self.state.borrow().timestamp_ns
    }
}

impl SocketIo for MockSocket {
    fn poll(&self, events: PollFlags, timeout: Duration) -> io::Result<Option<PollFlags>> {
        let mut state = self.state.borrow_mut();
        state.poll_requests.push((events, timeout));
        match state.polls.pop_front() {
            Some(Ok(revents)) => Ok(revents),
            Some(Err(errno)) => Err(io::Error::from_raw_os_error(errno)),
            None => Ok(Some(events | PollFlags::POLLERR)),
        }
    }

    fn recv_msg(
        &self,
        buf: &mut [u8],
        control: &mut [u8],
        error_queue: bool,
    ) -> io::Result<RecvMeta> {
        let mut state = self.state.borrow_mut();
        state.recv_calls.push(error_queue);
        let packet = match state.recvs.pop_front() {
            Some(Ok(packet)) => packet,
            Some(Err(errno)) => return Err(io::Error::from_raw_os_error(errno)),
            None => return Err(io::Error::from_raw_os_error(libc::EAGAIN)),
        };

        let len = packet.payload.len().min(buf.len());
        buf[..len].copy_from_slice(&packet.payload[..len]);
        let control_len = packet.control.len().min(control.len());
        control[..control_len].copy_from_slice(&packet.control[..control_len]);

        let mut flags = 0;
        if len < packet.payload.len() {
            flags |= libc::MSG_TRUNC;
        }
        if control_len < packet.control.len() {
            flags |= libc::MSG_CTRUNC;
        }
        Ok(RecvMeta {
            len,
            name: packet.name,
            control_len,
            flags,
        })
    }

    fn send(&self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.borrow_mut();
        if let Some(errno) = state.send_error {
            return Err(io::Error::from_raw_os_error(errno));
        }
        state.sent.push(buf.to_vec());
        Ok(buf.len())
    }

    fn set_timestamping(&self, flags: u32) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        if let Some(e) = state.failure(MockOption::Timestamping) {
            return Err(e);
        }
        state.timestamping = Some(flags);
        Ok(())
    }

    fn set_select_err_queue(&self, enable: bool) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        if let Some(e) = state.failure(MockOption::SelectErrQueue) {
            return Err(e);
        }
        state.select_err_queue = Some(enable);
        Ok(())
    }

    fn set_timestamp_ns(&self, enable: bool) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        if let Some(e) = state.failure(MockOption::TimestampNs) {
            return Err(e);
        }
        state.timestamp_ns = Some(enable);
        Ok(())
    }

    fn tos(&self) -> io::Result<i32> {
        let state = self.state.borrow();
        match state.failure(MockOption::GetTos) {
            Some(e) => Err(e),
            None => Ok(state.tos),
        }
    }

    fn set_tos(&self, tos: i32) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        if let Some(e) = state.failure(MockOption::SetTos) {
            return Err(e);
        }
        state.tos = tos;
        Ok(())
    }

    fn set_hwtstamp(&self, device: &str, config: HwTstampConfig) -> io::Result<HwTstampConfig> {
        let mut state = self.state.borrow_mut();
        state.hwtstamp_requests.push((device.to_string(), config));
        match state.hwtstamp_replies.pop_front() {
            Some(Ok(granted)) => Ok(granted),
            Some(Err(errno)) => Err(io::Error::from_raw_os_error(errno)),
            None => Ok(config),
        }
    }
}
