// libnfc/src/transport/mock.rs

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::transport::traits::{Transport, TransportOption};
use crate::types::{BitFrame, Target};
use crate::utils::{AbortHandle, Timeout};
use crate::{Error, Result};

#[derive(Debug, Default)]
struct MockState {
    responses: VecDeque<Result<BitFrame>>,
    sent: Vec<BitFrame>,
    /// Options in force when each entry of `sent` went out
    sent_options: Vec<HashMap<TransportOption, bool>>,
    target_frames: VecDeque<Result<Vec<u8>>>,
    target_sent: Vec<Vec<u8>>,
    target_inits: Vec<Target>,
    options: HashMap<TransportOption, bool>,
    idle_calls: usize,
}

/// Mock transport for unit tests. It records sent frames and returns queued
/// responses.
///
/// Clones share the same queues, so a test keeps one clone to seed and
/// inspect while the other is moved into a `Device`. With an empty queue a
/// bounded call fails with `Timeout` right away and a `Timeout::Forever`
/// call blocks until aborted.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    abort: AbortHandle,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue a whole-byte answer for the next initiator exchange.
    pub fn push_response(&self, resp: impl Into<Vec<u8>>) {
        self.state()
            .responses
            .push_back(Ok(BitFrame::from_bytes(resp)));
    }

    /// Queue a partial-byte answer (ATQA, 4-bit ACK, ...).
    pub fn push_bits(&self, frame: BitFrame) {
        self.state().responses.push_back(Ok(frame));
    }

    pub fn push_error(&self, err: Error) {
        self.state().responses.push_back(Err(err));
    }

    /// Queue a frame delivered to `target_init` / `target_receive_bytes`.
    pub fn push_target_frame(&self, frame: impl Into<Vec<u8>>) {
        self.state().target_frames.push_back(Ok(frame.into()));
    }

    pub fn push_target_error(&self, err: Error) {
        self.state().target_frames.push_back(Err(err));
    }

    /// Bytes of every initiator frame sent so far.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.state()
            .sent
            .iter()
            .map(|f| f.bytes().to_vec())
            .collect()
    }

    pub fn sent_frames(&self) -> Vec<BitFrame> {
        self.state().sent.clone()
    }

    /// Frames sent back to an initiator while in target mode.
    pub fn target_sent(&self) -> Vec<Vec<u8>> {
        self.state().target_sent.clone()
    }

    pub fn target_inits(&self) -> Vec<Target> {
        self.state().target_inits.clone()
    }

    /// Last value set for `option`, if it was ever configured.
    pub fn option(&self, option: TransportOption) -> Option<bool> {
        self.state().options.get(&option).copied()
    }

    pub fn idle_calls(&self) -> usize {
        self.state().idle_calls
    }

    /// Value `option` had when the `index`-th frame was sent.
    pub fn option_at_send(&self, index: usize, option: TransportOption) -> Option<bool> {
        self.state()
            .sent_options
            .get(index)
            .and_then(|o| o.get(&option).copied())
    }

    pub fn pending_responses(&self) -> usize {
        self.state().responses.len()
    }

    fn record(&self, frame: BitFrame) {
        let mut state = self.state();
        let options = state.options.clone();
        state.sent.push(frame);
        state.sent_options.push(options);
    }

    fn next_response(&self, timeout: Timeout) -> Result<BitFrame> {
        self.abort.check()?;
        let next = self.state().responses.pop_front();
        match next {
            Some(r) => r,
            None => self.wait_empty(timeout),
        }
    }

    fn next_target_frame(&self, timeout: Timeout) -> Result<Vec<u8>> {
        self.abort.check()?;
        let next = self.state().target_frames.pop_front();
        match next {
            Some(r) => r,
            None => self.wait_empty(timeout),
        }
    }

    fn wait_empty<T>(&self, timeout: Timeout) -> Result<T> {
        match timeout {
            Timeout::Forever => self.abort.block_until(timeout, || None),
            _ => Err(Error::Timeout),
        }
    }
}

impl Transport for MockTransport {
    fn transceive_bits(&mut self, tx: &BitFrame, timeout: Timeout) -> Result<BitFrame> {
        self.record(tx.clone());
        self.next_response(timeout)
    }

    fn transceive_bytes(&mut self, tx: &[u8], timeout: Timeout) -> Result<Vec<u8>> {
        self.record(BitFrame::from_bytes(tx));
        self.next_response(timeout).map(BitFrame::into_bytes)
    }

    fn configure(&mut self, option: TransportOption, enabled: bool) -> Result<()> {
        self.state().options.insert(option, enabled);
        Ok(())
    }

    fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    fn target_init(&mut self, target: &Target, timeout: Timeout) -> Result<Vec<u8>> {
        self.state().target_inits.push(target.clone());
        self.next_target_frame(timeout)
    }

    fn target_receive_bytes(&mut self, timeout: Timeout) -> Result<Vec<u8>> {
        self.next_target_frame(timeout)
    }

    fn target_send_bytes(&mut self, tx: &[u8], _timeout: Timeout) -> Result<()> {
        self.abort.check()?;
        self.state().target_sent.push(tx.to_vec());
        Ok(())
    }

    fn idle(&mut self) -> Result<()> {
        self.state().idle_calls += 1;
        Ok(())
    }
}
