//! A concrete, in-process realization of the "typed send/receive endpoint
//! with timeout" transport contract from `spec.md` §6. The real transport
//! between readout units and this module is an out-of-scope external
//! collaborator; this bounded channel (backed by `crossbeam-channel`,
//! matching the teacher workspace's dependency on it for exactly this kind
//! of in-process multi-producer/multi-consumer queue) is what tests and the
//! demo harness wire up in its place.
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("send timed out")]
pub struct SendTimeout;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RecvTimeout {
    #[error("receive timed out")]
    Timeout,
    #[error("all senders have been dropped")]
    Disconnected,
}

/// A bounded send endpoint for messages of type `T`.
pub trait EndpointSender<T>: Send {
    /// Attempt to send `msg`, waiting up to `timeout` for room in the queue.
    fn send_timeout(&self, msg: T, timeout: Duration) -> Result<(), SendTimeout>;
}

/// A bounded receive endpoint for messages of type `T`.
pub trait EndpointReceiver<T>: Send {
    /// Attempt to receive one message, waiting up to `timeout`.
    fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeout>;

    /// Non-blocking: drain and discard every message currently queued. Used
    /// by every worker's start-of-run pre-drain (`spec.md` §4.1, §4.2) to
    /// discard residue from a previous run.
    fn drain(&self) {
        while self.recv_timeout(Duration::from_millis(0)).is_ok() {}
    }
}

#[derive(Clone)]
pub struct ChannelSender<T>(crossbeam_channel::Sender<T>);

#[derive(Clone)]
pub struct ChannelReceiver<T>(crossbeam_channel::Receiver<T>);

/// Construct a bounded channel pair implementing `EndpointSender`/
/// `EndpointReceiver`.
pub fn bounded<T: Send>(capacity: usize) -> (ChannelSender<T>, ChannelReceiver<T>) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (ChannelSender(tx), ChannelReceiver(rx))
}

impl<T: Send> EndpointSender<T> for ChannelSender<T> {
    fn send_timeout(&self, msg: T, timeout: Duration) -> Result<(), SendTimeout> {
        self.0.send_timeout(msg, timeout).map_err(|_| SendTimeout)
    }
}

impl<T: Send> EndpointReceiver<T> for ChannelReceiver<T> {
    fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeout> {
        self.0.recv_timeout(timeout).map_err(|e| match e {
            crossbeam_channel::RecvTimeoutError::Timeout => RecvTimeout::Timeout,
            crossbeam_channel::RecvTimeoutError::Disconnected => RecvTimeout::Disconnected,
        })
    }
}
