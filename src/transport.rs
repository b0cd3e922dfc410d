//! Snapshot feed over TCP with reconnect and backoff.
//!
//! The simulator writes one JSON snapshot per line. A worker thread reads
//! lines, parses them and publishes the result on a [`SnapshotChannel`].
//! Connection changes are published as [`LinkEvent`]s. The worker cycles
//! through [`LinkState`]s, backing off exponentially between failed
//! attempts, until its [`FeedWorker`] handle is dropped.

use std::io::{self, BufRead, BufReader, Read};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use bevy::prelude::Resource;
use log::{debug, info, warn};
use thiserror::Error;

use crate::channel::{FeedMessage, LinkEvent, SnapshotChannel};
use crate::snapshot::Snapshot;

/// First delay after a failure.
pub const INITIAL_BACKOFF: Duration = Duration::from_millis(250);
/// Upper bound on the delay between attempts.
pub const MAX_BACKOFF: Duration = Duration::from_secs(8);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const READ_POLL: Duration = Duration::from_millis(100);
const SLEEP_SLICE: Duration = Duration::from_millis(25);
/// Longest feed line accepted. Longer frames are dropped up to their newline.
pub const MAX_FRAME_BYTES: usize = 1 << 20;

/// Errors that end a connection attempt or an established connection.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The address did not resolve or no resolved address accepted.
    #[error("cannot connect to {addr}: {source}")]
    Connect {
        /// Feed address as given.
        addr: String,
        /// Last underlying error.
        source: io::Error,
    },
    /// Reading from an established connection failed.
    #[error("feed read failed: {0}")]
    Read(#[source] io::Error),
    /// The peer closed the connection.
    #[error("feed closed by peer")]
    Closed,
}

/// Doubling delay with an upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    /// Creates a backoff starting at `initial` and capped at `max`.
    #[must_use]
    pub const fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            current: initial,
        }
    }

    /// Delay to wait now; the following call returns twice as much, up to
    /// the cap.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }

    /// Returns to the initial delay.
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(INITIAL_BACKOFF, MAX_BACKOFF)
    }
}

/// Connection state of the feed worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Attempting to connect.
    Connecting,
    /// Reading snapshots.
    Connected,
    /// The last attempt or connection failed.
    Lost,
    /// Waiting before the next attempt.
    Backoff,
}

/// What the worker should do after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recovery {
    /// Time to wait before reconnecting.
    pub delay: Duration,
    /// Whether subscribers have not yet been told the link is down.
    pub announce: bool,
}

/// `Connecting → Connected → Lost → Backoff → Connecting` state machine.
#[derive(Debug, Clone)]
pub struct LinkMachine {
    state: LinkState,
    backoff: Backoff,
    reported_down: bool,
}

impl LinkMachine {
    /// Starts in [`LinkState::Connecting`].
    #[must_use]
    pub const fn new(backoff: Backoff) -> Self {
        Self {
            state: LinkState::Connecting,
            backoff,
            reported_down: false,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> LinkState {
        self.state
    }

    /// Records a successful connection and resets the backoff.
    pub fn connected(&mut self) {
        self.state = LinkState::Connected;
        self.backoff.reset();
        self.reported_down = false;
    }

    /// Records a failure and moves to [`LinkState::Backoff`].
    ///
    /// Only the first failure after a connection, or the very first failed
    /// attempt, asks for an announcement.
    pub fn lost(&mut self) -> Recovery {
        self.state = LinkState::Lost;
        let announce = !self.reported_down;
        self.reported_down = true;
        let delay = self.backoff.next_delay();
        self.state = LinkState::Backoff;
        Recovery { delay, announce }
    }

    /// Leaves [`LinkState::Backoff`] for another attempt.
    pub fn retry(&mut self) {
        if self.state == LinkState::Backoff {
            self.state = LinkState::Connecting;
        }
    }
}

/// Handle to a running feed worker. Dropping it stops and joins the thread.
///
/// Kept as a resource so the worker lives exactly as long as the app.
#[derive(Debug, Resource)]
pub struct FeedWorker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl FeedWorker {
    /// Starts reading `addr` with the default backoff.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread cannot be spawned.
    pub fn spawn(addr: impl Into<String>, channel: SnapshotChannel) -> io::Result<Self> {
        Self::spawn_with(addr, channel, Backoff::default())
    }

    /// Starts reading `addr` with a custom backoff.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread cannot be spawned.
    pub fn spawn_with(
        addr: impl Into<String>,
        channel: SnapshotChannel,
        backoff: Backoff,
    ) -> io::Result<Self> {
        let addr = addr.into();
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("snapshot-feed".to_owned())
            .spawn(move || run(&addr, &channel, &flag, LinkMachine::new(backoff)))?;
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Returns `true` while the worker thread is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for FeedWorker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("snapshot feed worker panicked");
            }
        }
    }
}

fn run(addr: &str, channel: &SnapshotChannel, stop: &AtomicBool, mut machine: LinkMachine) {
    while !stop.load(Ordering::Relaxed) {
        let failure = match connect(addr) {
            Ok(stream) => {
                machine.connected();
                info!("snapshot feed connected to {addr}");
                channel.publish(&FeedMessage::Link(LinkEvent::Available));
                match pump(stream, channel, stop) {
                    Ok(()) => break,
                    Err(err) => err,
                }
            }
            Err(err) => err,
        };
        let recovery = machine.lost();
        if recovery.announce {
            warn!("snapshot feed lost: {failure}");
            channel.publish(&FeedMessage::Link(LinkEvent::Lost {
                reason: failure.to_string(),
            }));
        } else {
            debug!("snapshot feed still down: {failure}");
        }
        sleep_unless_stopped(recovery.delay, stop);
        machine.retry();
    }
    debug!("snapshot feed worker stopped");
}

fn connect(addr: &str) -> Result<TcpStream, TransportError> {
    let fail = |source| TransportError::Connect {
        addr: addr.to_owned(),
        source,
    };
    let mut last = io::Error::new(io::ErrorKind::NotFound, "address resolved to nothing");
    for candidate in addr.to_socket_addrs().map_err(fail)? {
        match TcpStream::connect_timeout(&candidate, CONNECT_TIMEOUT) {
            Ok(stream) => {
                stream.set_read_timeout(Some(READ_POLL)).map_err(fail)?;
                return Ok(stream);
            }
            Err(err) => last = err,
        }
    }
    Err(fail(last))
}

fn pump(stream: TcpStream, channel: &SnapshotChannel, stop: &AtomicBool) -> Result<(), TransportError> {
    let mut reader = BufReader::new(stream);
    let mut line = Vec::new();
    let mut discarding = false;
    loop {
        if stop.load(Ordering::Relaxed) {
            return Ok(());
        }
        let room = u64::try_from(MAX_FRAME_BYTES.saturating_sub(line.len())).unwrap_or(u64::MAX);
        match (&mut reader).take(room).read_until(b'\n', &mut line) {
            Ok(0) => return Err(TransportError::Closed),
            Ok(_) if line.ends_with(b"\n") => {
                if !discarding {
                    handle_line(&line, channel);
                }
                discarding = false;
                line.clear();
            }
            Ok(_) if line.len() >= MAX_FRAME_BYTES => {
                if !discarding {
                    warn!("dropping feed frame longer than {MAX_FRAME_BYTES} bytes");
                }
                discarding = true;
                line.clear();
            }
            Ok(_) => {}
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                ) => {}
            Err(err) => return Err(TransportError::Read(err)),
        }
    }
}

fn handle_line(raw: &[u8], channel: &SnapshotChannel) {
    let Ok(text) = std::str::from_utf8(raw) else {
        warn!("dropping feed line that is not UTF-8");
        return;
    };
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    match Snapshot::parse(text) {
        Ok(snapshot) => {
            channel.publish(&FeedMessage::Snapshot(snapshot));
        }
        Err(err) => warn!("dropping malformed snapshot: {err}"),
    }
}

fn sleep_unless_stopped(delay: Duration, stop: &AtomicBool) {
    let deadline = Instant::now() + delay;
    while !stop.load(Ordering::Relaxed) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep(SLEEP_SLICE.min(deadline - now));
    }
}
