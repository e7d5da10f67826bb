use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

use crate::history::ChartPayload;
use crate::live::ChannelEvent;

/// Everything the dashboard loop reacts to, in arrival order
#[derive(Clone, Debug)]
pub enum DashEvent {
    Key(KeyEvent),
    Resize,
    /// UI frame tick: advances effects.
    Tick,
    /// Fixed-cadence repeat of the active animation.
    RepeatPulse,
    Channel(ChannelEvent),
    ChartReady(ChartPayload),
}

/// Source of dashboard events
pub trait DashEventSource: Send + 'static {
    /// Wait at most `timeout` for the next event.
    fn recv_timeout(&self, timeout: Duration) -> Result<DashEvent, RecvTimeoutError>;
}

/// Channel-backed event source; producers hold clones of [`ChannelEventSource::sender`].
pub struct ChannelEventSource {
    tx: Sender<DashEvent>,
    rx: Receiver<DashEvent>,
}

impl ChannelEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<DashEvent> {
        self.tx.clone()
    }
}

impl Default for ChannelEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DashEventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<DashEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Forward crossterm key and resize events until the receiver goes away.
pub fn spawn_terminal_reader(tx: Sender<DashEvent>) {
    thread::spawn(move || loop {
        let evt = match event::read() {
            Ok(CtEvent::Key(key)) => DashEvent::Key(key),
            Ok(CtEvent::Resize(_, _)) => DashEvent::Resize,
            Ok(_) => continue,
            Err(err) => {
                tracing::error!(%err, "terminal event reader stopped");
                break;
            }
        };
        if tx.send(evt).is_err() {
            break;
        }
    });
}

/// Send `make()` every `interval` until the receiver goes away.
pub fn spawn_interval<F>(tx: Sender<DashEvent>, interval: Duration, make: F)
where
    F: Fn() -> DashEvent + Send + 'static,
{
    thread::spawn(move || loop {
        thread::sleep(interval);
        if tx.send(make()).is_err() {
            break;
        }
    });
}

/// A bare receiver is a source too; tests drive the loop through one.
impl DashEventSource for Receiver<DashEvent> {
    fn recv_timeout(&self, timeout: Duration) -> Result<DashEvent, RecvTimeoutError> {
        Receiver::recv_timeout(self, timeout)
    }
}

/// Pulls events for the dashboard loop, one at a time.
///
/// A quiet source still yields [`DashEvent::Tick`] every `tick_rate`, so
/// effects keep advancing when nothing else happens.
pub struct Runner<E: DashEventSource> {
    source: E,
    tick_rate: Duration,
}

impl<E: DashEventSource> Runner<E> {
    pub fn new(source: E, tick_rate: Duration) -> Self {
        Self { source, tick_rate }
    }

    pub fn step(&self) -> DashEvent {
        // A disconnected source can only mean shutdown; keep ticking until the loop exits.
        self.source
            .recv_timeout(self.tick_rate)
            .unwrap_or(DashEvent::Tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel::<DashEvent>();
        let runner = Runner::new(rx, Duration::from_millis(1));

        match runner.step() {
            DashEvent::Tick => {}
            other => panic!("expected Tick on timeout, got {other:?}"),
        }
    }

    #[test]
    fn step_passes_through_events_in_order() {
        let source = ChannelEventSource::new();
        let tx = source.sender();
        tx.send(DashEvent::Resize).unwrap();
        tx.send(DashEvent::RepeatPulse).unwrap();
        let runner = Runner::new(source, Duration::from_millis(10));

        assert!(matches!(runner.step(), DashEvent::Resize));
        assert!(matches!(runner.step(), DashEvent::RepeatPulse));
    }

    #[test]
    fn interval_thread_delivers_pulses() {
        let source = ChannelEventSource::new();
        spawn_interval(source.sender(), Duration::from_millis(5), || DashEvent::RepeatPulse);

        let ev = source.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(matches!(ev, DashEvent::RepeatPulse));
    }
}
