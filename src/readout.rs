use std::fmt;
use tokio::sync::watch;

use crate::speed::format_speed;
use crate::time_format::TimeFormatter;

/// Snapshot of what the status display shows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readout {
    pub start: f64,
    pub end: f64,
    /// Last sampled playback position
    pub position: f64,
    pub speed: f64,
    formatter: TimeFormatter,
}

impl Readout {
    pub fn new(formatter: TimeFormatter, start: f64, end: f64, speed: f64) -> Self {
        Self {
            start,
            end,
            position: 0.0,
            speed,
            formatter,
        }
    }

    /// Formatted loop start, as shown next to the start controls
    pub fn start_label(&self) -> String {
        self.formatter.format(self.start)
    }

    /// Formatted loop end, as shown next to the end controls
    pub fn end_label(&self) -> String {
        self.formatter.format(self.end)
    }

    pub fn position_label(&self) -> String {
        self.formatter.format(self.position)
    }
}

impl fmt::Display for Readout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Loop: {} → {} | Now: {} | Speed: {}",
            self.start_label(),
            self.end_label(),
            self.position_label(),
            format_speed(self.speed)
        )
    }
}

/// Publishes the latest readout to any number of observers
#[derive(Debug)]
pub struct ReadoutBoard {
    tx: watch::Sender<Readout>,
}

impl ReadoutBoard {
    pub fn new(initial: Readout) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Readout> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Readout {
        *self.tx.borrow()
    }

    /// Refresh bounds and speed after a state mutation, keeping the last position
    pub fn publish_bounds(&self, start: f64, end: f64, speed: f64) {
        self.tx.send_if_modified(|readout| {
            let before = *readout;
            readout.start = start;
            readout.end = end;
            readout.speed = speed;
            *readout != before
        });
    }

    /// Rebuild the whole line from a watchdog tick
    pub fn publish_tick(&self, start: f64, end: f64, position: f64, speed: f64) {
        self.tx.send_if_modified(|readout| {
            let before = *readout;
            readout.start = start;
            readout.end = end;
            readout.position = position;
            readout.speed = speed;
            *readout != before
        });
    }
}
