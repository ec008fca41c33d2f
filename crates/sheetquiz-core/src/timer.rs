//! Cancellable countdown ticker for timed sessions.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::session::QuizSession;
use crate::summary::Summary;

/// A periodic tick source backed by a tokio task.
///
/// The task is aborted by [`Countdown::cancel`] or when the handle is
/// dropped, so no tick is delivered after the owner goes away.
#[derive(Debug)]
pub struct Countdown {
    ticks: mpsc::Receiver<()>,
    task: JoinHandle<()>,
}

impl Countdown {
    /// Start ticking once per second.
    pub fn every_second() -> Self {
        Self::start(Duration::from_secs(1))
    }

    /// Start ticking once per `period`. The first tick arrives after one period.
    pub fn start(period: Duration) -> Self {
        let (tx, rx) = mpsc::channel(1);
        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(()).await.is_err() {
                    break;
                }
            }
        });
        Self { ticks: rx, task }
    }

    /// Wait for the next tick. Returns `None` once cancelled.
    pub async fn tick(&mut self) -> Option<()> {
        self.ticks.recv().await
    }

    /// Stop the ticker.
    pub fn cancel(&mut self) {
        self.task.abort();
        self.ticks.close();
        while self.ticks.try_recv().is_ok() {}
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Drive a timed session until its clock runs out, with no user input.
///
/// Returns `None` if the session was not timed or not running.
pub async fn run_to_expiry(session: &mut QuizSession, countdown: &mut Countdown) -> Option<Summary> {
    session.remaining_seconds()?;
    while session.is_running() {
        countdown.tick().await?;
        if let Some(summary) = session.tick() {
            let summary = summary.clone();
            countdown.cancel();
            return Some(summary);
        }
    }
    None
}
