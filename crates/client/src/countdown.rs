//! The restart countdown shown after the closing screens.

use interview_core::{event::Event, state::CountdownId};
use std::time::Duration;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::debug;

/// A running countdown. Dropping it stops the timer.
#[derive(Debug)]
pub struct Countdown {
    id: CountdownId,
    task: JoinHandle<()>,
}

impl Countdown {
    /// Reports each remaining second as a `CountdownTick` and finishes with
    /// `CountdownElapsed`.
    pub fn start(
        id: CountdownId,
        seconds: u32,
        tick: Duration,
        events: mpsc::Sender<Event>,
    ) -> Self {
        let task = tokio::spawn(async move {
            let mut remaining = seconds;
            while remaining > 0 {
                tokio::time::sleep(tick).await;
                remaining -= 1;
                if events
                    .send(Event::CountdownTick { id, remaining })
                    .await
                    .is_err()
                {
                    return;
                }
            }
            debug!(?id, "Countdown elapsed");
            let _ = events.send(Event::CountdownElapsed(id)).await;
        });
        Self { id, task }
    }

    pub fn id(&self) -> CountdownId {
        self.id
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.task.abort();
    }
}
