//! The timing harness that drives a [`Cpu`] on its own thread.
//!
//! Two cadences share the loop: the instruction cadence (a tunable, fast)
//! and the 60 Hz timer/display cadence. Collaborators talk to the running
//! machine exclusively over channels, so the framebuffer hand-off needs no
//! locking; the thread is the only owner of the machine state.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use spin_sleep::SpinSleeper;
use tracing::{debug, info, instrument};

use super::{Cpu, CpuError, Key, KeyState};
use crate::screen::Screen;

/// Cadence of the timer/display loop.
const TIMER_INTERVAL: Duration = Duration::from_nanos(1_000_000_000 / 60);

/// Events flowing into the running machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    KeyStateChange { key: Key, new_state: KeyState },
}

/// Events flowing out of the running machine to its collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CpuEvent {
    /// The framebuffer changed; here is the new frame to render.
    ScreenUpdate { new_screen: Screen },
    /// The sound timer just expired: emit one beep.
    Beep,
    /// A fatal fault stopped the machine.
    ErrorEncountered { error: CpuError },
}

impl Cpu {
    /// Run the machine on a dedicated thread.
    ///
    /// Returns the control sender, the event receiver and the thread handle.
    /// Dropping the control sender stops the loop cleanly between
    /// instructions, as does dropping the event receiver; stopping an
    /// already-stopped machine is a no-op. Loading a new program means
    /// stopping this machine, building a fresh [`Cpu`] and starting it —
    /// no state survives a reload.
    pub fn start(
        self,
    ) -> (
        flume::Sender<ControlEvent>,
        flume::Receiver<CpuEvent>,
        JoinHandle<Result<(), CpuError>>,
    ) {
        let (control_sender, control_receiver) = flume::unbounded();
        let (event_sender, event_receiver) = flume::unbounded();

        let join_handle = thread::Builder::new()
            .name("cpu runner".to_owned())
            .spawn(move || self.run(control_receiver, event_sender))
            .expect("could not spawn cpu runner thread");

        (control_sender, event_receiver, join_handle)
    }

    #[instrument(skip_all)]
    fn run(
        mut self,
        control_receiver: flume::Receiver<ControlEvent>,
        event_sender: flume::Sender<CpuEvent>,
    ) -> Result<(), CpuError> {
        info!(cycle_interval = ?self.cycle_interval, "cpu runner started");

        let sleeper = SpinSleeper::default();
        let mut next_cycle = Instant::now() + self.cycle_interval;
        let mut next_timer_tick = Instant::now() + TIMER_INTERVAL;

        loop {
            loop {
                match control_receiver.try_recv() {
                    Ok(ControlEvent::KeyStateChange { key, new_state }) => {
                        debug!(?key, ?new_state, "key state changed");
                        self.set_key_state(key, new_state);
                    }
                    Err(flume::TryRecvError::Empty) => break,
                    Err(flume::TryRecvError::Disconnected) => {
                        info!("control sender dropped, stopping cpu runner");
                        return Ok(());
                    }
                }
            }

            let now = Instant::now();

            if now >= next_timer_tick {
                if self.tick_timers() && event_sender.send(CpuEvent::Beep).is_err() {
                    info!("event receiver dropped, stopping cpu runner");
                    return Ok(());
                }
                if let Some(new_screen) = self.take_frame() {
                    if event_sender
                        .send(CpuEvent::ScreenUpdate { new_screen })
                        .is_err()
                    {
                        info!("event receiver dropped, stopping cpu runner");
                        return Ok(());
                    }
                }
                next_timer_tick += TIMER_INTERVAL;
                // After a long pause, resume at the usual rate instead of
                // replaying every missed tick.
                if next_timer_tick + TIMER_INTERVAL < now {
                    next_timer_tick = now + TIMER_INTERVAL;
                }
                continue;
            }

            if now >= next_cycle {
                if let Err(error) = self.step() {
                    let _ = event_sender.send(CpuEvent::ErrorEncountered {
                        error: error.clone(),
                    });
                    return Err(error);
                }
                next_cycle += self.cycle_interval;
                if next_cycle + self.cycle_interval < now {
                    next_cycle = now + self.cycle_interval;
                }
                continue;
            }

            let next_deadline = next_cycle.min(next_timer_tick);
            sleeper.sleep(next_deadline.saturating_duration_since(now));
        }
    }
}
