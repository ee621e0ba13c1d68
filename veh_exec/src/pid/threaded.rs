//! [`PidLoop`] recomputed by a background tick thread

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use log::{trace, warn};
use util::time::seconds_to_std;

use super::{PidController, PidError, PidIo, PidLoop};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A PID loop evaluated every controller interval by its own thread.
///
/// The controller and its [`PidIo`] block sit behind one mutex which both the tick and
/// [`PidLoop::exchange`] take, so writes from the control loop and recomputation by the tick are
/// never interleaved.
pub struct ThreadedPid {
    shared: Arc<Mutex<Shared>>,

    /// Recompute on each tick while set
    running: Arc<AtomicBool>,

    /// Cleared on drop to end the tick thread
    alive: Arc<AtomicBool>,

    handle: Option<JoinHandle<()>>,
}

struct Shared {
    ctrl: PidController,
    io: PidIo,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ThreadedPid {
    /// Create the loop and spawn its tick thread. The loop starts stopped.
    pub fn new(ctrl: PidController) -> Result<Self, PidError> {
        let interval_s = ctrl.interval_s();

        let shared = Arc::new(Mutex::new(Shared {
            ctrl,
            io: PidIo::default(),
        }));
        let running = Arc::new(AtomicBool::new(false));
        let alive = Arc::new(AtomicBool::new(true));

        let handle = {
            let shared = shared.clone();
            let running = running.clone();
            let alive = alive.clone();

            thread::Builder::new()
                .name("pid_tick".into())
                .spawn(move || tick_thread(shared, running, alive, interval_s))
                .map_err(PidError::SpawnFailed)?
        };

        Ok(Self {
            shared,
            running,
            alive,
            handle: Some(handle),
        })
    }
}

impl PidLoop for ThreadedPid {
    fn start(&mut self) {
        let mut shared = lock(&self.shared);
        if !self.running.load(Ordering::Acquire) {
            shared.ctrl.resume();
            self.running.store(true, Ordering::Release);
        }
    }

    /// Once this returns no tick is mid-computation.
    fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        drop(lock(&self.shared));
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn set_setpoint(&mut self, setpoint: f64) {
        lock(&self.shared).io.setpoint = setpoint;
    }

    fn exchange(&mut self, input: f64) -> f64 {
        let mut shared = lock(&self.shared);
        shared.io.input = input;
        shared.io.output
    }

    fn io(&self) -> PidIo {
        lock(&self.shared).io
    }
}

impl Drop for ThreadedPid {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Release);

        if let Some(h) = self.handle.take() {
            if h.join().is_err() {
                warn!("PID tick thread panicked");
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Lock the shared block. A panic elsewhere can't leave the block half written (all writes are
/// plain field stores) so a poisoned lock is still used.
fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn tick_thread(
    shared: Arc<Mutex<Shared>>,
    running: Arc<AtomicBool>,
    alive: Arc<AtomicBool>,
    interval_s: f64
) {
    let period = seconds_to_std(interval_s);
    let mut next = Instant::now() + period;

    while alive.load(Ordering::Acquire) {
        let now = Instant::now();
        if now < next {
            thread::sleep(next - now);
            continue;
        }

        // If we've fallen more than a whole period behind skip the missed ticks rather than
        // bursting through them
        next = if now >= next + period { now + period } else { next + period };

        if !running.load(Ordering::Acquire) {
            continue;
        }

        let mut s = lock(&shared);

        // `stop` may have run while we waited for the lock
        if running.load(Ordering::Acquire) {
            let Shared { ctrl, io } = &mut *s;
            io.output = ctrl.compute(io.setpoint, io.input);
            trace!("PID tick: {:?}", io);
        }
    }
}
