//! Coalescing wrappers for high-frequency signals.
//!
//! [`Debounced`] fires only the last call of a burst, once the burst has been
//! quiet for `wait`. [`Throttled`] fires at most once per `limit` window: the
//! first call immediately, later in-window calls once at the window boundary
//! with the latest arguments.
//!
//! Each wrapper owns at most one armed timer, a spawned tokio task. Arming a
//! new timer aborts the previous one, a fired timer releases its own slot, and
//! dropping the wrapper aborts whatever is still pending. Both wrappers must be
//! called from inside a tokio runtime.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Duration, Instant};

type Action<A> = Arc<dyn Fn(A) + Send + Sync>;

pub fn debounce<A, F>(action: F, wait: Duration) -> Debounced<A>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    Debounced::new(action, wait)
}

pub fn throttle<A, F>(action: F, limit: Duration) -> Throttled<A>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    Throttled::new(action, limit)
}

// ---------------------------------------------------------------------------
// Timer slot
// ---------------------------------------------------------------------------

#[derive(Default)]
struct TimerSlot {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl TimerSlot {
    /// Abort the armed timer, if any, and return the generation for the next one.
    fn rearm(&mut self) -> u64 {
        self.cancel();
        self.generation += 1;
        self.generation
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Called by a timer that fired. A superseded timer leaves the slot alone.
    fn release(&mut self, generation: u64) {
        if self.generation == generation {
            self.handle = None;
        }
    }

    fn is_armed(&self) -> bool {
        self.handle.is_some()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Debounce
// ---------------------------------------------------------------------------

pub struct Debounced<A> {
    action: Action<A>,
    wait: Duration,
    slot: Arc<Mutex<TimerSlot>>,
}

impl<A: Send + 'static> Debounced<A> {
    pub fn new<F>(action: F, wait: Duration) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self {
            action: Arc::new(action),
            wait,
            slot: Arc::new(Mutex::new(TimerSlot::default())),
        }
    }

    /// Schedule `action(args)` for `wait` from now, discarding any call still pending.
    pub fn call(&self, args: A) {
        let deadline = Instant::now() + self.wait;
        let mut slot = lock(&self.slot);
        let generation = slot.rearm();

        let shared = Arc::clone(&self.slot);
        let action = Arc::clone(&self.action);
        slot.handle = Some(tokio::spawn(async move {
            sleep_until(deadline).await;
            lock(&shared).release(generation);
            action(args);
        }));
    }

    pub fn pending(&self) -> bool {
        lock(&self.slot).is_armed()
    }
}

impl<A> Drop for Debounced<A> {
    fn drop(&mut self) {
        lock(&self.slot).cancel();
    }
}

// ---------------------------------------------------------------------------
// Throttle
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ThrottleState {
    last_ran: Option<Instant>,
    timer: TimerSlot,
}

pub struct Throttled<A> {
    action: Action<A>,
    limit: Duration,
    state: Arc<Mutex<ThrottleState>>,
}

impl<A: Send + 'static> Throttled<A> {
    pub fn new<F>(action: F, limit: Duration) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self {
            action: Arc::new(action),
            limit,
            state: Arc::new(Mutex::new(ThrottleState::default())),
        }
    }

    /// Run `action(args)` now if the window is open, otherwise defer it to the
    /// window boundary, replacing any call already deferred.
    pub fn call(&self, args: A) {
        let now = Instant::now();
        let mut state = lock(&self.state);

        let elapsed = match state.last_ran {
            Some(last) => now.saturating_duration_since(last),
            None => {
                state.last_ran = Some(now);
                drop(state);
                (self.action)(args);
                return;
            }
        };

        if elapsed >= self.limit {
            state.timer.cancel();
            state.last_ran = Some(now);
            drop(state);
            (self.action)(args);
            return;
        }

        // Clamped: a window that closes while we schedule fires on the next tick.
        let deadline = now + self.limit.saturating_sub(elapsed);
        let generation = state.timer.rearm();
        let limit = self.limit;
        let shared = Arc::clone(&self.state);
        let action = Arc::clone(&self.action);
        state.timer.handle = Some(tokio::spawn(async move {
            sleep_until(deadline).await;
            let fire = {
                let mut state = lock(&shared);
                state.timer.release(generation);
                let now = Instant::now();
                let open = state
                    .last_ran
                    .map_or(true, |last| now.saturating_duration_since(last) >= limit);
                if open {
                    state.last_ran = Some(now);
                }
                open
            };
            if fire {
                action(args);
            }
        }));
    }

    pub fn pending(&self) -> bool {
        lock(&self.state).timer.is_armed()
    }
}

impl<A> Drop for Throttled<A> {
    fn drop(&mut self) {
        lock(&self.state).timer.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    type Fired<T> = Arc<Mutex<Vec<(Duration, T)>>>;

    fn recorder<T: Send + 'static>(start: Instant) -> (Fired<T>, impl Fn(T) + Send + Sync + 'static) {
        let fired: Fired<T> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&fired);
        (fired, move |args: T| {
            sink.lock().unwrap().push((start.elapsed(), args));
        })
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    // --- debounce ---

    #[tokio::test(start_paused = true)]
    async fn debounce_fires_once_with_last_arguments() {
        let start = Instant::now();
        let (fired, action) = recorder(start);
        let debounced = debounce(action, ms(200));

        debounced.call(1);
        sleep(ms(100)).await;
        debounced.call(2);
        sleep(ms(50)).await;
        debounced.call(3);
        sleep(ms(1000)).await;

        let fired = fired.lock().unwrap();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0], (ms(350), 3));
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_separate_bursts_each_fire() {
        let start = Instant::now();
        let (fired, action) = recorder(start);
        let debounced = debounce(action, ms(200));

        debounced.call("first");
        sleep(ms(500)).await;
        debounced.call("second");
        sleep(ms(500)).await;

        let fired = fired.lock().unwrap();
        assert_eq!(*fired, vec![(ms(200), "first"), (ms(700), "second")]);
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_releases_its_timer_after_firing() {
        let (_fired, action) = recorder::<u8>(Instant::now());
        let debounced = debounce(action, ms(200));

        assert!(!debounced.pending());
        debounced.call(1);
        assert!(debounced.pending());
        sleep(ms(250)).await;
        assert!(!debounced.pending());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_debounce_discards_pending_call() {
        let (fired, action) = recorder::<u8>(Instant::now());
        let debounced = debounce(action, ms(200));

        debounced.call(1);
        drop(debounced);
        sleep(ms(500)).await;

        assert!(fired.lock().unwrap().is_empty());
    }

    // --- throttle ---

    #[tokio::test(start_paused = true)]
    async fn throttle_fires_leading_and_trailing() {
        let start = Instant::now();
        let (fired, action) = recorder(start);
        let throttled = throttle(action, ms(200));

        throttled.call(1);
        sleep(ms(50)).await;
        throttled.call(2);
        sleep(ms(100)).await;
        throttled.call(3);
        sleep(ms(1000)).await;

        let fired = fired.lock().unwrap();
        assert_eq!(*fired, vec![(ms(0), 1), (ms(200), 3)]);
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_call_after_window_fires_immediately() {
        let start = Instant::now();
        let (fired, action) = recorder(start);
        let throttled = throttle(action, ms(200));

        throttled.call(1);
        sleep(ms(300)).await;
        throttled.call(2);

        assert_eq!(*fired.lock().unwrap(), vec![(ms(0), 1), (ms(300), 2)]);
        assert!(!throttled.pending());
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_trailing_call_restarts_the_window() {
        let start = Instant::now();
        let (fired, action) = recorder(start);
        let throttled = throttle(action, ms(200));

        throttled.call(1);
        sleep(ms(100)).await;
        throttled.call(2); // deferred to 200
        sleep(ms(150)).await;
        throttled.call(3); // window restarted at 200, deferred to 400
        sleep(ms(1000)).await;

        assert_eq!(
            *fired.lock().unwrap(),
            vec![(ms(0), 1), (ms(200), 2), (ms(400), 3)]
        );
        assert!(!throttled.pending());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_throttle_discards_deferred_call() {
        let (fired, action) = recorder(Instant::now());
        let throttled = throttle(action, ms(200));

        throttled.call(1);
        throttled.call(2);
        assert!(throttled.pending());
        drop(throttled);
        sleep(ms(500)).await;

        assert_eq!(fired.lock().unwrap().len(), 1);
    }
}
