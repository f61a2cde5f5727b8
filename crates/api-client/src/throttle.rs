use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Enforces a minimum spacing between successive permits.
///
/// Callers queue on the inner mutex, so concurrent runs sharing one throttle are
/// serialized and each still waits out the full interval.
#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self { min_interval, last: Mutex::new(None) }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until `min_interval` has passed since the previous permit, then takes one.
    /// The first permit is immediate.
    pub async fn acquire(&self) {
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            sleep_until(previous + self.min_interval).await;
        }
        *last = Some(Instant::now());
    }

    /// Restarts the interval from now without waiting.
    pub async fn touch(&self) {
        *self.last.lock().await = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn permits_are_spaced() {
        let throttle = Throttle::new(Duration::from_secs(2));
        let start = Instant::now();

        throttle.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        throttle.acquire().await;
        throttle.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn touch_restarts_the_interval() {
        let throttle = Throttle::new(Duration::from_secs(5));
        throttle.acquire().await;
        tokio::time::sleep(Duration::from_secs(3)).await;
        throttle.touch().await;

        let before = Instant::now();
        throttle.acquire().await;
        assert!(before.elapsed() >= Duration::from_secs(5));
    }
}
