/// Tracks time since the last pointer or keyboard activity.
#[derive(Clone, Debug)]
pub struct IdleDetector {
    timeout: f64,
    last_activity: Option<f64>,
}

impl IdleDetector {
    /// `timeout` in seconds.
    pub fn new(timeout: f64) -> Self {
        Self {
            timeout,
            last_activity: None,
        }
    }

    pub fn timeout(&self) -> f64 {
        self.timeout
    }

    pub fn touch(&mut self, now: f64) {
        self.last_activity = Some(now);
    }

    /// Never idle before the first activity is recorded.
    pub fn is_idle(&self, now: f64) -> bool {
        self.last_activity
            .is_some_and(|last| now - last >= self.timeout)
    }
}
