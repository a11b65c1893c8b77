//! Elapsed-time accounting for interview sessions.
//!
//! The stopwatch accumulates only while running: pause stops the clock and
//! resume restarts it. All methods take explicit instants so callers pass
//! `Utc::now()` in production and fixed timestamps in tests.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stopwatch {
    accumulated: Duration,
    running_since: Option<DateTime<Utc>>,
}

impl Stopwatch {
    pub fn started_at(now: DateTime<Utc>) -> Self {
        Self {
            accumulated: Duration::zero(),
            running_since: Some(now),
        }
    }

    /// Stops accumulating. No-op when already paused.
    pub fn pause_at(&mut self, now: DateTime<Utc>) {
        if let Some(since) = self.running_since.take() {
            self.accumulated = self.accumulated + (now - since);
        }
    }

    /// Restarts accumulating. No-op when already running.
    pub fn resume_at(&mut self, now: DateTime<Utc>) {
        if self.running_since.is_none() {
            self.running_since = Some(now);
        }
    }

    /// Terminal stop; identical to pause, named for call sites that end a
    /// session rather than suspend it.
    pub fn stop_at(&mut self, now: DateTime<Utc>) {
        self.pause_at(now);
    }

    pub fn elapsed_at(&self, now: DateTime<Utc>) -> Duration {
        match self.running_since {
            Some(since) => self.accumulated + (now - since),
            None => self.accumulated,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .expect("valid timestamp")
            .with_timezone(&Utc)
    }

    #[test]
    fn accumulates_while_running() {
        let watch = Stopwatch::started_at(at("2026-02-01T10:00:00Z"));
        assert_eq!(
            watch.elapsed_at(at("2026-02-01T10:05:00Z")),
            Duration::minutes(5)
        );
    }

    #[test]
    fn pause_stops_the_clock() {
        let mut watch = Stopwatch::started_at(at("2026-02-01T10:00:00Z"));
        watch.pause_at(at("2026-02-01T10:05:00Z"));

        // Time passing while paused does not count.
        assert_eq!(
            watch.elapsed_at(at("2026-02-01T11:00:00Z")),
            Duration::minutes(5)
        );
        assert!(!watch.is_running());
    }

    #[test]
    fn resume_restarts_the_clock() {
        let mut watch = Stopwatch::started_at(at("2026-02-01T10:00:00Z"));
        watch.pause_at(at("2026-02-01T10:05:00Z"));
        watch.resume_at(at("2026-02-01T10:30:00Z"));

        assert_eq!(
            watch.elapsed_at(at("2026-02-01T10:32:00Z")),
            Duration::minutes(7)
        );
        assert!(watch.is_running());
    }

    #[test]
    fn repeated_pause_and_resume_are_no_ops() {
        let mut watch = Stopwatch::started_at(at("2026-02-01T10:00:00Z"));
        watch.pause_at(at("2026-02-01T10:05:00Z"));
        watch.pause_at(at("2026-02-01T10:10:00Z"));
        assert_eq!(
            watch.elapsed_at(at("2026-02-01T10:20:00Z")),
            Duration::minutes(5)
        );

        watch.resume_at(at("2026-02-01T10:20:00Z"));
        watch.resume_at(at("2026-02-01T10:25:00Z"));
        assert_eq!(
            watch.elapsed_at(at("2026-02-01T10:30:00Z")),
            Duration::minutes(15)
        );
    }
}
