use serde::{Deserialize, Serialize};

/// Additive match clock. Each tick is one second; no wall-clock correction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchClock {
    pub elapsed_seconds: u64,
    pub is_running: bool,
}

impl MatchClock {
    pub fn start(&mut self) {
        self.is_running = true;
    }

    pub fn stop(&mut self) {
        self.is_running = false;
    }

    /// Advances by one second if running. Returns whether time moved.
    pub fn tick(&mut self) -> bool {
        if !self.is_running {
            return false;
        }
        self.elapsed_seconds = self.elapsed_seconds.saturating_add(1);
        true
    }

    pub fn display(&self) -> String {
        format_clock(self.elapsed_seconds)
    }
}

/// `MM:SS`, minutes unbounded.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_pads_and_leaves_minutes_unbounded() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(100 * 60 + 9), "100:09");
    }

    #[test]
    fn stopped_clock_does_not_advance() {
        let mut clock = MatchClock::default();
        assert!(!clock.tick());
        clock.start();
        assert!(clock.tick());
        clock.stop();
        clock.stop();
        assert!(!clock.tick());
        assert_eq!(clock.elapsed_seconds, 1);
    }
}
