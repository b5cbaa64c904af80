//! # Timer
//!
//! Wall clock stopwatch for timing a single start/stop pair

use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
/// Misuse of a timer
pub enum TimerError {
    #[error("Timer is running. Use .stop() to stop it")]
    Running,
    #[error("Timer is not running. Use .start() to start it")]
    NotRunning,
}

/// Stopwatch that is either idle or running
///
/// # Examples
///
/// ```
/// use voxel_bench::timer::{Timer, TimerError};
/// let mut timer = Timer::new();
/// timer.start().unwrap();
/// assert_eq!(timer.start(), Err(TimerError::Running));
/// timer.stop().unwrap();
/// assert_eq!(timer.stop(), Err(TimerError::NotRunning));
/// ```
#[derive(Debug, Default, Clone)]
pub struct Timer {
    start: Option<Instant>,
}

impl Timer {
    pub fn new() -> Timer { Timer { start: None } }

    pub fn is_running(&self) -> bool { self.start.is_some() }

    /// Start a new timer
    pub fn start(&mut self) -> Result<(), TimerError> {
        if self.start.is_some() {
            return Err(TimerError::Running);
        }
        self.start = Some(Instant::now());
        Ok(())
    }

    /// Stop the timer, and report the elapsed time
    pub fn stop(&mut self) -> Result<Duration, TimerError> {
        let start = self.start.take().ok_or(TimerError::NotRunning)?;
        let elapsed = start.elapsed();
        println!("{}", format_elapsed(elapsed));
        Ok(elapsed)
    }
}

/// Elapsed time line, in seconds with four decimals
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use voxel_bench::timer::format_elapsed;
/// assert_eq!(format_elapsed(Duration::from_millis(1500)), "Elapsed time: 1.5000 seconds");
/// ```
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("Elapsed time: {:0.4} seconds", elapsed.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle() {
        let timer = Timer::default();
        assert!(!timer.is_running());
    }

    #[test]
    fn double_start_fails() {
        let mut timer = Timer::new();
        timer.start().unwrap();
        assert_eq!(timer.start(), Err(TimerError::Running));
        // the failed start leaves the timer running
        assert!(timer.is_running());
    }

    #[test]
    fn stop_without_start_fails() {
        let mut timer = Timer::new();
        assert_eq!(timer.stop(), Err(TimerError::NotRunning));
        assert!(!timer.is_running());
    }

    #[test]
    fn reusable_after_stop() {
        let mut timer = Timer::new();
        timer.start().unwrap();
        let first = timer.stop().unwrap();
        assert!(first >= Duration::from_secs(0));
        assert!(!timer.is_running());
        timer.start().unwrap();
        assert!(timer.stop().is_ok());
    }

    #[test]
    fn formats_four_decimals() {
        assert_eq!(format_elapsed(Duration::from_micros(123)), "Elapsed time: 0.0001 seconds");
        assert_eq!(format_elapsed(Duration::from_secs(2)), "Elapsed time: 2.0000 seconds");
    }
}
