#![allow(dead_code)]

use std::fmt;
use std::time::Duration;

/// Macros to time code and display a human-readable duration.
pub mod timeit {
    pub use crate::{timeit, timeit_n};
}

#[macro_export]
macro_rules! timeit_n {
    ($name:expr, $loops:expr, $code:expr) => {{
        use $crate::util::DisplayDuration;
        let start = std::time::Instant::now();
        let mut r = $code;
        for _ in 1..$loops {
            r = $code;
        }
        println!(
            "⏱  {}: {} (average over {} runs)",
            $name,
            DisplayDuration(start.elapsed() / $loops),
            $loops
        );
        r
    }};
}

#[macro_export]
macro_rules! timeit {
    ($name:expr, $code:expr) => {{
        use $crate::util::DisplayDuration;
        let start = std::time::Instant::now();
        let r = $code;
        println!("⏱  {}: {}", $name, DisplayDuration(start.elapsed()));
        r
    }};
}

/// Utility struct for displaying human-readable durations.
pub struct DisplayDuration(pub Duration);

impl fmt::Display for DisplayDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let duration_us = self.0.as_micros();
        if duration_us < 1_000 {
            write!(f, "{duration_us} µs")
        } else if duration_us < 1_000_000 {
            write!(f, "{:.2} ms", duration_us as f64 / 1_000.0)
        } else {
            write!(f, "{:.2} s", duration_us as f64 / 1_000_000.0)
        }
    }
}
