use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};
use std::time::Duration;

/// Elapsed game time in seconds.
///
/// Backed by an `f64`, so differences and comparisons stay exact to well below
/// a millisecond for sessions lasting years; nothing wraps around.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct GameDuration(f64);

impl GameDuration {
    pub const ZERO: Self = Self(0.0);

    pub const fn from_secs(seconds: f64) -> Self {
        Self(seconds)
    }

    pub const fn as_secs(self) -> f64 {
        self.0
    }

    pub fn as_secs_f32(self) -> f32 {
        self.0 as f32
    }

    pub fn min(self, other: Self) -> Self {
        if other < self { other } else { self }
    }
}

impl From<Duration> for GameDuration {
    fn from(duration: Duration) -> Self {
        Self(duration.as_secs_f64())
    }
}

impl Add for GameDuration {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for GameDuration {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for GameDuration {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul<f64> for GameDuration {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self(self.0 * rhs)
    }
}

impl fmt::Display for GameDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_and_ordering() {
        let mut d = GameDuration::from_secs(1.5);
        d += GameDuration::from_secs(0.5);
        assert_eq!(d, GameDuration::from_secs(2.0));
        assert!(d - GameDuration::from_secs(2.5) < GameDuration::ZERO);
        assert!(GameDuration::from(Duration::from_millis(250)) >= GameDuration::from_secs(0.25));
        assert_eq!((d * 0.5).as_secs(), 1.0);
    }

    #[test]
    fn long_sessions_keep_precision() {
        let week = GameDuration::from_secs(7.0 * 24.0 * 3600.0);
        let tick = GameDuration::from_secs(0.01);
        let later = week + tick;
        assert!((later - week).as_secs() - 0.01 < 1e-9);
        assert!(later > week);
    }
}
