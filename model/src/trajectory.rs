use std::collections::BTreeMap;

use anyhow::Result;
use geo::line_measures::Distance;
use geo::{Euclidean, Point};

/// Raw trace time, in whatever integer unit the input uses. The Dublin traces use microseconds.
pub type Timestamp = i64;

/// A projected point, in meters, and the time the vehicle was there.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    pub pt: Point,
    pub time: Timestamp,
}

impl Position {
    pub fn new(pt: Point, time: Timestamp) -> Self {
        Self { pt, time }
    }
}

/// When is it reasonable to interpolate between two observations?
#[derive(Clone, Debug, PartialEq)]
pub struct InterpolationLimits {
    /// Anything faster between two observations is probably a GPS glitch
    pub max_speed_mps: f64,
    /// A longer silence means the vehicle went out of service or lost signal
    pub max_gap_secs: f64,
    pub ticks_per_second: f64,
}

impl Default for InterpolationLimits {
    fn default() -> Self {
        Self {
            max_speed_mps: 30.0,
            max_gap_secs: 600.0,
            ticks_per_second: 1_000_000.0,
        }
    }
}

impl InterpolationLimits {
    pub fn to_secs(&self, ticks: Timestamp) -> f64 {
        (ticks as f64) / self.ticks_per_second
    }

    pub fn to_ticks(&self, secs: f64) -> Timestamp {
        (secs * self.ticks_per_second) as Timestamp
    }
}

#[derive(Clone, Debug)]
pub struct Trajectory {
    // Time strictly increases
    inner: Vec<Position>,
    limits: InterpolationLimits,
}

impl Trajectory {
    /// The input can be in any order. If two observations share a time, the one later in `raw`
    /// wins.
    pub fn new(raw: Vec<Position>, limits: InterpolationLimits) -> Result<Self> {
        if raw.is_empty() {
            bail!("Trajectory needs at least one observation");
        }
        let mut by_time = BTreeMap::new();
        for pos in raw {
            by_time.insert(pos.time, pos);
        }
        Ok(Self {
            inner: by_time.into_values().collect(),
            limits,
        })
    }

    pub fn start_time(&self) -> Timestamp {
        self.inner[0].time
    }

    pub fn end_time(&self) -> Timestamp {
        self.inner[self.inner.len() - 1].time
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// All observations, sorted by time
    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.inner.iter()
    }

    /// Only an exact match
    pub fn get(&self, time: Timestamp) -> Option<Position> {
        self.inner
            .binary_search_by_key(&time, |pos| pos.time)
            .ok()
            .map(|idx| self.inner[idx])
    }

    pub fn is_active(&self, time: Timestamp) -> bool {
        time >= self.start_time() && time <= self.end_time()
    }

    /// None if the vehicle isn't active at this time, or if the two observations around this
    /// time are too far apart in time or space to trust a straight line between them.
    pub fn position_at(&self, time: Timestamp) -> Option<Position> {
        let idx = match self.inner.binary_search_by_key(&time, |pos| pos.time) {
            Ok(idx) => {
                return Some(self.inner[idx]);
            }
            Err(idx) => idx,
        };
        // Before the start or after the end
        if idx == 0 || idx == self.inner.len() {
            return None;
        }

        let before = self.inner[idx - 1];
        let after = self.inner[idx];
        let elapsed = self.limits.to_secs(after.time - before.time);

        let speed = Euclidean.distance(before.pt, after.pt) / elapsed;
        if speed > self.limits.max_speed_mps {
            return None;
        }
        if elapsed > self.limits.max_gap_secs {
            return None;
        }

        let percent = ((time - before.time) as f64) / ((after.time - before.time) as f64);
        let pt = before.pt + (after.pt - before.pt) * percent;
        Some(Position::new(pt, time))
    }

    /// The straight-line distance between two vehicles at some time, if both are active
    pub fn distance_at(&self, other: &Trajectory, time: Timestamp) -> Option<f64> {
        let pos1 = self.position_at(time)?;
        let pos2 = other.position_at(time)?;
        Some(Euclidean.distance(pos1.pt, pos2.pt))
    }
}
