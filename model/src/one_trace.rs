//! Exports trajectories in the ONE simulator's external movement format. The first line is a
//! header, `minStep maxStep minX maxX minY maxY`. Every following line is
//! `step vehicle x y state`, sorted by step.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use geo::Point;

use crate::{Bounds, Model, Position, Timestamp, VehicleID};

/// The header's bounding box is snapped outwards to this many meters.
const BOUNDS_GRID: f64 = 500.0;

pub struct TraceOptions {
    /// The time between two output steps, in the same units as the raw trace
    pub sample_interval: Timestamp,
    /// Only this much time after the first observation is written.
    pub window_secs: f64,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            sample_interval: 1_000_000,
            window_secs: 3600.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeState {
    Up,
    Down,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NodeState::Up => write!(f, "UP"),
            NodeState::Down => write!(f, "DOWN"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TraceLine {
    pub step: i64,
    pub vehicle: VehicleID,
    pub pt: Point,
    pub state: NodeState,
}

impl TraceLine {
    fn new(step: i64, vehicle: VehicleID, pos: Position, state: NodeState) -> Self {
        Self {
            step,
            vehicle,
            pt: pos.pt,
            state,
        }
    }
}

/// Every vehicle resampled on a fixed grid of steps, ready to be written.
pub struct OneTrace<'a> {
    model: &'a Model,
    pub sample_interval: Timestamp,
    pub min_step: i64,
    pub max_step: i64,
    /// Covers every UP line in the body, already snapped outwards
    pub bounds: Bounds,
    /// Each vehicle's state at the first step, in vehicle order
    pub init: Vec<TraceLine>,
    /// Sorted by step, then vehicle
    pub body: Vec<TraceLine>,
}

impl<'a> OneTrace<'a> {
    pub fn build(model: &'a Model, opts: &TraceOptions) -> Result<Self> {
        if opts.sample_interval <= 0 {
            bail!("The sample interval must be positive, not {}", opts.sample_interval);
        }
        if !opts.window_secs.is_finite() || opts.window_secs < 0.0 {
            bail!("The window must be a non-negative number of seconds, not {}", opts.window_secs);
        }
        let grid_start = match model.start_time() {
            Some(t) => t,
            None => bail!("The trace has no vehicles"),
        };
        let grid_end = grid_start
            .checked_add(model.limits.to_ticks(opts.window_secs))
            .with_context(|| format!("A window of {}s is too long", opts.window_secs))?;
        let min_step = 0;
        let max_step = (grid_end - grid_start) / opts.sample_interval;
        let time_at = |step: i64| grid_start + step * opts.sample_interval;

        let start_secs = model.limits.to_secs(grid_start).floor() as i64;
        match chrono::DateTime::from_timestamp(start_secs, 0) {
            Some(dt) => info!(
                "Sampling {} vehicles from {} for {}s, {} steps",
                model.vehicles.len(),
                dt,
                opts.window_secs,
                max_step + 1
            ),
            None => info!(
                "Sampling {} vehicles from time {} for {}s, {} steps",
                model.vehicles.len(),
                grid_start,
                opts.window_secs,
                max_step + 1
            ),
        }

        let mut body = Vec::new();
        let mut bounds = Bounds::new();
        // The last valid position of everything currently UP
        let mut active: BTreeMap<VehicleID, Position> = BTreeMap::new();
        for step in min_step..=max_step {
            let time = time_at(step);
            for vehicle in &model.vehicles {
                if let Some(pos) = vehicle.trajectory.position_at(time) {
                    active.insert(vehicle.id, pos);
                    bounds.update(pos.pt);
                    body.push(TraceLine::new(step, vehicle.id, pos, NodeState::Up));
                } else if let Some(last) = active.remove(&vehicle.id) {
                    body.push(TraceLine::new(step, vehicle.id, last, NodeState::Down));
                }
            }
            debug!("Step {} (time {}): {} active", step, time, active.len());
        }

        if bounds.is_empty() {
            bail!("No vehicle has a valid position in the sampled window");
        }
        let bounds = bounds.round_out(BOUNDS_GRID);

        let mut init = Vec::new();
        for vehicle in &model.vehicles {
            if let Some(pos) = vehicle.trajectory.position_at(time_at(min_step)) {
                init.push(TraceLine::new(min_step, vehicle.id, pos, NodeState::Up));
            } else {
                // Not around yet (or briefly lost). Describe where it first shows up.
                let pos = vehicle
                    .trajectory
                    .position_at(vehicle.trajectory.start_time())
                    .with_context(|| {
                        format!("{} has no position at its own start", vehicle.original_id)
                    })?;
                init.push(TraceLine::new(min_step, vehicle.id, pos, NodeState::Down));
            }
        }

        info!(
            "Steps {} to {}, x from {} to {}, y from {} to {} ({}m by {}m)",
            min_step,
            max_step,
            bounds.min_x,
            bounds.max_x,
            bounds.min_y,
            bounds.max_y,
            bounds.width(),
            bounds.height()
        );

        Ok(Self {
            model,
            sample_interval: opts.sample_interval,
            min_step,
            max_step,
            bounds,
            init,
            body,
        })
    }

    /// Writes the whole file at once, returning the path actually used. See `output_path`.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = output_path(path.as_ref(), self.sample_interval);
        fs_err::write(&path, self.to_string())?;
        info!("Wrote {} lines to {}", self.init.len() + self.body.len() + 1, path.display());
        Ok(path)
    }
}

impl fmt::Display for OneTrace<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "{} {} {} {} {} {}",
            self.min_step,
            self.max_step,
            self.bounds.min_x as i64,
            self.bounds.max_x as i64,
            self.bounds.min_y as i64,
            self.bounds.max_y as i64
        )?;
        for line in self.init.iter().chain(self.body.iter()) {
            writeln!(
                f,
                "{} {} {:.6} {:.6} {}",
                line.step,
                self.model.vehicles[line.vehicle.0].original_id,
                line.pt.x(),
                line.pt.y(),
                line.state
            )?;
        }
        Ok(())
    }
}

/// "dir/trace.txt" with a sample interval of 1000000 becomes "dir/trace_1000000.txt"
pub fn output_path(path: &Path, sample_interval: Timestamp) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|x| x.to_string_lossy().to_string())
        .unwrap_or_default();
    let file_name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, sample_interval, ext.to_string_lossy()),
        None => format!("{}_{}", stem, sample_interval),
    };
    path.with_file_name(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InterpolationLimits, Trajectory, Vehicle, VehicleName};

    const SEC: Timestamp = 1_000_000;

    fn model(raw: Vec<(&str, Vec<(Timestamp, f64, f64)>)>) -> Model {
        let mut vehicles = Vec::new();
        let mut vehicle_ids = crate::IDMapping::new();
        for (name, pts) in raw {
            let name = VehicleName(name.to_string());
            let (id, _) = vehicle_ids.insert_idempotent(&name);
            let trajectory = Trajectory::new(
                pts.into_iter()
                    .map(|(t, x, y)| Position::new(Point::new(x, y), t))
                    .collect(),
                InterpolationLimits::default(),
            )
            .unwrap();
            vehicles.push(Vehicle {
                id,
                original_id: name,
                trajectory,
            });
        }
        Model {
            vehicles,
            vehicle_ids,
            limits: InterpolationLimits::default(),
        }
    }

    fn opts(window_secs: f64) -> TraceOptions {
        TraceOptions {
            sample_interval: SEC,
            window_secs,
        }
    }

    #[test]
    fn filename_has_the_interval() {
        assert_eq!(
            output_path(Path::new("out/trace.txt"), 1_000_000),
            PathBuf::from("out/trace_1000000.txt")
        );
        assert_eq!(
            output_path(Path::new("trace"), 500),
            PathBuf::from("trace_500")
        );
        assert_eq!(
            output_path(Path::new("a.b.one"), 2),
            PathBuf::from("a.b_2.one")
        );
    }

    #[test]
    fn down_once_then_up_again() {
        // A long gap in the middle makes the vehicle drop out, then come back
        let m = model(vec![(
            "bus",
            vec![
                (0, 1000.0, 1000.0),
                (2 * SEC, 1010.0, 1000.0),
                (700 * SEC, 1010.0, 1000.0),
                (701 * SEC, 1012.0, 1000.0),
            ],
        )]);
        let trace = OneTrace::build(&m, &opts(701.0)).unwrap();
        let states: Vec<(i64, NodeState)> =
            trace.body.iter().map(|l| (l.step, l.state)).collect();
        assert_eq!(
            states,
            vec![
                (0, NodeState::Up),
                (1, NodeState::Up),
                (2, NodeState::Up),
                (3, NodeState::Down),
                (700, NodeState::Up),
                (701, NodeState::Up),
            ]
        );
        // The DOWN line repeats the last valid position
        assert_eq!(trace.body[3].pt, Point::new(1010.0, 1000.0));
    }

    #[test]
    fn window_is_capped() {
        let m = model(vec![("bus", vec![(0, 0.0, 0.0), (100 * SEC, 0.0, 0.0)])]);
        let trace = OneTrace::build(&m, &opts(10.0)).unwrap();
        assert_eq!(trace.min_step, 0);
        assert_eq!(trace.max_step, 10);
        assert_eq!(trace.body.len(), 11);
        assert!(trace.body.iter().all(|l| l.state == NodeState::Up));
    }

    #[test]
    fn late_vehicle_starts_down() {
        let m = model(vec![
            ("early", vec![(0, 100.0, 100.0), (5 * SEC, 110.0, 100.0)]),
            ("late", vec![(3 * SEC, 700.0, 900.0), (5 * SEC, 710.0, 900.0)]),
        ]);
        let trace = OneTrace::build(&m, &opts(5.0)).unwrap();
        assert_eq!(
            trace.init,
            vec![
                TraceLine {
                    step: 0,
                    vehicle: VehicleID(0),
                    pt: Point::new(100.0, 100.0),
                    state: NodeState::Up,
                },
                TraceLine {
                    step: 0,
                    vehicle: VehicleID(1),
                    pt: Point::new(700.0, 900.0),
                    state: NodeState::Down,
                },
            ]
        );
        assert_eq!(trace.bounds.min_x, 0.0);
        assert_eq!(trace.bounds.max_x, 1000.0);
        assert_eq!(trace.bounds.min_y, 0.0);
        assert_eq!(trace.bounds.max_y, 1000.0);
    }

    #[test]
    fn renders_the_format() {
        let m = model(vec![
            ("33521", vec![(0, 1000.0, 2000.0), (2 * SEC, 1002.0, 2001.0)]),
            ("x", vec![(SEC, 1250.5, 2250.25)]),
        ]);
        let trace = OneTrace::build(&m, &opts(2.0)).unwrap();
        let expected = "\
0 2 1000 1500 2000 2500
0 33521 1000.000000 2000.000000 UP
0 x 1250.500000 2250.250000 DOWN
0 33521 1000.000000 2000.000000 UP
1 33521 1001.000000 2000.500000 UP
1 x 1250.500000 2250.250000 UP
2 33521 1002.000000 2001.000000 UP
2 x 1250.500000 2250.250000 DOWN
";
        assert_eq!(trace.to_string(), expected);
    }

    #[test]
    fn file_name_uses_the_built_interval() {
        let m = model(vec![("bus", vec![(0, 0.0, 0.0), (10 * SEC, 5.0, 0.0)])]);
        let trace = OneTrace::build(
            &m,
            &TraceOptions {
                sample_interval: 2 * SEC,
                window_secs: 10.0,
            },
        )
        .unwrap();
        assert_eq!(trace.sample_interval, 2 * SEC);
        assert_eq!(trace.max_step, 5);

        let dir = std::env::temp_dir().join(format!("one_trace_interval_{}", std::process::id()));
        fs_err::create_dir_all(&dir).unwrap();
        let path = trace.write(dir.join("bus.txt")).unwrap();
        assert_eq!(path, dir.join("bus_2000000.txt"));
        fs_err::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn bad_options() {
        let m = model(vec![("bus", vec![(0, 0.0, 0.0)])]);
        let zero = TraceOptions {
            sample_interval: 0,
            window_secs: 10.0,
        };
        assert!(OneTrace::build(&m, &zero).is_err());
        assert!(OneTrace::build(&m, &opts(-1.0)).is_err());
        assert!(OneTrace::build(&m, &opts(f64::NAN)).is_err());
        assert!(OneTrace::build(&m, &opts(f64::INFINITY)).is_err());
        // Finite, but more ticks than fit after the first observation
        assert!(OneTrace::build(&m, &opts(1e300)).is_err());

        let empty = model(Vec::new());
        assert!(OneTrace::build(&empty, &opts(10.0)).is_err());
    }
}
