#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod avl;
mod bounds;
mod ids;
mod one_trace;
mod projection;
mod trajectory;

use std::path::Path;

use anyhow::{Context, Result};

pub use self::avl::ReadOptions;
pub use self::bounds::Bounds;
pub use self::ids::{CheapID, IDMapping, VehicleID, VehicleName};
pub use self::one_trace::{output_path, NodeState, OneTrace, TraceLine, TraceOptions};
pub use self::projection::{Ellipsoid, UtmProjection};
pub use self::trajectory::{InterpolationLimits, Position, Timestamp, Trajectory};

/// Every vehicle seen in a raw trace. Built once and never changed afterwards.
pub struct Model {
    // In the order each vehicle first appears in the input
    pub vehicles: Vec<Vehicle>,
    pub vehicle_ids: IDMapping<VehicleName, VehicleID>,
    pub limits: InterpolationLimits,
}

pub struct Vehicle {
    pub id: VehicleID,
    pub original_id: VehicleName,
    pub trajectory: Trajectory,
}

impl Model {
    pub fn load(path: impl AsRef<Path>, opts: &ReadOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = fs_err::File::open(path)?;
        avl::load(std::io::BufReader::new(file), opts)
            .with_context(|| format!("loading trace from {}", path.display()))
    }

    pub fn from_reader<R: std::io::Read>(reader: R, opts: &ReadOptions) -> Result<Self> {
        avl::load(reader, opts)
    }

    pub fn lookup_vehicle(&self, name: &VehicleName) -> Result<&Vehicle> {
        let id = self.vehicle_ids.lookup(name)?;
        Ok(&self.vehicles[id.0])
    }

    /// The earliest observation of any vehicle
    pub fn start_time(&self) -> Option<Timestamp> {
        self.vehicles
            .iter()
            .map(|v| v.trajectory.start_time())
            .min()
    }
}
