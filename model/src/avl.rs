use anyhow::{Context, Result};
use serde::Deserialize;

use crate::projection::UtmProjection;
use crate::trajectory::{InterpolationLimits, Position, Timestamp, Trajectory};
use crate::{IDMapping, Model, Vehicle, VehicleID, VehicleName};

pub struct ReadOptions {
    /// Skip the first row
    pub has_header: bool,
    pub projection: UtmProjection,
    pub limits: InterpolationLimits,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            has_header: false,
            projection: UtmProjection::default(),
            limits: InterpolationLimits::default(),
        }
    }
}

pub fn load<R: std::io::Read>(reader: R, opts: &ReadOptions) -> Result<Model> {
    // Read raw data, keeping vehicles in the order they first appear
    let mut vehicle_ids: IDMapping<VehicleName, VehicleID> = IDMapping::new();
    let mut names = Vec::new();
    let mut data_per_vehicle: Vec<Vec<Position>> = Vec::new();
    let mut rows = 0;

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(opts.has_header)
        .from_reader(reader);
    for (idx, rec) in csv_reader.records().enumerate() {
        let rec = rec?;
        // Always match columns by position; the header names (if any) aren't trusted
        let rec: SiriRow = rec
            .deserialize(None)
            .with_context(|| format!("row {} of the trace is malformed", idx + 1))?;

        let pt = opts.projection.project(rec.longitude, rec.latitude);
        let (id, new) = vehicle_ids.insert_idempotent(&rec.vehicle_name);
        if new {
            names.push(rec.vehicle_name);
            data_per_vehicle.push(Vec::new());
        }
        data_per_vehicle[id.0].push(Position::new(pt, rec.timestamp));
        rows += 1;
    }
    info!(
        "Read {} observations of {} vehicles",
        rows,
        vehicle_ids.len()
    );

    // Calculate trajectories
    let mut vehicles = Vec::new();
    for (original_id, raw_pts) in names.into_iter().zip(data_per_vehicle) {
        let trajectory = Trajectory::new(raw_pts, opts.limits.clone())?;
        vehicles.push(Vehicle {
            id: VehicleID(vehicles.len()),
            original_id,
            trajectory,
        });
    }
    Ok(Model {
        vehicles,
        vehicle_ids,
        limits: opts.limits.clone(),
    })
}

/// One row of the Dublin City Council SIRI bus feed. Only a few columns matter here, but they're
/// matched by position, so all of them have to be listed.
#[allow(dead_code)]
#[derive(Deserialize)]
struct SiriRow {
    timestamp: Timestamp,
    line_id: String,
    direction: String,
    journey_pattern_id: String,
    time_frame: String,
    vehicle_journey_id: String,
    operator: String,
    congestion: String,
    longitude: f64,
    latitude: f64,
    delay: String,
    block_id: String,
    vehicle_name: VehicleName,
    stop_id: String,
    at_stop: String,
}
