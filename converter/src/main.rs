#[macro_use]
extern crate log;

use std::time::Instant;

use anyhow::Result;
use structopt::StructOpt;

use model::{
    Ellipsoid, InterpolationLimits, Model, OneTrace, ReadOptions, TraceOptions, UtmProjection,
};

/// Converts raw GPS bus traces into a ONE simulator external movement file.
#[derive(StructOpt)]
struct Args {
    /// The path to a raw GPS trace CSV
    #[structopt(long)]
    input: String,
    /// Where to write the movement file. The sample interval gets inserted before the extension.
    #[structopt(long)]
    output: String,
    /// Time between output steps, in the same units as the trace timestamps
    #[structopt(long, default_value = "1000000")]
    sample_interval: i64,
    /// Skip the first row of the input
    #[structopt(long)]
    has_header: bool,
    /// How much of the trace to export, starting from the first observation
    #[structopt(long, default_value = "3600")]
    window_secs: f64,
    #[structopt(long, default_value = "29")]
    utm_zone: u8,
    /// Use the southern hemisphere's false northing
    #[structopt(long)]
    south: bool,
    /// grs80 or wgs84
    #[structopt(long, default_value = "grs80")]
    ellipsoid: Ellipsoid,
}

impl Args {
    fn run(self) -> Result<()> {
        let projection = UtmProjection::new(self.utm_zone, self.south, self.ellipsoid)?;
        info!("Projecting into UTM zone {}", projection.zone());
        let read_opts = ReadOptions {
            has_header: self.has_header,
            projection,
            limits: InterpolationLimits::default(),
        };

        let start = Instant::now();
        info!("Loading GPS traces from {}", self.input);
        let model = Model::load(&self.input, &read_opts)?;
        info!("Loaded in {:?}", start.elapsed());

        let start = Instant::now();
        let trace_opts = TraceOptions {
            sample_interval: self.sample_interval,
            window_secs: self.window_secs,
        };
        let trace = OneTrace::build(&model, &trace_opts)?;
        let path = trace.write(&self.output)?;
        info!("Exported {} in {:?}", path.display(), start.elapsed());
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    Args::from_args().run()
}
