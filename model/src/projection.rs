use std::str::FromStr;

use anyhow::Result;
use geo::Point;

/// The reference ellipsoid the UTM projection is computed on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Ellipsoid {
    Grs80,
    Wgs84,
}

impl Ellipsoid {
    /// (semi-major axis in meters, inverse flattening)
    fn parameters(self) -> (f64, f64) {
        match self {
            Ellipsoid::Grs80 => (6_378_137.0, 298.257222101),
            Ellipsoid::Wgs84 => (6_378_137.0, 298.257223563),
        }
    }
}

impl FromStr for Ellipsoid {
    type Err = anyhow::Error;

    fn from_str(x: &str) -> Result<Self> {
        match x.to_lowercase().as_str() {
            "grs80" => Ok(Ellipsoid::Grs80),
            "wgs84" => Ok(Ellipsoid::Wgs84),
            _ => bail!("Unknown ellipsoid {}; use grs80 or wgs84", x),
        }
    }
}

const SCALE_FACTOR: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Projects WGS84-ish longitude/latitude onto one UTM zone, producing meters.
#[derive(Clone, Debug, PartialEq)]
pub struct UtmProjection {
    zone: u8,
    south: bool,
    ellipsoid: Ellipsoid,
}

impl Default for UtmProjection {
    /// Dublin sits in zone 29 north.
    fn default() -> Self {
        Self {
            zone: 29,
            south: false,
            ellipsoid: Ellipsoid::Grs80,
        }
    }
}

impl UtmProjection {
    pub fn new(zone: u8, south: bool, ellipsoid: Ellipsoid) -> Result<Self> {
        if zone < 1 || zone > 60 {
            bail!("UTM zone {} isn't in 1..=60", zone);
        }
        Ok(Self {
            zone,
            south,
            ellipsoid,
        })
    }

    pub fn zone(&self) -> u8 {
        self.zone
    }

    fn central_meridian(&self) -> f64 {
        (self.zone as f64) * 6.0 - 183.0
    }

    /// Transverse Mercator using the Krüger series to third order in n. Input ranges aren't
    /// validated; points far from the zone's central meridian just get distorted.
    pub fn project(&self, lon: f64, lat: f64) -> Point {
        let (a, inv_f) = self.ellipsoid.parameters();
        let f = 1.0 / inv_f;
        let n = f / (2.0 - f);
        let n2 = n * n;
        let n3 = n2 * n;
        let big_a = a / (1.0 + n) * (1.0 + n2 / 4.0 + n2 * n2 / 64.0);
        let alpha = [
            n / 2.0 - 2.0 / 3.0 * n2 + 5.0 / 16.0 * n3,
            13.0 / 48.0 * n2 - 3.0 / 5.0 * n3,
            61.0 / 240.0 * n3,
        ];
        // First eccentricity
        let e = 2.0 * n.sqrt() / (1.0 + n);

        let phi = lat.to_radians();
        let d_lambda = (lon - self.central_meridian()).to_radians();

        let sin_phi = phi.sin();
        let t = (sin_phi.atanh() - e * (e * sin_phi).atanh()).sinh();
        let xi = t.atan2(d_lambda.cos());
        let eta = (d_lambda.sin() / (1.0 + t * t).sqrt()).atanh();

        let mut easting = eta;
        let mut northing = xi;
        for (idx, a_j) in alpha.iter().enumerate() {
            let j2 = 2.0 * (idx + 1) as f64;
            easting += a_j * (j2 * xi).cos() * (j2 * eta).sinh();
            northing += a_j * (j2 * xi).sin() * (j2 * eta).cosh();
        }

        let x = FALSE_EASTING + SCALE_FACTOR * big_a * easting;
        let mut y = SCALE_FACTOR * big_a * northing;
        if self.south {
            y += FALSE_NORTHING_SOUTH;
        }
        Point::new(x, y)
    }
}
