use geo::Point;

/// A running bounding box over projected points. Starts out empty, with inverted extrema.
#[derive(Clone, Debug, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn new() -> Self {
        Self {
            min_x: f64::MAX,
            max_x: f64::MIN,
            min_y: f64::MAX,
            max_y: f64::MIN,
        }
    }

    pub fn update(&mut self, pt: Point) {
        self.min_x = self.min_x.min(pt.x());
        self.max_x = self.max_x.max(pt.x());
        self.min_y = self.min_y.min(pt.y());
        self.max_y = self.max_y.max(pt.y());
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn contains(&self, pt: Point) -> bool {
        !self.is_empty()
            && pt.x() >= self.min_x
            && pt.x() <= self.max_x
            && pt.y() >= self.min_y
            && pt.y() <= self.max_y
    }

    /// Expand outwards so every edge lands on a multiple of `grid`.
    pub fn round_out(&self, grid: f64) -> Bounds {
        Bounds {
            min_x: (self.min_x / grid).floor() * grid,
            max_x: (self.max_x / grid).ceil() * grid,
            min_y: (self.min_y / grid).floor() * grid,
            max_y: (self.max_y / grid).ceil() * grid,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let b = Bounds::new();
        assert!(b.is_empty());
        assert!(!b.contains(Point::new(0.0, 0.0)));
    }

    #[test]
    fn rounds_outwards() {
        let mut b = Bounds::new();
        b.update(Point::new(682_354.7, 5_914_674.4));
        b.update(Point::new(690_001.0, 5_910_000.0));
        let rounded = b.round_out(500.0);
        assert_eq!(rounded.min_x, 682_000.0);
        assert_eq!(rounded.max_x, 690_500.0);
        assert_eq!(rounded.min_y, 5_910_000.0);
        assert_eq!(rounded.max_y, 5_915_000.0);
        assert!(rounded.contains(Point::new(682_354.7, 5_914_674.4)));
        assert_eq!(rounded.width(), 8_500.0);
        assert_eq!(rounded.height(), 5_000.0);
    }

    #[test]
    fn negative_coordinates_round_away_from_zero() {
        let mut b = Bounds::new();
        b.update(Point::new(-10.0, -499.0));
        let rounded = b.round_out(500.0);
        assert_eq!(rounded.min_x, -500.0);
        assert_eq!(rounded.max_x, 0.0);
        assert_eq!(rounded.min_y, -500.0);
        assert_eq!(rounded.max_y, 0.0);
    }
}
