//! Polar/cartesian geometry shared by all visual parts.
//!
//! Angles are in degrees, 0° pointing right and positive angles turning
//! clockwise (dial coordinates grow downward). -90° is the top of the dial.

/// Position described as radius + angle-in-degrees relative to the dial center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarPos {
    pub radius: f32,
    pub angle: f32,
}

impl PolarPos {
    pub const fn new(radius: f32, angle: f32) -> Self {
        Self { radius, angle }
    }

    /// Replace both coordinates.
    pub fn set(&mut self, radius: f32, angle: f32) {
        self.radius = radius;
        self.angle = angle;
    }

    /// Replace the radius, keeping the current angle.
    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius;
    }

    pub fn to_cartesian(self) -> CartesianPos {
        let rad = self.angle.to_radians();
        CartesianPos {
            x: self.radius * rad.cos(),
            y: self.radius * rad.sin(),
        }
    }
}

/// Transient (x, y) position, recomputed from polar coordinates each draw.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CartesianPos {
    pub x: f32,
    pub y: f32,
}

impl CartesianPos {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Current widget dimensions, updated on layout.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewSize {
    pub width: f32,
    pub height: f32,
}

impl ViewSize {
    pub fn set(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    pub fn center(self) -> CartesianPos {
        CartesianPos::new(self.width / 2.0, self.height / 2.0)
    }
}
