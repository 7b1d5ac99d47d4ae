//! Detector geometry: vertices and the sensor position lookup.

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Speed of light in water [cm/ns], used for time-of-flight subtraction.
pub const C_WATER: f32 = 21.5833;

/// A point in detector coordinates [cm].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vertex {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
    /// Z coordinate.
    pub z: f32,
}

impl Vertex {
    /// Creates a new vertex.
    #[inline]
    #[must_use]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Returns the coordinates as an array.
    #[inline]
    #[must_use]
    pub fn as_array(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Distance to another point [cm].
    #[inline]
    #[must_use]
    pub fn distance_to(&self, other: [f32; 3]) -> f32 {
        let dx = self.x - other[0];
        let dy = self.y - other[1];
        let dz = self.z - other[2];
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl From<[f32; 3]> for Vertex {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// Read-only sensor position lookup.
///
/// Implementations must be total over every sensor id that appears in
/// the input hit stream. The table is shared, immutable state; per-event
/// processing never mutates it.
pub trait SensorGeometry: Send + Sync {
    /// Number of sensors in the table.
    fn len(&self) -> usize;

    /// Returns true if the table holds no sensors.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position of the sensor with the given id, if known.
    fn position(&self, sensor_id: u32) -> Option<[f32; 3]>;

    /// Position of the sensor with the given id, as a typed error on miss.
    ///
    /// # Errors
    /// [`Error::SensorIdOutOfRange`] for ids outside the table.
    fn position_checked(&self, sensor_id: u32) -> Result<[f32; 3]> {
        self.position(sensor_id)
            .ok_or_else(|| Error::SensorIdOutOfRange {
                sensor_id,
                table_size: self.len(),
            })
    }
}

/// Sensor geometry backed by a dense position table indexed by sensor id.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StaticGeometry {
    positions: Vec<[f32; 3]>,
}

impl StaticGeometry {
    /// Builds a geometry from a dense position table.
    ///
    /// # Errors
    /// [`Error::EmptyGeometry`] if the table is empty.
    pub fn new(positions: Vec<[f32; 3]>) -> Result<Self> {
        if positions.is_empty() {
            return Err(Error::EmptyGeometry);
        }
        Ok(Self { positions })
    }
}

impl SensorGeometry for StaticGeometry {
    fn len(&self) -> usize {
        self.positions.len()
    }

    fn position(&self, sensor_id: u32) -> Option<[f32; 3]> {
        self.positions.get(sensor_id as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_vertex_distance() {
        let v = Vertex::new(0.0, 0.0, 0.0);
        assert_relative_eq!(v.distance_to([3.0, 4.0, 0.0]), 5.0);
    }

    #[test]
    fn test_static_geometry_lookup() {
        let geometry = StaticGeometry::new(vec![[0.0, 0.0, 0.0], [100.0, 0.0, 0.0]]).unwrap();
        assert_eq!(geometry.len(), 2);
        assert_eq!(geometry.position(1), Some([100.0, 0.0, 0.0]));
        assert_eq!(geometry.position(2), None);
        assert!(matches!(
            geometry.position_checked(5),
            Err(Error::SensorIdOutOfRange {
                sensor_id: 5,
                table_size: 2
            })
        ));
    }

    #[test]
    fn test_empty_geometry_rejected() {
        assert!(matches!(
            StaticGeometry::new(Vec::new()),
            Err(Error::EmptyGeometry)
        ));
    }
}
