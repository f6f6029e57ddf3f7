use std::fmt;

use serde::{Deserialize, Serialize};

/// A position plus orientation, optionally bound to a named world.
///
/// Locations are plain values; every hand-off clones, so callers can never
/// mutate a stored location through a returned one.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world: Option<String>,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub pitch: f32,
}

impl Location {
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: Some(world.into()),
            x,
            y,
            z,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    pub fn with_rotation(mut self, yaw: f32, pitch: f32) -> Self {
        self.yaw = yaw;
        self.pitch = pitch;
        self
    }
}

/// `x, y, z; yaw=<yaw>/pitch=<pitch>`, followed by ` in world=<name>` when bound to a world.
impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.3}, {:.5}, {:.3}; yaw={:.1}/pitch={:.1}",
            self.x, self.y, self.z, self.yaw, self.pitch
        )?;
        if let Some(world) = &self.world {
            write!(f, " in world={}", world)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_world_when_present() {
        let location = Location::new("arena", 1.0, 64.0, -3.5).with_rotation(90.0, 10.0);
        assert_eq!(
            location.to_string(),
            "1.000, 64.00000, -3.500; yaw=90.0/pitch=10.0 in world=arena"
        );

        let unbound = Location {
            world: None,
            ..location
        };
        assert!(!unbound.to_string().contains("world="));
    }

    #[test]
    fn missing_rotation_defaults_to_zero() {
        let location: Location = serde_json::from_str(r#"{"x":1.0,"y":2.0,"z":3.0}"#).unwrap();
        assert_eq!(location.yaw, 0.0);
        assert_eq!(location.pitch, 0.0);
        assert!(location.world.is_none());
    }
}
