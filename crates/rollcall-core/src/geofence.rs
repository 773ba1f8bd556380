//! Geofence: the circular region a student must report coordinates inside.
//!
//! The configuration record is a singleton managed by an administrator. Its
//! fields may be individually absent; such a record is "partial" and cannot be
//! evaluated.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS-84 point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
  pub latitude:  f64,
  pub longitude: f64,
}

impl Coordinates {
  pub fn new(latitude: f64, longitude: f64) -> Self {
    Self { latitude, longitude }
  }

  /// Reject non-finite values and values outside the valid degree ranges.
  pub fn validate(&self) -> Result<()> {
    if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
      return Err(Error::InvalidCoordinates(format!(
        "latitude {} out of range",
        self.latitude
      )));
    }
    if !self.longitude.is_finite()
      || !(-180.0..=180.0).contains(&self.longitude)
    {
      return Err(Error::InvalidCoordinates(format!(
        "longitude {} out of range",
        self.longitude
      )));
    }
    Ok(())
  }
}

/// Great-circle distance between two points, in meters.
pub fn haversine_m(a: Coordinates, b: Coordinates) -> f64 {
  let d_lat = (b.latitude - a.latitude).to_radians();
  let d_lng = (b.longitude - a.longitude).to_radians();
  let h = (d_lat / 2.0).sin().powi(2)
    + a.latitude.to_radians().cos()
      * b.latitude.to_radians().cos()
      * (d_lng / 2.0).sin().powi(2);
  let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
  EARTH_RADIUS_M * c
}

// ─── Configuration record ────────────────────────────────────────────────────

/// The stored geofence record, possibly partial.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeofenceConfig {
  pub latitude:  Option<f64>,
  pub longitude: Option<f64>,
  pub radius_m:  Option<f64>,
}

/// Returned by [`GeofenceConfig::complete`] when a field is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigIncomplete;

impl GeofenceConfig {
  /// Validate the fields that are present.
  pub fn validate(&self) -> Result<()> {
    if let (Some(lat), Some(lng)) = (self.latitude, self.longitude) {
      Coordinates::new(lat, lng).validate()?;
    } else if let Some(lat) = self.latitude {
      Coordinates::new(lat, 0.0).validate()?;
    } else if let Some(lng) = self.longitude {
      Coordinates::new(0.0, lng).validate()?;
    }
    if let Some(r) = self.radius_m
      && (!r.is_finite() || r < 0.0)
    {
      return Err(Error::InvalidCoordinates(format!("radius {r} is negative")));
    }
    Ok(())
  }

  pub fn complete(&self) -> Result<Geofence, ConfigIncomplete> {
    match (self.latitude, self.longitude, self.radius_m) {
      (Some(latitude), Some(longitude), Some(radius_m)) => Ok(Geofence {
        center: Coordinates { latitude, longitude },
        radius_m,
      }),
      _ => Err(ConfigIncomplete),
    }
  }
}

// ─── Evaluator ───────────────────────────────────────────────────────────────

/// A fully specified circular admissible region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geofence {
  pub center:   Coordinates,
  pub radius_m: f64,
}

impl Geofence {
  pub fn distance_m(&self, point: Coordinates) -> f64 {
    haversine_m(self.center, point)
  }

  /// The boundary is inclusive.
  pub fn within_radius(&self, point: Coordinates) -> bool {
    self.distance_m(point) <= self.radius_m
  }
}
