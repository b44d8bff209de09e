use serde::{Deserialize, Serialize};

/// Geolocation captured with a record or photo in the field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, String> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(format!("Latitude out of range: {latitude}"));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(format!("Longitude out of range: {longitude}"));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_coordinates() {
        assert!(GeoPoint::new(-23.55, -46.63).is_ok());
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        assert!(GeoPoint::new(91.0, 0.0).is_err());
    }

    #[test]
    fn rejects_out_of_range_longitude() {
        assert!(GeoPoint::new(0.0, -181.0).is_err());
    }
}
