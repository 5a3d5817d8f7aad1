//! Location Model

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, ErrorCode};

/// Office location with a geofence radius
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// Geofence radius in metres
    pub radius_m: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationCreate {
    pub name: String,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_m: Option<i32>,
}

/// Check the coordinate and radius invariants
pub fn validate_geofence(latitude: f64, longitude: f64, radius_m: i32) -> AppResult<()> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(
            AppError::with_message(ErrorCode::ValueOutOfRange, "latitude must be within [-90, 90]")
                .with_detail("field", "latitude"),
        );
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "longitude must be within [-180, 180]",
        )
        .with_detail("field", "longitude"));
    }
    if radius_m <= 0 {
        return Err(
            AppError::with_message(ErrorCode::ValueOutOfRange, "radius must be greater than 0")
                .with_detail("field", "radius_m"),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_geofence() {
        assert!(validate_geofence(-6.2, 106.8, 100).is_ok());
        assert!(validate_geofence(90.0, -180.0, 1).is_ok());
        assert!(validate_geofence(90.1, 0.0, 1).is_err());
        assert!(validate_geofence(0.0, 181.0, 1).is_err());
        let err = validate_geofence(0.0, 0.0, 0).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);
    }
}
