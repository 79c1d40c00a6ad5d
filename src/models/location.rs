use crate::store::Record;
use chrono::{DateTime, Utc};
use uuid::Uuid;

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Location {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub slug: String,
    pub address: String,
    pub city: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Location {
    /// Great-circle distance in kilometres, `None` without coordinates.
    #[must_use]
    pub fn distance_km(&self, latitude: f64, longitude: f64) -> Option<f64> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(haversine_km(latitude, longitude, lat, lon)),
            _ => None,
        }
    }
}

#[must_use]
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

impl Record for Location {
    const KIND: &'static str = "location";
    const TENANT_SCOPED: bool = true;

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant_id(&self) -> Option<Uuid> {
        Some(self.tenant_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_known_distance() {
        // Jakarta (Monas) to Bandung (Gedung Sate), roughly 116 km
        let km = haversine_km(-6.1754, 106.8272, -6.9025, 107.6187);
        assert!((km - 116.0).abs() < 5.0, "got {km}");
        assert!(haversine_km(1.0, 1.0, 1.0, 1.0).abs() < f64::EPSILON);
    }
}
