//! Distance-ordered location lookup.

use crate::{
    error::Error,
    models::Location,
    store::{LocationStore, TenantScope},
};

#[derive(Clone, Debug, PartialEq)]
pub struct NearbyLocation {
    pub location: Location,
    pub distance_km: f64,
}

/// Locations in scope that have coordinates, nearest first.
///
/// # Errors
/// `Validation` for coordinates outside the valid range, `Internal` on storage failure.
pub async fn nearby(
    store: &dyn LocationStore,
    scope: TenantScope,
    latitude: f64,
    longitude: f64,
) -> Result<Vec<NearbyLocation>, Error> {
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(Error::Validation(
            "latitude or longitude out of range".to_string(),
        ));
    }

    let mut nearby: Vec<NearbyLocation> = store
        .find_with_coordinates(scope)
        .await?
        .into_iter()
        .filter_map(|location| {
            let distance_km = location.distance_km(latitude, longitude)?;
            Some(NearbyLocation {
                location,
                distance_km,
            })
        })
        .collect();

    nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

    Ok(nearby)
}
