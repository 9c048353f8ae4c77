use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::catalog::GroupCategory;
use crate::fusion::ResolvedObject;
use crate::propagate::adapter::StateVector;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PropagatedPosition {
    pub catalog_id: u32,
    pub name: String,
    pub international_id: String,
    /// Id of the group that owns this object.
    pub group: String,
    #[schema(value_type = String)]
    pub category: GroupCategory,
    /// TEME position, km.
    #[schema(value_type = Vec<f64>)]
    pub position_km: [f64; 3],
    /// TEME velocity, km/s.
    #[schema(value_type = Vec<f64>)]
    pub velocity_km_s: [f64; 3],
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
    pub timestamp: DateTime<Utc>,
}

impl PropagatedPosition {
    pub fn new(object: &ResolvedObject<'_>, state: StateVector, timestamp: DateTime<Utc>) -> Self {
        Self {
            catalog_id: object.element_set.catalog_id,
            name: object.element_set.name.clone(),
            international_id: object.element_set.international_id.clone(),
            group: object.group.id.clone(),
            category: object.group.category,
            position_km: state.position_km,
            velocity_km_s: state.velocity_km_s,
            latitude_deg: state.geodetic.latitude_deg,
            longitude_deg: state.geodetic.longitude_deg,
            altitude_km: state.geodetic.altitude_km,
            timestamp,
        }
    }
}
