use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::catalog::ElementSet;
use crate::propagate::frames::{
    ecef_to_geodetic, norm, sidereal_time, teme_to_ecef_position, Geodetic,
};

/// Mean Earth radius; anything closer to the centre has decayed.
pub const EARTH_RADIUS_KM: f64 = 6371.0;
/// Radii beyond this come from broken or stale element sets.
pub const MAX_RADIUS_KM: f64 = 100_000.0;

#[derive(Debug, Error, PartialEq)]
pub enum Rejection {
    #[error("propagation failed: {0}")]
    Propagation(String),
    #[error("non-finite state vector")]
    NonFinite,
    #[error("geocentric radius {0:.1} km out of range")]
    RadiusOutOfRange(f64),
    #[error("non-finite geodetic coordinates")]
    InvalidGeodetic,
}

/// Position (km) and velocity (km/s) in TEME as produced by the model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawState {
    pub position_km: [f64; 3],
    pub velocity_km_s: [f64; 3],
}

/// The numerical propagation step.
pub trait AnalyticalModel: Send + Sync {
    fn state_at(&self, element_set: &ElementSet, at: DateTime<Utc>) -> Result<RawState, Rejection>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sgp4Model;

impl AnalyticalModel for Sgp4Model {
    fn state_at(&self, element_set: &ElementSet, at: DateTime<Utc>) -> Result<RawState, Rejection> {
        let minutes = element_set
            .elements
            .datetime_to_minutes_since_epoch(&at.naive_utc())
            .map_err(|e| Rejection::Propagation(e.to_string()))?;

        let prediction = element_set
            .constants
            .propagate(minutes)
            .map_err(|e| Rejection::Propagation(e.to_string()))?;

        Ok(RawState {
            position_km: prediction.position,
            velocity_km_s: prediction.velocity,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVector {
    pub position_km: [f64; 3],
    pub velocity_km_s: [f64; 3],
    pub geodetic: Geodetic,
}

/// Runs a model and screens its output before anything is published.
#[derive(Debug, Clone, Default)]
pub struct PropagatorAdapter<M = Sgp4Model> {
    model: M,
}

impl<M: AnalyticalModel> PropagatorAdapter<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    pub fn propagate_one(
        &self,
        element_set: &ElementSet,
        at: DateTime<Utc>,
    ) -> Result<StateVector, Rejection> {
        let raw = self.model.state_at(element_set, at)?;
        check_state(&raw)?;

        let ecef = teme_to_ecef_position(raw.position_km, sidereal_time(at));
        let geodetic = ecef_to_geodetic(ecef);
        if !geodetic.is_finite() {
            return Err(Rejection::InvalidGeodetic);
        }

        Ok(StateVector {
            position_km: raw.position_km,
            velocity_km_s: raw.velocity_km_s,
            geodetic,
        })
    }
}

pub fn check_state(raw: &RawState) -> Result<(), Rejection> {
    let finite = raw
        .position_km
        .iter()
        .chain(raw.velocity_km_s.iter())
        .all(|v| v.is_finite());
    if !finite {
        return Err(Rejection::NonFinite);
    }

    let radius = norm(raw.position_km);
    if !(EARTH_RADIUS_KM..=MAX_RADIUS_KM).contains(&radius) {
        return Err(Rejection::RadiusOutOfRange(radius));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::{element_sets, fixture_epoch};

    struct FixedModel(RawState);

    impl AnalyticalModel for FixedModel {
        fn state_at(&self, _: &ElementSet, _: DateTime<Utc>) -> Result<RawState, Rejection> {
            Ok(self.0)
        }
    }

    fn at_radius(radius: f64) -> RawState {
        RawState {
            position_km: [radius, 0.0, 0.0],
            velocity_km_s: [0.0, 7.5, 0.0],
        }
    }

    #[test]
    fn sgp4_state_at_epoch_is_low_earth_orbit() {
        let sets = element_sets(&[25544], "ISS");
        let adapter = PropagatorAdapter::new(Sgp4Model);

        let state = adapter.propagate_one(&sets[0], fixture_epoch()).unwrap();

        let radius = norm(state.position_km);
        assert!((6600.0..6900.0).contains(&radius), "radius {}", radius);
        assert!((7.0..8.0).contains(&norm(state.velocity_km_s)));
        assert!(state.geodetic.latitude_deg.abs() <= 52.0);
        assert!((300.0..500.0).contains(&state.geodetic.altitude_km));
    }

    #[test]
    fn sgp4_handles_times_away_from_epoch() {
        let sets = element_sets(&[25544], "ISS");
        let adapter = PropagatorAdapter::new(Sgp4Model);
        let later = fixture_epoch() + chrono::Duration::hours(6);

        assert!(adapter.propagate_one(&sets[0], later).is_ok());
    }

    #[test]
    fn rejects_non_finite_output() {
        let sets = element_sets(&[1], "X");
        let mut raw = at_radius(7000.0);
        raw.velocity_km_s[1] = f64::NAN;
        let adapter = PropagatorAdapter::new(FixedModel(raw));

        assert_eq!(
            adapter.propagate_one(&sets[0], fixture_epoch()),
            Err(Rejection::NonFinite)
        );

        let adapter = PropagatorAdapter::new(FixedModel(at_radius(f64::INFINITY)));
        assert_eq!(
            adapter.propagate_one(&sets[0], fixture_epoch()),
            Err(Rejection::NonFinite)
        );
    }

    #[test]
    fn rejects_radius_outside_bounds() {
        let sets = element_sets(&[1], "X");

        for radius in [0.0, 6000.0, 100_001.0, 400_000.0] {
            let adapter = PropagatorAdapter::new(FixedModel(at_radius(radius)));
            assert!(matches!(
                adapter.propagate_one(&sets[0], fixture_epoch()),
                Err(Rejection::RadiusOutOfRange(_))
            ));
        }

        for radius in [6371.0, 42_164.0, 100_000.0] {
            let adapter = PropagatorAdapter::new(FixedModel(at_radius(radius)));
            assert!(adapter.propagate_one(&sets[0], fixture_epoch()).is_ok());
        }
    }
}
