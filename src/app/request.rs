// PropVal - app/request.rs
//
// Raw estimation request as entered by the user, and its validation into a
// `SubjectProperty`. Validation failures name the offending field.

use crate::core::model::{GeoPoint, RoomSelection, SubjectProperty};
use crate::util::constants;
use crate::util::error::RequestError;

/// Form inputs for one estimation.
#[derive(Debug, Clone, Default)]
pub struct EstimateRequest {
    pub street: String,
    pub postal_code: String,
    pub city: String,

    pub property_type: String,

    /// Living area in m².
    pub living_area: f64,

    /// Selected room counts; empty means any. 6 stands for "6 or more".
    pub rooms: Vec<u32>,

    /// Land area in m², if the user entered one.
    pub land_area: Option<f64>,

    pub radius_km: f64,
}

fn invalid(field: &'static str, reason: &str) -> RequestError {
    RequestError::Validation {
        field,
        reason: reason.to_string(),
    }
}

impl EstimateRequest {
    /// Check every input, reporting the first invalid field.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.street.trim().is_empty() {
            return Err(invalid("street", "address is required"));
        }
        if self.postal_code.trim().is_empty() {
            return Err(invalid("postal_code", "postal code is required"));
        }
        if self.city.trim().is_empty() {
            return Err(invalid("city", "city is required"));
        }
        if self.property_type.trim().is_empty() {
            return Err(invalid("property_type", "property type is required"));
        }
        if !(self.living_area.is_finite() && self.living_area > 0.0) {
            return Err(invalid("living_area", "must be a number greater than zero"));
        }
        if !(self.radius_km.is_finite() && self.radius_km > 0.0) {
            return Err(invalid("radius_km", "must be a number greater than zero"));
        }
        if let Some(&bad) = self
            .rooms
            .iter()
            .find(|&&r| !(constants::MIN_ROOM_SELECTION..=constants::ROOMS_OR_MORE).contains(&r))
        {
            return Err(RequestError::Validation {
                field: "rooms",
                reason: format!(
                    "{bad} is not a valid choice ({}..={})",
                    constants::MIN_ROOM_SELECTION,
                    constants::ROOMS_OR_MORE
                ),
            });
        }
        if let Some(land) = self.land_area {
            if !(land.is_finite() && land >= 0.0) {
                return Err(invalid("land_area", "must be zero or a positive number"));
            }
        }
        Ok(())
    }

    /// Free-text query sent to the geocoder: "street postal_code city".
    pub fn query(&self) -> String {
        [self.street.trim(), self.postal_code.trim(), self.city.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Build the subject once coordinates are known. Assumes `validate` passed.
    pub fn into_subject(self, location: GeoPoint) -> SubjectProperty {
        SubjectProperty {
            property_type: self.property_type.trim().to_string(),
            living_area: self.living_area,
            rooms: self.rooms.into_iter().collect::<RoomSelection>(),
            land_area: self.land_area.filter(|a| *a > 0.0),
            radius_km: self.radius_km,
            location,
        }
    }
}
