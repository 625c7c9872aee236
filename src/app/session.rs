// PropVal - app/session.rs
//
// Request boundary. One `EstimationSession` serves any number of
// concurrent requests against the shared dataset.
//
// Request flow:
//   validate inputs -> require a loaded dataset -> geocode -> build the
//   subject -> run the valuation pipeline on demand via
//   `Estimation::outcome`.
//
// Every failure is a `RequestError`: it is logged here and returned to the
// caller, and the session stays usable for the next request.

use crate::app::geocode::Geocoder;
use crate::app::request::EstimateRequest;
use crate::app::store::DatasetStore;
use crate::core::estimate::{self, EstimateOutcome};
use crate::core::model::{Dataset, EstimationConfig, SubjectProperty};
use crate::util::error::RequestError;
use std::sync::Arc;

/// Shared entry point for estimation requests.
pub struct EstimationSession {
    store: Arc<DatasetStore>,
    geocoder: Arc<dyn Geocoder>,
    config: EstimationConfig,
}

impl EstimationSession {
    pub fn new(store: Arc<DatasetStore>, geocoder: Arc<dyn Geocoder>, config: EstimationConfig) -> Self {
        Self {
            store,
            geocoder,
            config,
        }
    }

    pub fn config(&self) -> &EstimationConfig {
        &self.config
    }

    /// Validate and resolve a request into a runnable estimation.
    pub fn submit(&self, request: EstimateRequest) -> Result<Estimation, RequestError> {
        let result = self.prepare(request);
        if let Err(ref e) = result {
            tracing::warn!(error = %e, "Estimation request rejected");
        }
        result
    }

    fn prepare(&self, request: EstimateRequest) -> Result<Estimation, RequestError> {
        request.validate()?;
        let dataset = self.store.dataset()?;

        let query = request.query();
        tracing::debug!(query = %query, "Geocoding address");
        let Some(location) = self.geocoder.resolve(&query)? else {
            return Err(RequestError::AddressNotFound { query });
        };

        let subject = request.into_subject(location);
        tracing::info!(
            property_type = %subject.property_type,
            living_area = subject.living_area,
            rooms = %subject.rooms.label(),
            radius_km = subject.radius_km,
            latitude = location.latitude,
            longitude = location.longitude,
            "Estimation request accepted"
        );

        Ok(Estimation {
            dataset,
            subject,
            config: self.config.clone(),
        })
    }
}

/// A validated, geocoded request bound to the dataset it will run against.
#[derive(Debug, Clone)]
pub struct Estimation {
    dataset: Arc<Dataset>,
    subject: SubjectProperty,
    config: EstimationConfig,
}

impl Estimation {
    pub fn subject(&self) -> &SubjectProperty {
        &self.subject
    }

    pub fn config(&self) -> &EstimationConfig {
        &self.config
    }

    /// The dataset snapshot this estimation searches.
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Run the valuation pipeline. Comparables borrow from the dataset held
    /// by this estimation.
    pub fn outcome(&self) -> EstimateOutcome<'_> {
        estimate::run(&self.dataset.records, &self.subject, &self.config)
    }
}
