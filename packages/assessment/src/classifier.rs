//! Crime type classification adapter.

use std::sync::Arc;

use crime_insight_inference::{CrimeTypeModel, InferenceError};
use crime_insight_risk_models::{CrimeType, FeatureVector, GeoPoint};

/// Builds feature vectors and maps classifier ids to [`CrimeType`]s.
#[derive(Clone)]
pub struct CrimeTypeClassifier {
    model: Arc<dyn CrimeTypeModel>,
}

impl std::fmt::Debug for CrimeTypeClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrimeTypeClassifier").finish_non_exhaustive()
    }
}

impl CrimeTypeClassifier {
    /// Wraps a loaded classifier.
    #[must_use]
    pub fn new(model: Arc<dyn CrimeTypeModel>) -> Self {
        Self { model }
    }

    /// Predicts the most likely crime type at `point` during `hour`.
    ///
    /// Class ids outside the label table map to [`CrimeType::Unknown`].
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError`] if the model cannot score the input.
    pub fn classify(&self, point: GeoPoint, hour: u8) -> Result<CrimeType, InferenceError> {
        let features = FeatureVector::with_placeholders(point, hour);
        let class_id = self.model.predict(&features)?;
        let crime_type = CrimeType::from_class_id(class_id);

        if crime_type == CrimeType::Unknown {
            log::warn!("Classifier returned unlabelled class id {class_id}");
        }
        log::debug!("Classified ({point}) at hour {hour} as {crime_type} (id {class_id})");

        Ok(crime_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::FixedClassifier;

    fn point() -> GeoPoint {
        GeoPoint::new(28.6315, 77.2167).unwrap()
    }

    #[test]
    fn maps_every_labelled_id() {
        for expected in CrimeType::labelled() {
            let classifier = CrimeTypeClassifier::new(Arc::new(FixedClassifier(
                expected.class_id(),
            )));
            assert_eq!(classifier.classify(point(), 22).unwrap(), *expected);
        }
    }

    #[test]
    fn unknown_id_maps_to_unknown() {
        let classifier = CrimeTypeClassifier::new(Arc::new(FixedClassifier(Some(99))));
        assert_eq!(classifier.classify(point(), 3).unwrap(), CrimeType::Unknown);
    }

    #[test]
    fn model_failure_propagates() {
        let classifier = CrimeTypeClassifier::new(Arc::new(FixedClassifier(None)));
        assert!(classifier.classify(point(), 3).is_err());
    }
}
