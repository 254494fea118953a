use grading_engine::grading::{
    GradingMethodDefinition, GradingMethodId, GradingMethodStore, Rating, RatingId,
    RatingRepository, RepositoryError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Method store keyed by id, so listings come back in authoring order.
#[derive(Default, Clone)]
pub(crate) struct InMemoryGradingMethodStore {
    records: Arc<Mutex<BTreeMap<GradingMethodId, GradingMethodDefinition>>>,
}

impl GradingMethodStore for InMemoryGradingMethodStore {
    fn insert(
        &self,
        method: GradingMethodDefinition,
    ) -> Result<GradingMethodDefinition, RepositoryError> {
        let mut guard = self.records.lock().expect("method store mutex poisoned");
        if guard.contains_key(&method.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(method.id.clone(), method.clone());
        Ok(method)
    }

    fn fetch(
        &self,
        id: &GradingMethodId,
    ) -> Result<Option<GradingMethodDefinition>, RepositoryError> {
        let guard = self.records.lock().expect("method store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn public(&self, limit: usize) -> Result<Vec<GradingMethodDefinition>, RepositoryError> {
        let guard = self.records.lock().expect("method store mutex poisoned");
        Ok(guard
            .values()
            .filter(|method| method.is_public)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryRatingRepository {
    records: Arc<Mutex<BTreeMap<RatingId, Rating>>>,
}

impl RatingRepository for InMemoryRatingRepository {
    fn insert(&self, rating: Rating) -> Result<Rating, RepositoryError> {
        let mut guard = self.records.lock().expect("rating mutex poisoned");
        if guard.contains_key(&rating.rating_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(rating.rating_id.clone(), rating.clone());
        Ok(rating)
    }

    fn fetch(&self, id: &RatingId) -> Result<Option<Rating>, RepositoryError> {
        let guard = self.records.lock().expect("rating mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

impl InMemoryRatingRepository {
    pub(crate) fn len(&self) -> usize {
        self.records.lock().expect("rating mutex poisoned").len()
    }
}
