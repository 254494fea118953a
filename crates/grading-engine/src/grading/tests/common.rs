use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::config::GradingConfig;
use crate::grading::method::{
    BlockDefinition, ComponentDefinition, GradeDefinition, GradingMethodDefinition,
    GradingMethodDraft, GradingMethodId, OwnerId,
};
use crate::grading::rating::{Rating, RatingId};
use crate::grading::repository::{GradingMethodStore, RatingRepository, RepositoryError};
use crate::grading::{grading_router, GradingService, LeafInput, Operator};

pub(super) fn grade(name: &str, min: f64, max: f64, step: f64) -> ComponentDefinition {
    ComponentDefinition::Grade(GradeDefinition {
        name: name.to_string(),
        min_grade: min,
        max_grade: max,
        step_amount: step,
        default_value: None,
    })
}

pub(super) fn block(
    name: &str,
    children: Vec<ComponentDefinition>,
    operators: Vec<Operator>,
) -> ComponentDefinition {
    ComponentDefinition::Block(BlockDefinition {
        name: name.to_string(),
        children,
        operators,
    })
}

pub(super) fn draft(
    name: &str,
    top_level: Vec<ComponentDefinition>,
    top_level_operators: Vec<Operator>,
) -> GradingMethodDraft {
    GradingMethodDraft {
        name: name.to_string(),
        owner_id: OwnerId("user-1".to_string()),
        is_public: true,
        top_level,
        top_level_operators,
    }
}

/// Single "Lyrics" grade on a 1-10 scale.
pub(super) fn lyrics_draft() -> GradingMethodDraft {
    draft("Lyrics only", vec![grade("Lyrics", 1.0, 10.0, 1.0)], Vec::new())
}

/// Block "Overall" combining grades A and B (both 0-10) with one operator.
pub(super) fn overall_draft(operator: Operator) -> GradingMethodDraft {
    draft(
        "Two part",
        vec![block(
            "Overall",
            vec![grade("A", 0.0, 10.0, 1.0), grade("B", 0.0, 10.0, 1.0)],
            vec![operator],
        )],
        Vec::new(),
    )
}

/// Nested method with a production block, a lyrics grade, and a multiplier.
pub(super) fn album_draft() -> GradingMethodDraft {
    draft(
        "Album deep dive",
        vec![
            block(
                "Production",
                vec![
                    grade("Mixing", 1.0, 10.0, 1.0),
                    grade("Mastering", 1.0, 10.0, 0.5),
                ],
                vec![Operator::Add],
            ),
            grade("Lyrics", 1.0, 10.0, 1.0),
        ],
        vec![Operator::Add],
    )
}

pub(super) fn definition(draft: GradingMethodDraft, id: &str) -> GradingMethodDefinition {
    draft.into_definition(GradingMethodId(id.to_string()))
}

pub(super) fn inputs(values: &[(&str, f64)]) -> Vec<LeafInput> {
    values
        .iter()
        .map(|(path, value)| LeafInput::new(*path, *value))
        .collect()
}

pub(super) fn grading_config() -> GradingConfig {
    GradingConfig::default()
}

pub(super) fn build_service() -> (
    GradingService<MemoryMethodStore, MemoryRatings>,
    Arc<MemoryMethodStore>,
    Arc<MemoryRatings>,
) {
    let methods = Arc::new(MemoryMethodStore::default());
    let ratings = Arc::new(MemoryRatings::default());
    let service = GradingService::new(methods.clone(), ratings.clone(), &grading_config());
    (service, methods, ratings)
}

#[derive(Default, Clone)]
pub(super) struct MemoryMethodStore {
    pub(super) records: Arc<Mutex<HashMap<GradingMethodId, GradingMethodDefinition>>>,
}

impl GradingMethodStore for MemoryMethodStore {
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
pub(super) struct MemoryRatings {
    records: Arc<Mutex<HashMap<RatingId, Rating>>>,
}

impl MemoryRatings {
    pub(super) fn count(&self) -> usize {
        self.records.lock().expect("rating mutex poisoned").len()
    }
}

impl RatingRepository for MemoryRatings {
    fn insert(&self, rating: Rating) -> Result<Rating, RepositoryError> {
        let mut guard = self.records.lock().expect("rating mutex poisoned");
        guard.insert(rating.rating_id.clone(), rating.clone());
        Ok(rating)
    }

    fn fetch(&self, id: &RatingId) -> Result<Option<Rating>, RepositoryError> {
        let guard = self.records.lock().expect("rating mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

pub(super) struct UnavailableStore;

impl GradingMethodStore for UnavailableStore {
    fn insert(
        &self,
        _method: GradingMethodDefinition,
    ) -> Result<GradingMethodDefinition, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(
        &self,
        _id: &GradingMethodId,
    ) -> Result<Option<GradingMethodDefinition>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn public(&self, _limit: usize) -> Result<Vec<GradingMethodDefinition>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) struct ConflictStore;

impl GradingMethodStore for ConflictStore {
    fn insert(
        &self,
        _method: GradingMethodDefinition,
    ) -> Result<GradingMethodDefinition, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn fetch(
        &self,
        _id: &GradingMethodId,
    ) -> Result<Option<GradingMethodDefinition>, RepositoryError> {
        Ok(None)
    }

    fn public(&self, _limit: usize) -> Result<Vec<GradingMethodDefinition>, RepositoryError> {
        Ok(Vec::new())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_with_service(
    service: GradingService<MemoryMethodStore, MemoryRatings>,
) -> axum::Router {
    grading_router(Arc::new(service))
}
