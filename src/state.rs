use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::{
    form::{build_form, FeatureForm},
    schema::FeatureSchema,
    views::{HyperParameters, ModelInfo, ModelSummary, Prediction, TrainResults},
};

/// A successfully fetched and reshaped response.
#[derive(Debug, Clone)]
pub enum DashboardEvent {
    Summary(ModelSummary),
    InputFeatures(FeatureSchema),
    TrainResults(TrainResults),
    Prediction(Prediction),
}

/// An event tagged with the scope of the view that requested it.
#[derive(Debug)]
pub struct ScopedEvent {
    pub scope: CancellationToken,
    pub event: DashboardEvent,
}

/// Everything the views display. Each slot is replaced wholesale by the
/// fetch that owns it and is `None` until that fetch first succeeds.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    pub model_info: Option<ModelInfo>,
    pub hyper_parameters: Option<HyperParameters>,
    /// Raw schema, kept next to the form to list valid levels.
    pub input_features: Option<FeatureSchema>,
    pub form: Option<FeatureForm>,
    pub train_results: Option<TrainResults>,
    pub prediction: Option<Prediction>,
}

impl DashboardState {
    /// Replaces the slot owned by `event`.
    pub fn apply(&mut self, event: DashboardEvent) {
        match event {
            DashboardEvent::Summary(summary) => {
                self.model_info = Some(summary.info);
                self.hyper_parameters = Some(summary.hyper_parameters);
            }
            DashboardEvent::InputFeatures(schema) => {
                self.form = Some(build_form(&schema));
                self.input_features = Some(schema);
            }
            DashboardEvent::TrainResults(results) => {
                self.train_results = Some(results);
            }
            DashboardEvent::Prediction(prediction) => {
                self.prediction = Some(prediction);
            }
        }
    }

    /// Applies `event` unless the view that asked for it is gone.
    ///
    /// # Returns
    /// Whether the event was applied.
    pub fn apply_scoped(&mut self, event: ScopedEvent) -> bool {
        if event.scope.is_cancelled() {
            log::debug!("discarding {:?} from a cancelled scope", kind(&event.event));
            return false;
        }

        self.apply(event.event);
        true
    }
}

fn kind(event: &DashboardEvent) -> &'static str {
    match event {
        DashboardEvent::Summary(_) => "model info",
        DashboardEvent::InputFeatures(_) => "input features",
        DashboardEvent::TrainResults(_) => "train results",
        DashboardEvent::Prediction(_) => "prediction",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::form::FormValue;

    fn schema() -> FeatureSchema {
        FeatureSchema::from_json(json!({
            "age": { "class": ["numeric"], "mean": 30 },
            "sex": { "class": ["factor"], "levels": ["male", "female"] },
        }))
        .unwrap()
    }

    #[test]
    fn test_input_features_build_form_and_keep_schema() {
        let mut state = DashboardState::default();
        state.apply(DashboardEvent::InputFeatures(schema()));

        assert_eq!(state.input_features, Some(schema()));
        let form = state.form.as_ref().unwrap();
        assert_eq!(form.get("age").unwrap().value, FormValue::Numeric(30.0));
    }

    #[test]
    fn test_refetch_rebuilds_form_wholesale() {
        let mut state = DashboardState::default();
        state.apply(DashboardEvent::InputFeatures(schema()));
        state.form.as_mut().unwrap().set_text("age", "99").unwrap();

        state.apply(DashboardEvent::InputFeatures(schema()));
        let form = state.form.as_ref().unwrap();
        assert_eq!(form.get("age").unwrap().value, FormValue::Numeric(30.0));
    }

    #[test]
    fn test_events_touch_only_their_slot() {
        let mut state = DashboardState::default();
        state.apply(DashboardEvent::Prediction(Prediction(json!(1))));
        state.apply(DashboardEvent::TrainResults(
            TrainResults::from_json(json!([{"Metric": "RMSE", "Value": 0.5}])).unwrap(),
        ));

        assert_eq!(state.prediction, Some(Prediction(json!(1))));
        assert!(state.model_info.is_none());
        assert!(state.form.is_none());
    }

    #[test]
    fn test_cancelled_scope_is_discarded() {
        let mut state = DashboardState::default();
        let scope = CancellationToken::new();
        scope.cancel();

        let applied = state.apply_scoped(ScopedEvent {
            scope,
            event: DashboardEvent::Prediction(Prediction(json!(3))),
        });

        assert!(!applied);
        assert!(state.prediction.is_none());
    }

    #[test]
    fn test_state_serializes_with_camel_case_slots() {
        let mut state = DashboardState::default();
        state.apply(DashboardEvent::Summary(
            ModelSummary::from_json(json!({"a": [1], "hyperParameters": [{"x": 2}]})).unwrap(),
        ));

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["modelInfo"], json!({"a": 1}));
        assert_eq!(value["hyperParameters"], json!({"x": 2}));
        assert_eq!(value["prediction"], json!(null));
    }
}
