//! Display-ready reshaping of the metadata and prediction responses.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{
    api::{MODEL_INFO_PATH, PREDICT_PATH, TRAIN_RESULTS_PATH},
    error::{DashboardError, Result},
    schema::coerce_number,
};

const HYPER_PARAMETERS_KEY: &str = "hyperParameters";

/// Model summary fields, one scalar each.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ModelInfo(pub Map<String, Value>);

/// Hyperparameter name to value.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct HyperParameters(pub Map<String, Value>);

/// The `/modelInfo` response split into its two display sections.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ModelSummary {
    pub info: ModelInfo,
    pub hyper_parameters: HyperParameters,
}

impl ModelSummary {
    /// Unwraps every array-valued field to its first element and pulls the
    /// `hyperParameters` mapping out into its own section.
    ///
    /// # Errors
    /// Returns `Malformed` if the body is not an object.
    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Object(fields) = value else {
            return Err(DashboardError::Malformed {
                path: MODEL_INFO_PATH,
                msg: format!("expected an object, got {value}"),
            });
        };

        let mut info = Map::new();
        let mut hyper_parameters = Map::new();

        for (key, field) in fields {
            if key == HYPER_PARAMETERS_KEY {
                hyper_parameters = match field {
                    Value::Array(items) => match items.into_iter().next() {
                        Some(Value::Object(params)) => params,
                        _ => Map::new(),
                    },
                    Value::Object(params) => params,
                    _ => Map::new(),
                };
                continue;
            }

            match field {
                Value::Array(items) => {
                    if let Some(first) = items.into_iter().next() {
                        info.insert(key, first);
                    }
                }
                scalar => {
                    info.insert(key, scalar);
                }
            }
        }

        Ok(Self {
            info: ModelInfo(info),
            hyper_parameters: HyperParameters(hyper_parameters),
        })
    }
}

/// Metric name to value, in the order the metrics were reported.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrainResults {
    metrics: Vec<(String, f64)>,
}

impl TrainResults {
    /// Indexes a `[{Metric, Value}, ...]` sequence on `Metric`. A repeated
    /// metric keeps its first position and its last value.
    ///
    /// # Errors
    /// Returns `Malformed` if the body is not an array.
    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Array(records) = value else {
            return Err(DashboardError::Malformed {
                path: TRAIN_RESULTS_PATH,
                msg: format!("expected an array, got {value}"),
            });
        };

        let mut results = Self::default();
        for record in &records {
            let Some(metric) = record.get("Metric") else {
                log::debug!("skipping train result without a Metric: {record}");
                continue;
            };
            results.insert(display_value(metric), coerce_number(record.get("Value")));
        }

        Ok(results)
    }

    fn insert(&mut self, metric: String, value: f64) {
        match self.metrics.iter_mut().find(|(m, _)| *m == metric) {
            Some((_, slot)) => *slot = value,
            None => self.metrics.push((metric, value)),
        }
    }

    pub fn get(&self, metric: &str) -> Option<f64> {
        self.metrics
            .iter()
            .find(|(m, _)| m == metric)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.metrics.iter().map(|(m, v)| (m.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

impl Serialize for TrainResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// The single value returned by the serving endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Prediction(pub Value);

impl Prediction {
    /// Takes the first element of the `/predict` response array.
    ///
    /// # Errors
    /// Returns `Malformed` for a non-array or empty body.
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .next()
                .map(Self)
                .ok_or_else(|| DashboardError::Malformed {
                    path: PREDICT_PATH,
                    msg: "empty prediction array".into(),
                }),
            other => Err(DashboardError::Malformed {
                path: PREDICT_PATH,
                msg: format!("expected an array, got {other}"),
            }),
        }
    }
}

impl std::fmt::Display for Prediction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&display_value(&self.0))
    }
}

/// Text for a JSON value in a table cell: strings unquoted, arrays joined.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// `"Unknown"` for a missing value, the first element of an array, or the
/// value itself.
pub fn first_if_exists(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "Unknown".into(),
        Some(Value::Array(items)) => items.first().map(display_value).unwrap_or_default(),
        Some(other) => display_value(other),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_model_info_splits_hyper_parameters() {
        let summary = ModelSummary::from_json(json!({"a": [1], "hyperParameters": [{"x": 2}]}))
            .unwrap();

        assert_eq!(serde_json::to_value(&summary.info).unwrap(), json!({"a": 1}));
        assert_eq!(
            serde_json::to_value(&summary.hyper_parameters).unwrap(),
            json!({"x": 2})
        );
    }

    #[test]
    fn test_model_info_edge_shapes() {
        let summary = ModelSummary::from_json(json!({
            "algorithm": ["gbm", "ignored"],
            "empty": [],
            "version": "1.2",
            "hyperParameters": { "depth": 3 },
        }))
        .unwrap();

        assert_eq!(
            serde_json::to_value(&summary.info).unwrap(),
            json!({"algorithm": "gbm", "version": "1.2"})
        );
        assert_eq!(summary.hyper_parameters.0.get("depth"), Some(&json!(3)));

        let keys: Vec<_> = summary.info.0.keys().collect();
        assert_eq!(keys, ["algorithm", "version"]);
    }

    #[test]
    fn test_model_info_rejects_array_body() {
        let err = ModelSummary::from_json(json!([1])).unwrap_err();
        assert!(matches!(err, DashboardError::Malformed { .. }));
    }

    #[test]
    fn test_train_results_reduction() {
        let results = TrainResults::from_json(json!([
            {"Metric": "RMSE", "Value": 0.5},
            {"Metric": "R2", "Value": 0.9},
        ]))
        .unwrap();

        assert_eq!(
            serde_json::to_value(&results).unwrap(),
            json!({"RMSE": 0.5, "R2": 0.9})
        );
        assert_eq!(results.get("R2"), Some(0.9));
    }

    #[test]
    fn test_train_results_duplicates_and_missing_metric() {
        let results = TrainResults::from_json(json!([
            {"Metric": "MAE", "Value": 1.0},
            {"Value": 3.0},
            {"Metric": "RMSE", "Value": "0.25"},
            {"Metric": "MAE", "Value": 2.0},
        ]))
        .unwrap();

        let metrics: Vec<_> = results.iter().collect();
        assert_eq!(metrics, [("MAE", 2.0), ("RMSE", 0.25)]);
    }

    #[test]
    fn test_prediction_takes_first_element() {
        assert_eq!(Prediction::from_json(json!([1, 2])).unwrap(), Prediction(json!(1)));
        assert_eq!(
            Prediction::from_json(json!(["setosa"])).unwrap().to_string(),
            "setosa"
        );
        assert!(Prediction::from_json(json!([])).is_err());
        assert!(Prediction::from_json(json!({"p": 1})).is_err());
    }

    #[test]
    fn test_first_if_exists() {
        assert_eq!(first_if_exists(None), "Unknown");
        assert_eq!(first_if_exists(Some(&json!(null))), "Unknown");
        assert_eq!(first_if_exists(Some(&json!([42.5, 1]))), "42.5");
        assert_eq!(first_if_exists(Some(&json!("gbm"))), "gbm");
    }
}
