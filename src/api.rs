//! Typed client for the model serving process.

use serde_json::Value;

use crate::{
    config::DashboardConfig,
    error::{DashboardError, Result},
    form::PredictionRequest,
    schema::FeatureSchema,
    views::{ModelSummary, Prediction, TrainResults},
};

pub const MODEL_INFO_PATH: &str = "/modelInfo";
pub const INPUT_FEATURES_PATH: &str = "/inputFeatures";
pub const TRAIN_RESULTS_PATH: &str = "/trainResults";
pub const PREDICT_PATH: &str = "/predict";

/// Issues the four GET requests the dashboard needs.
///
/// Requests run on tokio's blocking pool, so every method is safe to await
/// from async code. There is no timeout and no retry.
#[derive(Clone)]
pub struct ModelApi {
    agent: ureq::Agent,
    config: DashboardConfig,
}

impl ModelApi {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
            config,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// `GET /modelInfo`, split into model info and hyperparameters.
    pub async fn model_summary(&self) -> Result<ModelSummary> {
        ModelSummary::from_json(self.get_json(MODEL_INFO_PATH, None).await?)
    }

    /// `GET /inputFeatures`, the raw feature schema.
    pub async fn input_features(&self) -> Result<FeatureSchema> {
        FeatureSchema::from_json(self.get_json(INPUT_FEATURES_PATH, None).await?)
    }

    /// `GET /trainResults`, reduced to a metric mapping.
    pub async fn train_results(&self) -> Result<TrainResults> {
        TrainResults::from_json(self.get_json(TRAIN_RESULTS_PATH, None).await?)
    }

    /// `GET /predict?name=value&...` asking for JSON.
    pub async fn predict(&self, request: &PredictionRequest) -> Result<Prediction> {
        let query = request.query_pairs();
        Prediction::from_json(self.get_json(PREDICT_PATH, Some(query)).await?)
    }

    async fn get_json(
        &self,
        path: &'static str,
        query: Option<Vec<(String, String)>>,
    ) -> Result<Value> {
        let agent = self.agent.clone();
        let url = self.config.endpoint(path);
        log::debug!("GET {url}");

        tokio::task::spawn_blocking(move || fetch_json(&agent, path, &url, query))
            .await
            .map_err(|e| DashboardError::Transport {
                path,
                msg: format!("request task failed: {e}"),
            })?
    }
}

fn fetch_json(
    agent: &ureq::Agent,
    path: &'static str,
    url: &str,
    query: Option<Vec<(String, String)>>,
) -> Result<Value> {
    let mut req = agent.get(url);
    if let Some(params) = query {
        req = req.set("Accept", "application/json");
        for (name, value) in &params {
            req = req.query(name, value);
        }
    }

    let response = match req.call() {
        Ok(response) => response,
        Err(ureq::Error::Status(status, _)) => {
            return Err(DashboardError::Http { path, status });
        }
        Err(ureq::Error::Transport(err)) => {
            return Err(DashboardError::Transport {
                path,
                msg: err.to_string(),
            });
        }
    };

    response
        .into_json::<Value>()
        .map_err(|e| DashboardError::Malformed {
            path,
            msg: format!("invalid JSON: {e}"),
        })
}
