//! Spawns the dashboard's fetches and publishes their results.

use std::future::Future;

use futures::future;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    api::{ModelApi, INPUT_FEATURES_PATH, MODEL_INFO_PATH, PREDICT_PATH, TRAIN_RESULTS_PATH},
    error::{DashboardError, Result},
    form::PredictionRequest,
    state::{DashboardEvent, ScopedEvent},
};

/// How a single fetch ended.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The result was published to the state.
    Delivered,
    /// The request or the reshaping failed, nothing was published.
    Failed(DashboardError),
    /// The requesting view went away first, nothing was published.
    Cancelled,
}

impl FetchOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Per-endpoint outcome of a metadata load.
#[derive(Debug)]
pub struct MetadataReport {
    pub model_info: FetchOutcome,
    pub input_features: FetchOutcome,
    pub train_results: FetchOutcome,
}

/// Runs fetches as tokio tasks and sends their results over a channel.
#[derive(Clone)]
pub struct Loader {
    api: ModelApi,
    events: mpsc::Sender<ScopedEvent>,
}

impl Loader {
    /// Creates a new `Loader`.
    ///
    /// # Args
    /// * `api` - Client for the serving process.
    /// * `events` - The sending end of the state's event channel.
    pub fn new(api: ModelApi, events: mpsc::Sender<ScopedEvent>) -> Self {
        Self { api, events }
    }

    pub fn api(&self) -> &ModelApi {
        &self.api
    }

    /// Fetches model info, input features and train results concurrently.
    ///
    /// Each result is published as soon as it arrives; a failing fetch does
    /// not hold back the other two.
    ///
    /// # Returns
    /// A handle resolving to the outcome of every fetch once all three ended.
    pub fn load_metadata(&self, scope: CancellationToken) -> JoinHandle<MetadataReport> {
        let loader = self.clone();

        tokio::spawn(async move {
            let api = &loader.api;
            let (model_info, input_features, train_results) = future::join3(
                loader.deliver(
                    &scope,
                    MODEL_INFO_PATH,
                    api.model_summary(),
                    DashboardEvent::Summary,
                ),
                loader.deliver(
                    &scope,
                    INPUT_FEATURES_PATH,
                    api.input_features(),
                    DashboardEvent::InputFeatures,
                ),
                loader.deliver(
                    &scope,
                    TRAIN_RESULTS_PATH,
                    api.train_results(),
                    DashboardEvent::TrainResults,
                ),
            )
            .await;

            MetadataReport {
                model_info,
                input_features,
                train_results,
            }
        })
    }

    /// Sends one prediction request.
    pub fn submit(
        &self,
        request: PredictionRequest,
        scope: CancellationToken,
    ) -> JoinHandle<FetchOutcome> {
        let loader = self.clone();

        tokio::spawn(async move {
            log::info!("submitting prediction with {} feature(s)", request.len());
            loader
                .deliver(
                    &scope,
                    PREDICT_PATH,
                    loader.api.predict(&request),
                    DashboardEvent::Prediction,
                )
                .await
        })
    }

    async fn deliver<T, F>(
        &self,
        scope: &CancellationToken,
        path: &'static str,
        fetch: F,
        wrap: fn(T) -> DashboardEvent,
    ) -> FetchOutcome
    where
        F: Future<Output = Result<T>>,
    {
        let result = tokio::select! {
            biased;
            _ = scope.cancelled() => {
                log::debug!("GET {path} cancelled");
                return FetchOutcome::Cancelled;
            }
            result = fetch => result,
        };

        let value = match result {
            Ok(value) => value,
            Err(e) => {
                log::debug!("{e}");
                return FetchOutcome::Failed(e);
            }
        };

        let event = ScopedEvent {
            scope: scope.clone(),
            event: wrap(value),
        };

        tokio::select! {
            biased;
            _ = scope.cancelled() => FetchOutcome::Cancelled,
            sent = self.events.send(event) => match sent {
                Ok(()) => FetchOutcome::Delivered,
                Err(_) => FetchOutcome::Cancelled,
            },
        }
    }
}
