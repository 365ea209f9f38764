use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::{
    api::ModelApi,
    form::{FeatureForm, PredictionRequest},
    loader::{FetchOutcome, Loader, MetadataReport},
    state::{DashboardState, ScopedEvent},
};

const EVENT_BUFFER: usize = 64;

/// Cancellation scope of one mounted view. Dropping it cancels every fetch
/// started under it and discards their late results.
pub struct ViewScope {
    token: CancellationToken,
    _guard: DropGuard,
}

impl ViewScope {
    fn new(token: CancellationToken) -> Self {
        let _guard = token.clone().drop_guard();
        Self { token, _guard }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Opens a nested scope, cancelled with this one or when dropped.
    pub fn child(&self) -> ViewScope {
        ViewScope::new(self.token.child_token())
    }
}

/// Owns the dashboard state and drives it from the results of the fetches
/// it starts. The page shell owns one `Session` and lends it to its views.
pub struct Session {
    state: DashboardState,
    events: mpsc::Receiver<ScopedEvent>,
    loader: Loader,
    root: CancellationToken,
}

impl Session {
    /// Creates a new `Session` with empty state.
    ///
    /// # Args
    /// * `api` - Client for the serving process.
    pub fn new(api: ModelApi) -> Self {
        let (tx, events) = mpsc::channel(EVENT_BUFFER);

        Self {
            state: DashboardState::default(),
            events,
            loader: Loader::new(api, tx),
            root: CancellationToken::new(),
        }
    }

    /// Returns the current state for rendering.
    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Returns the live form, if the input features have been loaded.
    pub fn form_mut(&mut self) -> Option<&mut FeatureForm> {
        self.state.form.as_mut()
    }

    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    /// Opens a cancellation scope for a view that is being mounted.
    pub fn mount(&self) -> ViewScope {
        ViewScope::new(self.root.child_token())
    }

    /// Starts the three metadata fetches under `scope`.
    pub fn load_metadata(&self, scope: &ViewScope) -> JoinHandle<MetadataReport> {
        log::info!("loading model metadata from {}", self.loader.api().config().base_url());
        self.loader.load_metadata(scope.token().clone())
    }

    /// Encodes the live form and submits it under `scope`.
    ///
    /// Without a loaded form the request carries no parameters.
    pub fn submit(&self, scope: &ViewScope) -> JoinHandle<FetchOutcome> {
        let request = self
            .state
            .form
            .as_ref()
            .map(FeatureForm::encode)
            .unwrap_or_default();

        self.submit_request(request, scope)
    }

    /// Submits an explicit request under `scope`.
    pub fn submit_request(
        &self,
        request: PredictionRequest,
        scope: &ViewScope,
    ) -> JoinHandle<FetchOutcome> {
        self.loader.submit(request, scope.token().clone())
    }

    /// Drains all pending results and updates state. Non-blocking.
    ///
    /// Should be called once per frame tick.
    ///
    /// # Returns
    /// How many results were applied.
    pub fn tick(&mut self) -> usize {
        let mut applied = 0;

        // Drain all events that are ready right now without blocking.
        while let Ok(event) = self.events.try_recv() {
            if self.state.apply_scoped(event) {
                applied += 1;
            }
        }

        applied
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.root.cancel();
    }
}
