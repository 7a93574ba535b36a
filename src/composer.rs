use crate::draft::RequestDraft;
use crate::executor::{RequestExecutor, SendOutcome};
use crate::history::HistoryStore;
use crate::notify::Notifier;
use crate::timing::Clock;
use crate::transport::Transport;
use crate::types::{Collection, HistoryItem, ResponseOutcome};
use crate::workspace::Workspace;

/// Everything the composer screen shows, held in one place.
///
/// Mutations go through methods here so that history, the draft and the
/// workspace stay consistent with each other.
#[derive(Debug, Clone, Default)]
pub struct Composer {
    draft: RequestDraft,
    history: HistoryStore,
    workspace: Workspace,
    response: Option<ResponseOutcome>,
}

impl Composer {
    pub fn new(collections: Vec<Collection>, history: HistoryStore) -> Self {
        Self {
            workspace: Workspace::new(collections),
            history,
            ..Self::default()
        }
    }

    pub fn draft(&self) -> &RequestDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut RequestDraft {
        &mut self.draft
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryStore {
        &mut self.history
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn workspace_mut(&mut self) -> &mut Workspace {
        &mut self.workspace
    }

    /// Response of the last attempt that received one.
    pub fn response(&self) -> Option<&ResponseOutcome> {
        self.response.as_ref()
    }

    /// Send a snapshot of the current draft.
    ///
    /// The previous response is cleared up front, so a rejected or failed
    /// attempt leaves nothing stale on screen.
    pub async fn send<T, C>(
        &mut self,
        executor: &RequestExecutor<T, C>,
        notifier: &dyn Notifier,
    ) -> SendOutcome
    where
        T: Transport,
        C: Clock,
    {
        if !executor.is_sending() {
            self.response = None;
        }

        let outcome = executor.send(self.draft.clone(), notifier).await;

        if let Some(item) = outcome.history_item() {
            self.history.record(item.clone());
        }
        if let Some(response) = outcome.response() {
            self.response = Some(response.clone());
        }
        outcome
    }

    /// Select an endpoint and load its method and composed URL.
    pub fn select_endpoint(&mut self, endpoint_id: &str) -> bool {
        match self.workspace.select_endpoint(endpoint_id) {
            Some(target) => {
                self.draft.load_from_endpoint(target.method, target.url);
                true
            }
            None => false,
        }
    }

    /// New endpoint in `collection_id` seeded from the draft's method and URL.
    pub fn add_endpoint(&mut self, collection_id: &str) -> Option<String> {
        self.workspace
            .add_endpoint(collection_id, self.draft.method(), self.draft.url())
    }

    /// Load a history entry's method and URL back into the draft.
    pub fn recall_history(&mut self, index: usize) -> Option<&HistoryItem> {
        let item = self.history.get(index)?;
        self.draft.load_from_endpoint(item.method, item.url.clone());
        Some(item)
    }
}
