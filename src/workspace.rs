//! Collections tree and the selection state derived from it.
//!
//! Which endpoint is "active" and which collections are expanded is never
//! patched by hand at mutation sites. It is recomputed from the tree plus a
//! little interaction memory (explicit selection, last selection, explicit
//! expand/collapse toggles) every time it is read.

use std::collections::HashSet;

use uuid::Uuid;

use crate::types::{Collection, CollectionEndpoint, HttpMethod};
use crate::url_validator::has_any_scheme;

pub const DEFAULT_COLLECTION_NAME: &str = "New Collection";
pub const DEFAULT_ENDPOINT_NAME: &str = "Untitled";

/// Interaction memory behind the derived selection. Not persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceSelectionState {
    pub active_endpoint_id: Option<String>,
    pub expanded_collection_ids: HashSet<String>,
    pub last_selected_endpoint_id: Option<String>,
}

/// Method and composed URL to load into the draft after a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTarget {
    pub method: HttpMethod,
    pub url: String,
}

// ============ derivations ============

/// Only the first collection starts out expanded.
pub fn default_expanded_collection_ids(collections: &[Collection]) -> HashSet<String> {
    collections.iter().take(1).map(|c| c.id.clone()).collect()
}

pub fn find_endpoint<'a>(
    collections: &'a [Collection],
    endpoint_id: &str,
) -> Option<(&'a Collection, &'a CollectionEndpoint)> {
    collections
        .iter()
        .find_map(|c| c.endpoint(endpoint_id).map(|e| (c, e)))
}

/// The last selected endpoint if it lives in `collection`, else its first endpoint.
pub fn resolve_default_endpoint_id<'a>(
    collection: &'a Collection,
    last_selected_endpoint_id: Option<&str>,
) -> Option<&'a str> {
    last_selected_endpoint_id
        .and_then(|id| collection.endpoint(id))
        .or_else(|| collection.endpoints.first())
        .map(|e| e.id.as_str())
}

/// Active endpoint, in priority order: a still-existing explicit selection,
/// then the first expanded collection with endpoints, then the first
/// collection with endpoints at all.
pub fn resolve_active_endpoint_id(
    collections: &[Collection],
    selection: &WorkspaceSelectionState,
    expanded_collection_ids: &HashSet<String>,
) -> Option<String> {
    if let Some(active) = &selection.active_endpoint_id {
        if find_endpoint(collections, active).is_some() {
            return Some(active.clone());
        }
    }

    let target = collections
        .iter()
        .filter(|c| expanded_collection_ids.contains(&c.id))
        .find(|c| c.has_endpoints())
        .or_else(|| collections.iter().find(|c| c.has_endpoints()))?;

    resolve_default_endpoint_id(target, selection.last_selected_endpoint_id.as_deref())
        .map(str::to_string)
}

/// Join a collection base URL and an endpoint path with exactly one slash.
///
/// Paths that start with a scheme are absolute and ignore the base. A URL
/// appearing later in the path (say in a query value) does not count.
pub fn compose_endpoint_url(base_url: &str, path: &str) -> String {
    if base_url.is_empty() || has_any_scheme(path.trim_start()) {
        return path.to_string();
    }
    if path.is_empty() {
        return base_url.to_string();
    }

    match (base_url.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base_url, &path[1..]),
        (false, false) => format!("{}/{}", base_url, path),
        _ => format!("{}{}", base_url, path),
    }
}

/// "New Collection", or "New Collection N" with N one past the highest suffix
/// in use. A bare "New Collection" counts as suffix 1.
pub fn next_collection_name(collections: &[Collection]) -> String {
    let next = collections
        .iter()
        .filter_map(|c| default_name_suffix(&c.name))
        .max()
        .map_or(1, |max| max.saturating_add(1));

    if next == 1 {
        DEFAULT_COLLECTION_NAME.to_string()
    } else {
        format!("{} {}", DEFAULT_COLLECTION_NAME, next)
    }
}

fn default_name_suffix(name: &str) -> Option<u64> {
    if name == DEFAULT_COLLECTION_NAME {
        return Some(1);
    }
    let digits = name
        .strip_prefix(DEFAULT_COLLECTION_NAME)?
        .strip_prefix(' ')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn name_or(name: &str, fallback: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// ============ workspace ============

#[derive(Debug, Clone, Default)]
pub struct Workspace {
    collections: Vec<Collection>,
    selection: WorkspaceSelectionState,
    has_interacted: bool,
}

impl Workspace {
    pub fn new(collections: Vec<Collection>) -> Self {
        Self {
            collections,
            ..Self::default()
        }
    }

    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    pub fn collection(&self, collection_id: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.id == collection_id)
    }

    pub fn selection(&self) -> &WorkspaceSelectionState {
        &self.selection
    }

    /// True once any expand/collapse control has been used.
    pub fn has_interacted(&self) -> bool {
        self.has_interacted
    }

    pub fn effective_expanded_collection_ids(&self) -> HashSet<String> {
        if self.has_interacted {
            self.selection.expanded_collection_ids.clone()
        } else {
            default_expanded_collection_ids(&self.collections)
        }
    }

    pub fn is_expanded(&self, collection_id: &str) -> bool {
        if self.has_interacted {
            self.selection.expanded_collection_ids.contains(collection_id)
        } else {
            self.collections
                .first()
                .is_some_and(|c| c.id == collection_id)
        }
    }

    pub fn resolved_active_endpoint_id(&self) -> Option<String> {
        resolve_active_endpoint_id(
            &self.collections,
            &self.selection,
            &self.effective_expanded_collection_ids(),
        )
    }

    /// Select an endpoint and return what the draft should load.
    ///
    /// The id is remembered even when it matches nothing; resolution then
    /// simply falls through to the defaults.
    pub fn select_endpoint(&mut self, endpoint_id: &str) -> Option<EndpointTarget> {
        self.selection.active_endpoint_id = Some(endpoint_id.to_string());
        self.selection.last_selected_endpoint_id = Some(endpoint_id.to_string());

        let (collection, endpoint) = find_endpoint(&self.collections, endpoint_id)?;
        Some(EndpointTarget {
            method: endpoint.method,
            url: compose_endpoint_url(&collection.base_url, &endpoint.url),
        })
    }

    pub fn toggle_collection(&mut self, collection_id: &str, open: bool) {
        if !self.has_interacted {
            // seed from what the user was looking at
            self.selection.expanded_collection_ids =
                default_expanded_collection_ids(&self.collections);
            self.has_interacted = true;
        }

        if open {
            self.selection
                .expanded_collection_ids
                .insert(collection_id.to_string());
        } else {
            self.selection.expanded_collection_ids.remove(collection_id);
        }
    }

    /// Append a new empty collection and return its id.
    pub fn add_collection(&mut self, name: Option<&str>) -> String {
        let name = match name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => next_collection_name(&self.collections),
        };

        let id = new_id();
        self.collections.push(Collection {
            id: id.clone(),
            name,
            base_url: String::new(),
            endpoints: Vec::new(),
        });
        id
    }

    pub fn delete_collection(&mut self, collection_id: &str) -> bool {
        let Some(index) = self.collections.iter().position(|c| c.id == collection_id) else {
            return false;
        };

        let removed = self.collections.remove(index);
        let owned_active = self
            .selection
            .active_endpoint_id
            .as_deref()
            .is_some_and(|id| removed.endpoint(id).is_some());
        if owned_active {
            self.selection.active_endpoint_id = None;
        }
        self.selection.expanded_collection_ids.remove(collection_id);
        true
    }

    pub fn set_collection_base_url(&mut self, collection_id: &str, base_url: &str) -> bool {
        match self.collection_mut(collection_id) {
            Some(collection) => {
                collection.base_url = base_url.trim().to_string();
                true
            }
            None => false,
        }
    }

    /// Append an "Untitled" endpoint seeded with the given method and URL.
    pub fn add_endpoint(
        &mut self,
        collection_id: &str,
        method: HttpMethod,
        url: &str,
    ) -> Option<String> {
        let collection = self.collection_mut(collection_id)?;
        let id = new_id();
        collection.endpoints.push(CollectionEndpoint {
            id: id.clone(),
            name: DEFAULT_ENDPOINT_NAME.to_string(),
            method,
            url: url.to_string(),
        });
        Some(id)
    }

    pub fn delete_endpoint(&mut self, collection_id: &str, endpoint_id: &str) -> bool {
        let Some(collection) = self.collection_mut(collection_id) else {
            return false;
        };
        let before = collection.endpoints.len();
        collection.endpoints.retain(|e| e.id != endpoint_id);
        let removed = collection.endpoints.len() != before;

        if removed && self.selection.active_endpoint_id.as_deref() == Some(endpoint_id) {
            self.selection.active_endpoint_id = None;
        }
        removed
    }

    pub fn rename_collection(&mut self, collection_id: &str, name: &str) -> bool {
        match self.collection_mut(collection_id) {
            Some(collection) => {
                collection.name = name_or(name, DEFAULT_COLLECTION_NAME);
                true
            }
            None => false,
        }
    }

    pub fn rename_endpoint(&mut self, collection_id: &str, endpoint_id: &str, name: &str) -> bool {
        let endpoint = self
            .collection_mut(collection_id)
            .and_then(|c| c.endpoints.iter_mut().find(|e| e.id == endpoint_id));
        match endpoint {
            Some(endpoint) => {
                endpoint.name = name_or(name, DEFAULT_ENDPOINT_NAME);
                true
            }
            None => false,
        }
    }

    fn collection_mut(&mut self, collection_id: &str) -> Option<&mut Collection> {
        self.collections.iter_mut().find(|c| c.id == collection_id)
    }
}
