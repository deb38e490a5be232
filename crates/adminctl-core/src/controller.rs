// ABOUTME: Generic CRUD controller binding injected resource operations to list/selection/form state.
// ABOUTME: Route changes drive the ViewMode machine; mutations close the form and refetch the list.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error};

use crate::error::ConsoleError;
use crate::mode::ViewMode;

/// Ordered field map used for form state and create/update payloads.
pub type FormData = BTreeMap<String, serde_json::Value>;

/// A wire record the controller can manage. `id()` is `None` for records not
/// yet persisted; update and delete require it.
pub trait ResourceRecord: Serialize + Clone + Send + Sync {
    fn id(&self) -> Option<&str>;
}

/// Flatten a record into form fields. Non-object serializations (a bare
/// scalar record) produce an empty map.
pub fn form_fields<T: ResourceRecord>(record: &T) -> Result<FormData, ConsoleError> {
    match serde_json::to_value(record)? {
        serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
        _ => Ok(FormData::new()),
    }
}

/// The five operations a controller needs. Injected rather than taken from a
/// concrete API factory so feature code can mix sources and tests can mock.
#[async_trait]
pub trait ResourceOps<T>: Send + Sync {
    async fn fetch_list(&self) -> Result<Vec<T>, ConsoleError>;
    async fn fetch_item(&self, id: &str) -> Result<T, ConsoleError>;
    async fn create_item(&self, data: FormData) -> Result<T, ConsoleError>;
    async fn update_item(&self, id: &str, data: FormData) -> Result<T, ConsoleError>;
    async fn delete_item(&self, id: &str) -> Result<(), ConsoleError>;
}

/// State container for one resource screen. No cross-request coordination:
/// the last response to land wins, and the server list is authoritative.
pub struct CrudController<T, O> {
    ops: O,
    base_path: String,
    defaults: FormData,
    items: Vec<T>,
    selected: Option<T>,
    mode: ViewMode,
    form: FormData,
}

impl<T, O> CrudController<T, O>
where
    T: ResourceRecord,
    O: ResourceOps<T>,
{
    pub fn new(ops: O, base_path: impl Into<String>) -> Self {
        Self {
            ops,
            base_path: base_path.into(),
            defaults: FormData::new(),
            items: Vec::new(),
            selected: None,
            mode: ViewMode::Closed,
            form: FormData::new(),
        }
    }

    /// Form defaults applied on create and layered under fetched items.
    pub fn with_defaults(mut self, defaults: FormData) -> Self {
        self.form = defaults.clone();
        self.defaults = defaults;
        self
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn selected(&self) -> Option<&T> {
        self.selected.as_ref()
    }

    pub fn mode(&self) -> &ViewMode {
        &self.mode
    }

    pub fn form(&self) -> &FormData {
        &self.form
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Re-derive the view mode from the latest path and transition. The mode
    /// is a pure function of the path, so a slug change while an item is
    /// selected re-fetches instead of keeping the stale selection.
    pub async fn handle_route(&mut self, path: &str) -> Result<(), ConsoleError> {
        let suffix = path.strip_prefix(self.base_path.as_str()).unwrap_or(path);
        let mode = ViewMode::parse(suffix);
        debug!(?mode, path, "resource route change");

        match &mode {
            ViewMode::Closed => {
                self.selected = None;
                self.form = self.defaults.clone();
                self.mode = ViewMode::Closed;
            }
            ViewMode::Creating => {
                self.selected = None;
                self.form = self.defaults.clone();
                self.mode = ViewMode::Creating;
            }
            ViewMode::Viewing(slug) | ViewMode::Editing(slug) => {
                let item = match self.ops.fetch_item(slug).await {
                    Ok(item) => item,
                    Err(e) => {
                        self.selected = None;
                        self.mode = ViewMode::Closed;
                        return Err(e);
                    }
                };
                // Populate field by field over the defaults.
                let mut form = self.defaults.clone();
                for (key, value) in form_fields(&item)? {
                    form.insert(key, value);
                }
                self.form = form;
                self.selected = Some(item);
                self.mode = mode;
            }
        }
        Ok(())
    }

    /// Load (or reload) the list.
    pub async fn refetch(&mut self) -> Result<(), ConsoleError> {
        self.items = self.ops.fetch_list().await?;
        Ok(())
    }

    /// Create a new record. On success the dialog closes and the list is
    /// refetched; on failure the form stays open for correction.
    pub async fn handle_create(&mut self, data: FormData) -> Result<(), ConsoleError> {
        match self.ops.create_item(data).await {
            Ok(_) => self.close_and_refetch().await,
            Err(e) => {
                error!("create failed: {e}");
                Err(e)
            }
        }
    }

    /// Update the selected record. A no-op returning `Ok(false)` when nothing
    /// is selected or the selection has no id; no request is issued in that
    /// case.
    pub async fn handle_update(&mut self, data: FormData) -> Result<bool, ConsoleError> {
        let Some(id) = self.selected.as_ref().and_then(|s| s.id()).map(String::from) else {
            debug!("update skipped: no selected item with an id");
            return Ok(false);
        };

        match self.ops.update_item(&id, data).await {
            Ok(_) => {
                self.close_and_refetch().await?;
                Ok(true)
            }
            Err(e) => {
                error!("update failed: {e}");
                Err(e)
            }
        }
    }

    /// Delete by id, then refetch the list regardless of the delete outcome.
    /// No optimistic removal; the server list is the source of truth.
    pub async fn handle_delete(&mut self, id: &str) -> Result<(), ConsoleError> {
        let deleted = self.ops.delete_item(id).await;
        let refetched = self.refetch().await;
        deleted?;
        refetched
    }

    /// Submit handler: dispatches on the current mode. Viewing and Closed are
    /// no-ops.
    pub async fn handle_confirm(&mut self, data: FormData) -> Result<(), ConsoleError> {
        match self.mode {
            ViewMode::Editing(_) => {
                self.handle_update(data).await?;
                Ok(())
            }
            ViewMode::Creating => self.handle_create(data).await,
            ViewMode::Viewing(_) | ViewMode::Closed => Ok(()),
        }
    }

    /// Close the dialog: clear selection and mode, reset the form, refetch
    /// the list, and hand back the base path for navigation.
    pub async fn handle_dialog_close(&mut self) -> Result<String, ConsoleError> {
        self.close_and_refetch().await?;
        Ok(self.base_path.clone())
    }

    async fn close_and_refetch(&mut self) -> Result<(), ConsoleError> {
        self.selected = None;
        self.mode = ViewMode::Closed;
        self.form = self.defaults.clone();
        self.refetch().await
    }
}
