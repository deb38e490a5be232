// ABOUTME: Generic CRUD API factory: one endpoint in, a uniform create/get/update/delete/list surface out.
// ABOUTME: Per-verb overrides and named extensions share an OpCtx; defaults route through HttpClient.

use std::collections::HashMap;
use std::sync::Arc;

use adminctl_core::controller::{FormData, ResourceOps, ResourceRecord};
use adminctl_core::error::ConsoleError;
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::http::HttpClient;
use crate::query::with_query;

/// Context handed to overrides and extensions: the resource endpoint and the
/// shared request client.
#[derive(Clone)]
pub struct OpCtx {
    pub endpoint: String,
    pub http: HttpClient,
}

type RecordOp<T> =
    Arc<dyn Fn(Value, OpCtx) -> BoxFuture<'static, Result<T, ConsoleError>> + Send + Sync>;
type GetOp<T> =
    Arc<dyn Fn(String, OpCtx) -> BoxFuture<'static, Result<T, ConsoleError>> + Send + Sync>;
type UpdateOp<T> =
    Arc<dyn Fn(String, Value, OpCtx) -> BoxFuture<'static, Result<T, ConsoleError>> + Send + Sync>;
type DeleteOp =
    Arc<dyn Fn(String, OpCtx) -> BoxFuture<'static, Result<(), ConsoleError>> + Send + Sync>;
type ListOp<T> = Arc<
    dyn Fn(Option<Value>, OpCtx) -> BoxFuture<'static, Result<Vec<T>, ConsoleError>> + Send + Sync,
>;
type ExtOp =
    Arc<dyn Fn(Value, OpCtx) -> BoxFuture<'static, Result<Value, ConsoleError>> + Send + Sync>;

/// A configured CRUD surface for one resource endpoint. Built by
/// [`create_api`]; every feature module instantiates one of these instead of
/// hand-rolling five request functions.
pub struct ResourceApi<T> {
    ctx: OpCtx,
    create_op: Option<RecordOp<T>>,
    get_op: Option<GetOp<T>>,
    update_op: Option<UpdateOp<T>>,
    delete_op: Option<DeleteOp>,
    list_op: Option<ListOp<T>>,
    extensions: HashMap<String, ExtOp>,
}

/// Produce the standard CRUD surface for `endpoint`. Verbs are individually
/// overridable with the `with_*` builders; unoverridden verbs keep the
/// defaults.
pub fn create_api<T>(endpoint: impl Into<String>, http: HttpClient) -> ResourceApi<T> {
    ResourceApi {
        ctx: OpCtx {
            endpoint: endpoint.into(),
            http,
        },
        create_op: None,
        get_op: None,
        update_op: None,
        delete_op: None,
        list_op: None,
        extensions: HashMap::new(),
    }
}

impl<T> ResourceApi<T>
where
    T: ResourceRecord + DeserializeOwned + 'static,
{
    pub fn endpoint(&self) -> &str {
        &self.ctx.endpoint
    }

    pub fn with_create(
        mut self,
        f: impl Fn(Value, OpCtx) -> BoxFuture<'static, Result<T, ConsoleError>>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.create_op = Some(Arc::new(f));
        self
    }

    pub fn with_get(
        mut self,
        f: impl Fn(String, OpCtx) -> BoxFuture<'static, Result<T, ConsoleError>>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.get_op = Some(Arc::new(f));
        self
    }

    pub fn with_update(
        mut self,
        f: impl Fn(String, Value, OpCtx) -> BoxFuture<'static, Result<T, ConsoleError>>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.update_op = Some(Arc::new(f));
        self
    }

    pub fn with_delete(
        mut self,
        f: impl Fn(String, OpCtx) -> BoxFuture<'static, Result<(), ConsoleError>>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.delete_op = Some(Arc::new(f));
        self
    }

    pub fn with_list(
        mut self,
        f: impl Fn(Option<Value>, OpCtx) -> BoxFuture<'static, Result<Vec<T>, ConsoleError>>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.list_op = Some(Arc::new(f));
        self
    }

    /// Attach an additional named operation sharing this resource's context.
    pub fn with_extension(
        mut self,
        name: impl Into<String>,
        f: impl Fn(Value, OpCtx) -> BoxFuture<'static, Result<Value, ConsoleError>>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.extensions.insert(name.into(), Arc::new(f));
        self
    }

    /// POST the payload to the endpoint and decode the server echo.
    pub async fn create<P: Serialize + ?Sized>(&self, payload: &P) -> Result<T, ConsoleError> {
        self.create_value(serde_json::to_value(payload)?).await
    }

    pub(crate) async fn create_value(&self, value: Value) -> Result<T, ConsoleError> {
        if let Some(op) = &self.create_op {
            return op(value, self.ctx.clone()).await;
        }
        let echoed = self.ctx.http.post(&self.ctx.endpoint, &value).await?;
        Ok(serde_json::from_value(echoed)?)
    }

    /// GET `endpoint/{id}`. A 404 surfaces as the rejected result; handling
    /// is the caller's decision.
    pub async fn get(&self, id: &str) -> Result<T, ConsoleError> {
        if let Some(op) = &self.get_op {
            return op(id.to_string(), self.ctx.clone()).await;
        }
        let path = format!("{}/{}", self.ctx.endpoint, id);
        let value = self.ctx.http.get(&path).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// PUT `endpoint/{id}`. A payload without an id is refused before any
    /// request goes out, so `endpoint/undefined` can never be requested.
    pub async fn update(&self, payload: &T) -> Result<T, ConsoleError> {
        let id = payload
            .id()
            .ok_or_else(|| ConsoleError::Config("update requires a payload with an id".into()))?
            .to_string();
        self.update_value(&id, serde_json::to_value(payload)?).await
    }

    pub(crate) async fn update_value(&self, id: &str, value: Value) -> Result<T, ConsoleError> {
        if let Some(op) = &self.update_op {
            return op(id.to_string(), value, self.ctx.clone()).await;
        }
        let path = format!("{}/{}", self.ctx.endpoint, id);
        let echoed = self.ctx.http.put(&path, &value).await?;
        Ok(serde_json::from_value(echoed)?)
    }

    /// DELETE `endpoint/{id}`.
    pub async fn delete(&self, id: &str) -> Result<(), ConsoleError> {
        if let Some(op) = &self.delete_op {
            return op(id.to_string(), self.ctx.clone()).await;
        }
        let path = format!("{}/{}", self.ctx.endpoint, id);
        self.ctx.http.delete(&path).await?;
        Ok(())
    }

    /// GET the endpoint with serialized parameters. Empty parameter sets
    /// produce a bare URL with no trailing `?`.
    pub async fn list(&self, params: Option<Value>) -> Result<Vec<T>, ConsoleError> {
        if let Some(op) = &self.list_op {
            return op(params, self.ctx.clone()).await;
        }
        let path = with_query(&self.ctx.endpoint, params.as_ref());
        let value = self.ctx.http.get(&path).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Invoke a named extension. Unknown names are a configuration error.
    pub async fn ext(&self, name: &str, args: Value) -> Result<Value, ConsoleError> {
        let op = self
            .extensions
            .get(name)
            .ok_or_else(|| ConsoleError::Config(format!("unknown extension operation: {name}")))?;
        op(args, self.ctx.clone()).await
    }
}

/// Bridge so a `CrudController` can drive a factory-built API directly.
#[async_trait]
impl<T> ResourceOps<T> for ResourceApi<T>
where
    T: ResourceRecord + DeserializeOwned + 'static,
{
    async fn fetch_list(&self) -> Result<Vec<T>, ConsoleError> {
        self.list(None).await
    }

    async fn fetch_item(&self, id: &str) -> Result<T, ConsoleError> {
        self.get(id).await
    }

    async fn create_item(&self, data: FormData) -> Result<T, ConsoleError> {
        let value = Value::Object(data.into_iter().collect());
        self.create_value(value).await
    }

    async fn update_item(&self, id: &str, data: FormData) -> Result<T, ConsoleError> {
        let mut map: serde_json::Map<String, Value> = data.into_iter().collect();
        map.insert("id".to_string(), Value::String(id.to_string()));
        self.update_value(id, Value::Object(map)).await
    }

    async fn delete_item(&self, id: &str) -> Result<(), ConsoleError> {
        self.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adminctl_core::events::EventBus;
    use adminctl_core::session::SessionHandle;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Tag {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        name: String,
    }

    impl ResourceRecord for Tag {
        fn id(&self) -> Option<&str> {
            self.id.as_deref()
        }
    }

    /// Client pointed at an unroutable address; any accidental network use
    /// in these tests fails loudly.
    fn offline_http() -> HttpClient {
        let bus = EventBus::new();
        HttpClient::new("http://127.0.0.1:9", SessionHandle::new(bus.clone()), bus)
    }

    #[tokio::test]
    async fn update_without_id_is_refused_before_any_request() {
        let api: ResourceApi<Tag> = create_api("/cms/tags", offline_http());
        let payload = Tag {
            id: None,
            name: "unsaved".to_string(),
        };

        let err = api.update(&payload).await.unwrap_err();

        assert!(matches!(err, ConsoleError::Config(_)), "got: {err}");
    }

    #[tokio::test]
    async fn override_replaces_one_verb_only() {
        let api: ResourceApi<Tag> =
            create_api("/cms/tags", offline_http()).with_get(|id, ctx| {
                Box::pin(async move {
                    assert_eq!(ctx.endpoint, "/cms/tags");
                    Ok(Tag {
                        id: Some(id),
                        name: "from override".to_string(),
                    })
                })
            });

        let tag = api.get("abc").await.unwrap();
        assert_eq!(tag.id.as_deref(), Some("abc"));
        assert_eq!(tag.name, "from override");

        // list still routes through the default and hits the dead address
        let err = api.list(None).await.unwrap_err();
        assert!(matches!(err, ConsoleError::Network(_)), "got: {err}");
    }

    #[tokio::test]
    async fn extension_dispatches_by_name() {
        let api: ResourceApi<Tag> = create_api("/admin/roles", offline_http()).with_extension(
            "permissions",
            |args, ctx| {
                Box::pin(async move {
                    let id = args.get("id").and_then(|v| v.as_str()).unwrap_or("?");
                    Ok(serde_json::json!({
                        "path": format!("{}/{}/permissions", ctx.endpoint, id)
                    }))
                })
            },
        );

        let out = api
            .ext("permissions", serde_json::json!({"id": "r1"}))
            .await
            .unwrap();
        assert_eq!(out["path"], "/admin/roles/r1/permissions");
    }

    #[tokio::test]
    async fn unknown_extension_is_a_config_error() {
        let api: ResourceApi<Tag> = create_api("/admin/roles", offline_http());
        let err = api.ext("meshes", Value::Null).await.unwrap_err();
        assert!(matches!(err, ConsoleError::Config(_)), "got: {err}");
    }

    #[tokio::test]
    async fn resource_ops_update_injects_the_id() {
        let api: ResourceApi<Tag> =
            create_api("/cms/tags", offline_http()).with_update(|id, value, _ctx| {
                Box::pin(async move {
                    assert_eq!(value["id"], "abc");
                    assert_eq!(value["name"], "renamed");
                    Ok(Tag {
                        id: Some(id),
                        name: "renamed".to_string(),
                    })
                })
            });

        let mut data = FormData::new();
        data.insert("name".to_string(), serde_json::json!("renamed"));
        let tag = ResourceOps::update_item(&api, "abc", data).await.unwrap();
        assert_eq!(tag.id.as_deref(), Some("abc"));
    }
}
