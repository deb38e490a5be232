// ABOUTME: Typed wire models for the admin API resources and their factory constructors.
// ABOUTME: Wire format is camelCase JSON; ids are server-minted and absent on create payloads.

use adminctl_core::controller::ResourceRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{ResourceApi, create_api};
use crate::http::HttpClient;
use crate::query::with_query;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub label: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
    #[serde(default)]
    pub order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default)]
    pub suspended: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default)]
    pub taxonomies: Vec<String>,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Taxonomy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAsset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

macro_rules! record_id {
    ($($ty:ty),+) => {
        $(impl ResourceRecord for $ty {
            fn id(&self) -> Option<&str> {
                self.id.as_deref()
            }
        })+
    };
}

record_id!(User, Role, PermissionEntry, MenuEntry, Tenant, Topic, Taxonomy, MediaAsset);

pub fn users(http: HttpClient) -> ResourceApi<User> {
    create_api("/admin/users", http)
}

/// Roles carry an extension resolving the expanded permission set for one
/// role: `ext("permissions", {"id": ...})` → GET `/admin/roles/{id}/permissions`.
pub fn roles(http: HttpClient) -> ResourceApi<Role> {
    create_api("/admin/roles", http).with_extension("permissions", |args, ctx| {
        Box::pin(async move {
            let id = args
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    adminctl_core::ConsoleError::Config(
                        "permissions extension requires an id".into(),
                    )
                })?
                .to_string();
            ctx.http
                .get(&format!("{}/{}/permissions", ctx.endpoint, id))
                .await
        })
    })
}

pub fn permissions(http: HttpClient) -> ResourceApi<PermissionEntry> {
    create_api("/admin/permissions", http)
}

pub fn menus(http: HttpClient) -> ResourceApi<MenuEntry> {
    create_api("/admin/menus", http)
}

pub fn tenants(http: HttpClient) -> ResourceApi<Tenant> {
    create_api("/admin/tenants", http)
}

pub fn topics(http: HttpClient) -> ResourceApi<Topic> {
    create_api("/cms/topics", http)
}

pub fn taxonomies(http: HttpClient) -> ResourceApi<Taxonomy> {
    create_api("/cms/taxonomies", http)
}

/// Media listing goes through the search endpoint rather than the base path;
/// the other verbs keep the defaults.
pub fn media(http: HttpClient) -> ResourceApi<MediaAsset> {
    create_api("/cms/media", http).with_list(|params, ctx| {
        Box::pin(async move {
            let path = with_query("/cms/media/search", params.as_ref());
            let value = ctx.http.get(&path).await?;
            Ok(serde_json::from_value(value)?)
        })
    })
}
