// ABOUTME: HTTP layer of the admin console: request client, CRUD API factory, typed resources.
// ABOUTME: Consumes adminctl-core's session and event bus; emits bus events per the status contract.

pub mod api;
pub mod auth_api;
pub mod http;
pub mod query;
pub mod resources;

pub use api::{OpCtx, ResourceApi, create_api};
pub use auth_api::AuthApi;
pub use http::{HttpClient, TENANT_HEADER};
pub use query::{to_query, with_query};
