//! CRUD calls behind the dashboard's tables and forms

use serde_json::Value;

use crate::api::resources::{ListParams, ResourceKind};
use crate::client::{AuthenticatedClient, RequestDescriptor};
use crate::error::Result;

/// Typed entry point for the dashboard's resources.
///
/// Record shapes belong to the backend and are passed through as JSON.
#[derive(Clone)]
pub struct Dashboard {
    client: AuthenticatedClient,
}

impl Dashboard {
    pub fn new(client: AuthenticatedClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, kind: ResourceKind, params: &ListParams) -> Result<Value> {
        let mut request = RequestDescriptor::get(kind.path());
        request.query = params.to_query();
        self.client.send_json(request).await
    }

    pub async fn get(&self, kind: ResourceKind, id: &str) -> Result<Value> {
        self.client
            .send_json(RequestDescriptor::get(kind.item_path(id)))
            .await
    }

    pub async fn create(&self, kind: ResourceKind, body: &Value) -> Result<Value> {
        let request = RequestDescriptor::post(kind.path()).json(body)?;
        self.client.send_json(request).await
    }

    pub async fn update(&self, kind: ResourceKind, id: &str, body: &Value) -> Result<Value> {
        let request = RequestDescriptor::put(kind.item_path(id)).json(body)?;
        self.client.send_json(request).await
    }
}
