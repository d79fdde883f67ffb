//! The backend seam used by the wizard engine, and its HTTP implementation.

use async_trait::async_trait;
use reqwest::Method;
use rescat_types::{BackingResource, CatalogDetail, CatalogPayload, DepartmentNode, InformationItem, LabelNode, RawField, ResourceType};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    ApiError, CatalogClient,
    wire::{ApiDetail, CreatedId, DataViewField, Entries},
};

/// Metadata of an uploaded file resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub size: u64,
}

/// Operations the console consumes from the backend.
///
/// Implemented over HTTP by [`CatalogClient`]; tests substitute in-memory fakes.
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    async fn fetch_data_view_fields(&self, resource_id: &str) -> Result<Vec<RawField>, ApiError>;
    async fn fetch_api_fields(&self, resource_id: &str) -> Result<Vec<RawField>, ApiError>;
    async fn fetch_file_metadata(&self, resource_id: &str) -> Result<FileMetadata, ApiError>;
    async fn fetch_catalog(&self, catalog_id: &str) -> Result<CatalogDetail, ApiError>;
    async fn fetch_catalog_columns(&self, catalog_id: &str) -> Result<Vec<InformationItem>, ApiError>;
    /// Creates a catalog entry and returns its id.
    async fn create_catalog(&self, payload: &CatalogPayload) -> Result<String, ApiError>;
    async fn update_catalog(&self, catalog_id: &str, payload: &CatalogPayload) -> Result<(), ApiError>;
    /// Opens a change audit for a published entry and returns the audit application id.
    async fn create_audit_flow(&self, catalog_id: &str, payload: &CatalogPayload) -> Result<String, ApiError>;
    async fn cancel_audit_flow(&self, catalog_id: &str) -> Result<(), ApiError>;
    async fn fetch_grade_labels(&self) -> Result<Vec<LabelNode>, ApiError>;
    async fn fetch_department_tree(&self) -> Result<Vec<DepartmentNode>, ApiError>;

    /// Fetches the field schema of any mounted resource. Files have no fields.
    async fn fetch_resource_fields(&self, resource: &BackingResource) -> Result<Vec<RawField>, ApiError> {
        match resource.resource_type {
            ResourceType::DataView => self.fetch_data_view_fields(&resource.resource_id).await,
            ResourceType::Api => self.fetch_api_fields(&resource.resource_id).await,
            ResourceType::File => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl CatalogBackend for CatalogClient {
    async fn fetch_data_view_fields(&self, resource_id: &str) -> Result<Vec<RawField>, ApiError> {
        let path = format!("/api/data-view/v1/form-view/{}/fields", resource_id);
        let parsed: Entries<DataViewField> = self.send_json(self.request(Method::GET, &path)).await?;
        debug!(resource_id, count = parsed.entries.len(), "fetched data view fields");
        Ok(parsed
            .entries
            .into_iter()
            .map(|field| field.into_raw_field(resource_id))
            .collect())
    }

    async fn fetch_api_fields(&self, resource_id: &str) -> Result<Vec<RawField>, ApiError> {
        let path = format!("/api/data-application-service/v1/services/{}", resource_id);
        let detail: ApiDetail = self.send_json(self.request(Method::GET, &path)).await?;
        debug!(resource_id, count = detail.response_params.len(), "fetched interface parameters");
        Ok(detail
            .response_params
            .into_iter()
            .map(|parameter| parameter.into_raw_field(resource_id))
            .collect())
    }

    async fn fetch_file_metadata(&self, resource_id: &str) -> Result<FileMetadata, ApiError> {
        let path = format!("/api/data-catalog/v1/files/{}", resource_id);
        self.send_json(self.request(Method::GET, &path)).await
    }

    async fn fetch_catalog(&self, catalog_id: &str) -> Result<CatalogDetail, ApiError> {
        let path = format!("/api/data-catalog/v1/catalogs/{}", catalog_id);
        self.send_json(self.request(Method::GET, &path)).await
    }

    async fn fetch_catalog_columns(&self, catalog_id: &str) -> Result<Vec<InformationItem>, ApiError> {
        let path = format!("/api/data-catalog/v1/catalogs/{}/columns", catalog_id);
        let builder = self.request(Method::GET, &path).query(&[("limit", "-1")]);
        let parsed: Entries<InformationItem> = self.send_json(builder).await?;
        Ok(parsed.entries)
    }

    async fn create_catalog(&self, payload: &CatalogPayload) -> Result<String, ApiError> {
        let builder = self.request(Method::POST, "/api/data-catalog/v1/catalogs").json(payload);
        let created: CreatedId = self.send_json(builder).await?;
        Ok(created.id)
    }

    async fn update_catalog(&self, catalog_id: &str, payload: &CatalogPayload) -> Result<(), ApiError> {
        let path = format!("/api/data-catalog/v1/catalogs/{}", catalog_id);
        self.send_unit(self.request(Method::PUT, &path).json(payload)).await
    }

    async fn create_audit_flow(&self, catalog_id: &str, payload: &CatalogPayload) -> Result<String, ApiError> {
        let path = format!("/api/data-catalog/v1/catalogs/{}/audit", catalog_id);
        let created: CreatedId = self.send_json(self.request(Method::POST, &path).json(payload)).await?;
        Ok(created.id)
    }

    async fn cancel_audit_flow(&self, catalog_id: &str) -> Result<(), ApiError> {
        let path = format!("/api/data-catalog/v1/catalogs/{}/audit", catalog_id);
        self.send_unit(self.request(Method::DELETE, &path)).await
    }

    async fn fetch_grade_labels(&self) -> Result<Vec<LabelNode>, ApiError> {
        let parsed: Entries<LabelNode> = self
            .send_json(self.request(Method::GET, "/api/data-subject/v1/grade-labels"))
            .await?;
        Ok(parsed.entries)
    }

    async fn fetch_department_tree(&self) -> Result<Vec<DepartmentNode>, ApiError> {
        let parsed: Entries<DepartmentNode> = self
            .send_json(self.request(Method::GET, "/api/configuration-center/v1/departments/tree"))
            .await?;
        Ok(parsed.entries)
    }
}
