//! Assets endpoints of the platform API

use crate::error::{PixelbinError, Result};
use crate::platform::api::ApiClient;
use crate::platform::paginator::ListFilesPaginator;
use crate::platform::transport::RequestBody;
use crate::upload::types::{SignedUrlResponse, UploadParams};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;

const ASSETS_V1: &str = "/service/platform/assets/v1.0";
const SIGNED_URL_V2_PATH: &str = "/service/platform/assets/v2.0/upload/signed-url";

/// Default page size used by [`ListFilesPaginator`]
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// Filters for listing files and folders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListFilesQuery {
    pub name: Option<String>,
    pub path: Option<String>,
    pub format: Option<String>,
    pub tags: Vec<String>,
    pub only_files: Option<bool>,
    pub only_folders: Option<bool>,
    pub page_no: Option<u32>,
    pub page_size: Option<u32>,
    /// Sort key; a `-` suffix sorts descending
    pub sort: Option<String>,
}

impl ListFilesQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn add_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn only_files(mut self, only_files: bool) -> Self {
        self.only_files = Some(only_files);
        self
    }

    pub fn only_folders(mut self, only_folders: bool) -> Self {
        self.only_folders = Some(only_folders);
        self
    }

    pub fn page_no(mut self, page_no: u32) -> Self {
        self.page_no = Some(page_no);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// Query pairs in wire order; tags are sent as `tags[i]`
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        let mut push = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                query.push((key.to_string(), value));
            }
        };

        push("name", self.name.clone());
        push("path", self.path.clone());
        push("format", self.format.clone());
        if self.tags.iter().any(|t| !t.is_empty()) {
            for (idx, tag) in self.tags.iter().enumerate() {
                push(&format!("tags[{}]", idx), Some(tag.clone()));
            }
        }
        push("onlyFiles", self.only_files.map(|v| v.to_string()));
        push("onlyFolders", self.only_folders.map(|v| v.to_string()));
        push("pageNo", self.page_no.map(|v| v.to_string()));
        push("pageSize", self.page_size.map(|v| v.to_string()));
        push("sort", self.sort.clone());
        query
    }
}

/// Assets API
#[derive(Debug, Clone)]
pub struct Assets {
    api: Arc<ApiClient>,
}

impl Assets {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Request a presigned multipart destination
    pub async fn create_signed_url_v2(&self, params: &UploadParams) -> Result<SignedUrlResponse> {
        let body = serde_json::to_value(params)?;
        let response = self
            .api
            .execute(Method::POST, SIGNED_URL_V2_PATH, &[], RequestBody::Json(body))
            .await?;
        serde_json::from_value(response).map_err(PixelbinError::from)
    }

    /// Fetch file metadata by id
    pub async fn get_file_by_file_id(&self, file_id: &str) -> Result<Value> {
        let path = file_path(file_id)?;
        self.api
            .execute(Method::GET, &path, &[], RequestBody::Empty)
            .await
    }

    /// Delete a file by id
    pub async fn delete_file(&self, file_id: &str) -> Result<Value> {
        let path = file_path(file_id)?;
        self.api
            .execute(Method::DELETE, &path, &[], RequestBody::Empty)
            .await
    }

    /// List and search files and folders
    pub async fn list_files(&self, query: &ListFilesQuery) -> Result<Value> {
        let path = format!("{}/listFiles", ASSETS_V1);
        self.api
            .execute(Method::GET, &path, &query.to_query(), RequestBody::Empty)
            .await
    }

    /// Page through [`Assets::list_files`] results
    pub fn list_files_paginator(&self, query: ListFilesQuery) -> ListFilesPaginator {
        ListFilesPaginator::new(self.clone(), query)
    }
}

fn file_path(file_id: &str) -> Result<String> {
    if file_id.is_empty() {
        return Err(PixelbinError::validation("fileId (string) is required"));
    }
    Ok(format!("{}/files/{}", ASSETS_V1, file_id))
}
