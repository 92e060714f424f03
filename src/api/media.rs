//! File storage and stream capture.

use serde_json::{json, Value};

use crate::api::{query_path, require_id};
use crate::client::ArgusClient;
use crate::error::{ArgusError, Result};
use crate::transport::{HttpMethod, MultipartFile};

impl ArgusClient {
    /// Upload a file (detection clip, reference image) to platform storage.
    pub async fn upload_file(
        &self,
        file_name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<Value> {
        self.ensure_connected()?;
        require_id(file_name, "file name")?;
        if data.is_empty() {
            return Err(ArgusError::Validation(
                "file data must not be empty".to_string(),
            ));
        }

        let file = MultipartFile {
            field: "file".to_string(),
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            data,
        };
        self.executor.execute_multipart("/files/upload", file).await
    }

    /// Fetch metadata for a stored file.
    pub async fn get_file_info(&self, file_id: &str) -> Result<Value> {
        self.ensure_connected()?;
        require_id(file_id, "file id")?;
        self.executor
            .execute(HttpMethod::Get, &format!("/files/{}", file_id), None)
            .await
    }

    /// List stored files, optionally filtered by name prefix.
    pub async fn query_files(&self, prefix: Option<&str>, limit: Option<u32>) -> Result<Value> {
        self.ensure_connected()?;
        let limit = limit.map(|n| n.to_string());
        let path = query_path(
            "/files",
            &[("prefix", prefix), ("limit", limit.as_deref())],
        );
        self.executor.execute(HttpMethod::Get, &path, None).await
    }

    /// Delete a stored file.
    pub async fn delete_file(&self, file_id: &str) -> Result<Value> {
        self.ensure_connected()?;
        require_id(file_id, "file id")?;
        self.executor
            .execute(HttpMethod::Delete, &format!("/files/{}", file_id), None)
            .await
    }

    /// Obtain a short-lived download URL for a stored file.
    pub async fn get_file_url(&self, file_id: &str) -> Result<Value> {
        self.ensure_connected()?;
        require_id(file_id, "file id")?;
        self.executor
            .execute(HttpMethod::Get, &format!("/files/{}/url", file_id), None)
            .await
    }

    /// Ask the platform to capture a still frame from a live stream.
    pub async fn capture_stream_frame(&self, stream_url: &str) -> Result<Value> {
        self.ensure_connected()?;
        require_id(stream_url, "stream url")?;
        self.executor
            .execute(
                HttpMethod::Post,
                "/streams/capture",
                Some(json!({ "streamUrl": stream_url })),
            )
            .await
    }
}
