use std::path::Path;

use async_trait::async_trait;
use derive_more::Display;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use serde::{de::DeserializeOwned, Deserialize};
use uuid::Uuid;

use crate::{
    constants::DEFAULT_API_BASE,
    entities::product::{Product, ProductQuery, ProductStatus},
    errors::FieldError,
};

#[derive(Debug, Display)]
pub enum ClientError {
    /// The API answered with an error envelope.
    #[display("{message}")]
    Api {
        status: u16,
        message: String,
        details: Vec<FieldError>,
    },

    #[display("{_0}")]
    Transport(String),

    #[display("Unexpected response: {_0}")]
    Decode(String),

    /// Rejected by the form before any request was sent.
    #[display("Validation failed")]
    Invalid(Vec<FieldError>),
}

impl std::error::Error for ClientError {}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn details(&self) -> &[FieldError] {
        match self {
            ClientError::Api { details, .. } | ClientError::Invalid(details) => details,
            _ => &[],
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: String,
    #[serde(default)]
    details: Vec<FieldError>,
}

/// An image picked for upload, held in memory until submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        ImageUpload { file_name: file_name.into(), bytes }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(ImageUpload { file_name, bytes })
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    fn mime_type(&self) -> &'static str {
        match self.file_name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
            Some(ext) if ext == "png" => "image/png",
            Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
            _ => "application/octet-stream",
        }
    }
}

/// Body of a create or update call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductSubmission {
    pub title: String,
    pub description: String,
    pub status: ProductStatus,
    pub date: Option<String>,
    pub image: Option<ImageUpload>,
}

impl ProductSubmission {
    /// `description` is always sent, `date` and `image` only when present.
    fn into_form(self) -> Result<Form, ClientError> {
        let mut form = Form::new()
            .text("title", self.title)
            .text("description", self.description)
            .text("status", self.status.to_string());

        if let Some(date) = self.date.filter(|d| !d.trim().is_empty()) {
            form = form.text("date", date);
        }

        if let Some(image) = self.image {
            let mime = image.mime_type();
            let part = Part::bytes(image.bytes)
                .file_name(image.file_name)
                .mime_str(mime)?;
            form = form.part("image", part);
        }

        Ok(form)
    }
}

#[async_trait]
pub trait ProductApi: Send + Sync {
    async fn list(&self, query: &ProductQuery) -> Result<Vec<Product>, ClientError>;
    async fn fetch(&self, id: &Uuid) -> Result<Product, ClientError>;
    async fn create(&self, submission: ProductSubmission) -> Result<Product, ClientError>;
    async fn update(&self, id: &Uuid, submission: ProductSubmission) -> Result<Product, ClientError>;
    async fn delete(&self, id: &Uuid) -> Result<(), ClientError>;
}

/// `ProductApi` over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpProductApi {
    client: Client,
    base_url: String,
}

impl HttpProductApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        HttpProductApi { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn products_url(&self) -> String {
        format!("{}/products", self.base_url)
    }

    fn product_url(&self, id: &Uuid) -> String {
        format!("{}/products/{}", self.base_url, id)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let response = Self::check(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Turns a non-success response into `ClientError::Api`, preferring the
    /// server's `error` string over the status text.
    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let (message, details) = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => (envelope.error, envelope.details),
            Err(_) => (
                format!("Request failed with status code {}", status.as_u16()),
                Vec::new(),
            ),
        };

        Err(ClientError::Api { status: status.as_u16(), message, details })
    }
}

impl Default for HttpProductApi {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

#[async_trait]
impl ProductApi for HttpProductApi {
    async fn list(&self, query: &ProductQuery) -> Result<Vec<Product>, ClientError> {
        let response = self.client.get(self.products_url()).query(query).send().await?;
        Self::read_json(response).await
    }

    async fn fetch(&self, id: &Uuid) -> Result<Product, ClientError> {
        let response = self.client.get(self.product_url(id)).send().await?;
        Self::read_json(response).await
    }

    async fn create(&self, submission: ProductSubmission) -> Result<Product, ClientError> {
        let form = submission.into_form()?;
        let response = self.client.post(self.products_url()).multipart(form).send().await?;
        Self::read_json(response).await
    }

    async fn update(&self, id: &Uuid, submission: ProductSubmission) -> Result<Product, ClientError> {
        let form = submission.into_form()?;
        let response = self.client.put(self.product_url(id)).multipart(form).send().await?;
        Self::read_json(response).await
    }

    async fn delete(&self, id: &Uuid) -> Result<(), ClientError> {
        let response = self.client.delete(self.product_url(id)).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}
