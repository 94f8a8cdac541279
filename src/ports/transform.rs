use async_trait::async_trait;

use crate::domain::DomainError;

/// A submission to the transformation service: the staged audio payload plus
/// the composed prompt. The networking layer owns serializing this into
/// whatever wire format the service requires.
#[derive(Debug, Clone, Copy)]
pub struct SubmitRequest<'a> {
    pub payload: &'a [u8],
    pub file_name: &'a str,
    pub mime_type: &'a str,
    pub prompt: &'a str,
}

/// Opaque handle the service returns for a finished transformation; used to
/// fetch the result bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultHandle(String);

impl ResultHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Port for the remote transformation service.
///
/// One run issues exactly one `submit` followed, on success, by one
/// `fetch_result`; the controller never pipelines or retries them.
#[async_trait]
pub trait TransformService: Send + Sync {
    /// Send the audio payload and prompt; resolves to the result handle.
    async fn submit(&self, request: SubmitRequest<'_>) -> Result<ResultHandle, DomainError>;

    /// Fetch the transformed audio bytes for a previously returned handle.
    async fn fetch_result(&self, handle: &ResultHandle) -> Result<Vec<u8>, DomainError>;
}
