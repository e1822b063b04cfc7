use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes a single prepared request. Retries, authentication and URL
/// building live in the layers wrapped around an implementation.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

#[async_trait]
impl<C: HttpClient + ?Sized> HttpClient for &C {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        (**self).execute(req).await
    }
}
