// Request Handler: multipart intake, the validation pipeline and the result models.
// All model calls go through llm_client; no direct provider calls here.

pub mod handlers;
pub mod models;
pub mod pipeline;
