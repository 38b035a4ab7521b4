/*
 * Responsibility
 * - POST /dpop/validate の request DTO
 * - response は services::dpop::ValidationResult をそのまま返す
 */
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub proof: String,
    pub method: String,
    pub url: String,
    pub access_token: Option<String>,
}

impl ValidateRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.method.trim().is_empty() {
            return Err("method is required");
        }
        if self.url.trim().is_empty() {
            return Err("url is required");
        }
        Ok(())
    }
}
