/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - DPoP validator と htu 組み立て用の public base URL
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::dpop::DpopValidator;

#[derive(Clone, Debug)]
pub struct AppState {
    pub dpop: DpopValidator,
    pub public_base_url: Option<Arc<str>>,
}

impl AppState {
    pub fn new(dpop: DpopValidator, public_base_url: Option<String>) -> Self {
        Self {
            dpop,
            public_base_url: public_base_url.map(Arc::from),
        }
    }

    pub fn public_base_url(&self) -> Option<&str> {
        self.public_base_url.as_deref()
    }
}
