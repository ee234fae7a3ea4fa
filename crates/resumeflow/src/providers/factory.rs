use std::sync::Arc;

use super::{base::Provider, configs::ProviderConfig, openai::OpenAiProvider};
use crate::errors::ProviderError;

pub fn get_provider(config: ProviderConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    match config {
        ProviderConfig::OpenAi(openai_config) => Ok(Arc::new(OpenAiProvider::new(openai_config)?)),
    }
}
