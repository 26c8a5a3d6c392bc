pub(crate) mod health;
pub(crate) mod portfolio;
pub(crate) mod quotes;
pub(crate) mod sessions;
pub(crate) mod settings;
pub(crate) mod trades;

use serde::{Deserialize, Serialize};

/// Confirmation body for mutations with nothing else to return.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
