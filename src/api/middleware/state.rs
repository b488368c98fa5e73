use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::card_issuer::CardIssuer;

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub issuer: CardIssuer,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        let issuer = CardIssuer::new(store.clone());
        Self {
            store,
            issuer,
            config,
        }
    }
}
