use std::sync::Arc;

use pairbot_store::Store;

use crate::dates::DateParser;
use crate::exceptions::ExceptionManager;
use crate::matching::MatchingEngine;
use crate::messenger::Messenger;

/// Dependencies shared by every command and by the daily trigger.
///
/// Built once at startup; handlers receive it by reference.
pub struct AppState {
    pub store: Arc<Store>,
    pub messenger: Arc<dyn Messenger>,
    pub exceptions: ExceptionManager,
    pub matching: MatchingEngine,
}

impl AppState {
    pub fn new(store: Arc<Store>, messenger: Arc<dyn Messenger>, dates: Arc<dyn DateParser>) -> Self {
        Self {
            exceptions: ExceptionManager::new(Arc::clone(&store), dates),
            matching: MatchingEngine::new(Arc::clone(&store), Arc::clone(&messenger)),
            store,
            messenger,
        }
    }
}
