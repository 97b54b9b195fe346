use std::sync::Arc;

use ptcg_deckbuilder::AsyncDeckBuilder;

use crate::auth::AuthService;
use crate::mailer::Mailer;

/// Shared application state available to all route handlers via Axum's
/// `State` extractor.
pub struct AppState {
    /// Dispatches blocking store operations to a thread pool internally.
    pub sdk: AsyncDeckBuilder,

    pub auth: Arc<AuthService>,

    pub mailer: Arc<dyn Mailer>,

    /// Public address used in verification links.
    pub base_url: String,
}
