//! Request-scoped ambient state.
//!
//! Tool handlers invoked deep inside the agent loop need the caller's user id
//! and the data-store handle without those being threaded through every
//! function. The bindings are task-local: concurrent requests never observe
//! each other, and a nested scope restores the previous value on exit.

use std::sync::Arc;

use uuid::Uuid;

use crate::store::Store;

#[derive(Clone)]
pub struct RequestScope {
    pub user_id: Option<Uuid>,
    pub store: Option<Arc<Store>>,
}

impl RequestScope {
    pub fn new(user_id: Uuid, store: Arc<Store>) -> Self {
        Self {
            user_id: Some(user_id),
            store: Some(store),
        }
    }
}

tokio::task_local! {
    static REQUEST_SCOPE: RequestScope;
}

/// Run `fut` with the given scope bound for its duration.
pub async fn with_scope<F>(scope: RequestScope, fut: F) -> F::Output
where
    F: std::future::Future,
{
    REQUEST_SCOPE.scope(scope, fut).await
}

/// The current request's user id, or `None` outside a scope.
pub fn current_user_id() -> Option<Uuid> {
    REQUEST_SCOPE
        .try_with(|scope| scope.user_id)
        .ok()
        .flatten()
}

/// The current request's store handle, or `None` outside a scope.
pub fn current_store() -> Option<Arc<Store>> {
    REQUEST_SCOPE
        .try_with(|scope| scope.store.clone())
        .ok()
        .flatten()
}
