//! Task-scoped context store.
//!
//! Installs a [`RequestContext`] for the extent of a future or closure so that
//! code several calls deep can retrieve it with [`current`] without having it
//! passed in. Scopes nest: the innermost installation wins and the outer one
//! is visible again once the inner scope returns. Tasks and threads that never
//! entered a scope see [`RequestContext::background`].
//!
//! Keep lookups at the edges (handlers, adapters). Business logic should take
//! `&RequestContext` explicitly.

use std::future::Future;

use crate::context::RequestContext;

tokio::task_local! {
    static CURRENT: RequestContext;
}

/// Run `fut` with `ctx` installed.
pub async fn scope<F>(ctx: RequestContext, fut: F) -> F::Output
where
    F: Future,
{
    CURRENT.scope(ctx, fut).await
}

/// Run `f` with `ctx` installed on the calling thread.
pub fn sync_scope<F, R>(ctx: RequestContext, f: F) -> R
where
    F: FnOnce() -> R,
{
    CURRENT.sync_scope(ctx, f)
}

/// The nearest installed context, or a background context if none.
pub fn current() -> RequestContext {
    CURRENT
        .try_with(RequestContext::clone)
        .unwrap_or_else(|_| RequestContext::background())
}

/// Whether any scope is active for the caller.
pub fn is_installed() -> bool {
    CURRENT.try_with(|_| ()).is_ok()
}

/// Capture the caller's current context and install it around `fut`.
///
/// Used when handing work to `tokio::spawn`, which otherwise starts with an
/// empty store.
pub fn propagate<F>(fut: F) -> impl Future<Output = F::Output>
where
    F: Future,
{
    let ctx = current();
    CURRENT.scope(ctx, fut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_defaults_to_background() {
        assert!(!is_installed());
        assert!(current().is_background());
    }

    #[test]
    fn sync_scope_nests_and_restores() {
        let outer = RequestContext::background().with_request_id("outer");
        let inner = RequestContext::background().with_request_id("inner");

        sync_scope(outer, || {
            assert_eq!(current().request_id(), Some("outer"));
            sync_scope(inner, || {
                assert_eq!(current().request_id(), Some("inner"));
            });
            assert_eq!(current().request_id(), Some("outer"));
        });

        assert!(current().is_background());
    }

    #[tokio::test]
    async fn async_scope_nests_and_restores() {
        let outer = RequestContext::background().with_request_id("a");
        let inner = RequestContext::background().with_request_id("b");

        scope(outer, async move {
            assert_eq!(current().request_id(), Some("a"));
            scope(inner, async {
                tokio::task::yield_now().await;
                assert_eq!(current().request_id(), Some("b"));
            })
            .await;
            assert_eq!(current().request_id(), Some("a"));
        })
        .await;

        assert!(!is_installed());
    }

    #[tokio::test]
    async fn spawned_task_does_not_inherit_scope() {
        let ctx = RequestContext::background().with_request_id("parent");
        scope(ctx, async {
            let seen = tokio::spawn(async { current().request_id().map(str::to_owned) })
                .await
                .unwrap();
            assert_eq!(seen, None);
        })
        .await;
    }

    #[tokio::test]
    async fn propagate_carries_scope_into_spawn() {
        let ctx = RequestContext::background().with_request_id("parent");
        scope(ctx, async {
            let seen = tokio::spawn(propagate(async { current().request_id().map(str::to_owned) }))
                .await
                .unwrap();
            assert_eq!(seen.as_deref(), Some("parent"));
        })
        .await;
    }
}
