//! Async propagation of the active [`TraceContext`] (§5).
//!
//! The host runtime's async-local mechanism has no direct analogue in Rust,
//! so this uses `tokio::task_local!`: the context lives in task-local
//! storage and is carried explicitly across suspension points that the
//! runtime does not propagate on its own (spawned tasks, spawned blocking
//! work). Call sites that cross one of those boundaries must go through
//! [`Propagated::spawn`] rather than `tokio::spawn` directly.

use std::future::Future;

use tokio::task::JoinHandle;

use tracekit_types::TraceContext;

tokio::task_local! {
    static CURRENT: TraceContext;
}

/// The context active on the calling task, if any.
pub fn current() -> Option<TraceContext> {
    CURRENT.try_with(|ctx| ctx.clone()).ok()
}

/// Run `f` with `ctx` installed as the current context for its duration.
pub async fn scope<F, T>(ctx: TraceContext, f: F) -> T
where
    F: Future<Output = T>,
{
    CURRENT.scope(ctx, f).await
}

/// Spawn `future` onto the runtime with the calling task's current context
/// (if any) carried into it. Plain `tokio::spawn` would start the new task
/// with no task-local context at all, breaking propagation across the
/// spawn boundary (§5).
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    match current() {
        Some(ctx) => tokio::spawn(scope(ctx, future)),
        None => tokio::spawn(future),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracekit_types::{SpanId, TraceId};

    #[tokio::test]
    async fn no_context_outside_a_scope() {
        assert!(current().is_none());
    }

    #[tokio::test]
    async fn scope_installs_and_restores_context() {
        let ctx = TraceContext::root(TraceId::new(), SpanId::new());
        let seen = scope(ctx.clone(), async { current() }).await;
        assert_eq!(seen, Some(ctx));
        assert!(current().is_none());
    }

    #[tokio::test]
    async fn spawned_task_inherits_parent_context() {
        let ctx = TraceContext::root(TraceId::new(), SpanId::new());
        let seen = scope(ctx.clone(), async {
            spawn(async { current() }).await.unwrap()
        })
        .await;
        assert_eq!(seen, Some(ctx));
    }

    #[tokio::test]
    async fn nested_scope_sees_child_then_restores_parent() {
        let root = TraceContext::root(TraceId::new(), SpanId::new());
        let child = root.child(SpanId::new());

        scope(root.clone(), async {
            assert_eq!(current(), Some(root.clone()));
            scope(child.clone(), async {
                assert_eq!(current(), Some(child.clone()));
            })
            .await;
            assert_eq!(current(), Some(root.clone()));
        })
        .await;
    }
}
