//! Isolation of task-scoped contexts across concurrent call chains.

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use outbound_trace::context::{self, RequestContext};
use tokio::sync::Notify;

fn ctx(id: &str) -> RequestContext {
    RequestContext::background().with_request_id(id)
}

fn current_id() -> Option<String> {
    context::current().request_id().map(str::to_owned)
}

#[tokio::test]
async fn test_nested_scopes_restore_outer() {
    let observed = context::scope(ctx("A"), async {
        let before = current_id();
        let inner = context::scope(ctx("B"), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            current_id()
        })
        .await;
        let after = current_id();
        (before, inner, after)
    })
    .await;

    assert_eq!(
        observed,
        (Some("A".into()), Some("B".into()), Some("A".into()))
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_tasks_never_see_each_other() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());

    let scoped = {
        let entered = entered.clone();
        let release = release.clone();
        tokio::spawn(context::scope(ctx("A"), async move {
            entered.notify_one();
            release.notified().await;
            current_id()
        }))
    };

    // The bystander runs while A's scope is active but never entered it.
    entered.notified().await;
    let bystander = tokio::spawn(async {
        let mut seen = Vec::new();
        for _ in 0..10 {
            seen.push(context::current().is_background());
            tokio::task::yield_now().await;
        }
        seen
    })
    .await
    .unwrap();
    release.notify_one();

    assert!(bystander.iter().all(|&background| background));
    assert_eq!(scoped.await.unwrap().as_deref(), Some("A"));
}

#[tokio::test]
async fn test_interleaved_futures_on_one_task() {
    let a = context::scope(ctx("A"), async {
        let mut ids = Vec::new();
        for _ in 0..5 {
            ids.push(current_id());
            tokio::task::yield_now().await;
        }
        ids
    });
    let b = context::scope(ctx("B"), async {
        let mut ids = Vec::new();
        for _ in 0..5 {
            ids.push(current_id());
            tokio::task::yield_now().await;
        }
        ids
    });
    let plain = async {
        tokio::task::yield_now().await;
        current_id()
    };

    let (a, b, plain) = tokio::join!(a, b, plain);

    assert!(a.iter().all(|id| id.as_deref() == Some("A")));
    assert!(b.iter().all(|id| id.as_deref() == Some("B")));
    assert_eq!(plain, None);
}

#[test]
fn test_threads_are_isolated() {
    let barrier = Arc::new(Barrier::new(2));

    let scoped = {
        let barrier = barrier.clone();
        thread::spawn(move || {
            context::sync_scope(ctx("thread-A"), || {
                barrier.wait();
                barrier.wait();
                current_id()
            })
        })
    };

    let bystander = {
        let barrier = barrier.clone();
        thread::spawn(move || {
            barrier.wait();
            let seen = current_id();
            barrier.wait();
            seen
        })
    };

    assert_eq!(scoped.join().unwrap().as_deref(), Some("thread-A"));
    assert_eq!(bystander.join().unwrap(), None);
}
