//! Request context carrier: deadline, cancellation and correlation values.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Why a context finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Done {
    /// The cancellation token fired.
    Cancelled,
    /// The deadline elapsed.
    DeadlineExceeded,
}

impl fmt::Display for Done {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Done::Cancelled => write!(f, "context cancelled"),
            Done::DeadlineExceeded => write!(f, "context deadline exceeded"),
        }
    }
}

/// Request-scoped context handed to every outbound call.
///
/// Cloning is cheap: clones share the cancellation token and the value map.
#[derive(Clone)]
pub struct RequestContext {
    request_id: Option<Arc<str>>,
    deadline: Option<Instant>,
    cancel: CancellationToken,
    values: Arc<BTreeMap<String, String>>,
}

impl RequestContext {
    /// Empty context with no id, no deadline and no values.
    pub fn background() -> Self {
        Self {
            request_id: None,
            deadline: None,
            cancel: CancellationToken::new(),
            values: Arc::new(BTreeMap::new()),
        }
    }

    /// Fresh context carrying a generated request ID (UUID v4).
    pub fn new() -> Self {
        Self::background().with_request_id(Uuid::new_v4().to_string())
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(Arc::from(id.into()));
        self
    }

    /// Set a deadline. An earlier existing deadline is kept.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        });
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Attach a correlation value. Other clones are unaffected.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.values).insert(key.into(), value.into());
        self
    }

    /// Derive a context that is cancelled together with this one but can
    /// also be cancelled on its own.
    pub fn child(&self) -> Self {
        Self {
            request_id: self.request_id.clone(),
            deadline: self.deadline,
            cancel: self.cancel.child_token(),
            values: Arc::clone(&self.values),
        }
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline, zero once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// True for a context with nothing attached.
    pub fn is_background(&self) -> bool {
        self.request_id.is_none() && self.deadline.is_none() && self.values.is_empty()
    }

    /// Already finished, without waiting.
    pub fn check(&self) -> Option<Done> {
        if self.is_cancelled() {
            return Some(Done::Cancelled);
        }
        match self.deadline {
            Some(d) if d <= Instant::now() => Some(Done::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves when the context is cancelled or its deadline passes.
    /// Pending forever for a background context that is never cancelled.
    pub async fn done(&self) -> Done {
        let deadline = async {
            match self.deadline {
                Some(d) => tokio::time::sleep_until(d).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Done::Cancelled,
            _ = deadline => Done::DeadlineExceeded,
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::background()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("deadline", &self.deadline)
            .field("cancelled", &self.is_cancelled())
            .field("values", &self.values)
            .finish()
    }
}
