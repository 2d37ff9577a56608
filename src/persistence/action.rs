//! Store Actions
//!
//! Request/response messages exchanged between cache handles and the writer task.

use std::fmt;
use std::sync::Arc;

use tokio::sync::oneshot;

use crate::query::Matcher;

/// Single-use reply channel. Sending consumes it, so a response is
/// delivered at most once.
pub type Responder<V> = oneshot::Sender<ActionResponse<V>>;

/// Kind of store operation an [`Action`] requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Get,
    Put,
    Delete,
    Exists,
    Query,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::Get => "get",
            ActionKind::Put => "put",
            ActionKind::Delete => "delete",
            ActionKind::Exists => "exists",
            ActionKind::Query => "query",
        };
        f.write_str(name)
    }
}

// == Action ==
/// One queued store operation.
///
/// Reads always carry a responder. Mutations carry one only when the caller
/// waits for the store result; otherwise they are fire-and-forget.
pub enum Action<K, V> {
    Get {
        key: K,
        respond_to: Responder<V>,
    },
    Put {
        key: K,
        value: V,
        respond_to: Option<Responder<V>>,
    },
    Delete {
        key: K,
        respond_to: Option<Responder<V>>,
    },
    Exists {
        key: K,
        respond_to: Responder<V>,
    },
    Query {
        matcher: Arc<dyn Matcher<V>>,
        respond_to: Responder<V>,
    },
}

impl<K, V> Action<K, V> {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Get { .. } => ActionKind::Get,
            Action::Put { .. } => ActionKind::Put,
            Action::Delete { .. } => ActionKind::Delete,
            Action::Exists { .. } => ActionKind::Exists,
            Action::Query { .. } => ActionKind::Query,
        }
    }

    pub fn wants_response(&self) -> bool {
        match self {
            Action::Get { .. } | Action::Exists { .. } | Action::Query { .. } => true,
            Action::Put { respond_to, .. } | Action::Delete { respond_to, .. } => {
                respond_to.is_some()
            }
        }
    }

    // == Constructors ==
    /// Builds a get action and the receiver its response arrives on.
    pub fn get(key: K) -> (Self, oneshot::Receiver<ActionResponse<V>>) {
        let (tx, rx) = oneshot::channel();
        (Action::Get { key, respond_to: tx }, rx)
    }

    pub fn exists(key: K) -> (Self, oneshot::Receiver<ActionResponse<V>>) {
        let (tx, rx) = oneshot::channel();
        (Action::Exists { key, respond_to: tx }, rx)
    }

    pub fn query(matcher: Arc<dyn Matcher<V>>) -> (Self, oneshot::Receiver<ActionResponse<V>>) {
        let (tx, rx) = oneshot::channel();
        (
            Action::Query {
                matcher,
                respond_to: tx,
            },
            rx,
        )
    }

    /// Builds a put action; the receiver is present only when `wait` is set.
    pub fn put(key: K, value: V, wait: bool) -> (Self, Option<oneshot::Receiver<ActionResponse<V>>>) {
        let (respond_to, rx) = optional_channel(wait);
        (
            Action::Put {
                key,
                value,
                respond_to,
            },
            rx,
        )
    }

    pub fn delete(key: K, wait: bool) -> (Self, Option<oneshot::Receiver<ActionResponse<V>>>) {
        let (respond_to, rx) = optional_channel(wait);
        (Action::Delete { key, respond_to }, rx)
    }
}

impl<K: fmt::Debug, V> fmt::Debug for Action<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Action");
        out.field("kind", &self.kind());
        match self {
            Action::Get { key, .. }
            | Action::Put { key, .. }
            | Action::Delete { key, .. }
            | Action::Exists { key, .. } => {
                out.field("key", key);
            }
            Action::Query { .. } => {}
        }
        out.field("wants_response", &self.wants_response()).finish()
    }
}

fn optional_channel<V>(
    wait: bool,
) -> (
    Option<Responder<V>>,
    Option<oneshot::Receiver<ActionResponse<V>>>,
) {
    if wait {
        let (tx, rx) = oneshot::channel();
        (Some(tx), Some(rx))
    } else {
        (None, None)
    }
}

// == Action Response ==
/// Result of one executed action.
#[derive(Debug)]
pub struct ActionResponse<V> {
    /// Store failure, if any
    pub error: Option<anyhow::Error>,
    /// Value returned by a get
    pub value: Option<V>,
    /// Values returned by a query
    pub values: Vec<V>,
    /// Answer to an exists
    pub exists: bool,
}

impl<V> Default for ActionResponse<V> {
    fn default() -> Self {
        Self {
            error: None,
            value: None,
            values: Vec::new(),
            exists: false,
        }
    }
}

impl<V> ActionResponse<V> {
    pub fn failed(error: anyhow::Error) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    /// Splits the response into the error channel and the payload.
    pub fn into_result(mut self) -> Result<Self, anyhow::Error> {
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}
