//! Store Writer Task
//!
//! The single actor that owns all traffic to a cache's backing store.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::persistence::{Action, ActionKind, ActionResponse, Responder, Store, StoreResult};

/// Spawns the writer task for one cache.
///
/// Actions are executed strictly one at a time in the order they were
/// enqueued. Responses are sent only when the action carries a responder;
/// store errors of fire-and-forget mutations are logged and dropped.
///
/// On cancellation the queue is closed and every action already enqueued is
/// still executed before the task exits. The task also exits once every
/// sender has been dropped.
///
/// # Arguments
/// * `store` - Backing store the actions run against
/// * `actions` - Receiving half of the cache's action queue
/// * `cancel` - Token cancelled when the owning cache shuts down
pub fn spawn_writer_task<K, V>(
    store: Arc<dyn Store<K, V>>,
    mut actions: mpsc::Receiver<Action<K, V>>,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    K: std::fmt::Debug + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!("Starting store writer task");
        let mut processed: u64 = 0;

        loop {
            tokio::select! {
                biased;

                next = actions.recv() => match next {
                    Some(action) => {
                        execute(store.as_ref(), action).await;
                        processed += 1;
                    }
                    None => break,
                },
                _ = cancel.cancelled() => {
                    actions.close();
                    while let Some(action) = actions.recv().await {
                        execute(store.as_ref(), action).await;
                        processed += 1;
                    }
                    break;
                }
            }
        }

        info!("Store writer task stopped after {} actions", processed);
    })
}

// == Execute ==
/// Runs one action against the store and answers it if requested.
async fn execute<K, V>(store: &dyn Store<K, V>, action: Action<K, V>)
where
    K: std::fmt::Debug + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    debug!("Executing {:?}", action);
    let kind = action.kind();

    match action {
        Action::Get { key, respond_to } => {
            let response = match store.get(&key).await {
                Ok(value) => ActionResponse {
                    value,
                    ..ActionResponse::default()
                },
                Err(err) => ActionResponse::failed(err),
            };
            reply(kind, respond_to, response);
        }
        Action::Put {
            key,
            value,
            respond_to,
        } => {
            let result = store.put(key, value).await;
            settle(kind, respond_to, result);
        }
        Action::Delete { key, respond_to } => {
            let result = store.delete(&key).await;
            settle(kind, respond_to, result);
        }
        Action::Exists { key, respond_to } => {
            let response = match store.exists(&key).await {
                Ok(exists) => ActionResponse {
                    exists,
                    ..ActionResponse::default()
                },
                Err(err) => ActionResponse::failed(err),
            };
            reply(kind, respond_to, response);
        }
        Action::Query {
            matcher,
            respond_to,
        } => {
            let response = match store.query(matcher.as_ref()).await {
                Ok(values) => ActionResponse {
                    values,
                    ..ActionResponse::default()
                },
                Err(err) => ActionResponse::failed(err),
            };
            reply(kind, respond_to, response);
        }
    }
}

/// Answers a mutation, or logs its failure when nobody is waiting.
fn settle<V>(kind: ActionKind, respond_to: Option<Responder<V>>, result: StoreResult<()>) {
    match (respond_to, result) {
        (Some(tx), Ok(())) => reply(kind, tx, ActionResponse::default()),
        (Some(tx), Err(err)) => reply(kind, tx, ActionResponse::failed(err)),
        (None, Ok(())) => {}
        (None, Err(err)) => warn!("Dropping store error for unawaited {}: {:#}", kind, err),
    }
}

fn reply<V>(kind: ActionKind, respond_to: Responder<V>, response: ActionResponse<V>) {
    if respond_to.send(response).is_err() {
        debug!("Receiver of {} response went away", kind);
    }
}
