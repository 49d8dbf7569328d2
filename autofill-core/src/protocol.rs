// Messages exchanged between popup, background and content script.
//
// The host only promises "the channel closes when you are done", so every request
// is paired with a `Responder` that can reply at most once and a `PendingReply`
// that resolves exactly once, either with the reply or with `ReplyDropped`.

use std::future::Future;
use std::pin::pin;

use futures::channel::oneshot;
use futures::future::{self, Either};
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// Popup → background.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "command")]
pub enum Request {
    #[serde(rename = "connectToRkl")]
    Connect,
    #[serde(rename = "getAll")]
    GetAll,
    #[serde(rename = "resetRkl")]
    Reset,
}

/// Background → popup. Failures travel in `response` as plain text.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub response: String,
}

impl Reply {
    pub const OK: &'static str = "OK";

    pub fn ok() -> Self {
        Self::new(Self::OK)
    }

    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.response == Self::OK
    }
}

impl From<Result<String>> for Reply {
    fn from(result: Result<String>) -> Self {
        match result {
            Ok(response) => Reply::new(response),
            Err(e) => Reply::new(e.to_string()),
        }
    }
}

/// Background → content script.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum FillCommand {
    Credentials { user: String, pass: String },
    /// Single value written to whatever editable field has focus.
    Legacy(String),
}

/// Reply half of a request. Consumed by `reply`, so a handler cannot answer twice.
#[derive(Debug)]
pub struct Responder<T> {
    tx: oneshot::Sender<T>,
}

impl<T> Responder<T> {
    pub fn reply(self, value: T) {
        if self.tx.send(value).is_err() {
            // Sender side went away (popup closed); nothing to deliver to.
            log::debug!("Reply orphaned, requester is gone");
        }
    }
}

/// Requester half. Resolves with `ReplyDropped` if the responder is dropped unused.
#[derive(Debug)]
pub struct PendingReply<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> PendingReply<T> {
    pub async fn wait(self) -> Result<T> {
        self.rx.await.map_err(|_| BridgeError::ReplyDropped)
    }
}

pub fn reply_channel<T>() -> (Responder<T>, PendingReply<T>) {
    let (tx, rx) = oneshot::channel();
    (Responder { tx }, PendingReply { rx })
}

/// Source of delays for `with_timeout`; gloo timers in wasm, anything in tests.
pub trait Timer {
    type Delay: Future<Output = ()>;

    fn delay(&self, ms: u32) -> Self::Delay;
}

/// Race `fut` against a `ms` delay from `timer`.
pub async fn with_timeout<T, F>(timer: &T, ms: u32, fut: F) -> Result<F::Output>
where
    T: Timer,
    F: Future,
{
    let fut = pin!(fut);
    let delay = pin!(timer.delay(ms));

    match future::select(fut, delay).await {
        Either::Left((output, _)) => Ok(output),
        Either::Right(_) => Err(BridgeError::Timeout(ms)),
    }
}
