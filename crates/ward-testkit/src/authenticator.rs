//! Scripted remote authenticator
//!
//! Stands in for the router's remote call capability. Every call is recorded
//! so tests can assert on exactly what a handshake sent.

#![allow(clippy::disallowed_types)]

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use ward_core::{JsonMap, RemoteCallEffects, WardError};

/// What the next calls return
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Resolve with this value
    Value(Value),
    /// Fail with this error
    Error(WardError),
    /// Never resolve
    Hang,
}

/// One recorded call
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Procedure URI that was called
    pub procedure: String,
    /// Positional arguments
    pub args: Vec<Value>,
}

impl RecordedCall {
    /// First positional argument
    pub fn realm(&self) -> Option<&str> {
        self.args.first().and_then(Value::as_str)
    }

    /// Second positional argument, `None` when null
    pub fn authid(&self) -> Option<&str> {
        self.args.get(1).and_then(Value::as_str)
    }

    /// Third positional argument
    pub fn details(&self) -> &JsonMap {
        self.args
            .get(2)
            .and_then(Value::as_object)
            .expect("authenticator call without a details mapping")
    }
}

#[derive(Debug)]
struct State {
    reply: MockReply,
    calls: Vec<RecordedCall>,
}

/// Remote authenticator with a scripted reply
#[derive(Debug, Clone)]
pub struct MockAuthenticator {
    state: Arc<Mutex<State>>,
}

impl MockAuthenticator {
    /// Reply with `value`
    pub fn returning(value: Value) -> Self {
        Self::with_reply(MockReply::Value(value))
    }

    /// Reply with an error
    pub fn failing(error: WardError) -> Self {
        Self::with_reply(MockReply::Error(error))
    }

    /// Never reply
    pub fn hanging() -> Self {
        Self::with_reply(MockReply::Hang)
    }

    fn with_reply(reply: MockReply) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                reply,
                calls: Vec::new(),
            })),
        }
    }

    /// Replace the scripted reply
    pub fn set_reply(&self, reply: MockReply) {
        self.state.lock().unwrap().reply = reply;
    }

    /// All calls so far, oldest first
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of calls so far
    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    /// Most recent call
    pub fn last_call(&self) -> RecordedCall {
        self.calls()
            .pop()
            .expect("the authenticator was never called")
    }
}

#[async_trait]
impl RemoteCallEffects for MockAuthenticator {
    async fn call(&self, procedure: &str, args: Vec<Value>) -> Result<Value, WardError> {
        let reply = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(RecordedCall {
                procedure: procedure.to_string(),
                args,
            });
            state.reply.clone()
        };
        tracing::trace!(procedure, "mock authenticator called");

        match reply {
            MockReply::Value(value) => Ok(value),
            MockReply::Error(error) => Err(error),
            MockReply::Hang => std::future::pending().await,
        }
    }
}
