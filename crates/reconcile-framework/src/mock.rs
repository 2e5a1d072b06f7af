//! # Mock Remote & Testing Guide
//!
//! `MockRemote<K>` implements the same [`RemoteClient`] / [`ManagedClient`]
//! traits as a real client but answers from a queue of expectations. Every
//! request the driver sends is recorded, including the JSON encoding of the
//! request body, so tests can assert exactly what went over the wire.
//!
//! ## When to use the mock vs the simulator
//!
//! | Feature | MockRemote | SimulatedApi |
//! |---------|------------|--------------|
//! | **Speed** | Instant (in-memory) | Fast (spawns a tokio task) |
//! | **Determinism** | Scripted responses | Real store semantics |
//! | **Use case** | Driver behaviour on specific responses | End-to-end lifecycles |
//! | **Error injection** | Any status, body or transport error | Injected [`Fault`](crate::simulator::Fault)s |
//!
//! ## Example
//!
//! ```rust,ignore
//! let mock = MockRemote::<NetworkResource>::new();
//! mock.expect_add()
//!     .return_created("https://api.example/networks/network-1");
//! mock.expect_get("network-1").return_ok(network);
//!
//! let driver = ResourceDriver::new(mock.clone());
//! driver.create(&mut data).await?;
//!
//! mock.verify(); // panics if an expectation was not consumed
//! ```
//!
//! Requests are matched strictly in order; a request that does not match the
//! next expectation panics with both sides printed.

use crate::client::{ManagedClient, RemoteClient};
use crate::kind::{ManagedKind, ResourceKind};
use crate::response::{ApiResponse, CallResult, Reply, StatusResult, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

enum Expectation<O> {
    Find {
        response: CallResult<Vec<O>>,
    },
    Get {
        id: String,
        response: CallResult<O>,
    },
    Add {
        response: StatusResult,
    },
    Update {
        id: String,
        response: CallResult<O>,
    },
    Delete {
        id: String,
        response: StatusResult,
    },
}

impl<O> Expectation<O> {
    fn describe(&self) -> String {
        match self {
            Expectation::Find { .. } => "find".to_string(),
            Expectation::Get { id, .. } => format!("get({id})"),
            Expectation::Add { .. } => "add".to_string(),
            Expectation::Update { id, .. } => format!("update({id})"),
            Expectation::Delete { id, .. } => format!("delete({id})"),
        }
    }
}

/// A request received by the mock.
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Find,
    Get { id: String },
    Add { parent_id: String, body: serde_json::Value },
    Update { id: String, body: serde_json::Value },
    Delete { id: String },
}

struct Shared<O> {
    expectations: VecDeque<Expectation<O>>,
    recorded: Vec<Recorded>,
}

/// A scripted remote client. Clones share the same expectation queue.
pub struct MockRemote<K: ResourceKind> {
    shared: Arc<Mutex<Shared<K::Object>>>,
}

impl<K: ResourceKind> Clone for MockRemote<K> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<K: ResourceKind> Default for MockRemote<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ResourceKind> MockRemote<K> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                expectations: VecDeque::new(),
                recorded: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared<K::Object>> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, expectation: Expectation<K::Object>) {
        self.lock().expectations.push_back(expectation);
    }

    fn next(&self, request: Recorded) -> Expectation<K::Object> {
        let mut shared = self.lock();
        let description = format!("{request:?}");
        shared.recorded.push(request);
        match shared.expectations.pop_front() {
            Some(expectation) => expectation,
            None => panic!("Unexpected request {description}: no expectations left"),
        }
    }

    pub fn expect_find(&self) -> ValueExpectation<'_, K, Vec<K::Object>> {
        ValueExpectation {
            mock: self,
            make: Box::new(|response| Expectation::Find { response }),
        }
    }

    pub fn expect_get(&self, id: &str) -> ValueExpectation<'_, K, K::Object> {
        let id = id.to_string();
        ValueExpectation {
            mock: self,
            make: Box::new(move |response| Expectation::Get { id, response }),
        }
    }

    pub fn expect_add(&self) -> StatusExpectation<'_, K> {
        StatusExpectation {
            mock: self,
            make: Box::new(|response| Expectation::Add { response }),
        }
    }

    pub fn expect_update(&self, id: &str) -> ValueExpectation<'_, K, K::Object> {
        let id = id.to_string();
        ValueExpectation {
            mock: self,
            make: Box::new(move |response| Expectation::Update { id, response }),
        }
    }

    pub fn expect_delete(&self, id: &str) -> StatusExpectation<'_, K> {
        let id = id.to_string();
        StatusExpectation {
            mock: self,
            make: Box::new(move |response| Expectation::Delete { id, response }),
        }
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<Recorded> {
        self.lock().recorded.clone()
    }

    /// Panics unless every expectation was consumed.
    pub fn verify(&self) {
        let shared = self.lock();
        if !shared.expectations.is_empty() {
            let pending: Vec<String> = shared.expectations.iter().map(|e| e.describe()).collect();
            panic!("Not all expectations were met. Remaining: {pending:?}");
        }
    }
}

type MakeExpectation<O, T> = Box<dyn FnOnce(CallResult<T>) -> Expectation<O> + Send>;

/// Builder for calls that return a value (`find`, `get`, `update`).
pub struct ValueExpectation<'a, K: ResourceKind, T> {
    mock: &'a MockRemote<K>,
    make: MakeExpectation<K::Object, T>,
}

impl<K: ResourceKind, T> ValueExpectation<'_, K, T> {
    /// Answers `200` with `value`.
    pub fn return_ok(self, value: T) {
        self.mock
            .push((self.make)(Ok(Reply::ok(value, ApiResponse::new(200)))));
    }

    /// Answers with `response` and no decoded value.
    pub fn return_response(self, response: ApiResponse) {
        self.mock.push((self.make)(Ok(Reply::empty(response))));
    }

    pub fn return_err(self, error: TransportError) {
        self.mock.push((self.make)(Err(error)));
    }
}

type MakeStatusExpectation<O> = Box<dyn FnOnce(StatusResult) -> Expectation<O> + Send>;

/// Builder for calls that only return a response (`add`, `delete`).
pub struct StatusExpectation<'a, K: ResourceKind> {
    mock: &'a MockRemote<K>,
    make: MakeStatusExpectation<K::Object>,
}

impl<K: ResourceKind> StatusExpectation<'_, K> {
    /// Answers `201` with the given `location` header.
    pub fn return_created(self, location: &str) {
        self.mock
            .push((self.make)(Ok(ApiResponse::new(201).with_header("location", location))));
    }

    /// Answers `200` with no body.
    pub fn return_ok(self) {
        self.mock.push((self.make)(Ok(ApiResponse::new(200))));
    }

    pub fn return_response(self, response: ApiResponse) {
        self.mock.push((self.make)(Ok(response)));
    }

    pub fn return_err(self, error: TransportError) {
        self.mock.push((self.make)(Err(error)));
    }
}

fn encode<T: serde::Serialize>(body: &T) -> serde_json::Value {
    serde_json::to_value(body).unwrap_or(serde_json::Value::Null)
}

#[async_trait]
impl<K: ResourceKind> RemoteClient<K> for MockRemote<K> {
    async fn find(&self) -> CallResult<Vec<K::Object>> {
        match self.next(Recorded::Find) {
            Expectation::Find { response } => response,
            other => panic!("Expected {}, got find", other.describe()),
        }
    }

    async fn get(&self, id: &str) -> CallResult<K::Object> {
        match self.next(Recorded::Get { id: id.to_string() }) {
            Expectation::Get { id: expected, response } if expected == id => response,
            other => panic!("Expected {}, got get({id})", other.describe()),
        }
    }
}

#[async_trait]
impl<K: ManagedKind> ManagedClient<K> for MockRemote<K> {
    async fn add(&self, parent_id: &str, body: &K::Body) -> StatusResult {
        let request = Recorded::Add {
            parent_id: parent_id.to_string(),
            body: encode(body),
        };
        match self.next(request) {
            Expectation::Add { response } => response,
            other => panic!("Expected {}, got add({parent_id})", other.describe()),
        }
    }

    async fn update(&self, id: &str, body: &K::Body) -> CallResult<K::Object> {
        let request = Recorded::Update {
            id: id.to_string(),
            body: encode(body),
        };
        match self.next(request) {
            Expectation::Update { id: expected, response } if expected == id => response,
            other => panic!("Expected {}, got update({id})", other.describe()),
        }
    }

    async fn delete(&self, id: &str) -> StatusResult {
        match self.next(Recorded::Delete { id: id.to_string() }) {
            Expectation::Delete { id: expected, response } if expected == id => response,
            other => panic!("Expected {}, got delete({id})", other.describe()),
        }
    }
}
