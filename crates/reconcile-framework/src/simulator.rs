//! # Simulated Provisioning API
//!
//! An in-memory stand-in for one collection of the provisioning API, built as
//! an actor: [`SimulatedApi`] owns the store and processes [`ApiRequest`]s
//! sequentially in its own task, and [`ApiHandle`] is the cheap-to-clone
//! client half that implements the driver's client traits.
//!
//! The simulator answers the way the real API does:
//!
//! * **add** returns `201` with no body and a `location` header.
//! * **get**, **update**, **delete** on an unknown id return `404` with a
//!   structured `{status, code, message}` body.
//! * A payload the collection rejects returns `400`.
//!
//! Failures can be injected per verb with [`ApiHandle::inject`]; each injected
//! [`Fault`] is consumed by the next matching request.
//!
//! ```rust
//! use reconcile_framework::simulator::{Simulated, SimulatedApi};
//! use serde::Serialize;
//!
//! #[derive(Clone, Debug, Serialize)]
//! struct Widget { id: String, name: String }
//!
//! struct Widgets;
//! impl Simulated for Widgets {
//!     const COLLECTION: &'static str = "widgets";
//!     const ID_PREFIX: &'static str = "widget";
//!     type Object = Widget;
//!     type Payload = String;
//!     fn object_id(w: &Widget) -> Option<&str> { Some(&w.id) }
//!     fn materialize(id: &str, _href: &str, _parent: &str, name: String) -> Result<Widget, String> {
//!         Ok(Widget { id: id.to_string(), name })
//!     }
//!     fn replace(current: &Widget, name: String) -> Result<Widget, String> {
//!         Ok(Widget { name, ..current.clone() })
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (api, handle) = SimulatedApi::<Widgets>::new(8, "https://api.example");
//!     tokio::spawn(api.run());
//!     let id = handle.seed(Widget { id: "w1".into(), name: "a".into() }).await.unwrap();
//!     assert_eq!(id.as_str(), "w1");
//! }
//! ```

use crate::client::{ManagedClient, RemoteClient};
use crate::identity::ExternalId;
use crate::kind::{ManagedKind, ResourceKind};
use crate::normalize::ApiErrorBody;
use crate::response::{ApiResponse, CallResult, Reply, StatusResult, TransportError};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Debug;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// A collection the simulator can serve.
pub trait Simulated: Send + Sync + 'static {
    /// Path segment of the collection, e.g. `connections`.
    const COLLECTION: &'static str;
    /// Prefix of generated identifiers, e.g. `conn`.
    const ID_PREFIX: &'static str;

    type Object: Clone + Debug + Send + Sync + Serialize + 'static;
    type Payload: Clone + Debug + Send + Sync + 'static;

    fn object_id(object: &Self::Object) -> Option<&str>;

    /// Builds the stored object for a newly added payload. An `Err` is
    /// answered with `400`.
    fn materialize(
        id: &str,
        href: &str,
        parent_id: &str,
        payload: Self::Payload,
    ) -> Result<Self::Object, String>;

    /// Applies an update payload to a stored object.
    fn replace(current: &Self::Object, payload: Self::Payload) -> Result<Self::Object, String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Find,
    Get,
    Add,
    Update,
    Delete,
}

/// A failure the next matching request answers with.
#[derive(Debug, Clone)]
pub enum Fault {
    Respond(ApiResponse),
    Transport(TransportError),
}

impl Fault {
    /// A rejection with a structured error body.
    pub fn rejected(status: u16, code: &str, message: &str) -> Self {
        Fault::Respond(error_response(status, code, message))
    }
}

fn error_response(status: u16, code: &str, message: &str) -> ApiResponse {
    let body = ApiErrorBody {
        status,
        code: code.to_string(),
        message: message.to_string(),
    };
    let response = ApiResponse::new(status);
    match serde_json::to_vec(&body) {
        Ok(bytes) => response
            .with_header("content-type", "application/json")
            .with_body(bytes),
        Err(_) => response,
    }
}

type Respond<T> = oneshot::Sender<Result<T, TransportError>>;

#[derive(Debug)]
pub enum ApiRequest<S: Simulated> {
    Find {
        respond_to: Respond<Reply<Vec<S::Object>>>,
    },
    Get {
        id: String,
        respond_to: Respond<Reply<S::Object>>,
    },
    Add {
        parent_id: String,
        payload: S::Payload,
        respond_to: Respond<ApiResponse>,
    },
    Update {
        id: String,
        payload: S::Payload,
        respond_to: Respond<Reply<S::Object>>,
    },
    Delete {
        id: String,
        respond_to: Respond<ApiResponse>,
    },
    Seed {
        object: S::Object,
        respond_to: Respond<ExternalId>,
    },
    Inject {
        verb: Verb,
        fault: Fault,
        respond_to: Respond<()>,
    },
}

/// The server half: owns the store and the receiving end of the channel.
pub struct SimulatedApi<S: Simulated> {
    receiver: mpsc::Receiver<ApiRequest<S>>,
    base_url: String,
    /// Insertion order is kept so `find` is deterministic.
    store: Vec<(String, S::Object)>,
    faults: Vec<(Verb, Fault)>,
    next_id: u32,
}

impl<S: Simulated> SimulatedApi<S> {
    pub fn new(buffer_size: usize, base_url: &str) -> (Self, ApiHandle<S>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let api = Self {
            receiver,
            base_url: base_url.trim_end_matches('/').to_string(),
            store: Vec::new(),
            faults: Vec::new(),
            next_id: 1,
        };
        (api, ApiHandle { sender })
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.store.iter().position(|(key, _)| key == id)
    }

    fn take_fault(&mut self, verb: Verb) -> Option<Fault> {
        let index = self.faults.iter().position(|(v, _)| *v == verb)?;
        Some(self.faults.remove(index).1)
    }

    fn not_found(id: &str) -> ApiResponse {
        error_response(
            404,
            "RESOURCE_NOT_FOUND",
            &format!("{} {id} does not exist", S::COLLECTION),
        )
    }

    /// Runs the request loop until every handle is dropped.
    pub async fn run(mut self) {
        let collection = S::COLLECTION;
        info!(collection, "Simulated API started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ApiRequest::Find { respond_to } => {
                    let result = match self.take_fault(Verb::Find) {
                        Some(fault) => faulted(fault),
                        None => {
                            let objects = self.store.iter().map(|(_, o)| o.clone()).collect();
                            Ok(Reply::ok(objects, ApiResponse::new(200)))
                        }
                    };
                    debug!(collection, size = self.store.len(), "Find");
                    let _ = respond_to.send(result);
                }
                ApiRequest::Get { id, respond_to } => {
                    let result = match self.take_fault(Verb::Get) {
                        Some(fault) => faulted(fault),
                        None => match self.position(&id) {
                            Some(i) => Ok(Reply::ok(self.store[i].1.clone(), ApiResponse::new(200))),
                            None => Ok(Reply::empty(Self::not_found(&id))),
                        },
                    };
                    debug!(collection, %id, "Get");
                    let _ = respond_to.send(result);
                }
                ApiRequest::Add {
                    parent_id,
                    payload,
                    respond_to,
                } => {
                    debug!(collection, %parent_id, ?payload, "Add");
                    let result = match self.take_fault(Verb::Add) {
                        Some(fault) => faulted(fault).map(|reply: Reply<()>| reply.response),
                        None => Ok(self.add(&parent_id, payload)),
                    };
                    let _ = respond_to.send(result);
                }
                ApiRequest::Update {
                    id,
                    payload,
                    respond_to,
                } => {
                    debug!(collection, %id, ?payload, "Update");
                    let result = match self.take_fault(Verb::Update) {
                        Some(fault) => faulted(fault),
                        None => Ok(self.update(&id, payload)),
                    };
                    let _ = respond_to.send(result);
                }
                ApiRequest::Delete { id, respond_to } => {
                    debug!(collection, %id, "Delete");
                    let result = match self.take_fault(Verb::Delete) {
                        Some(fault) => faulted(fault).map(|reply: Reply<()>| reply.response),
                        None => Ok(match self.position(&id) {
                            Some(i) => {
                                self.store.remove(i);
                                info!(collection, %id, size = self.store.len(), "Deleted");
                                ApiResponse::new(204)
                            }
                            None => Self::not_found(&id),
                        }),
                    };
                    let _ = respond_to.send(result);
                }
                ApiRequest::Seed { object, respond_to } => {
                    let result = match S::object_id(&object).map(str::to_string) {
                        Some(id) => {
                            match self.position(&id) {
                                Some(i) => self.store[i].1 = object,
                                None => self.store.push((id.clone(), object)),
                            }
                            Ok(ExternalId::from(id))
                        }
                        None => Err(TransportError::Codec(
                            "seeded object has no identifier".to_string(),
                        )),
                    };
                    let _ = respond_to.send(result);
                }
                ApiRequest::Inject {
                    verb,
                    fault,
                    respond_to,
                } => {
                    debug!(collection, ?verb, ?fault, "Fault injected");
                    self.faults.push((verb, fault));
                    let _ = respond_to.send(Ok(()));
                }
            }
        }

        info!(collection, size = self.store.len(), "Shutdown");
    }

    fn add(&mut self, parent_id: &str, payload: S::Payload) -> ApiResponse {
        let id = format!("{}-{}", S::ID_PREFIX, self.next_id);
        let href = format!("/{}/{id}", S::COLLECTION);
        match S::materialize(&id, &href, parent_id, payload) {
            Ok(object) => {
                self.next_id += 1;
                self.store.push((id.clone(), object));
                info!(collection = S::COLLECTION, %id, size = self.store.len(), "Created");
                ApiResponse::new(201).with_header("location", format!("{}{href}", self.base_url))
            }
            Err(reason) => {
                warn!(collection = S::COLLECTION, %reason, "Add rejected");
                error_response(400, "INVALID_REQUEST", &reason)
            }
        }
    }

    fn update(&mut self, id: &str, payload: S::Payload) -> Reply<S::Object> {
        let Some(i) = self.position(id) else {
            return Reply::empty(Self::not_found(id));
        };
        match S::replace(&self.store[i].1, payload) {
            Ok(object) => {
                self.store[i].1 = object.clone();
                info!(collection = S::COLLECTION, %id, "Updated");
                Reply::ok(object, ApiResponse::new(200))
            }
            Err(reason) => {
                warn!(collection = S::COLLECTION, %id, %reason, "Update rejected");
                Reply::empty(error_response(400, "INVALID_REQUEST", &reason))
            }
        }
    }
}

fn faulted<T>(fault: Fault) -> Result<Reply<T>, TransportError> {
    match fault {
        Fault::Respond(response) => Ok(Reply::empty(response)),
        Fault::Transport(error) => Err(error),
    }
}

/// The client half of a [`SimulatedApi`].
pub struct ApiHandle<S: Simulated> {
    sender: mpsc::Sender<ApiRequest<S>>,
}

impl<S: Simulated> Clone for ApiHandle<S> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<S: Simulated> ApiHandle<S> {
    async fn call<T>(
        &self,
        request: impl FnOnce(Respond<T>) -> ApiRequest<S>,
    ) -> Result<T, TransportError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(request(respond_to))
            .await
            .map_err(|_| TransportError::Connection(format!("{} API is not running", S::COLLECTION)))?;
        response.await.map_err(|_| {
            TransportError::Connection(format!("{} API dropped the request", S::COLLECTION))
        })?
    }

    /// Stores `object` under its own identifier, replacing any previous one.
    pub async fn seed(&self, object: S::Object) -> Result<ExternalId, TransportError> {
        self.call(|respond_to| ApiRequest::Seed { object, respond_to })
            .await
    }

    pub async fn inject(&self, verb: Verb, fault: Fault) -> Result<(), TransportError> {
        self.call(|respond_to| ApiRequest::Inject {
            verb,
            fault,
            respond_to,
        })
        .await
    }

    pub async fn find(&self) -> CallResult<Vec<S::Object>> {
        self.call(|respond_to| ApiRequest::Find { respond_to }).await
    }

    pub async fn get(&self, id: &str) -> CallResult<S::Object> {
        let id = id.to_string();
        self.call(|respond_to| ApiRequest::Get { id, respond_to })
            .await
    }

    pub async fn add(&self, parent_id: &str, payload: S::Payload) -> StatusResult {
        let parent_id = parent_id.to_string();
        self.call(|respond_to| ApiRequest::Add {
            parent_id,
            payload,
            respond_to,
        })
        .await
    }

    pub async fn update(&self, id: &str, payload: S::Payload) -> CallResult<S::Object> {
        let id = id.to_string();
        self.call(|respond_to| ApiRequest::Update {
            id,
            payload,
            respond_to,
        })
        .await
    }

    pub async fn delete(&self, id: &str) -> StatusResult {
        let id = id.to_string();
        self.call(|respond_to| ApiRequest::Delete { id, respond_to })
            .await
    }
}

#[async_trait]
impl<K, S> RemoteClient<K> for ApiHandle<S>
where
    K: ResourceKind<Object = S::Object>,
    S: Simulated,
{
    async fn find(&self) -> CallResult<Vec<K::Object>> {
        ApiHandle::find(self).await
    }

    async fn get(&self, id: &str) -> CallResult<K::Object> {
        ApiHandle::get(self, id).await
    }
}

#[async_trait]
impl<K, S> ManagedClient<K> for ApiHandle<S>
where
    K: ManagedKind<Object = S::Object, Body = S::Payload>,
    S: Simulated,
{
    async fn add(&self, parent_id: &str, body: &K::Body) -> StatusResult {
        ApiHandle::add(self, parent_id, body.clone()).await
    }

    async fn update(&self, id: &str, body: &K::Body) -> CallResult<K::Object> {
        ApiHandle::update(self, id, body.clone()).await
    }

    async fn delete(&self, id: &str) -> StatusResult {
        ApiHandle::delete(self, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::parse_error_body;

    #[derive(Clone, Debug, PartialEq, Serialize)]
    struct Note {
        id: String,
        href: String,
        folder: String,
        text: String,
    }

    struct Notes;

    impl Simulated for Notes {
        const COLLECTION: &'static str = "notes";
        const ID_PREFIX: &'static str = "note";
        type Object = Note;
        type Payload = String;

        fn object_id(note: &Note) -> Option<&str> {
            Some(&note.id)
        }

        fn materialize(id: &str, href: &str, folder: &str, text: String) -> Result<Note, String> {
            if text.is_empty() {
                return Err("text must not be empty".into());
            }
            Ok(Note {
                id: id.into(),
                href: href.into(),
                folder: folder.into(),
                text,
            })
        }

        fn replace(current: &Note, text: String) -> Result<Note, String> {
            Ok(Note {
                text,
                ..current.clone()
            })
        }
    }

    fn start() -> ApiHandle<Notes> {
        let (api, handle) = SimulatedApi::<Notes>::new(8, "https://api.example/");
        tokio::spawn(api.run());
        handle
    }

    #[tokio::test]
    async fn add_answers_created_with_location() {
        let api = start();
        let response = api.add("inbox", "hello".into()).await.unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(response.location(), Some("https://api.example/notes/note-1"));
        assert!(response.body.is_empty());

        let reply = api.get("note-1").await.unwrap();
        assert_eq!(reply.value.unwrap().folder, "inbox");
    }

    #[tokio::test]
    async fn unknown_ids_answer_structured_not_found() {
        let api = start();
        let reply = api.get("missing").await.unwrap();
        assert_eq!(reply.response.status, 404);
        assert!(reply.value.is_none());
        let body = parse_error_body(&reply.response.body).unwrap();
        assert_eq!(body.code, "RESOURCE_NOT_FOUND");

        assert_eq!(api.delete("missing").await.unwrap().status, 404);
    }

    #[tokio::test]
    async fn rejected_payload_answers_bad_request() {
        let api = start();
        let response = api.add("inbox", String::new()).await.unwrap();
        assert_eq!(response.status, 400);
        assert_eq!(response.location(), None);
    }

    #[tokio::test]
    async fn injected_faults_are_consumed_once() {
        let api = start();
        api.inject(Verb::Find, Fault::Transport(TransportError::Timeout))
            .await
            .unwrap();
        assert_eq!(api.find().await.unwrap_err(), TransportError::Timeout);
        assert_eq!(api.find().await.unwrap().response.status, 200);
    }

    #[tokio::test]
    async fn seed_then_update_then_delete() {
        let api = start();
        let note = Note {
            id: "n9".into(),
            href: "/notes/n9".into(),
            folder: "inbox".into(),
            text: "a".into(),
        };
        api.seed(note).await.unwrap();

        let updated = api.update("n9", "b".into()).await.unwrap();
        assert_eq!(updated.value.unwrap().text, "b");
        assert_eq!(api.delete("n9").await.unwrap().status, 204);
        assert_eq!(api.get("n9").await.unwrap().response.status, 404);
    }

    #[tokio::test]
    async fn stopped_api_is_a_connection_failure() {
        let (api, handle) = SimulatedApi::<Notes>::new(1, "https://api.example");
        drop(api);
        let err = handle.find().await.unwrap_err();
        assert!(matches!(err, TransportError::Connection(_)));
    }
}
