//! Client code for swcache.
//!
//! This crate provides the network fetch client, request classification,
//! the per-class caching strategies, the worker lifecycle and push
//! notification handling shared by the server and CLI.

pub mod fetch;
pub mod intercept;
pub mod lifecycle;
pub mod push;

#[cfg(test)]
pub(crate) mod testing;

pub use fetch::{FetchClient, FetchConfig, FetchRequest, Network};
pub use intercept::{Classifier, Disposition, Interceptor, ResponseSource, Served};
pub use lifecycle::{ActivateReport, ControlMessage, InstallReport, PrecacheFailure, ServiceWorker, WorkerState};
pub use push::{ClickOutcome, Notification, NotificationTemplate};
pub use reqwest::Method;
