#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use proxy_sync_core as core;
pub use proxy_sync_k8s_api as k8s;
pub use proxy_sync_k8s_gc as gc;
pub use proxy_sync_k8s_index as index;

mod args;
mod backend;
mod partitions;
mod probe;

pub use self::{args::Args, backend::TracingBackend};
