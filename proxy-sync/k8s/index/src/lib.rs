//! Endpoints sync index
//!
//! Endpoints objects are watched from every API server partition that feeds this node. Each
//! partition's watch is indexed by a [`PartitionIndex`], which describes every event to a shared
//! [`ChangeTracker`] as a transition from the object's previous state to its current state:
//!
//! ```text
//! [ partition 0 ] --\
//! [ partition 1 ] ---> [ ChangeTracker ] -> [ Syncer: EndpointsMap ] -> [ Backend ]
//! [ partition n ] --/
//! ```
//!
//! The tracker collapses repeated changes to the same object so that a sync only observes the
//! object's state as of the last sync and its latest state. The [`Syncer`] drains the tracker,
//! applies the changes to its [`EndpointsMap`], and hands the resulting diff to a [`Backend`].
//! Each sync publishes an immutable [`EndpointsSnapshot`] so that readers never observe a
//! partially applied map.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod endpoints_map;
mod metrics;
mod partition;
mod sync;
mod tracker;


pub use self::{
    endpoints_map::EndpointsMap,
    metrics::Metrics,
    partition::{PartitionIndex, SharedPartitionIndex},
    sync::{Backend, EndpointsSnapshot, Syncer},
    tracker::{Change, ChangeTracker, Changes, ObjectKey, PortEndpoints, SharedTracker},
};
