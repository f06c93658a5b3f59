//! Pod garbage collection across API server partitions.
//!
//! Nodes may be registered with any of several partitions. Queries that corroborate a node's
//! existence are issued to every partition with [`scatter_gather`], and a [`FailurePolicy`]
//! decides whether the answers are complete enough to act on.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod gather;
mod gc;
mod pods;

pub use self::{
    gather::{scatter_gather, FailurePolicy, GatherError, Gathered},
    gc::{Collected, PodGc, GC_PERIOD},
    pods::{KubeNodes, KubePods, NodeLister, PodInfo, PodStore},
};
