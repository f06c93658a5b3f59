#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod endpoints;
mod tenant;

pub use self::{endpoints::parse_trigger_time, tenant::TenantSource};
pub use k8s_openapi::api::{
    self,
    core::v1::{Endpoints, Node, Pod, PodSpec, PodStatus},
};
pub use kube::{
    api::{ObjectMeta, ResourceExt},
    Client, Resource,
};
