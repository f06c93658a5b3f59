use kube::ResourceExt;
use proxy_sync_core::DEFAULT_TENANT;

/// Determines the tenant that owns a resource.
///
/// The tenant is read from a well-known label. Resources without the label belong to the
/// default tenant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TenantSource {
    label: String,
    default: String,
}

// === impl TenantSource ===

impl TenantSource {
    pub fn new(label: impl ToString, default: impl ToString) -> Self {
        Self {
            label: label.to_string(),
            default: default.to_string(),
        }
    }

    pub fn tenant_of<R: ResourceExt>(&self, resource: &R) -> String {
        match resource.labels().get(&self.label) {
            Some(tenant) if !tenant.is_empty() => tenant.clone(),
            _ => self.default.clone(),
        }
    }
}

impl Default for TenantSource {
    fn default() -> Self {
        Self::new("tenant", DEFAULT_TENANT)
    }
}
