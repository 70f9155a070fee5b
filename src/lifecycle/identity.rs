use uuid::Uuid;

/// A comparable value telling which logical piece of data a call refers to.
///
/// Two requests for the same data must produce equal identities. Anything cheap to clone
/// and comparable qualifies, from a plain `u64` to a composite key struct.
pub trait Identity: Clone + PartialEq + core::fmt::Debug + 'static {}
impl<T: Clone + PartialEq + core::fmt::Debug + 'static> Identity for T {}

/// Unique id of one component instance.
///
/// Handed to the [`ViewHost`](crate::host::ViewHost) together with every mount hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(Uuid);

impl InstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
