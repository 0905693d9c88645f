//! Well-known tag keys.

use std::collections::BTreeMap;

/// A dataplane tag set.
///
/// Tags are ordered so that serialized descriptors are stable across conversions.
pub type Tags = BTreeMap<String, String>;

/// Names the mesh service a listener belongs to. The value is an encoded
/// [`ServiceIdentity`](crate::ServiceIdentity).
pub const SERVICE: &str = "kuma.io/service";

pub const PROTOCOL: &str = "kuma.io/protocol";

pub const ZONE: &str = "kuma.io/zone";

/// Set only on listeners of workloads backing a headless Service; names the individual
/// workload so that it may be addressed directly.
pub const INSTANCE: &str = "kuma.io/instance";

/// Labels containing this marker are reserved for the control plane and are never copied from
/// a workload into its tags.
pub const INTERNAL_MARKER: &str = "kuma.io/";

pub const PROTOCOL_TCP: &str = "tcp";
