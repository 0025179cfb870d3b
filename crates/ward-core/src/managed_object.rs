use serde::{Deserialize, Serialize};

/// A managed object: the protected network entity (customer prefix, peer,
/// service) that alerts and mitigations are attributed to. `gid` is the
/// appliance-assigned identifier and is opaque to this system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedObject {
    pub gid: String,
    pub name: String,
}
