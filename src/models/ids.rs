//! Typed arena handles.
//!
//! Every entity lives in a `Vec` owned by [`Project`](super::Project) and is
//! addressed by its index. Handles are plain `Copy` newtypes so relation sets
//! can hold them without borrowing the arena.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub usize);

        impl $name {
            /// Entity kind used in error messages.
            pub const KIND: &'static str = $kind;

            /// Arena index of this handle.
            #[inline]
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $kind, self.0)
            }
        }
    };
}

entity_id!(
    /// Handle of a [`Task`](super::Task).
    TaskId,
    "task"
);
entity_id!(
    /// Handle of a [`Component`](super::Component).
    ComponentId,
    "component"
);
entity_id!(
    /// Handle of a [`Worker`](super::Worker).
    WorkerId,
    "worker"
);
entity_id!(
    /// Handle of a [`Facility`](super::Facility).
    FacilityId,
    "facility"
);
entity_id!(
    /// Handle of a [`Team`](super::Team).
    TeamId,
    "team"
);
entity_id!(
    /// Handle of a [`Workplace`](super::Workplace).
    WorkplaceId,
    "workplace"
);
entity_id!(
    /// Handle of a [`Workflow`](super::Workflow).
    WorkflowId,
    "workflow"
);
entity_id!(
    /// Handle of a [`Product`](super::Product).
    ProductId,
    "product"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_index() {
        let id = TaskId(4);
        assert_eq!(id.index(), 4);
        assert_eq!(id.to_string(), "task#4");
        assert_eq!(WorkplaceId::KIND, "workplace");
    }

    #[test]
    fn test_ordering_follows_index() {
        let mut ids = vec![WorkerId(3), WorkerId(1), WorkerId(2)];
        ids.sort();
        assert_eq!(ids, vec![WorkerId(1), WorkerId(2), WorkerId(3)]);
    }
}
