//! Project simulation domain models.
//!
//! Provides the entity types of a project model: what is built (product
//! and components), how it is built (workflow and tasks) and who builds it
//! (teams of workers, workplaces with facilities). All entities live in the
//! [`Project`] arena and reference each other through typed handles.
//!
//! # Domain Mappings
//!
//! | u-pdes | Manufacturing | Software | Construction |
//! |--------|--------------|----------|--------------|
//! | Component | Part/Assembly | Module | Building Element |
//! | Task | Operation | Work Item | Activity |
//! | Worker | Operator | Developer | Craftsman |
//! | Facility | Machine | Build Server | Crane |
//! | Workplace | Cell/Line | Environment | Site Zone |

mod calendar;
mod component;
mod facility;
mod ids;
mod project;
pub mod record;
mod resource;
mod task;
mod team;
mod worker;
mod workflow;
mod workplace;

pub use calendar::{Calendar, TimeWindow};
pub use component::{is_ready_for_placement, Component, ComponentState};
pub use facility::Facility;
pub use ids::{
    ComponentId, FacilityId, ProductId, TaskId, TeamId, WorkerId, WorkflowId, WorkplaceId,
};
pub use project::{Project, ProjectStatus, SimulationMode};
pub use resource::{Resource, ResourceActivity, ResourceState, WorkAmountSkills, SKILL_EPSILON};
pub use task::{Dependency, DependencyKind, Task, TaskState};
pub use team::Team;
pub use worker::Worker;
pub use workflow::{Product, Workflow};
pub use workplace::{Workplace, SPACE_EPSILON};
