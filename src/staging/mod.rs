// ABOUTME: Client for the remote staging repository service.
// ABOUTME: Exposes the StagingOps capability trait, its HTTP implementation and domain model.

mod client;
mod error;
mod model;
mod traits;
mod wire;

pub use client::{StagingClient, StagingSettings};
pub use error::StagingError;
pub use model::{
    ActivityEvent, ActivityProperty, RepositoryState, StagingActivity, StagingProfile,
    StagingRepository, Transition,
};
pub use traits::StagingOps;
