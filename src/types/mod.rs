// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Phantom-typed staging ids, artifact coordinates and deployables.

mod coordinates;
mod deployable;
mod id;

pub use coordinates::{Coordinates, CoordinatesError};
pub use deployable::{Deployable, DeployableError};
pub use id::{Id, ProfileId, ProfileMarker, RepositoryId, RepositoryMarker};
