// ABOUTME: Phantom-typed identifiers for provider-side staging resources.
// ABOUTME: Keeps staging profile ids and staging repository ids from being swapped.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Marker for staging profile ids.
pub enum ProfileMarker {}
/// Marker for staging repository ids.
pub enum RepositoryMarker {}

/// An opaque identifier assigned by the staging provider.
///
/// The marker parameter only exists at compile time, so a repository id
/// cannot be handed to an API that expects a profile id:
///
/// ```compile_fail
/// use stagehand::types::{ProfileId, RepositoryId};
///
/// fn close(_profile: &ProfileId) {}
///
/// let repository = RepositoryId::new("comexample-1001");
/// close(&repository);
/// ```
#[must_use = "ids name remote resources and should not be ignored"]
pub struct Id<T> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_inner(self) -> String {
        self.value
    }
}

// T is only a marker, so none of these impls may require bounds on it.

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Id").field(&self.value).finish()
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

pub type ProfileId = Id<ProfileMarker>;
pub type RepositoryId = Id<RepositoryMarker>;
