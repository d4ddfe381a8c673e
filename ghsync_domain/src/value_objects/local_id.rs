// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Local ID Value Object
//!
//! Type-safe, per-entity local identifiers. Each entity has a locally
//! generated stable identifier in addition to the upstream numeric id; this
//! module provides the former as a phantom-typed wrapper over ULID so that a
//! `RepositoryId` and a `ContributorId` can never be mixed up at compile time.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use ulid::Ulid;

use crate::error::IngestError;

/// Per-entity category marker. Implementors are zero-sized phantom types.
pub trait IdCategory {
    fn category_name() -> &'static str;

    fn validate_id(ulid: &Ulid) -> Result<(), IngestError> {
        if *ulid == Ulid::nil() {
            return Err(IngestError::Validation(format!("{} id cannot be nil", Self::category_name())));
        }
        Ok(())
    }
}

/// Type-safe local identifier, backed by a ULID for natural chronological
/// ordering (useful for "entities touched this run" style context sets).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
pub struct LocalId<T: IdCategory> {
    value: Ulid,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: IdCategory> Serialize for LocalId<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.value.to_string().serialize(serializer)
    }
}

impl<'de, T: IdCategory> Deserialize<'de> for LocalId<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let ulid = Ulid::from_string(&s).map_err(|e| serde::de::Error::custom(e.to_string()))?;
        Ok(Self {
            value: ulid,
            _phantom: std::marker::PhantomData,
        })
    }
}

impl<T: IdCategory> LocalId<T> {
    /// Creates a new time-ordered local id.
    pub fn new() -> Self {
        Self {
            value: Ulid::new(),
            _phantom: std::marker::PhantomData,
        }
    }

    pub fn from_ulid(ulid: Ulid) -> Result<Self, IngestError> {
        T::validate_id(&ulid)?;
        Ok(Self {
            value: ulid,
            _phantom: std::marker::PhantomData,
        })
    }

    pub fn from_string(s: &str) -> Result<Self, IngestError> {
        let ulid = Ulid::from_str(s).map_err(|e| IngestError::Validation(format!("invalid id format: {}", e)))?;
        Self::from_ulid(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.value
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.value.timestamp_ms()
    }

    pub fn category(&self) -> &'static str {
        T::category_name()
    }

    #[cfg(test)]
    pub fn nil() -> Self {
        Self {
            value: Ulid(0),
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T: IdCategory> Default for LocalId<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: IdCategory> Display for LocalId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T: IdCategory> Hash for LocalId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T: IdCategory> FromStr for LocalId<T> {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

impl<T: IdCategory> From<LocalId<T>> for Ulid {
    fn from(id: LocalId<T>) -> Self {
        id.value
    }
}

macro_rules! entity_id {
    ($marker:ident, $id:ident, $name:literal) => {
        #[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
        pub struct $marker;

        impl IdCategory for $marker {
            fn category_name() -> &'static str {
                $name
            }
        }

        pub type $id = LocalId<$marker>;
    };
}

entity_id!(RepositoryMarker, RepositoryId, "repository");
entity_id!(ContributorMarker, ContributorId, "contributor");
entity_id!(MergeRequestMarker, MergeRequestId, "merge_request");
entity_id!(CommitMarker, CommitId, "commit");
entity_id!(RawPayloadMarker, RawPayloadId, "raw_payload");
entity_id!(PipelineRunMarker, PipelineRunId, "pipeline_run");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_of_different_categories_have_distinct_names() {
        assert_eq!(RepositoryId::new().category(), "repository");
        assert_eq!(ContributorId::new().category(), "contributor");
    }

    #[test]
    fn round_trips_through_string() {
        let id = CommitId::new();
        let parsed: CommitId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn nil_id_fails_validation() {
        let nil = RepositoryId::nil();
        assert!(RepositoryMarker::validate_id(&nil.as_ulid()).is_err());
    }

    #[test]
    fn ids_are_time_ordered() {
        let a = RepositoryId::new();
        std::thread::sleep(std::time::Duration::from_millis(1));
        let b = RepositoryId::new();
        assert!(b > a);
    }
}
