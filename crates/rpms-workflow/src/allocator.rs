//! # Publication Identifier Allocation
//!
//! Identifiers are `SMU_P` followed by decimal digits, starting at
//! `SMU_P201817001`. Two allocation strategies exist:
//!
//! - [`AllocatorKind::Scan`] reads the greatest stored identifier and adds
//!   one. Two concurrent callers can read the same maximum; the unique
//!   constraint on `publication_id` turns that into
//!   [`StoreError::DuplicatePublicationId`](crate::StoreError::DuplicatePublicationId)
//!   and the orchestrator retries.
//! - [`AllocatorKind::Sequence`] draws from a counter that the backend
//!   increments atomically, seeded once from the numeric maximum of the
//!   stored identifiers. Concurrent callers always get distinct values.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use rpms_core::{PublicationId, ValidationError};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::store::PaperRepository;

/// Successor of the current maximum identifier.
///
/// Falls back to the seed when there is no maximum, when it does not parse
/// as `SMU_P<digits>`, or when incrementing would overflow.
pub fn next_publication_id(current_max: Option<&str>) -> PublicationId {
    let Some(raw) = current_max else {
        return PublicationId::seed();
    };
    match PublicationId::parse(raw) {
        Ok(current) => current.successor().unwrap_or_else(|| {
            tracing::warn!(current = %current, "publication identifier overflow, using seed");
            PublicationId::seed()
        }),
        Err(e) => {
            tracing::warn!(
                current = raw,
                error = %e,
                "unparseable publication identifier maximum, using seed"
            );
            PublicationId::seed()
        }
    }
}

/// Source of fresh publication identifiers.
#[async_trait]
pub trait PublicationIdAllocator: Send + Sync {
    /// A fresh identifier. Uniqueness is final only once the paper row
    /// holding it commits.
    async fn allocate(&self) -> Result<PublicationId, StoreError>;
}

/// Allocation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocatorKind {
    /// Atomic counter.
    #[default]
    Sequence,
    /// Max-plus-one over stored identifiers.
    Scan,
}

impl AllocatorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequence => "sequence",
            Self::Scan => "scan",
        }
    }
}

impl FromStr for AllocatorKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequence" => Ok(Self::Sequence),
            "scan" => Ok(Self::Scan),
            _ => Err(ValidationError::UnknownSetting {
                setting: "allocator",
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for AllocatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Max-plus-one allocation over any paper repository.
#[derive(Clone)]
pub struct ScanAllocator {
    papers: Arc<dyn PaperRepository>,
}

impl ScanAllocator {
    pub fn new(papers: Arc<dyn PaperRepository>) -> Self {
        Self { papers }
    }
}

#[async_trait]
impl PublicationIdAllocator for ScanAllocator {
    async fn allocate(&self) -> Result<PublicationId, StoreError> {
        let current = self.papers.max_publication_id().await?;
        Ok(next_publication_id(current.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpms_core::SEED_PUBLICATION_ID;

    #[test]
    fn empty_store_starts_at_seed() {
        assert_eq!(next_publication_id(None).as_str(), SEED_PUBLICATION_ID);
    }

    #[test]
    fn increments_numeric_suffix() {
        assert_eq!(
            next_publication_id(Some("SMU_P201817005")).as_str(),
            "SMU_P201817006"
        );
        assert_eq!(
            next_publication_id(Some("SMU_P999999999")).as_str(),
            "SMU_P1000000000"
        );
    }

    #[test]
    fn leading_zeros_are_dropped() {
        assert_eq!(next_publication_id(Some("SMU_P007")).as_str(), "SMU_P8");
    }

    #[test]
    fn unparseable_maximum_falls_back_to_seed() {
        for raw in ["", "SMU_P", "SMU_PX", "SMU_P12abc", "ABC201817001", "smu_p201817001"] {
            assert_eq!(
                next_publication_id(Some(raw)).as_str(),
                SEED_PUBLICATION_ID,
                "input {raw:?}"
            );
        }
    }

    #[test]
    fn overflow_falls_back_to_seed() {
        let max = format!("SMU_P{}", i64::MAX);
        assert_eq!(next_publication_id(Some(&max)).as_str(), SEED_PUBLICATION_ID);
        let beyond = format!("SMU_P{}", u64::MAX);
        assert_eq!(next_publication_id(Some(&beyond)).as_str(), SEED_PUBLICATION_ID);
    }

    #[test]
    fn allocator_kind_parses() {
        assert_eq!("scan".parse::<AllocatorKind>().unwrap(), AllocatorKind::Scan);
        assert_eq!(
            " Sequence ".parse::<AllocatorKind>().unwrap(),
            AllocatorKind::Sequence
        );
        assert!("random".parse::<AllocatorKind>().is_err());
        assert_eq!(AllocatorKind::default(), AllocatorKind::Sequence);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use rpms_core::publication::MAX_NUMBER;
    use rpms_core::PUBLICATION_PREFIX;

    proptest! {
        #[test]
        fn successor_is_numeric_plus_one(n in 0..MAX_NUMBER) {
            let next = next_publication_id(Some(&format!("{PUBLICATION_PREFIX}{n}")));
            prop_assert_eq!(next.number(), n + 1);
        }

        #[test]
        fn any_input_yields_a_well_formed_identifier(raw in ".*") {
            let next = next_publication_id(Some(&raw));
            prop_assert!(PublicationId::parse(next.as_str()).is_ok());
        }
    }
}
