//! Detection result status.

use serde::Serialize;

/// Terminal status of one detection run.
///
/// Every `detect` call returns a fully-formed result object; this status
/// discriminates usable from unusable output. Soft failures keep the scans
/// detected before the terminating condition accessible on the structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DetectionStatus {
    /// A structure was detected.
    Ok,
    /// Nothing to detect, or an internal inconsistency was detected and the
    /// run was abandoned without a result.
    None,
    /// The input stroke is too short.
    FailTooNarrowInput,
    /// A required tile is not available; no partial detection is returned.
    FailNoAvailableScan,
    /// No plateau was found on the central scan.
    FailNoCentralPlateau,
    /// No bump was found on the central scan.
    FailNoCentralBump,
    /// Too few accepted scans remain after propagation and pruning.
    FailNoConsistentSequence,
    /// No accepted scan carries consistent bounds.
    FailNoBounds,
    /// Center drift pruning rejected most of the sequence.
    FailTooHecticPlateaux,
    /// Detection density dropped below the configured minimum.
    FailTooSparsePlateaux,
}

impl DetectionStatus {
    /// Returns whether the detection produced a usable structure.
    pub fn is_ok(self) -> bool {
        self == DetectionStatus::Ok
    }
}
