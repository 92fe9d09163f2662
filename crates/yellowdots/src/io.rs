//! JSON configuration and report helpers.

use serde::{Deserialize, Serialize};

use crate::core::BinaryMatrix;
use crate::decode::{decode, Payload};
use crate::error::ScanError;
use crate::mask::{MaskError, MaskGenerator, MaskParams, MaskPolicy};
use crate::patterns::PatternId;
use crate::scan::{ScanParams, ScanReport, Scanner};
use crate::tdm::TrackingDotMatrix;

/// One scan request: the grid, scanner settings and an optional mask policy.
///
/// ```json
/// {
///   "matrix": ["0110", "1001"],
///   "scan": { "deadline_ms": 50 },
///   "mask": { "policy": "strategic", "seed": 7 }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    pub matrix: BinaryMatrix,
    #[serde(default)]
    pub scan: ScanParams,
    #[serde(default)]
    pub mask: Option<MaskParams>,
}

impl ScanConfig {
    pub fn new(matrix: BinaryMatrix) -> Self {
        Self {
            matrix,
            scan: ScanParams::default(),
            mask: None,
        }
    }

    pub fn from_json(text: &str) -> Result<Self, ScanError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, ScanError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Scan the grid and, when a mask policy is set, build one mask per
    /// finding.
    pub fn run(&self) -> Result<ScanSummary<'static>, ScanError> {
        let report = Scanner::new(self.scan.clone()).scan(&self.matrix)?;
        let masks = match &self.mask {
            Some(params) => {
                let generator = MaskGenerator::new(params.clone());
                report
                    .findings()
                    .map(|f| mask_report(&generator, &f.tdm))
                    .collect()
            }
            None => Vec::new(),
        };
        Ok(ScanSummary { report, masks })
    }
}

/// Mask built for one finding.
#[derive(Debug, Clone, Serialize)]
pub struct MaskReport {
    pub pattern: PatternId,
    pub policy: MaskPolicy,
    /// Dots to add, in the frame of the scanned grid.
    pub mask: Option<BinaryMatrix>,
    /// Decoded masked tile; absent when it no longer validates.
    pub anonymised: Option<Payload>,
    /// Groups the strategic policy could not move.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unanonymisable: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary<'a> {
    pub report: ScanReport<'a>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub masks: Vec<MaskReport>,
}

impl ScanSummary<'_> {
    pub fn to_json(&self) -> Result<String, ScanError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn mask_report(generator: &MaskGenerator, tdm: &TrackingDotMatrix) -> MaskReport {
    let policy = generator.params().policy;
    match generator.generate(tdm) {
        Ok(mask) => {
            let view = mask.anonymised_view(tdm);
            let anonymised =
                TrackingDotMatrix::from_aligned(tdm.spec(), &view).map(|t| decode(&t));
            MaskReport {
                pattern: tdm.pattern(),
                policy,
                mask: Some(mask.in_raw_frame(tdm)),
                anonymised,
                unanonymisable: Vec::new(),
            }
        }
        Err(MaskError::NotAnonymisable { groups }) => {
            log::warn!("{}: cannot anonymise {}", tdm.pattern(), groups.join(", "));
            MaskReport {
                pattern: tdm.pattern(),
                policy,
                mask: None,
                anonymised: None,
                unanonymisable: groups,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P1_ROWS: [&str; 8] = [
        "11000000", "00000000", "10000000", "00000000", "00000000", "00000000",
        "00000000", "00000000",
    ];

    #[test]
    fn config_defaults_and_roundtrip() {
        let text = format!(r#"{{"matrix": {}}}"#, serde_json::to_string(&P1_ROWS).unwrap());
        let config = ScanConfig::from_json(&text).expect("parse");
        assert_eq!(config.matrix.dims(), (8, 8));
        assert_eq!(config.scan, ScanParams::default());
        assert!(config.mask.is_none());

        let back = ScanConfig::from_json(&config.to_json().expect("json")).expect("parse");
        assert_eq!(back.matrix, config.matrix);
    }

    #[test]
    fn bad_cell_is_a_json_error() {
        let err = ScanConfig::from_json(r#"{"matrix": ["01", "0z"]}"#).unwrap_err();
        assert!(matches!(err, ScanError::Json(_)));
    }

    #[test]
    fn empty_payload_block_decodes_without_masks() {
        let config = ScanConfig::new(BinaryMatrix::from_rows(&P1_ROWS).expect("rows"));
        let summary = config.run().expect("run");
        let findings: Vec<_> = summary.report.findings().collect();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].payload.get("serial"), Some("00000000"));
        assert!(summary.masks.is_empty());
    }

    #[test]
    fn strategic_mask_is_reported_in_raw_frame() {
        let mut config = ScanConfig::new(BinaryMatrix::from_rows(&P1_ROWS).expect("rows"));
        config.mask = Some(MaskParams::strategic(3));
        let summary = config.run().expect("run");
        assert_eq!(summary.masks.len(), 1);
        let mask = &summary.masks[0];
        assert_eq!(mask.policy, MaskPolicy::Strategic);
        assert_eq!(mask.mask.as_ref().map(BinaryMatrix::dims), Some((8, 8)));
        let anonymised = mask.anonymised.as_ref().expect("validates");
        assert_ne!(anonymised.get("serial"), Some("00000000"));
        let json = summary.to_json().expect("json");
        assert!(json.contains("\"anonymised\""));
    }
}
