//! Catalog-wide scanning with an optional deadline.
//!
//! Each applicable pattern is one unit of work: search, assemble, decode and
//! group by payload. With the `rayon` feature the units run in parallel; the
//! report always lists them in catalog order.

use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::core::{BinaryMatrix, Transform};
use crate::decode::{decode, Payload};
use crate::error::ScanError;
use crate::patterns::{PatternCatalog, PatternId, PatternSpec};
use crate::search::align_candidates;
use crate::tdm::{assemble_candidates, TrackingDotMatrix};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Scanner settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanParams {
    /// Restrict the scan to these patterns; all of them when absent.
    pub patterns: Option<Vec<PatternId>>,
    /// Patterns not started within this many milliseconds are skipped.
    pub deadline_ms: Option<u64>,
}

/// One decoded payload and the matrix it was read from.
#[derive(Clone, Debug, Serialize)]
pub struct Finding<'a> {
    pub tdm: TrackingDotMatrix<'a>,
    pub payload: Payload,
    /// Transforms of every validated matrix that decodes to `payload`.
    pub transforms: Vec<Transform>,
}

/// Result of scanning for one pattern.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "status", content = "findings", rename_all = "snake_case")]
pub enum PatternOutcome<'a> {
    NoMatch,
    Match(Finding<'a>),
    /// Several validated matrices with different payloads.
    Ambiguous(Vec<Finding<'a>>),
    /// The deadline passed before this pattern was tried.
    Skipped,
}

impl<'a> PatternOutcome<'a> {
    pub fn findings(&self) -> &[Finding<'a>] {
        match self {
            PatternOutcome::Match(f) => std::slice::from_ref(f),
            PatternOutcome::Ambiguous(v) => v,
            PatternOutcome::NoMatch | PatternOutcome::Skipped => &[],
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, PatternOutcome::Match(_))
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PatternReport<'a> {
    pub pattern: PatternId,
    /// Number of transforms the alignment search proposed.
    pub candidates: usize,
    pub outcome: PatternOutcome<'a>,
}

/// Per-pattern results in catalog order.
#[derive(Clone, Debug, Serialize)]
pub struct ScanReport<'a> {
    pub dims: (usize, usize),
    pub reports: Vec<PatternReport<'a>>,
}

impl<'a> ScanReport<'a> {
    pub fn get(&self, id: PatternId) -> Option<&PatternReport<'a>> {
        self.reports.iter().find(|r| r.pattern == id)
    }

    /// Every finding of every pattern.
    pub fn findings(&self) -> impl Iterator<Item = &Finding<'a>> {
        self.reports.iter().flat_map(|r| r.outcome.findings())
    }

    pub fn has_findings(&self) -> bool {
        self.findings().next().is_some()
    }
}

/// Runs a catalog against raw grids.
///
/// Reports borrow their pattern definitions from the catalog, so they cannot
/// outlive it.
#[derive(Clone, Debug)]
pub struct Scanner<'a> {
    catalog: &'a PatternCatalog,
    params: ScanParams,
}

impl Default for Scanner<'static> {
    fn default() -> Self {
        Self::new(ScanParams::default())
    }
}

impl Scanner<'static> {
    /// Scanner over the built-in catalog.
    pub fn new(params: ScanParams) -> Self {
        Self::with_catalog(PatternCatalog::builtin(), params)
    }
}

impl<'a> Scanner<'a> {
    pub fn with_catalog(catalog: &'a PatternCatalog, params: ScanParams) -> Self {
        Self { catalog, params }
    }

    pub fn params(&self) -> &ScanParams {
        &self.params
    }

    /// Scan `raw` against every selected pattern that accepts its dimensions.
    ///
    /// Fails only when no selected pattern accepts the grid; a pattern that
    /// finds nothing is reported as [`PatternOutcome::NoMatch`].
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, raw), fields(rows = raw.rows(), cols = raw.cols()))
    )]
    pub fn scan(&self, raw: &BinaryMatrix) -> Result<ScanReport<'a>, ScanError> {
        let started = Instant::now();
        let deadline = self.params.deadline_ms.map(Duration::from_millis);
        let dims = raw.dims();

        let specs: Vec<&'a PatternSpec> = self
            .catalog
            .applicable(dims)
            .filter(|s| self.is_selected(s.id))
            .collect();
        if specs.is_empty() {
            return Err(ScanError::UnsupportedDimensions {
                rows: dims.0,
                cols: dims.1,
            });
        }
        debug!(
            "scanning {}x{} grid against {} pattern(s)",
            dims.0,
            dims.1,
            specs.len()
        );

        let unit = |spec: &&'a PatternSpec| {
            if deadline.is_some_and(|d| started.elapsed() >= d) {
                warn!("{}: deadline passed, skipped", spec.id);
                return PatternReport {
                    pattern: spec.id,
                    candidates: 0,
                    outcome: PatternOutcome::Skipped,
                };
            }
            scan_pattern(raw, *spec)
        };

        #[cfg(feature = "rayon")]
        let reports: Vec<PatternReport<'a>> = specs.par_iter().map(unit).collect();
        #[cfg(not(feature = "rayon"))]
        let reports: Vec<PatternReport<'a>> = specs.iter().map(unit).collect();

        Ok(ScanReport { dims, reports })
    }

    fn is_selected(&self, id: PatternId) -> bool {
        self.params
            .patterns
            .as_ref()
            .is_none_or(|ids| ids.contains(&id))
    }
}

fn scan_pattern<'a>(raw: &BinaryMatrix, spec: &'a PatternSpec) -> PatternReport<'a> {
    let Some(full) = spec.expand_window(raw) else {
        return PatternReport {
            pattern: spec.id,
            candidates: 0,
            outcome: PatternOutcome::NoMatch,
        };
    };
    let candidates = align_candidates(&full, spec);
    let tdms = assemble_candidates(raw.dims(), &full, spec, &candidates);

    let mut findings: Vec<Finding<'a>> = Vec::new();
    for tdm in tdms {
        let payload = decode(&tdm);
        match findings.iter_mut().find(|f| f.payload == payload) {
            Some(f) => f.transforms.push(tdm.transform()),
            None => findings.push(Finding {
                transforms: vec![tdm.transform()],
                tdm,
                payload,
            }),
        }
    }

    info!("{}: {} finding(s)", spec.id, findings.len());
    let outcome = match findings.len() {
        0 => PatternOutcome::NoMatch,
        1 => match findings.pop() {
            Some(f) => PatternOutcome::Match(f),
            None => PatternOutcome::NoMatch,
        },
        n => {
            warn!("{}: {} distinct payloads, reporting all", spec.id, n);
            PatternOutcome::Ambiguous(findings)
        }
    };
    PatternReport {
        pattern: spec.id,
        candidates: candidates.len(),
        outcome,
    }
}

/// Scan `raw` against the built-in catalog with default settings.
pub fn scan(raw: &BinaryMatrix) -> Result<ScanReport<'static>, ScanError> {
    Scanner::default().scan(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p1_grid() -> BinaryMatrix {
        PatternId::Pattern1
            .spec()
            .render(&[
                ("serial", "00123456"),
                ("year", "2009"),
                ("month", "11"),
                ("unknown1", "2"),
            ])
            .expect("render")
    }

    #[test]
    fn rendered_grid_is_a_single_match() {
        let report = scan(&p1_grid()).expect("scan");
        assert_eq!(report.reports.len(), 1);
        let r = report.get(PatternId::Pattern1).expect("pattern1");
        assert!(r.candidates >= 1);
        assert!(r.outcome.is_match(), "{:?}", r.outcome);
        let finding = &r.outcome.findings()[0];
        assert_eq!(finding.payload.get("serial"), Some("00123456"));
        assert!(finding.transforms.contains(&finding.tdm.transform()));
    }

    #[test]
    fn selection_excludes_patterns() {
        let params = ScanParams {
            patterns: Some(vec![PatternId::Pattern2]),
            deadline_ms: None,
        };
        let err = Scanner::new(params).scan(&p1_grid()).unwrap_err();
        assert!(matches!(
            err,
            ScanError::UnsupportedDimensions { rows: 16, cols: 16 }
        ));
    }

    #[test]
    fn borrowed_catalog_scans_only_its_patterns() {
        let catalog = PatternCatalog::new(vec![PatternId::Pattern3.spec().clone()]);
        let scanner = Scanner::with_catalog(&catalog, ScanParams::default());
        let err = scanner.scan(&p1_grid()).unwrap_err();
        assert!(matches!(
            err,
            ScanError::UnsupportedDimensions { rows: 16, cols: 16 }
        ));

        let report = scanner.scan(&BinaryMatrix::zeros(16, 32)).expect("scan");
        assert_eq!(report.reports.len(), 1);
        assert_eq!(report.reports[0].pattern, PatternId::Pattern3);
        assert!(!report.has_findings());
    }

    #[test]
    fn params_default_from_empty_json() {
        let params: ScanParams = serde_json::from_str("{}").expect("json");
        assert_eq!(params, ScanParams::default());
        let params: ScanParams =
            serde_json::from_str(r#"{"patterns":["pattern3"],"deadline_ms":5}"#).expect("json");
        assert_eq!(params.patterns, Some(vec![PatternId::Pattern3]));
        assert_eq!(params.deadline_ms, Some(5));
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(PatternOutcome::Skipped).expect("json");
        assert_eq!(json["status"], "skipped");
        let report = scan(&p1_grid()).expect("scan");
        let json = serde_json::to_value(&report).expect("json");
        assert_eq!(json["reports"][0]["outcome"]["status"], "match");
        assert_eq!(json["reports"][0]["pattern"], "pattern1");
    }
}
