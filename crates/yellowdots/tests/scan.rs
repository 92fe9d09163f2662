use yellowdots::core::{BinaryMatrix, Transform};
use yellowdots::patterns::{PatternCatalog, PatternId};
use yellowdots::{
    align_candidates, MaskParams, PatternOutcome, ScanConfig, ScanError, ScanParams, Scanner,
};

fn lexmark_tile() -> BinaryMatrix {
    PatternId::Pattern2
        .spec()
        .render(&[
            ("manufacturer", "0213"),
            ("serial", "AB1357"),
            ("unknown1", "246"),
            ("year", "2011"),
            ("month", "10"),
            ("day", "03"),
            ("hour", "14"),
            ("minute", "27"),
            ("unknown2", "01"),
        ])
        .expect("render")
}

#[test]
fn blank_grids_match_nothing() {
    for spec in PatternCatalog::builtin().iter() {
        let blank = BinaryMatrix::zeros(spec.rows, spec.cols);
        let report = Scanner::default().scan(&blank).expect("scan");
        assert!(!report.reports.is_empty());
        for r in &report.reports {
            assert!(matches!(r.outcome, PatternOutcome::NoMatch), "{:?}", r.pattern);
            assert_eq!(r.candidates, 0);
        }
        assert!(!report.has_findings());
    }
}

#[test]
fn unsupported_dimensions_are_an_error() {
    let err = Scanner::default()
        .scan(&BinaryMatrix::zeros(5, 7))
        .unwrap_err();
    assert!(matches!(
        err,
        ScanError::UnsupportedDimensions { rows: 5, cols: 7 }
    ));
    assert_eq!(err.to_string(), "no pattern accepts a 5x7 grid");
}

#[test]
fn expired_deadline_skips_every_pattern() {
    let params = ScanParams {
        deadline_ms: Some(0),
        ..ScanParams::default()
    };
    let report = Scanner::new(params).scan(&lexmark_tile()).expect("scan");
    assert_eq!(report.reports.len(), 1);
    assert!(matches!(report.reports[0].outcome, PatternOutcome::Skipped));
}

#[test]
fn aligned_lexmark_tile_decodes_at_identity() {
    let tile = lexmark_tile();
    let spec = PatternId::Pattern2.spec();
    assert!(align_candidates(&tile, spec).contains(&Transform::IDENTITY));

    let report = Scanner::default().scan(&tile).expect("scan");
    let r = report.get(PatternId::Pattern2).expect("pattern2 scanned");
    let PatternOutcome::Match(finding) = &r.outcome else {
        panic!("expected a single match, got {:?}", r.outcome);
    };
    assert!(finding.transforms.contains(&Transform::IDENTITY));
    assert_eq!(finding.payload.manufacturer.as_deref(), Some("Lexmark"));
    assert_eq!(finding.payload.get("serial"), Some("AB1357"));
    assert_eq!(finding.payload.get("year"), Some("2011"));
    assert_eq!(finding.payload.printer, PatternId::Pattern2.spec().printer);
}

#[test]
fn rotated_and_rolled_tile_still_decodes() {
    let tile = Transform::new(2, false, 11, 5).apply(&lexmark_tile());
    let report = Scanner::default().scan(&tile).expect("scan");
    let finding = report
        .findings()
        .find(|f| f.payload.get("serial") == Some("AB1357"))
        .expect("decoded");
    assert_eq!(finding.tdm.transform().apply(&tile), lexmark_tile());
}

#[test]
fn json_config_runs_scan_and_mask() {
    let tile = PatternId::Pattern3
        .spec()
        .render(&[
            ("minute", "01"),
            ("hour", "02"),
            ("day", "03"),
            ("month", "04"),
            ("year", "2005"),
            ("serial", "00000006"),
        ])
        .expect("render");
    let text = serde_json::json!({
        "matrix": tile.to_rows(),
        "scan": { "patterns": ["pattern3"] },
        "mask": { "policy": "strategic", "seed": 17 },
    })
    .to_string();

    let config = ScanConfig::from_json(&text).expect("config");
    assert_eq!(config.mask, Some(MaskParams::strategic(17)));
    let summary = config.run().expect("run");
    assert_eq!(summary.masks.len(), 1);
    let anonymised = summary.masks[0].anonymised.as_ref().expect("validates");
    assert_ne!(anonymised.get("serial"), Some("00000006"));

    let json: serde_json::Value =
        serde_json::from_str(&summary.to_json().expect("json")).expect("parse");
    let outcome = &json["report"]["reports"][0]["outcome"];
    assert_eq!(outcome["status"], "match");
    assert_eq!(outcome["findings"]["payload"]["fields"][4]["value"], "2005");
    assert_eq!(json["masks"][0]["policy"], "strategic");
}
