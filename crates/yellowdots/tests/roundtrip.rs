//! Rendered payloads survive an arbitrary rigid transform of the tile.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use yellowdots::core::{BinaryMatrix, Transform};
use yellowdots::patterns::tables::{MANUFACTURER_CODES, SERIAL_LETTERS};
use yellowdots::patterns::{PatternId, PatternSpec};
use yellowdots::{align_candidates, assemble_all, decode, Scanner, ScanParams};

type Values = Vec<(&'static str, String)>;

fn p1_values(rng: &mut StdRng) -> Values {
    vec![
        ("serial", format!("{:08}", rng.gen_range(0..1u32 << 24))),
        ("year", format!("{}", 2000 + rng.gen_range(0..64))),
        ("month", format!("{:02}", rng.gen_range(1..=12))),
        ("unknown1", format!("{}", rng.gen_range(0..4))),
    ]
}

fn p2_values(rng: &mut StdRng) -> Values {
    let letters: Vec<char> = SERIAL_LETTERS.iter().map(|&(_, l)| l).collect();
    let two = |rng: &mut StdRng| format!("{:02}", rng.gen_range(0..100));
    let serial = format!(
        "{}{}{:04}",
        letters.choose(rng).copied().unwrap_or('A'),
        letters.choose(rng).copied().unwrap_or('A'),
        rng.gen_range(0..10_000),
    );
    let code = MANUFACTURER_CODES
        .choose(rng)
        .map(|&(code, _)| code)
        .unwrap_or("0213");
    vec![
        ("manufacturer", code.to_string()),
        ("serial", serial),
        ("unknown1", format!("{:03}", rng.gen_range(0..1000))),
        ("year", format!("20{}", two(rng))),
        ("month", two(rng)),
        ("day", two(rng)),
        ("hour", two(rng)),
        ("minute", two(rng)),
        ("unknown2", format!("{}{}", rng.gen_range(0..4), rng.gen_range(0..4))),
    ]
}

fn p3_values(rng: &mut StdRng) -> Values {
    vec![
        ("minute", format!("{:02}", rng.gen_range(0..=59))),
        ("hour", format!("{:02}", rng.gen_range(0..=23))),
        ("day", format!("{:02}", rng.gen_range(1..=31))),
        ("month", format!("{:02}", rng.gen_range(1..=12))),
        ("year", format!("{}", 2000 + rng.gen_range(0..128))),
        ("serial", format!("{:08}", rng.gen_range(0..100_000_000))),
    ]
}

fn render(spec: &PatternSpec, values: &Values) -> BinaryMatrix {
    let pairs: Vec<(&str, &str)> = values.iter().map(|(k, v)| (*k, v.as_str())).collect();
    spec.render(&pairs).expect("render")
}

fn random_transform(rng: &mut StdRng, spec: &PatternSpec, any_orientation: bool) -> Transform {
    let rotation = if any_orientation {
        rng.gen_range(0..4)
    } else {
        2 * rng.gen_range(0..2)
    };
    let flip = any_orientation && rng.gen_bool(0.5);
    let roll_x = rng.gen_range(0..spec.cols) as isize;
    let roll_y = rng.gen_range(0..spec.rows) as isize;
    Transform::new(rotation, flip, roll_x, roll_y)
}

fn check_roundtrip(id: PatternId, values: Values, t: Transform) {
    let spec = id.spec();
    let canonical = render(spec, &values);
    let raw = t.apply(&canonical);

    let candidates = align_candidates(&raw, spec);
    assert!(
        candidates.iter().any(|c| c.apply(&raw) == canonical),
        "{id}: no candidate recovers {t:?}"
    );

    let found = assemble_all(&raw, spec);
    let payload = found
        .iter()
        .map(decode)
        .find(|p| {
            values
                .iter()
                .all(|(name, value)| p.get(name) == Some(value.as_str()) || *name == "manufacturer")
        })
        .unwrap_or_else(|| panic!("{id}: payload {values:?} not decoded under {t:?}"));
    assert_eq!(payload.pattern, id);
}

#[test]
fn pattern1_all_orientations() {
    let mut rng = StdRng::seed_from_u64(0x1001);
    let spec = PatternId::Pattern1.spec();
    for rotation in 0..4 {
        for flip in [false, true] {
            let values = p1_values(&mut rng);
            let roll_x = rng.gen_range(0..spec.cols) as isize;
            let roll_y = rng.gen_range(0..spec.rows) as isize;
            check_roundtrip(
                PatternId::Pattern1,
                values,
                Transform::new(rotation, flip, roll_x, roll_y),
            );
        }
    }
}

#[test]
fn pattern1_random_payloads() {
    let mut rng = StdRng::seed_from_u64(7);
    let spec = PatternId::Pattern1.spec();
    for _ in 0..24 {
        let values = p1_values(&mut rng);
        let t = random_transform(&mut rng, spec, true);
        check_roundtrip(PatternId::Pattern1, values, t);
    }
}

#[test]
fn pattern2_random_payloads() {
    let mut rng = StdRng::seed_from_u64(0x2002);
    let spec = PatternId::Pattern2.spec();
    for _ in 0..24 {
        let values = p2_values(&mut rng);
        let t = random_transform(&mut rng, spec, false);
        check_roundtrip(PatternId::Pattern2, values, t);
    }
}

#[test]
fn pattern2_manufacturer_code_roundtrips() {
    let mut rng = StdRng::seed_from_u64(0x2003);
    for &(code, vendors) in MANUFACTURER_CODES {
        let mut values = p2_values(&mut rng);
        values[0].1 = code.to_string();
        let spec = PatternId::Pattern2.spec();
        let raw = render(spec, &values);
        let found = assemble_all(&raw, spec);
        let payload = found.iter().map(decode).next().expect("decoded");
        assert_eq!(payload.manufacturer, Some(vendors.join(" or ")));
    }
}

#[test]
fn pattern3_random_payloads() {
    let mut rng = StdRng::seed_from_u64(0x3003);
    let spec = PatternId::Pattern3.spec();
    for _ in 0..24 {
        let values = p3_values(&mut rng);
        let t = random_transform(&mut rng, spec, false);
        check_roundtrip(PatternId::Pattern3, values, t);
    }
}

#[test]
fn pattern1_prototype_window_scans() {
    let mut rng = StdRng::seed_from_u64(11);
    let spec = PatternId::Pattern1.spec();
    let values = p1_values(&mut rng);
    let canonical = render(spec, &values);
    let raw = Transform::new(3, true, 5, 2)
        .apply(&canonical)
        .window_wrapped(0, 0, 8, 8);

    let report = Scanner::new(ScanParams::default()).scan(&raw).expect("scan");
    let finding = report
        .findings()
        .find(|f| f.payload.get("serial") == Some(values[0].1.as_str()))
        .expect("serial decoded from the window");
    assert_eq!(finding.tdm.raw_dims(), (8, 8));
    assert_eq!(finding.tdm.aligned().dims(), (16, 16));
}
