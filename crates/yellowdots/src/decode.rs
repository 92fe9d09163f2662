//! Payload decoding of validated matrices.

use serde::{Deserialize, Serialize};

use crate::patterns::{FieldCodec, PatternId};
use crate::tdm::TrackingDotMatrix;

/// One decoded field.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayloadField {
    pub name: String,
    /// Candidates joined as `"A or B"`; `None` when the bits are not in the
    /// field's table or range.
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<String>,
    pub identifying: bool,
}

/// Decoded content of one tracking-dot matrix.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Payload {
    pub pattern: PatternId,
    /// Compact rendering of the canonical bits.
    pub raw: String,
    /// Vendor read from the grid, or the fixed vendor of the pattern.
    pub manufacturer: Option<String>,
    pub printer: String,
    /// Fields in the order the pattern declares them.
    pub fields: Vec<PayloadField>,
}

impl Payload {
    /// Value of field `name`, if present and decodable.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .and_then(|f| f.value.as_deref())
    }

    /// Fields that failed closed.
    pub fn missing_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.value.is_none())
            .map(|f| f.name.as_str())
            .collect()
    }

    /// `(name, value)` pairs of the identifying fields.
    pub fn identifying(&self) -> Vec<(&str, Option<&str>)> {
        self.fields
            .iter()
            .filter(|f| f.identifying)
            .map(|f| (f.name.as_str(), f.value.as_deref()))
            .collect()
    }
}

/// Interpret the cropped cells of `tdm` through its pattern's field layout.
pub fn decode(tdm: &TrackingDotMatrix) -> Payload {
    let spec = tdm.spec();
    let cropped = tdm.cropped();

    let mut manufacturer = spec.manufacturer.map(str::to_string);
    let mut fields = Vec::with_capacity(spec.fields.len());
    for field in &spec.fields {
        let candidates = field.candidates(cropped);
        let value = (!candidates.is_empty()).then(|| candidates.join(" or "));
        if matches!(field.codec, FieldCodec::Manufacturer { .. }) {
            manufacturer = value.clone();
        }
        fields.push(PayloadField {
            name: field.name.to_string(),
            value,
            candidates: if candidates.len() > 1 {
                candidates
            } else {
                Vec::new()
            },
            identifying: field.identifying,
        });
    }

    let payload = Payload {
        pattern: spec.id,
        raw: spec.raw.render(cropped),
        manufacturer,
        printer: spec.printer.to_string(),
        fields,
    };
    let missing = payload.missing_fields();
    if !missing.is_empty() {
        log::debug!("{}: undecodable field(s) {:?}", spec.id, missing);
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BinaryMatrix;

    #[test]
    fn fixed_manufacturer_and_declared_field_order() {
        let spec = PatternId::Pattern3.spec();
        let aligned = spec
            .render(&[
                ("minute", "59"),
                ("hour", "23"),
                ("day", "31"),
                ("month", "12"),
                ("year", "2099"),
                ("serial", "99999999"),
            ])
            .expect("render");
        let tdm = TrackingDotMatrix::from_aligned(spec, &aligned).expect("valid");
        let payload = decode(&tdm);
        assert_eq!(payload.manufacturer.as_deref(), Some("Xerox"));
        let names: Vec<_> = payload.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["minute", "hour", "day", "month", "year", "serial"]);
        assert_eq!(payload.get("serial"), Some("99999999"));
        assert!(payload.missing_fields().is_empty());
        assert_eq!(payload.raw.split(' ').count(), 15);
    }

    #[test]
    fn shared_manufacturer_code_is_reported_as_alternatives() {
        let spec = PatternId::Pattern2.spec();
        let aligned = spec
            .render(&[
                ("manufacturer", "0123"),
                ("serial", "BC1234"),
                ("unknown1", "000"),
                ("year", "2008"),
                ("month", "01"),
                ("day", "02"),
                ("hour", "03"),
                ("minute", "04"),
                ("unknown2", "00"),
            ])
            .expect("render");
        let tdm = TrackingDotMatrix::from_aligned(spec, &aligned).expect("valid");
        let payload = decode(&tdm);
        assert_eq!(payload.manufacturer.as_deref(), Some("Xerox or Dell"));
        let field = &payload.fields[0];
        assert_eq!(field.candidates, vec!["Xerox", "Dell"]);
        assert!(!field.identifying);
        assert_eq!(payload.get("serial"), Some("BC1234"));
        assert_eq!(payload.raw.split(' ').count(), 2);
        assert!(payload.raw.starts_with("0123"));
    }

    #[test]
    fn unknown_digit_pattern_fails_closed() {
        let spec = PatternId::Pattern2.spec();
        let mut aligned = spec
            .render(&[
                ("manufacturer", "Epson"),
                ("serial", "AA0000"),
                ("unknown1", "000"),
                ("year", "2010"),
                ("month", "06"),
                ("day", "15"),
                ("hour", "12"),
                ("minute", "30"),
                ("unknown2", "00"),
            ])
            .expect("render");
        // day tens digit: high word index 3, low word index 1 (no table entry)
        let hi = 1 + 8;
        let lo = 1 + 9;
        for (col, index) in [(hi, 3), (lo, 1)] {
            for k in 0..4 {
                aligned.set(5 + k, col, k == index);
            }
        }
        spec.replicate(&mut aligned);
        let tdm = TrackingDotMatrix::from_aligned(spec, &aligned).expect("still valid");
        let payload = decode(&tdm);
        assert_eq!(payload.get("day"), None);
        assert_eq!(payload.missing_fields(), vec!["day"]);
        assert_eq!(payload.get("month"), Some("06"));
        assert_eq!(payload.manufacturer.as_deref(), Some("Epson"));
    }

    #[test]
    fn unknown_manufacturer_code_is_absent() {
        let spec = PatternId::Pattern2.spec();
        let aligned = spec
            .render(&[
                ("manufacturer", "3333"),
                ("serial", "AA0000"),
                ("unknown1", "000"),
                ("year", "2010"),
                ("month", "06"),
                ("day", "15"),
                ("hour", "12"),
                ("minute", "30"),
                ("unknown2", "00"),
            ])
            .expect("render");
        let tdm = TrackingDotMatrix::from_aligned(spec, &aligned).expect("valid");
        let payload = decode(&tdm);
        assert_eq!(payload.manufacturer, None);
        assert_eq!(payload.missing_fields(), vec!["manufacturer"]);
        let blank = BinaryMatrix::zeros(18, 23);
        assert!(TrackingDotMatrix::from_aligned(spec, &blank).is_none());
    }
}
