//! One measured calibration record.

use tw_core::{Category, Error, OperatingPoint, Result};

use crate::formula::Formula;

/// Selection tags of a calibration row.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryKey {
    /// Operating point the row was measured at.
    pub operating_point: OperatingPoint,
    /// Measurement method (e.g. `comb`, `mujets`, `incl`).
    pub measurement_type: String,
    /// Systematic label (`central`, `up`, `down`, or a per-source split).
    pub sys_type: String,
    /// Flavour category.
    pub category: Category,
}

/// Rectangular region over which a row is valid (all bounds inclusive).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryBounds {
    /// Lower eta edge. A non-negative value on every row of a category
    /// means the category is binned in |eta|.
    pub eta_min: f64,
    /// Upper eta edge.
    pub eta_max: f64,
    /// Lower pt edge (GeV).
    pub pt_min: f64,
    /// Upper pt edge (GeV).
    pub pt_max: f64,
    /// Lower discriminant edge (reshaping only).
    pub discr_min: f64,
    /// Upper discriminant edge (reshaping only).
    pub discr_max: f64,
}

impl EntryBounds {
    /// Bounds covering a pt/eta rectangle with the full discriminant range.
    pub fn new(eta_min: f64, eta_max: f64, pt_min: f64, pt_max: f64) -> Self {
        Self { eta_min, eta_max, pt_min, pt_max, discr_min: 0.0, discr_max: 1.0 }
    }

    /// Set the discriminant range.
    pub fn discriminant(mut self, discr_min: f64, discr_max: f64) -> Self {
        self.discr_min = discr_min;
        self.discr_max = discr_max;
        self
    }

    /// True when `eta` lies in `[eta_min, eta_max]`.
    pub fn contains_eta(&self, eta: f64) -> bool {
        self.eta_min <= eta && eta <= self.eta_max
    }

    /// True when `pt` lies in `[pt_min, pt_max]`.
    pub fn contains_pt(&self, pt: f64) -> bool {
        self.pt_min <= pt && pt <= self.pt_max
    }

    /// True when `discr` lies in `[discr_min, discr_max]`.
    pub fn contains_discriminant(&self, discr: f64) -> bool {
        self.discr_min <= discr && discr <= self.discr_max
    }

    fn validate(&self) -> Result<()> {
        let ordered = [
            ("eta", self.eta_min, self.eta_max),
            ("pt", self.pt_min, self.pt_max),
            ("discriminant", self.discr_min, self.discr_max),
        ];
        for (name, lo, hi) in ordered {
            if !(lo.is_finite() && hi.is_finite()) || lo > hi {
                return Err(Error::Parse(format!("invalid {name} range [{lo}, {hi}]")));
            }
        }
        Ok(())
    }
}

/// A calibration value valid over one region for one selection key.
#[derive(Debug, Clone)]
pub struct CalibrationEntry {
    /// Selection tags.
    pub key: EntryKey,
    /// Validity region.
    pub bounds: EntryBounds,
    /// Value as a function of pt (or discriminant for reshaping rows).
    pub formula: Formula,
}

impl CalibrationEntry {
    /// Create an entry, rejecting inverted or non-finite bounds.
    pub fn new(key: EntryKey, bounds: EntryBounds, formula: Formula) -> Result<Self> {
        bounds.validate()?;
        Ok(Self { key, bounds, formula })
    }

    /// Parse one data row of the calibration CSV layout.
    ///
    /// `fields` are the comma-separated cells, already trimmed. A formula
    /// containing commas may arrive split over several trailing cells; they
    /// are joined back together.
    pub fn from_fields(fields: &[&str]) -> Result<Self> {
        if fields.len() < 11 {
            return Err(Error::Parse(format!("expected 11 fields, got {}", fields.len())));
        }

        let op_index: u8 = parse_field(fields[0], "OperatingPoint")?;
        let operating_point = OperatingPoint::from_file_index(op_index)
            .ok_or_else(|| Error::Parse(format!("unknown OperatingPoint index {op_index}")))?;
        let flavour_index: u8 = parse_field(fields[3], "jetFlavor")?;
        let category = Category::from_file_index(flavour_index)
            .ok_or_else(|| Error::Parse(format!("unknown jetFlavor index {flavour_index}")))?;

        let bounds = EntryBounds {
            eta_min: parse_field(fields[4], "etaMin")?,
            eta_max: parse_field(fields[5], "etaMax")?,
            pt_min: parse_field(fields[6], "ptMin")?,
            pt_max: parse_field(fields[7], "ptMax")?,
            discr_min: parse_field(fields[8], "discrMin")?,
            discr_max: parse_field(fields[9], "discrMax")?,
        };

        let formula_text = fields[10..].join(",");
        let formula_text = formula_text.trim().trim_matches('"').trim();
        let formula = Formula::compile(formula_text)?;

        let key = EntryKey {
            operating_point,
            measurement_type: fields[1].to_string(),
            sys_type: fields[2].to_string(),
            category,
        };
        Self::new(key, bounds, formula)
    }

    /// Value at `x`.
    pub fn value(&self, x: f64) -> f64 {
        self.formula.eval(x)
    }
}

fn parse_field<T: std::str::FromStr>(raw: &str, column: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| Error::Parse(format!("invalid {column} value '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(line: &str) -> Vec<&str> {
        line.split(',').map(str::trim).collect()
    }

    #[test]
    fn test_parse_row() {
        let e = CalibrationEntry::from_fields(&fields(
            r#"1, comb, up, 0, 0, 2.4, 30, 670, 0, 1, "0.9+(0.001*x)""#,
        ))
        .unwrap();
        assert_eq!(e.key.operating_point, OperatingPoint::Medium);
        assert_eq!(e.key.measurement_type, "comb");
        assert_eq!(e.key.sys_type, "up");
        assert_eq!(e.key.category, Category::B);
        assert_eq!(e.bounds, EntryBounds::new(0.0, 2.4, 30.0, 670.0));
        assert!((e.value(100.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_formula_with_commas() {
        let e = CalibrationEntry::from_fields(&fields(
            r#"0, incl, central, 2, 0, 2.4, 20, 1000, 0, 1, "max(0.5, min(x, 1))""#,
        ))
        .unwrap();
        assert_eq!(e.key.category, Category::Udsg);
        assert!((e.value(0.7) - 0.7).abs() < 1e-12);
        assert_eq!(e.formula.text(), "max(0.5,min(x,1))");
    }

    #[test]
    fn test_bad_rows() {
        assert!(CalibrationEntry::from_fields(&fields("0, comb, central")).is_err());
        assert!(
            CalibrationEntry::from_fields(&fields("7, comb, central, 0, 0, 2.4, 30, 670, 0, 1, 1"))
                .is_err()
        );
        assert!(
            CalibrationEntry::from_fields(&fields("0, comb, central, 9, 0, 2.4, 30, 670, 0, 1, 1"))
                .is_err()
        );
        assert!(
            CalibrationEntry::from_fields(&fields("0, comb, central, 0, 0, 2.4, abc, 670, 0, 1, 1"))
                .is_err()
        );
        // inverted pt range
        assert!(
            CalibrationEntry::from_fields(&fields("0, comb, central, 0, 0, 2.4, 670, 30, 0, 1, 1"))
                .is_err()
        );
    }

    #[test]
    fn test_bounds_inclusive() {
        let b = EntryBounds::new(0.0, 2.4, 30.0, 50.0).discriminant(0.2, 0.4);
        assert!(b.contains_eta(0.0) && b.contains_eta(2.4));
        assert!(b.contains_pt(30.0) && b.contains_pt(50.0));
        assert!(!b.contains_pt(50.0001));
        assert!(b.contains_discriminant(0.2) && !b.contains_discriminant(0.41));
    }
}
