//! Read-only calibration table for one operating point and variation.

use std::collections::BTreeMap;

use tw_core::{Category, Error, OperatingPoint, Result, Variation};

use crate::entry::CalibrationEntry;
use crate::source::{CalibrationSource, EntryQuery};

/// Entries of one category, ordered by (eta_min, pt_min, discr_min).
#[derive(Debug, Clone)]
struct CategoryEntries {
    entries: Vec<CalibrationEntry>,
    /// Every row starts at eta >= 0: the category is binned in |eta|.
    abs_eta: bool,
}

impl CategoryEntries {
    fn fold(&self, eta: f64) -> f64 {
        if self.abs_eta { eta.abs() } else { eta }
    }

    fn eta_domain(&self) -> (f64, f64) {
        self.entries.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), e| {
            (lo.min(e.bounds.eta_min), hi.max(e.bounds.eta_max))
        })
    }
}

/// Measured correction values for one (operating point, variation), grouped
/// by flavour category.
///
/// Lookups are deterministic: the first entry (in bin order) containing the
/// point wins, so a point on a shared bin edge belongs to the lower bin.
#[derive(Debug, Clone)]
pub struct CalibrationTable {
    operating_point: OperatingPoint,
    variation: Variation,
    groups: BTreeMap<Category, CategoryEntries>,
}

impl CalibrationTable {
    /// Build a table for a named working point.
    ///
    /// Heavy-flavour rows (b, c) are selected with `measurement_type_heavy`,
    /// light rows with `measurement_type_light`.
    pub fn build(
        source: &dyn CalibrationSource,
        working_point: &str,
        variation: Variation,
        measurement_type_heavy: &str,
        measurement_type_light: &str,
    ) -> Result<Self> {
        let operating_point: OperatingPoint = working_point.parse()?;
        Self::build_for(
            source,
            operating_point,
            variation,
            measurement_type_heavy,
            measurement_type_light,
        )
    }

    /// Build a table for an already-parsed operating point.
    pub fn build_for(
        source: &dyn CalibrationSource,
        operating_point: OperatingPoint,
        variation: Variation,
        measurement_type_heavy: &str,
        measurement_type_light: &str,
    ) -> Result<Self> {
        let mut groups = BTreeMap::new();
        let mut heavy_rows = 0usize;
        let mut light_rows = 0usize;

        for category in Category::ALL {
            let measurement_type =
                if category.is_heavy() { measurement_type_heavy } else { measurement_type_light };
            let query = EntryQuery { operating_point, category, variation, measurement_type };
            let mut entries: Vec<CalibrationEntry> =
                source.select(&query).into_iter().cloned().collect();
            if entries.is_empty() {
                continue;
            }

            if category.is_heavy() {
                heavy_rows += entries.len();
            } else {
                light_rows += entries.len();
            }

            entries.sort_by(|a, b| {
                a.bounds
                    .eta_min
                    .total_cmp(&b.bounds.eta_min)
                    .then(a.bounds.pt_min.total_cmp(&b.bounds.pt_min))
                    .then(a.bounds.discr_min.total_cmp(&b.bounds.discr_min))
            });
            let abs_eta = entries.iter().all(|e| e.bounds.eta_min >= 0.0);
            groups.insert(category, CategoryEntries { entries, abs_eta });
        }

        for (rows, measurement_type, flavours) in
            [(heavy_rows, measurement_type_heavy, "b/c"), (light_rows, measurement_type_light, "udsg")]
        {
            if rows == 0 {
                return Err(Error::Configuration(format!(
                    "tagger '{}' has no {variation} rows for measurement type '{measurement_type}' \
                     ({flavours}) at working point {operating_point}",
                    source.tagger()
                )));
            }
        }

        log::debug!(
            "built {variation} table at {operating_point}: {heavy_rows} heavy rows, {light_rows} light rows"
        );

        Ok(Self { operating_point, variation, groups })
    }

    /// Operating point the table was built for.
    pub fn operating_point(&self) -> OperatingPoint {
        self.operating_point
    }

    /// Variation the table was built for.
    pub fn variation(&self) -> Variation {
        self.variation
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.groups.values().map(|g| g.entries.len()).sum()
    }

    /// True when the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Entries of `category` in bin order (empty when there are none).
    pub fn entries(&self, category: Category) -> &[CalibrationEntry] {
        self.groups.get(&category).map(|g| g.entries.as_slice()).unwrap_or(&[])
    }

    /// `(eta_min, eta_max)` covered by `category`, if it has entries.
    pub fn eta_domain(&self, category: Category) -> Option<(f64, f64)> {
        self.groups.get(&category).map(CategoryEntries::eta_domain)
    }

    /// True when `category` is binned in |eta|.
    pub fn folds_eta(&self, category: Category) -> bool {
        self.groups.get(&category).is_some_and(|g| g.abs_eta)
    }

    /// Inclusive pt bounds of the entries covering `eta` for `category`.
    pub fn valid_pt_range(&self, category: Category, eta: f64) -> Result<(f64, f64)> {
        let group = self.group(category)?;
        let eta = group.fold(eta);

        group
            .entries
            .iter()
            .filter(|e| e.bounds.contains_eta(eta))
            .fold(None, |range: Option<(f64, f64)>, e| {
                let (lo, hi) = range.unwrap_or((e.bounds.pt_min, e.bounds.pt_max));
                Some((lo.min(e.bounds.pt_min), hi.max(e.bounds.pt_max)))
            })
            .ok_or_else(|| self.eta_out_of_domain(category, group, eta))
    }

    /// Value at (`eta`, `pt`). No clamping is applied.
    pub fn evaluate(&self, category: Category, eta: f64, pt: f64) -> Result<f64> {
        self.evaluate_with_discriminant(category, eta, pt, 0.0)
    }

    /// Value at (`eta`, `pt`, `discr`).
    ///
    /// Reshaping tables also bin in the discriminant and evaluate their
    /// formula at `discr`; other tables ignore `discr` and evaluate at `pt`.
    pub fn evaluate_with_discriminant(
        &self,
        category: Category,
        eta: f64,
        pt: f64,
        discr: f64,
    ) -> Result<f64> {
        let group = self.group(category)?;
        let eta = group.fold(eta);
        let use_discr = self.operating_point.uses_discriminant();

        let mut eta_covered = false;
        for e in group.entries.iter().filter(|e| e.bounds.contains_eta(eta)) {
            eta_covered = true;
            if !e.bounds.contains_pt(pt) {
                continue;
            }
            if !use_discr {
                return Ok(e.value(pt));
            }
            if e.bounds.contains_discriminant(discr) {
                return Ok(e.value(discr));
            }
        }

        if !eta_covered {
            return Err(self.eta_out_of_domain(category, group, eta));
        }
        if use_discr {
            Err(Error::Lookup(format!(
                "no {} bin of category {category} covers pt={pt}, discriminant={discr} at eta={eta}",
                self.variation
            )))
        } else {
            Err(Error::Lookup(format!(
                "no {} bin of category {category} covers pt={pt} at eta={eta}",
                self.variation
            )))
        }
    }

    fn group(&self, category: Category) -> Result<&CategoryEntries> {
        self.groups.get(&category).ok_or_else(|| {
            Error::Lookup(format!(
                "no {} calibration entries for category {category} at {}",
                self.variation, self.operating_point
            ))
        })
    }

    fn eta_out_of_domain(&self, category: Category, group: &CategoryEntries, eta: f64) -> Error {
        let (lo, hi) = group.eta_domain();
        Error::Lookup(format!(
            "eta={eta} outside the calibrated domain [{lo}, {hi}] of category {category} ({} table)",
            self.variation
        ))
    }
}
