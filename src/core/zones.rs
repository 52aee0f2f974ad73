use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{HistError, HistResult};

/// Zone table family used for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneContext {
    Power,
    HeartRate,
}

/// Zone bands in effect over a date span.
///
/// `end == None` means the range stays open towards the future.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ZoneRangeFields")]
pub struct ZoneRange {
    start: NaiveDate,
    end: Option<NaiveDate>,
    lows: SmallVec<[f64; 8]>,
    names: Vec<String>,
}

#[derive(Deserialize)]
struct ZoneRangeFields {
    start: NaiveDate,
    #[serde(default)]
    end: Option<NaiveDate>,
    lows: Vec<f64>,
    names: Vec<String>,
}

impl TryFrom<ZoneRangeFields> for ZoneRange {
    type Error = HistError;

    fn try_from(fields: ZoneRangeFields) -> HistResult<Self> {
        Self::new(fields.start, fields.end, fields.lows, fields.names)
    }
}

impl ZoneRange {
    pub fn new(
        start: NaiveDate,
        end: Option<NaiveDate>,
        lows: impl IntoIterator<Item = f64>,
        names: impl IntoIterator<Item = impl Into<String>>,
    ) -> HistResult<Self> {
        let lows: SmallVec<[f64; 8]> = lows.into_iter().collect();
        let names: Vec<String> = names.into_iter().map(Into::into).collect();

        if let Some(end) = end {
            if end < start {
                return Err(HistError::InvalidData(format!(
                    "zone range end {end} precedes start {start}"
                )));
            }
        }
        if lows.len() != names.len() {
            return Err(HistError::InvalidData(format!(
                "zone range has {} lower bounds but {} names",
                lows.len(),
                names.len()
            )));
        }
        if lows.iter().any(|low| !low.is_finite()) {
            return Err(HistError::InvalidData(
                "zone lower bounds must be finite".to_owned(),
            ));
        }
        if lows.windows(2).any(|pair| pair[1] < pair[0]) {
            return Err(HistError::InvalidData(
                "zone lower bounds must be ascending".to_owned(),
            ));
        }

        Ok(Self {
            start,
            end,
            lows,
            names,
        })
    }

    #[must_use]
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    #[must_use]
    pub fn lows(&self) -> &[f64] {
        &self.lows
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn zone_count(&self) -> usize {
        self.lows.len()
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && self.end.is_none_or(|end| date <= end)
    }

    /// Band holding `value`: last index whose lower bound is `<= value`.
    /// Values below the first bound fall into band 0.
    #[must_use]
    pub fn band_of(&self, value: f64) -> Option<usize> {
        if self.lows.is_empty() || value.is_nan() {
            return None;
        }
        let above = self.lows.partition_point(|low| *low <= value);
        Some(above.saturating_sub(1))
    }
}

/// Ordered set of zone ranges for one context.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ZoneTable {
    ranges: Vec<ZoneRange>,
}

impl ZoneTable {
    #[must_use]
    pub fn new(ranges: Vec<ZoneRange>) -> Self {
        Self { ranges }
    }

    pub fn push(&mut self, range: ZoneRange) {
        self.ranges.push(range);
    }

    #[must_use]
    pub fn ranges(&self) -> &[ZoneRange] {
        &self.ranges
    }

    #[must_use]
    pub fn range(&self, index: usize) -> Option<&ZoneRange> {
        self.ranges.get(index)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Resolves the range applying to `date`.
    ///
    /// When several ranges cover the date the most recent start wins, then the
    /// narrower span.
    #[must_use]
    pub fn which_range(&self, date: NaiveDate) -> Option<usize> {
        self.ranges
            .iter()
            .enumerate()
            .filter(|(_, range)| range.contains(date))
            .max_by(|(_, a), (_, b)| {
                a.start
                    .cmp(&b.start)
                    .then_with(|| span_end(b).cmp(&span_end(a)))
            })
            .map(|(index, _)| index)
    }

    #[must_use]
    pub fn classify(&self, value: f64, date: NaiveDate) -> Option<usize> {
        let range = self.which_range(date)?;
        self.ranges[range].band_of(value)
    }
}

fn span_end(range: &ZoneRange) -> NaiveDate {
    range.end.unwrap_or(NaiveDate::MAX)
}

/// Band geometry handed to renderers for shading and labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneBand {
    pub index: usize,
    pub name: String,
    pub low: f64,
    /// Next band's lower bound; `None` for the open top band.
    pub high: Option<f64>,
    pub label_anchor: f64,
}

/// Power and heart-rate zone tables behind one boundary search.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ZoneClassifier {
    power: ZoneTable,
    heart_rate: ZoneTable,
}

impl ZoneClassifier {
    #[must_use]
    pub fn new(power: ZoneTable, heart_rate: ZoneTable) -> Self {
        Self { power, heart_rate }
    }

    #[must_use]
    pub fn table(&self, context: ZoneContext) -> &ZoneTable {
        match context {
            ZoneContext::Power => &self.power,
            ZoneContext::HeartRate => &self.heart_rate,
        }
    }

    #[must_use]
    pub fn which_range(&self, context: ZoneContext, date: NaiveDate) -> Option<usize> {
        self.table(context).which_range(date)
    }

    /// Zone index of `value` on `date`, or `None` when unclassified.
    #[must_use]
    pub fn classify(&self, value: f64, date: NaiveDate, context: ZoneContext) -> Option<usize> {
        self.table(context).classify(value, date)
    }

    #[must_use]
    pub fn zone_lower_bounds(&self, context: ZoneContext, range: usize) -> &[f64] {
        self.table(context)
            .range(range)
            .map_or(&[][..], ZoneRange::lows)
    }

    #[must_use]
    pub fn zone_names(&self, context: ZoneContext, range: usize) -> &[String] {
        self.table(context)
            .range(range)
            .map_or(&[][..], ZoneRange::names)
    }

    /// Number of bands applying on `date`; 0 when no range matches.
    #[must_use]
    pub fn zone_count(&self, context: ZoneContext, date: NaiveDate) -> usize {
        let table = self.table(context);
        table
            .which_range(date)
            .and_then(|index| table.range(index))
            .map_or(0, ZoneRange::zone_count)
    }

    /// Band bounds and label anchors for `range`, divided by `mass_kg` when the
    /// histogram shows power per mass.
    #[must_use]
    pub fn zone_bands(
        &self,
        context: ZoneContext,
        range: usize,
        mass_kg: Option<f64>,
    ) -> Vec<ZoneBand> {
        let lows = self.zone_lower_bounds(context, range);
        let names = self.zone_names(context, range);
        let divisor = mass_kg.filter(|mass| mass.is_finite() && *mass > 0.0).unwrap_or(1.0);

        lows.iter()
            .zip(names)
            .enumerate()
            .map(|(index, (low, name))| {
                let next = lows.get(index + 1).copied();
                let anchor = match (next, index) {
                    (Some(next), _) => 0.5 * (low + next),
                    (None, 0) => 2.0 * low,
                    (None, _) => 1.5 * low - 0.5 * lows[index - 1],
                };
                ZoneBand {
                    index,
                    name: name.clone(),
                    low: low / divisor,
                    high: next.map(|next| next / divisor),
                    label_anchor: anchor / divisor,
                }
            })
            .collect()
    }
}
