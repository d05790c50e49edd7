use crate::models::{CountrySeries, RawRecord, SeriesPoint};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Immutable per-country view of the source table.
///
/// Built once at startup and shared read-only by every chart request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    series: BTreeMap<String, CountrySeries>,
}

impl Dataset {
    pub fn series(&self, country: &str) -> Option<&CountrySeries> {
        self.series.get(country)
    }

    /// Country names in ascending order.
    pub fn countries(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn contains(&self, country: &str) -> bool {
        self.series.contains_key(country)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// The retained rows in long form. Feeding them back through [`reshape`]
    /// yields an equal dataset.
    pub fn records(&self) -> impl Iterator<Item = RawRecord> + '_ {
        self.series.values().flat_map(|series| {
            series.points.iter().map(|point| RawRecord {
                country: series.country.clone(),
                date: point.date,
                confirmed: point.confirmed,
            })
        })
    }
}

/// Groups long-form rows into one series per country.
///
/// Rows sharing a country and date are summed (sub-national rows roll up into
/// their country), dates with fewer than one cumulative case are dropped, and
/// the survivors are ordered by date before the derived columns are filled.
pub fn reshape<I>(records: I) -> Dataset
where
    I: IntoIterator<Item = RawRecord>,
{
    let mut grouped: BTreeMap<String, BTreeMap<NaiveDate, i64>> = BTreeMap::new();
    for record in records {
        let total = grouped
            .entry(record.country)
            .or_default()
            .entry(record.date)
            .or_insert(0);
        *total = total.saturating_add(record.confirmed);
    }

    let series = grouped
        .into_iter()
        .filter_map(|(country, by_date)| {
            let points = derive_points(&by_date);
            if points.is_empty() {
                return None;
            }
            Some((country.clone(), CountrySeries { country, points }))
        })
        .collect();

    Dataset { series }
}

fn derive_points(by_date: &BTreeMap<NaiveDate, i64>) -> Vec<SeriesPoint> {
    let mut points: Vec<SeriesPoint> = Vec::with_capacity(by_date.len());
    let mut first: Option<NaiveDate> = None;
    let mut previous: Option<i64> = None;

    for (&date, &confirmed) in by_date.iter().filter(|(_, confirmed)| **confirmed >= 1) {
        let start = *first.get_or_insert(date);
        points.push(SeriesPoint {
            date,
            days_from_first: (date - start).num_days(),
            confirmed,
            daily_new: previous.map(|prev| confirmed - prev),
        });
        previous = Some(confirmed);
    }

    points
}
