//! Normalization and view transforms for per-region COVID-19 time series.
//!
//! Raw tabular sources (the CSSE time-series CSVs, the ECDC spreadsheet)
//! are parsed into flat records, merged into one canonical set of regions
//! and projected into chart-ready series.

pub mod error;
pub mod model;
pub mod table;
pub mod header;
pub mod merge;
pub mod fill;
pub mod aggregate;
pub mod view;
pub mod state;
pub mod csse;
pub mod ecdc;
pub mod graph;

use chrono::naive::NaiveDate;

pub use error::{Result,Error};
pub use model::{StatType,DayStat,Region,RegionSet,Dataset,Provenance};
pub use state::ViewState;
pub use view::{ChartData,Series,RenderPayload};


/// Iterator over consecutive calendar days, open-ended when no end is given.
#[derive(Clone,Debug)]
pub struct NaiveDateRange(pub NaiveDate,pub Option<NaiveDate>);

impl Iterator for NaiveDateRange {
    type Item = NaiveDate;
    fn next(&mut self) -> Option<NaiveDate> {
	match self.1.map_or(true, |end| self.0 <= end) {
	    false => None,
	    true => {
		let current = self.0;
		self.0 = self.0.succ_opt()?;
		Some(current)
	    }
	}
    }
}


#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn date_range_is_inclusive() {
	let start = NaiveDate::from_ymd_opt(2020, 2, 27).unwrap();
	let end = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
	let days: Vec<_> = NaiveDateRange(start, Some(end)).collect();
	assert_eq!(days.len(), 4);
	assert_eq!(days[2], NaiveDate::from_ymd_opt(2020, 2, 29).unwrap());
	assert_eq!(days.last(), Some(&end));
    }

    #[test]
    fn empty_when_end_precedes_start() {
	let start = NaiveDate::from_ymd_opt(2020, 3, 2).unwrap();
	let end = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
	assert_eq!(NaiveDateRange(start, Some(end)).count(), 0);
    }

}
