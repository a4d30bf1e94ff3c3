use std::fmt;
use std::collections::BTreeMap;

use serde::{Serialize,Deserialize};
use chrono::{DateTime,Utc};
use chrono::naive::NaiveDate;


#[derive(Serialize,Deserialize,Clone,Copy,Debug,PartialEq,Eq,Hash,PartialOrd,Ord)]
#[serde(rename_all = "lowercase")]
pub enum StatType {
    Confirmed,
    Deaths,
    Recovered
}

impl StatType {

    /// Chart order of the stat types.
    pub const ALL: [StatType; 3] = [StatType::Confirmed, StatType::Recovered, StatType::Deaths];

    pub fn name(&self) -> &'static str {
	match self {
	    Self::Confirmed => "confirmed",
	    Self::Deaths => "deaths",
	    Self::Recovered => "recovered"
	}
    }

}

impl fmt::Display for StatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
	f.write_str(self.name())
    }
}


/// Cumulative counts reported for one region on one day.
#[derive(Serialize,Deserialize,Clone,Copy,Debug,PartialEq,Eq)]
pub struct DayStat {
    pub date: NaiveDate,
    pub confirmed: i64,
    pub deaths: i64,
    pub recovered: i64
}

impl DayStat {

    pub fn zero(date: NaiveDate) -> Self {
	Self { date, confirmed: 0, deaths: 0, recovered: 0 }
    }

    pub fn get(&self, stat: StatType) -> i64 {
	match stat {
	    StatType::Confirmed => self.confirmed,
	    StatType::Deaths => self.deaths,
	    StatType::Recovered => self.recovered
	}
    }

    pub fn add(&mut self, stat: StatType, count: i64) {
	match stat {
	    StatType::Confirmed => self.confirmed += count,
	    StatType::Deaths => self.deaths += count,
	    StatType::Recovered => self.recovered += count
	}
    }

    pub fn accumulate(&mut self, other: &DayStat) {
	for stat in StatType::ALL.iter() {
	    self.add(*stat, other.get(*stat));
	}
    }

    /// The same counts, reported on another day.
    pub fn on(&self, date: NaiveDate) -> Self {
	Self { date, ..*self }
    }

}


#[derive(Serialize,Deserialize,Clone,Debug,PartialEq)]
pub struct Region {
    pub country: String,
    pub province: String,
    pub lat: f64,
    pub long: f64,
    pub dates: Vec<DayStat>
}

impl Region {

    pub fn new(country: &str, province: &str) -> Self {
	Self {
	    country: country.to_string(),
	    province: province.to_string(),
	    lat: 0.0,
	    long: 0.0,
	    dates: vec![]
	}
    }

    pub fn key(&self) -> String {
	region_key(&self.country, &self.province)
    }

    pub fn last(&self) -> Option<&DayStat> {
	self.dates.last()
    }

    /// The latest entry reported on or before `date`.
    pub fn latest(&self, date: NaiveDate) -> Option<&DayStat> {
	match self.dates.binary_search_by_key(&date, |ds| ds.date) {
	    Ok(i) => Some(&self.dates[i]),
	    Err(0) => None,
	    Err(i) => Some(&self.dates[i - 1])
	}
    }

}


/// Identity of a region: the country alone, or country and province.
pub fn region_key(country: &str, province: &str) -> String {
    match (country, province) {
	(country,"") => country.to_string(),
	(country,province) => format!("{}, {}", country, province),
    }
}


pub type RegionSet = BTreeMap<String,Region>;


#[derive(Serialize,Deserialize,Clone,Debug,PartialEq)]
pub struct Provenance {
    pub name: String,
    pub link: String
}


#[derive(Serialize,Deserialize,Clone,Debug,PartialEq)]
pub struct Dataset {
    pub date: DateTime<Utc>,
    pub total: Vec<DayStat>,
    pub regions: RegionSet,
    pub source: Provenance
}

impl Dataset {

    /// Builds a dataset whose totals are derived from `regions`.
    pub fn new(regions: RegionSet, source: Provenance) -> Self {
	let mut dataset = Self { date: Utc::now(), total: vec![], regions, source };
	dataset.recompute_totals();
	dataset
    }

    /// Sorted union of the dates reported by any region.
    pub fn dates(&self) -> Vec<NaiveDate> {
	union_dates(self.regions.values())
    }

    pub fn last_two_dates(&self) -> (Option<NaiveDate>,Option<NaiveDate>) {
	let dates = self.dates();
	let n = dates.len();
	(dates.last().copied(), n.checked_sub(2).map(|i| dates[i]))
    }

    pub fn recompute_totals(&mut self) {
	self.total = sum_by_date(self.regions.values());
    }

    /// Dates on which `total` disagrees with the sum over all regions.
    pub fn check_totals(&self) -> Vec<NaiveDate> {
	let expected : BTreeMap<_,_> = sum_by_date(self.regions.values())
	    .into_iter().map(|ds| (ds.date, ds)).collect();
	let actual : BTreeMap<_,_> = self.total.iter()
	    .map(|ds| (ds.date, *ds)).collect();
	let mut dates : Vec<_> = expected.keys().chain(actual.keys())
	    .filter(|date| expected.get(*date) != actual.get(*date))
	    .copied().collect();
	dates.sort();
	dates.dedup();
	dates
    }

}


pub fn union_dates<'a, I>(regions: I) -> Vec<NaiveDate>
where I: IntoIterator<Item = &'a Region> {
    let mut dates : Vec<_> = regions.into_iter()
	.flat_map(|region| region.dates.iter().map(|ds| ds.date))
	.collect();
    dates.sort();
    dates.dedup();
    dates
}


/// Date-wise sum over all given regions, one entry per date present in
/// any of them.
pub fn sum_by_date<'a, I>(regions: I) -> Vec<DayStat>
where I: IntoIterator<Item = &'a Region> {
    let mut result = BTreeMap::new();
    for region in regions {
	for ds in region.dates.iter() {
	    result.entry(ds.date).or_insert_with(|| DayStat::zero(ds.date))
		.accumulate(ds);
	}
    }
    result.into_iter().map(|(_,ds)| ds).collect()
}
