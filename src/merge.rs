use std::collections::BTreeMap;

use chrono::naive::NaiveDate;

use super::model::{StatType,DayStat,Region,RegionSet,Dataset,Provenance,region_key};
use super::table::Record;


pub const COUNTRY: [&str; 3] = ["Country/Region", "Country_Region", "Countries and territories"];
pub const PROVINCE: [&str; 2] = ["Province/State", "Province_State"];
pub const LAT: [&str; 1] = ["Lat"];
pub const LONG: [&str; 2] = ["Long", "Long_"];


struct RegionMap {
    region: Region,
    dates: BTreeMap<NaiveDate,DayStat>
}


/// Folds the records of one pass per stat type into a single region set.
///
/// Counts are only ever added, so the order in which stat types (or
/// records) are merged does not change the result. Region metadata is
/// taken from the first record seen for a key.
#[derive(Default)]
pub struct Merger {
    regions: BTreeMap<String,RegionMap>,
    total: BTreeMap<NaiveDate,DayStat>,
    warnings: usize
}

impl Merger {

    pub fn new() -> Self {
	Self::default()
    }

    pub fn merge(&mut self, stat: StatType, records: &[Record]) -> &mut Self {

	for record in records {

	    let country = record.field(&COUNTRY);
	    let province = record.field(&PROVINCE);
	    let key = region_key(country, province);

	    let entry = self.regions.entry(key.clone()).or_insert_with(|| RegionMap {
		region: Region {
		    lat: record.field(&LAT).parse().unwrap_or(0.0),
		    long: record.field(&LONG).parse().unwrap_or(0.0),
		    ..Region::new(country, province)
		},
		dates: BTreeMap::new()
	    });

	    for (date,count) in record.dates.iter() {
		if *count < 0 {
		    self.warnings += 1;
		    log::warn!("count is negative: region: {:?}, date: {}, type: {}, count: {}",
			       key, date, stat, count);
		}
		entry.dates.entry(*date).or_insert_with(|| DayStat::zero(*date))
		    .add(stat, *count);
		self.total.entry(*date).or_insert_with(|| DayStat::zero(*date))
		    .add(stat, *count);
	    }

	}

	self

    }

    /// Number of negative counts seen so far.
    pub fn warnings(&self) -> usize {
	self.warnings
    }

    pub fn regions(&self) -> usize {
	self.regions.len()
    }

    pub fn finish(self, source: Provenance) -> Dataset {
	if self.warnings > 0 {
	    log::info!("{}: {} negative counts kept as reported", source.name, self.warnings);
	}
	let regions : RegionSet = self.regions.into_iter().map(
	    |(key,map)| (key, Region {
		dates: map.dates.into_iter().map(|(_,ds)| ds).collect(),
		..map.region
	    })).collect();
	Dataset {
	    date: chrono::Utc::now(),
	    total: self.total.into_iter().map(|(_,ds)| ds).collect(),
	    regions,
	    source
	}
    }

}
