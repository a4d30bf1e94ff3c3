use std::fmt;
use std::cmp::Reverse;
use std::collections::{BTreeMap,BTreeSet};

use serde::Serialize;
use chrono::naive::NaiveDate;
use unidecode::unidecode;

use super::model::{StatType,Region,RegionSet,union_dates,sum_by_date};
use super::state::{ViewState,SortKey,Scale};


#[derive(Serialize,Clone,Debug,PartialEq)]
pub struct Series {
    pub label: String,
    pub stat: StatType,
    pub region: Option<String>,
    pub data: Vec<i64>
}

/// Labels plus one value per label for every series.
#[derive(Serialize,Clone,Debug,Default,PartialEq)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Series>
}

pub type Subset<'a> = BTreeMap<&'a str,&'a Region>;


pub fn select<'a>(regions: &'a RegionSet, keys: &BTreeSet<String>) -> Subset<'a> {
    regions.iter().filter(|(key,_)| keys.contains(*key))
	.map(|(key,region)| (key.as_str(), region)).collect()
}


fn date_label(date: &NaiveDate) -> String {
    format!("{}", date.format("%Y-%m-%d"))
}


/// One series per stat type, summed over the subset.
pub fn cumulative(subset: &Subset) -> ChartData {
    let sums = sum_by_date(subset.values().copied());
    ChartData {
	labels: sums.iter().map(|ds| date_label(&ds.date)).collect(),
	datasets: StatType::ALL.iter().map(|stat| Series {
	    label: stat.name().to_string(),
	    stat: *stat,
	    region: None,
	    data: sums.iter().map(|ds| ds.get(*stat)).collect()
	}).collect()
    }
}


/// One series per region and stat type, aligned on the union of dates.
///
/// Days a region did not report are padded: with 0 before its first
/// report, with its last known value afterwards.
pub fn distinct(subset: &Subset) -> ChartData {

    let axis = union_dates(subset.values().copied());
    let mut datasets = vec![];

    for (key,region) in subset.iter() {
	for stat in StatType::ALL.iter() {
	    let mut data : Vec<i64> = Vec::with_capacity(axis.len());
	    for ds in region.dates.iter() {
		let index = match axis.binary_search(&ds.date) {
		    Ok(index) if index >= data.len() => index,
		    _ => {
			log::debug!("{}: out of order entry on {} skipped", key, ds.date);
			continue;
		    }
		};
		pad(key, *stat, &axis, &mut data, index);
		data.push(ds.get(*stat));
	    }
	    pad(key, *stat, &axis, &mut data, axis.len());
	    datasets.push(Series {
		label: format!("{} ({})", key, stat),
		stat: *stat,
		region: Some(key.to_string()),
		data
	    });
	}
    }

    ChartData { labels: axis.iter().map(date_label).collect(), datasets }

}


fn pad(key: &str, stat: StatType, axis: &[NaiveDate], data: &mut Vec<i64>, len: usize) {
    while data.len() < len {
	let date = axis[data.len()];
	match data.last().copied() {
	    Some(value) => {
		log::warn!("filling missing value for {:?}, date: {}, type: {}, count: {}",
			   key, date, stat, value);
		data.push(value);
	    },
	    None => {
		log::debug!("{:?} not reported yet on {}, type: {}", key, date, stat);
		data.push(0);
	    }
	}
    }
}


/// Distinct series re-indexed by days since each region's first confirmed
/// case, cut to the shortest region. Regions that never had a confirmed
/// case are left out.
pub fn patient_zero(subset: &Subset) -> ChartData {

    let ChartData { datasets, .. } = distinct(subset);

    let offsets : BTreeMap<String,usize> = datasets.iter()
	.filter(|s| s.stat == StatType::Confirmed)
	.filter_map(|s| {
	    let region = s.region.clone()?;
	    match s.data.iter().position(|v| *v > 0) {
		Some(offset) => Some((region, offset)),
		None => {
		    log::debug!("{:?} has no confirmed cases, left out", region);
		    None
		}
	    }
	}).collect();

    let mut datasets : Vec<Series> = datasets.into_iter().filter_map(|mut s| {
	let offset = *offsets.get(s.region.as_ref()?)?;
	s.data.drain(..offset);
	Some(s)
    }).collect();

    let size = datasets.iter().map(|s| s.data.len()).min().unwrap_or(0);
    for s in datasets.iter_mut() {
	s.data.truncate(size);
    }

    ChartData {
	labels: (1..=size).map(|i| i.to_string()).collect(),
	datasets
    }

}


#[derive(Serialize,Clone,Debug,PartialEq)]
pub struct StatTotal {
    pub stat: StatType,
    pub last: i64,
    pub previous: i64,
    pub growth: Option<i64>
}

impl StatTotal {

    pub fn growth_label(&self) -> String {
	match self.growth {
	    Some(growth) => format!("{:+}%", growth),
	    None => "n/a".to_string(),
	}
    }

}


#[derive(Serialize,Clone,Debug,Default,PartialEq)]
pub struct Totals {
    pub date: Option<NaiveDate>,
    pub stats: Vec<StatTotal>
}

impl Totals {

    pub fn get(&self, stat: StatType) -> Option<&StatTotal> {
	self.stats.iter().find(|t| t.stat == stat)
    }

}


/// Growth in whole percent; undefined when there was nothing before.
pub fn growth(last: i64, previous: i64) -> Option<i64> {
    match previous {
	0 => None,
	previous => Some(((last as f64 / previous as f64 - 1.0) * 100.0).round() as i64),
    }
}


/// Sums of the last two days of the subset, with growth between them.
pub fn totals(subset: &Subset) -> Totals {

    let axis = union_dates(subset.values().copied());
    let last = axis.last().copied();
    let previous = axis.len().checked_sub(2).map(|i| axis[i]);

    let sum = |date: Option<NaiveDate>, stat: StatType| -> i64 {
	date.map_or(0, |date| subset.values()
		    .filter_map(|r| r.latest(date))
		    .map(|ds| ds.get(stat)).sum())
    };

    Totals {
	date: last,
	stats: StatType::ALL.iter().map(|stat| {
	    let (l,p) = (sum(last, *stat), sum(previous, *stat));
	    StatTotal { stat: *stat, last: l, previous: p, growth: growth(l, p) }
	}).collect()
    }

}


const SUFFIXES: [&str; 3] = ["k", "m", "b"];

pub fn human_readable(value: i64) -> String {
    let mut value = value as f64;
    let mut suffix = "";
    for s in SUFFIXES.iter() {
	if value <= 1000.0 {
	    break;
	}
	value /= 1000.0;
	suffix = s;
    }
    format!("{}{}", value.round() as i64, suffix)
}


#[derive(Serialize,Clone,Debug,PartialEq)]
pub struct RegionEntry {
    pub key: String,
    pub count: i64,
    pub selected: bool
}

impl fmt::Display for RegionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
	write!(f, "{} {}", self.key, human_readable(self.count))
    }
}


/// Region listing in the requested order; the count shown is the last
/// value of the sort stat (confirmed when sorting by name).
pub fn sorted_regions(regions: &RegionSet, sort: SortKey,
		      selected: &BTreeSet<String>) -> Vec<RegionEntry> {

    let stat = sort.stat().unwrap_or(StatType::Confirmed);
    let mut entries : Vec<RegionEntry> = regions.iter().map(|(key,region)| RegionEntry {
	key: key.clone(),
	count: region.last().map_or(0, |ds| ds.get(stat)),
	selected: selected.contains(key)
    }).collect();

    match sort.stat() {
	None => entries.sort_by_cached_key(
	    |e| (unidecode(&e.key).to_lowercase(), e.key.clone())),
	Some(_) => entries.sort_by_key(|e| (Reverse(e.count), e.key.clone())),
    }

    entries

}


#[derive(Serialize,Clone,Debug,PartialEq)]
pub struct RenderPayload {
    pub chart: ChartData,
    pub totals: Totals,
    pub scale: Scale,
    pub hidden: BTreeSet<usize>,
    pub regions: Vec<RegionEntry>
}


/// Everything a renderer needs for the given state.
pub fn update(by_region: &RegionSet, by_country: &RegionSet, state: &ViewState) -> RenderPayload {

    let regions = match state.aggregate_by_country {
	true => by_country,
	false => by_region,
    };
    let subset = select(regions, &state.selected);

    let chart = match (state.cumulative, state.patient_zero) {
	(true,_) => cumulative(&subset),
	(false,true) => patient_zero(&subset),
	(false,false) => distinct(&subset),
    };

    RenderPayload {
	chart,
	totals: totals(&subset),
	scale: state.scale,
	hidden: state.hidden.clone(),
	regions: sorted_regions(regions, state.sort, &state.selected)
    }

}


#[cfg(test)]
mod tests {

    use super::*;
    use crate::model::tests::{stat,region,region_set};
    use crate::fill::fill_regions;
    use crate::aggregate::by_country;

    fn all(regions: &RegionSet) -> BTreeSet<String> {
	regions.keys().cloned().collect()
    }

    fn scenario_a() -> RegionSet {
	region_set(vec![
	    region("Aa", "X", vec![stat(1, 1, 0, 0), stat(2, 2, 0, 0)]),
	    region("Bb", "Y", vec![stat(2, 5, 0, 0)]),
	])
    }

    fn series<'a>(chart: &'a ChartData, label: &str) -> &'a [i64] {
	&chart.datasets.iter().find(|s| s.label == label).unwrap().data
    }

    #[test]
    fn cumulative_sums_per_date() {
	let mut regions = scenario_a();
	fill_regions(&mut regions);
	let chart = cumulative(&select(&regions, &all(&regions)));
	assert_eq!(chart.labels, vec!["2020-01-01", "2020-01-02"]);
	assert_eq!(chart.datasets.len(), 3);
	assert_eq!(series(&chart, "confirmed"), &[1, 7]);
	assert_eq!(series(&chart, "deaths"), &[0, 0]);
    }

    #[test]
    fn distinct_pads_to_axis() {
	let regions = region_set(vec![
	    region("Aa", "", vec![stat(1, 1, 0, 0), stat(2, 2, 0, 0), stat(4, 3, 1, 0)]),
	    region("Bb", "", vec![stat(2, 5, 0, 0), stat(3, 6, 0, 0)]),
	]);
	let chart = distinct(&select(&regions, &all(&regions)));
	assert_eq!(chart.labels.len(), 4);
	assert_eq!(chart.datasets.len(), 6);
	assert_eq!(series(&chart, "Aa (confirmed)"), &[1, 2, 2, 3]);
	assert_eq!(series(&chart, "Aa (deaths)"), &[0, 0, 0, 1]);
	assert_eq!(series(&chart, "Bb (confirmed)"), &[0, 5, 6, 6]);
	assert!(chart.datasets.iter().all(|s| s.data.len() == chart.labels.len()));
    }

    #[test]
    fn selection_limits_subset() {
	let regions = scenario_a();
	let keys : BTreeSet<_> = vec!["Bb, Y".to_string(), "Zz".to_string()].into_iter().collect();
	let chart = distinct(&select(&regions, &keys));
	assert_eq!(chart.labels, vec!["2020-01-02"]);
	assert_eq!(chart.datasets.len(), 3);
    }

    #[test]
    fn patient_zero_aligns_first_cases() {
	let regions = region_set(vec![
	    region("Aa", "", vec![stat(1, 0, 0, 0), stat(2, 1, 0, 0), stat(3, 4, 1, 0),
				  stat(4, 9, 2, 1)]),
	    region("Bb", "", vec![stat(1, 0, 0, 0), stat(2, 0, 0, 0), stat(3, 0, 0, 0),
				  stat(4, 2, 0, 0)]),
	    region("Cc", "", vec![stat(1, 0, 0, 0), stat(4, 0, 0, 0)]),
	]);
	let chart = patient_zero(&select(&regions, &all(&regions)));
	assert_eq!(chart.labels, vec!["1"]);
	assert_eq!(chart.datasets.len(), 6);
	assert!(chart.datasets.iter().all(|s| s.region.as_deref() != Some("Cc")));
	assert_eq!(series(&chart, "Aa (confirmed)"), &[1]);
	assert_eq!(series(&chart, "Bb (confirmed)"), &[2]);

	let two = region_set(vec![regions["Aa"].clone()]);
	let chart = patient_zero(&select(&two, &all(&two)));
	assert_eq!(chart.labels, vec!["1", "2", "3"]);
	assert_eq!(series(&chart, "Aa (confirmed)"), &[1, 4, 9]);
	assert_eq!(series(&chart, "Aa (recovered)"), &[0, 0, 1]);
	assert!(chart.datasets.iter().filter(|s| s.stat == StatType::Confirmed)
		.all(|s| s.data[0] > 0));
    }

    #[test]
    fn patient_zero_without_cases_is_empty() {
	let regions = region_set(vec![region("Cc", "", vec![stat(1, 0, 0, 0)])]);
	let chart = patient_zero(&select(&regions, &all(&regions)));
	assert!(chart.labels.is_empty());
	assert!(chart.datasets.is_empty());
    }

    #[test]
    fn growth_percentages() {
	assert_eq!(growth(120, 100), Some(20));
	assert_eq!(growth(95, 100), Some(-5));
	assert_eq!(growth(10, 3), Some(233));
	assert_eq!(growth(5, 0), None);
	assert_eq!(growth(0, 0), None);
    }

    #[test]
    fn totals_of_last_two_days() {
	let regions = region_set(vec![
	    region("Aa", "", vec![stat(1, 60, 1, 0), stat(2, 70, 2, 3)]),
	    region("Bb", "", vec![stat(1, 40, 0, 0)]),
	]);
	let totals = totals(&select(&regions, &all(&regions)));
	let confirmed = totals.get(StatType::Confirmed).unwrap();
	assert_eq!((confirmed.last, confirmed.previous), (110, 100));
	assert_eq!(confirmed.growth_label(), "+10%");
	let recovered = totals.get(StatType::Recovered).unwrap();
	assert_eq!((recovered.last, recovered.growth), (3, None));
	assert_eq!(recovered.growth_label(), "n/a");
	assert_eq!(totals.get(StatType::Deaths).unwrap().growth, Some(100));
    }

    #[test]
    fn human_readable_counts() {
	assert_eq!(human_readable(999), "999");
	assert_eq!(human_readable(1234), "1k");
	assert_eq!(human_readable(2_500_000), "3m");
	assert_eq!(human_readable(7_000_000_000), "7b");
    }

    #[test]
    fn region_listing_order() {
	let regions = region_set(vec![
	    region("Zambia", "", vec![stat(1, 50, 0, 0)]),
	    region("Côte d'Ivoire", "", vec![stat(1, 5, 9, 0)]),
	    region("Bolivia", "", vec![stat(1, 500, 1, 0)]),
	]);
	let none = BTreeSet::new();
	let by_name : Vec<_> = sorted_regions(&regions, SortKey::Name, &none)
	    .into_iter().map(|e| e.key).collect();
	assert_eq!(by_name, vec!["Bolivia", "Côte d'Ivoire", "Zambia"]);
	let by_deaths = sorted_regions(&regions, SortKey::Deaths, &none);
	assert_eq!(by_deaths[0].key, "Côte d'Ivoire");
	assert_eq!(by_deaths[0].to_string(), "Côte d'Ivoire 9");
	let by_confirmed = sorted_regions(&regions, SortKey::Confirmed, &none);
	assert_eq!(by_confirmed[0].to_string(), "Bolivia 500");
    }

    #[test]
    fn update_follows_state() {
	let by_region = region_set(vec![
	    region("Canada", "Ontario", vec![stat(1, 1, 0, 0), stat(2, 2, 0, 0)]),
	    region("Canada", "Quebec", vec![stat(1, 3, 0, 0), stat(2, 4, 0, 0)]),
	]);
	let countries = by_country(&by_region);
	let mut state = ViewState::new(countries.keys().cloned());

	let payload = update(&by_region, &countries, &state);
	assert_eq!(payload.chart.datasets.len(), 3);
	assert_eq!(series(&payload.chart, "confirmed"), &[4, 6]);
	assert_eq!(payload.totals.get(StatType::Confirmed).unwrap().growth, Some(50));

	state.set_cumulative(false);
	let payload = update(&by_region, &countries, &state);
	assert_eq!(series(&payload.chart, "Canada (confirmed)"), &[4, 6]);

	// province keys are not selected at region granularity
	state.set_aggregate_by_country(false);
	let payload = update(&by_region, &countries, &state);
	assert!(payload.chart.datasets.is_empty());
	assert_eq!(payload.regions.len(), 2);
    }

}
