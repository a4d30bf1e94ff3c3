use std::collections::BTreeMap;

use super::model::{Region,RegionSet,Dataset,sum_by_date};


/// Collapses sub-national regions into one region per country.
///
/// Series are summed per date over the union of the sub-regions' dates; a
/// sub-region lacking a date contributes nothing to it, so inputs should be
/// gap filled first when their series end on different days.
pub fn by_country(regions: &RegionSet) -> RegionSet {

    let mut groups : BTreeMap<&str,Vec<&Region>> = BTreeMap::new();
    for region in regions.values() {
	groups.entry(region.country.as_str()).or_insert_with(Vec::new).push(region);
    }

    groups.into_iter().map(|(country,members)| {
	// coordinates of the country-wide row when the source has one
	let anchor = members.iter().find(|r| r.province.is_empty())
	    .or_else(|| members.first()).copied();
	let region = Region {
	    lat: anchor.map_or(0.0, |r| r.lat),
	    long: anchor.map_or(0.0, |r| r.long),
	    dates: sum_by_date(members),
	    ..Region::new(country, "")
	};
	(region.key(), region)
    }).collect()

}


impl Dataset {

    pub fn by_country(&self) -> Dataset {
	Dataset {
	    date: self.date,
	    total: self.total.clone(),
	    regions: by_country(&self.regions),
	    source: self.source.clone()
	}
    }

}


#[cfg(test)]
mod tests {

    use super::*;
    use crate::model::{Provenance,DayStat};
    use crate::model::tests::{stat,region,region_set};

    fn dataset() -> Dataset {
	let mut canada = region("Canada", "", vec![stat(1, 1, 0, 0)]);
	canada.lat = 56.1;
	let mut ontario = region("Canada", "Ontario", vec![stat(1, 2, 1, 0), stat(2, 4, 1, 1)]);
	ontario.lat = 51.2;
	Dataset::new(region_set(vec![
	    ontario,
	    region("Canada", "Quebec", vec![stat(1, 3, 0, 0), stat(2, 5, 2, 0)]),
	    canada,
	    region("Italy", "", vec![stat(2, 9, 1, 0)]),
	]), Provenance { name: "t".to_string(), link: String::new() })
    }

    #[test]
    fn sums_provinces_per_date() {
	let countries = by_country(&dataset().regions);
	assert_eq!(countries.keys().collect::<Vec<_>>(), vec!["Canada", "Italy"]);
	let canada = &countries["Canada"];
	assert_eq!(canada.province, "");
	assert_eq!(canada.lat, 56.1);
	// Canada's own row has no day 2: union of dates, absent side adds nothing
	assert_eq!(canada.dates, vec![stat(1, 6, 1, 0), stat(2, 9, 3, 1)]);
    }

    #[test]
    fn totals_survive_aggregation() {
	let dataset = dataset();
	let countries = dataset.by_country();
	assert!(dataset.check_totals().is_empty());
	assert!(countries.check_totals().is_empty());
	assert_eq!(countries.total, dataset.total);
	let sum : i64 = countries.regions.values()
	    .flat_map(|r| r.dates.iter().map(DayStat::clone))
	    .map(|ds| ds.confirmed).sum();
	assert_eq!(sum, 1 + 2 + 4 + 3 + 5 + 9);
    }

}
