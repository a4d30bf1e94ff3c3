use chrono::naive::NaiveDate;

use super::model::{DayStat,Region,RegionSet,Dataset};
use super::NaiveDateRange;


/// Makes the region's series contiguous from its first reported day up to
/// `until`, repeating the last known entry into every missing day. Days
/// before the first report are never filled. Returns the number of
/// inserted entries.
pub fn fill_region(region: &mut Region, until: NaiveDate) -> usize {

    region.dates.sort_by_key(|ds| ds.date);

    let mut filled : Vec<DayStat> = Vec::with_capacity(region.dates.len());
    let mut inserted = 0;

    for ds in region.dates.drain(..) {
	if let Some(prev) = filled.last().copied() {
	    let gap = carry_forward(&prev, ds.date.pred_opt());
	    inserted += gap.len();
	    filled.extend(gap);
	}
	filled.push(ds);
    }

    if let Some(last) = filled.last().copied() {
	let tail = carry_forward(&last, Some(until));
	inserted += tail.len();
	filled.extend(tail);
    }

    region.dates = filled;
    inserted

}


fn carry_forward(from: &DayStat, until: Option<NaiveDate>) -> Vec<DayStat> {
    match (from.date.succ_opt(), until) {
	(Some(start),Some(end)) => NaiveDateRange(start, Some(end))
	    .map(|date| from.on(date)).collect(),
	_ => vec![],
    }
}


/// Fills every region up to the latest date reported by any of them.
pub fn fill_regions(regions: &mut RegionSet) -> usize {
    let until = match regions.values().filter_map(|r| r.last().map(|ds| ds.date)).max() {
	Some(until) => until,
	None => return 0,
    };
    regions.iter_mut().map(|(key,region)| {
	let n = fill_region(region, until);
	if n > 0 {
	    log::debug!("{}: filled {} missing days up to {}", key, n, until);
	}
	n
    }).sum()
}


/// Fills all regions of the dataset and re-derives its totals.
pub fn fill_gaps(dataset: &mut Dataset) -> usize {
    let n = fill_regions(&mut dataset.regions);
    dataset.recompute_totals();
    n
}


#[cfg(test)]
mod tests {

    use super::*;
    use crate::model::tests::{day,stat,region,region_set};
    use proptest::prelude::*;

    #[test]
    fn interior_and_trailing_gaps_carry_forward() {
	let mut r = region("Aa", "", vec![stat(1, 1, 0, 0), stat(4, 6, 1, 1)]);
	assert_eq!(fill_region(&mut r, day(6)), 4);
	assert_eq!(r.dates, vec![
	    stat(1, 1, 0, 0), stat(2, 1, 0, 0), stat(3, 1, 0, 0),
	    stat(4, 6, 1, 1), stat(5, 6, 1, 1), stat(6, 6, 1, 1),
	]);
    }

    #[test]
    fn leading_days_are_not_filled() {
	let mut regions = region_set(vec![
	    region("Aa", "X", vec![stat(1, 1, 0, 0), stat(2, 2, 0, 0)]),
	    region("Bb", "Y", vec![stat(2, 5, 0, 0)]),
	]);
	assert_eq!(fill_regions(&mut regions), 0);
	assert_eq!(regions["Bb, Y"].dates, vec![stat(2, 5, 0, 0)]);
    }

    #[test]
    fn empty_region_is_untouched() {
	let mut r = region("Aa", "", vec![]);
	assert_eq!(fill_region(&mut r, day(5)), 0);
	assert!(r.dates.is_empty());
    }

    #[test]
    fn filled_dataset_keeps_totals_consistent() {
	let mut dataset = Dataset::new(region_set(vec![
	    region("Aa", "", vec![stat(1, 1, 0, 0), stat(3, 3, 0, 0)]),
	    region("Bb", "", vec![stat(1, 2, 0, 0)]),
	]), crate::model::Provenance { name: "t".to_string(), link: String::new() });
	assert_eq!(fill_gaps(&mut dataset), 3);
	assert_eq!(dataset.total, vec![stat(1, 3, 0, 0), stat(2, 3, 0, 0), stat(3, 5, 0, 0)]);
	assert!(dataset.check_totals().is_empty());
    }

    proptest! {
	#[test]
	fn filled_series_are_contiguous_and_stable(
	    days in prop::collection::btree_set(1u32..28, 0..10),
	    until in 1u32..31
	) {
	    let dates = days.iter().map(|d| stat(*d, *d as i64, 0, 0)).collect();
	    let mut r = region("Aa", "", dates);
	    fill_region(&mut r, day(until));
	    for pair in r.dates.windows(2) {
		prop_assert_eq!(pair[0].date.succ_opt(), Some(pair[1].date));
		prop_assert!(pair[0].confirmed <= pair[1].confirmed);
	    }
	    if let Some(first) = days.iter().next() {
		prop_assert_eq!(r.dates[0].date, day(*first));
	    }
	    let once = r.dates.clone();
	    prop_assert_eq!(fill_region(&mut r, day(until)), 0);
	    prop_assert_eq!(r.dates, once);
	}
    }

}
