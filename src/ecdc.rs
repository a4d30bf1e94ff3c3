use std::fs;
use std::path::Path;
use std::time::Duration;
use std::collections::BTreeMap;

use calamine::{Reader,Data};
use chrono::{Duration as Days,Utc};
use chrono::naive::NaiveDate;

use super::error::{Result,Error};
use super::model::{DayStat,Region,RegionSet,Dataset,Provenance};
use super::merge::COUNTRY;
use super::table::{self,Table};


const URL_PREFIX: &str = "https://www.ecdc.europa.eu/sites/default/files/documents\
			  /COVID-19-geographic-disbtribution-worldwide-";


pub fn source() -> Provenance {
    Provenance {
	name: "ECDC's COVID-19 dataset".to_string(),
	link: "https://www.ecdc.europa.eu/en/publications-data/\
	       download-todays-data-geographic-distribution-covid-19-cases-worldwide".to_string()
    }
}


/// Downloads today's spreadsheet (or yesterday's when today's is not out
/// yet), re-using a cached copy younger than `max_age`.
pub fn load(cache_path: &Path, max_age: Duration) -> Result<Dataset> {

    let cache_path = cache_path.join("ecdc");
    let cache_file = cache_path.join("europa.xlsx");

    if !(cache_file.exists() && fs::metadata(&cache_file)?.modified()?.elapsed()? < max_age) {
	let today = Utc::now().date_naive();
	let data = match download(today) {
	    Ok(data) => data,
	    Err(err) => {
		log::warn!("{}: {}, trying yesterday", today, err);
		download(today - Days::days(1))?
	    }
	};
	fs::create_dir_all(&cache_path)?;
	fs::write(&cache_file, &data)?;
    } else {
	log::info!("Using cached {}", cache_file.display());
    }

    load_file(&cache_file)

}


pub fn load_file(path: &Path) -> Result<Dataset> {
    let name = path.display().to_string();
    Ok(from_table(&table::from_grid(&name, read_grid(path)?)?))
}


fn download(date: NaiveDate) -> Result<Vec<u8>> {
    let url = format!("{}{}.xlsx", URL_PREFIX, date.format("%Y-%m-%d"));
    log::info!("Downloading {}...", url);
    let res = reqwest::blocking::get(&url)?;
    match res.status().as_u16() {
	200 => Ok(res.bytes()?.to_vec()),
	_ => Err(Error::HttpError(res.status())),
    }
}


/// Cells of the first sheet, rendered as text.
pub fn read_grid(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut workbook = calamine::open_workbook_auto(path)?;
    let sheet = workbook.sheet_names().first().cloned().ok_or_else(
	|| Error::MalformedSource(format!("{}: no sheets", path.display())))?;
    let range = workbook.worksheet_range(&sheet)?;
    Ok(range.rows().map(|row| row.iter().map(cell_text).collect()).collect())
}


fn cell_text(cell: &Data) -> String {
    match cell {
	Data::String(s) => s.trim().to_string(),
	Data::Int(i) => i.to_string(),
	Data::Float(f) if f.fract() == 0.0 => (*f as i64).to_string(),
	Data::Float(f) => f.to_string(),
	Data::Bool(b) => b.to_string(),
	_ => String::new(),
    }
}


/// Turns rows of daily new cases and deaths per country into cumulative
/// series. The source carries no recoveries.
pub fn from_table(sheet: &Table) -> Dataset {

    let mut daily : BTreeMap<String,BTreeMap<NaiveDate,(i64,i64)>> = BTreeMap::new();

    for (i,record) in sheet.records.iter().enumerate() {
	let country = record.field(&COUNTRY);
	let date = (record.field(&["Year", "year"]).parse().ok(),
		    record.field(&["Month", "month"]).parse().ok(),
		    record.field(&["Day", "day"]).parse().ok());
	let date = match date {
	    (Some(y),Some(m),Some(d)) => NaiveDate::from_ymd_opt(y, m, d),
	    _ => None,
	};
	let date = match date {
	    Some(date) => date,
	    None => {
		log::warn!("{:?}: row {} has no valid date, skipped", country, i + 2);
		continue;
	    }
	};
	let cases = table::parse_count(record.field(&["Cases", "cases"])).unwrap_or(0);
	let deaths = table::parse_count(record.field(&["Deaths", "deaths"])).unwrap_or(0);
	for (stat,count) in &[("confirmed", cases), ("deaths", deaths)] {
	    if *count < 0 {
		log::warn!("count is negative: region: {:?}, date: {}, type: {}, count: {}",
			   country, date, stat, count);
	    }
	}
	let day = daily.entry(country.to_string()).or_insert_with(BTreeMap::new)
	    .entry(date).or_insert((0, 0));
	day.0 += cases;
	day.1 += deaths;
    }

    let regions : RegionSet = daily.into_iter().map(|(country,days)| {
	let mut sum = DayStat::zero(NaiveDate::MIN);
	let region = Region {
	    dates: days.into_iter().map(|(date,(cases,deaths))| {
		sum.confirmed += cases;
		sum.deaths += deaths;
		sum.on(date)
	    }).collect(),
	    ..Region::new(&country, "")
	};
	(region.key(), region)
    }).collect();

    Dataset::new(regions, source())

}


#[cfg(test)]
mod tests {

    use super::*;
    use crate::model::tests::stat;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
	rows.iter().map(|row| row.iter().map(|c| c.to_string()).collect()).collect()
    }

    #[test]
    fn daily_rows_accumulate() {
	let table = table::from_grid("ecdc", grid(&[
	    &["dateRep", "Day", "Month", "Year", "Cases", "Deaths", "Countries and territories"],
	    &["02/01/2020", "2", "1", "2020", "3", "1", "Aa"],
	    &["01/01/2020", "1", "1", "2020", "2", "0", "Aa"],
	    &["03/01/2020", "3", "1", "2020", "-1", "0", "Aa"],
	    &["01/01/2020", "1", "1", "2020", "4", "0", "Bb"],
	    &["", "31", "2", "2020", "4", "0", "Bb"],
	])).unwrap();
	let dataset = from_table(&table);
	assert_eq!(dataset.source, source());
	assert_eq!(dataset.regions["Aa"].dates,
		   vec![stat(1, 2, 0, 0), stat(2, 5, 1, 0), stat(3, 4, 1, 0)]);
	assert_eq!(dataset.regions["Bb"].dates, vec![stat(1, 4, 0, 0)]);
	// recovered is never counted twice into confirmed
	assert_eq!(dataset.total, vec![stat(1, 6, 0, 0), stat(2, 5, 1, 0), stat(3, 4, 1, 0)]);
	assert!(dataset.check_totals().is_empty());
    }

    #[test]
    fn numeric_cells() {
	assert_eq!(cell_text(&Data::Float(12.0)), "12");
	assert_eq!(cell_text(&Data::Float(1.5)), "1.5");
	assert_eq!(cell_text(&Data::Int(-3)), "-3");
	assert_eq!(cell_text(&Data::String(" Aa ".to_string())), "Aa");
	assert_eq!(cell_text(&Data::Empty), "");
    }

}
