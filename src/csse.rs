use std::fs;
use std::path::Path;
use std::time::Duration;

use super::error::{Result,Error};
use super::model::{StatType,Dataset,Provenance};
use super::merge::Merger;
use super::table;


const BASE_URL: &str = "https://raw.githubusercontent.com/CSSEGISandData/COVID-19\
			/master/csse_covid_19_data/csse_covid_19_time_series";

/// Time-series files, in merge order.
pub const FILES: [(StatType,&str); 3] = [
    (StatType::Confirmed, "time_series_covid19_confirmed_global.csv"),
    (StatType::Deaths, "time_series_covid19_deaths_global.csv"),
    (StatType::Recovered, "time_series_covid19_recovered_global.csv"),
];


pub fn source() -> Provenance {
    Provenance {
	name: "John Hopkins' COVID-19 dataset".to_string(),
	link: "https://github.com/CSSEGISandData/COVID-19".to_string()
    }
}


/// Downloads the time series, re-using cached copies younger than `max_age`.
pub fn load(cache_path: &Path, max_age: Duration) -> Result<Dataset> {
    build(|file| cached(cache_path, file, max_age))
}


/// Reads the time series from a local snapshot directory.
pub fn load_dir(dir: &Path) -> Result<Dataset> {
    build(|file| Ok(fs::read(dir.join(file))?))
}


/// Parses and merges the three files; the first failure aborts the batch.
pub fn build<F>(mut read: F) -> Result<Dataset>
where F: FnMut(&str) -> Result<Vec<u8>> {
    let mut merger = Merger::new();
    for (stat,file) in FILES.iter() {
	let bytes = read(file)?;
	let parsed = table::parse_csv(file, &table::decode(&bytes))?;
	log::info!("{}: {} rows, {} columns", file, parsed.records.len(), parsed.columns.len());
	merger.merge(*stat, &parsed.records);
    }
    Ok(merger.finish(source()))
}


fn cached(cache_path: &Path, file: &str, max_age: Duration) -> Result<Vec<u8>> {

    let cache_path = cache_path.join("csse");
    let cache_file = cache_path.join(file);

    if cache_file.exists() && fs::metadata(&cache_file)?.modified()?.elapsed()? < max_age {
	log::info!("Using cached {}", cache_file.display());
	return Ok(fs::read(&cache_file)?);
    }

    let data = download(file)?;
    fs::create_dir_all(&cache_path)?;
    fs::write(&cache_file, &data)?;
    Ok(data)

}


fn download(file: &str) -> Result<Vec<u8>> {
    log::info!("Downloading {}...", file);
    let res = reqwest::blocking::get(&format!("{}/{}", BASE_URL, file))?;
    match res.status().as_u16() {
	200 => Ok(res.bytes()?.to_vec()),
	_ => Err(Error::HttpError(res.status())),
    }
}


#[cfg(test)]
mod tests {

    use super::*;
    use crate::model::tests::stat;

    fn snapshot(file: &str) -> Result<Vec<u8>> {
	let text = match file {
	    "time_series_covid19_confirmed_global.csv" => "\
Province/State,Country/Region,Lat,Long,1/1/20,1/2/20
,Aa,1.0,2.0,1,2
Y,Bb,3.0,4.0,,5
",
	    "time_series_covid19_deaths_global.csv" => "\
Province/State,Country/Region,Lat,Long,1/1/20,1/2/20
,Aa,9.0,9.0,0,1
Y,Bb,3.0,4.0,,0
",
	    _ => "\u{feff}Province/State,Country/Region,Lat,Long,1/1/20,1/2/20\n,Aa,1.0,2.0,0,-1\n",
	};
	Ok(text.as_bytes().to_vec())
    }

    #[test]
    fn merges_the_three_files() {
	let dataset = build(snapshot).unwrap();
	assert_eq!(dataset.source, source());
	assert_eq!(dataset.regions.keys().collect::<Vec<_>>(), vec!["Aa", "Bb, Y"]);
	let aa = &dataset.regions["Aa"];
	assert_eq!((aa.lat, aa.long), (1.0, 2.0));
	assert_eq!(aa.dates, vec![stat(1, 1, 0, 0), stat(2, 2, 1, -1)]);
	assert_eq!(dataset.regions["Bb, Y"].dates, vec![stat(2, 5, 0, 0)]);
	assert_eq!(dataset.total, vec![stat(1, 1, 0, 0), stat(2, 7, 1, -1)]);
    }

    #[test]
    fn one_bad_file_aborts() {
	let result = build(|file| match file {
	    "time_series_covid19_deaths_global.csv" => Ok(b"\n".to_vec()),
	    file => snapshot(file),
	});
	assert!(matches!(result, Err(Error::MalformedSource(_))));
    }

}
