use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::naive::NaiveDate;
use encoding_rs::UTF_8;
use encoding_rs::mem::decode_latin1;

use super::error::{Result,Error};
use super::header::{self,Column};


/// One data row: metadata cells by column name, counts by date.
#[derive(Clone,Debug,Default,PartialEq)]
pub struct Record {
    pub fields: BTreeMap<String,String>,
    pub dates: BTreeMap<NaiveDate,i64>
}

impl Record {

    /// Value of the first of `names` present in the row, or "".
    pub fn field(&self, names: &[&str]) -> &str {
	names.iter().find_map(|name| self.fields.get(*name))
	    .map_or("", |v| v.as_str())
    }

}


#[derive(Clone,Debug,PartialEq)]
pub struct Table {
    pub columns: Vec<Column>,
    pub records: Vec<Record>
}


/// Source bytes as text: UTF-8 without BOM, Latin-1 when not valid UTF-8.
pub fn decode(bytes: &[u8]) -> Cow<'_, str> {
    match UTF_8.decode_with_bom_removal(bytes) {
	(text,false) => text,
	(_,true) => decode_latin1(bytes),
    }
}


pub fn parse_csv(name: &str, text: &str) -> Result<Table> {
    let rows = csv::ReaderBuilder::new()
	.has_headers(false)
	.flexible(true)
	.from_reader(text.as_bytes())
	.into_records()
	.map(|row| row.map(|row| row.iter().map(String::from).collect())
	     .map_err(|err| Error::MalformedSource(format!("{}: {}", name, err))))
	.collect::<Result<Vec<Vec<String>>>>()?;
    from_rows(name, rows)
}


/// Tabulates a spreadsheet cell grid, already rendered as text.
pub fn from_grid(name: &str, grid: Vec<Vec<String>>) -> Result<Table> {
    from_rows(name, grid)
}


fn from_rows(name: &str, rows: Vec<Vec<String>>) -> Result<Table> {

    let mut rows = rows.into_iter()
	.map(|row| row.iter().map(|v| v.trim().to_string()).collect::<Vec<_>>())
	.filter(|row| row.iter().any(|v| !v.is_empty()));

    let columns = header::classify(&rows.next().ok_or_else(
	|| Error::MalformedSource(format!("{}: missing header row", name)))?);

    let records = rows.enumerate().map(|(i,mut row)| {
	if row.len() > columns.len() {
	    log::debug!("{}: row {} has {} cells, truncating to {}",
			name, i + 2, row.len(), columns.len());
	    row.truncate(columns.len());
	}
	row.into_iter().zip(columns.iter()).fold(
	    Record::default(), |mut record,(value,column)| {
		match column {
		    Column::Meta(field) => {
			record.fields.insert(field.clone(), value);
		    },
		    Column::Date(date) => if let Some(count) = parse_count(&value) {
			record.dates.insert(*date, count);
		    } else if !value.is_empty() {
			log::warn!("{}: row {}: ignoring non-numeric count {:?} on {}",
				   name, i + 2, value, date);
		    }
		}
		record
	    })
    }).collect();

    Ok(Table { columns, records })

}


pub(crate) fn parse_count(value: &str) -> Option<i64> {
    value.parse().ok().or_else(
	|| value.parse::<f64>().ok()
	    .filter(|v| v.is_finite())
	    .map(|v| v.round() as i64))
}
