use chrono::Datelike;
use chrono::naive::NaiveDate;


/// Date layouts seen in source headers, most specific first: `%y` must be
/// tried before `%Y` or `1/22/20` would be read as the year 20.
const DATE_FORMATS: [&str; 4] = ["%m/%d/%y", "%m/%d/%Y", "%Y-%m-%d", "%Y/%m/%d"];


#[derive(Clone,Debug,PartialEq,Eq)]
pub enum Column {
    Meta(String),
    Date(NaiveDate)
}

impl Column {

    pub fn name(&self) -> String {
	match self {
	    Self::Meta(name) => name.clone(),
	    Self::Date(date) => format!("{}", date.format("%Y-%m-%d")),
	}
    }

}


pub fn parse_date(field: &str) -> Option<NaiveDate> {
    let field = field.trim();
    DATE_FORMATS.iter()
	.find_map(|fmt| NaiveDate::parse_from_str(field, fmt).ok())
	.filter(|date| (1900..=2100).contains(&date.year()))
}


/// Header cells that read as a calendar day become date columns, anything
/// else is kept as a metadata column under its original name.
pub fn classify(header: &[String]) -> Vec<Column> {
    header.iter().map(|field| match parse_date(field) {
	Some(date) => Column::Date(date),
	None => Column::Meta(field.trim().to_string()),
    }).collect()
}
