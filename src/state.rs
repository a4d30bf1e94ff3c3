use std::collections::{BTreeMap,BTreeSet};

use serde::{Serialize,Deserialize};
use percent_encoding::{AsciiSet,NON_ALPHANUMERIC,percent_decode_str,utf8_percent_encode};

use super::error::{Result,Error};
use super::model::StatType;


/// Characters `encodeURIComponent` leaves alone.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-').remove(b'_').remove(b'.').remove(b'!')
    .remove(b'~').remove(b'*').remove(b'\'').remove(b'(').remove(b')');


#[derive(Serialize,Deserialize,Clone,Copy,Debug,PartialEq,Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Name,
    Confirmed,
    Recovered,
    Deaths
}

impl SortKey {

    pub fn stat(&self) -> Option<StatType> {
	match self {
	    Self::Name => None,
	    Self::Confirmed => Some(StatType::Confirmed),
	    Self::Recovered => Some(StatType::Recovered),
	    Self::Deaths => Some(StatType::Deaths)
	}
    }

}

impl Default for SortKey {
    fn default() -> Self {
	Self::Confirmed
    }
}


#[derive(Serialize,Deserialize,Clone,Copy,Debug,PartialEq,Eq)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    Linear,
    Logarithmic
}

impl Default for Scale {
    fn default() -> Self {
	Self::Linear
    }
}


/// The user's chart options. Regions are referenced by key only.
#[derive(Clone,Debug,PartialEq,Eq)]
pub struct ViewState {
    pub selected: BTreeSet<String>,
    pub cumulative: bool,
    pub patient_zero: bool,
    pub aggregate_by_country: bool,
    pub sort: SortKey,
    pub scale: Scale,
    pub hidden: BTreeSet<usize>
}

impl Default for ViewState {
    fn default() -> Self {
	Self {
	    selected: BTreeSet::new(),
	    cumulative: true,
	    patient_zero: false,
	    aggregate_by_country: true,
	    sort: SortKey::default(),
	    scale: Scale::default(),
	    hidden: BTreeSet::new()
	}
    }
}


/// Wire form of a view state. Every field is optional so that fragments
/// written by older or newer versions still parse.
#[derive(Serialize,Deserialize)]
#[serde(rename_all = "camelCase")]
struct Fragment {
    checkboxes: Option<BTreeMap<String,bool>>,
    #[serde(alias = "cummulative")]
    cumulative: Option<bool>,
    patient_zero: Option<bool>,
    per_country: Option<bool>,
    sort: Option<SortKey>,
    scale: Option<Scale>,
    hidden_charts: Option<BTreeSet<usize>>
}


impl ViewState {

    /// Initial state with all of `keys` selected.
    pub fn new<I: IntoIterator<Item = String>>(keys: I) -> Self {
	Self { selected: keys.into_iter().collect(), ..Self::default() }
    }

    pub fn toggle_region(&mut self, key: &str) {
	if !self.selected.remove(key) {
	    self.selected.insert(key.to_string());
	}
    }

    pub fn select_all<I: IntoIterator<Item = String>>(&mut self, keys: I) {
	self.selected = keys.into_iter().collect();
    }

    pub fn select_none(&mut self) {
	self.selected.clear();
    }

    /// Patient-zero alignment is unavailable on cumulative charts.
    pub fn set_cumulative(&mut self, cumulative: bool) {
	self.cumulative = cumulative;
	if cumulative {
	    self.patient_zero = false;
	}
    }

    pub fn set_patient_zero(&mut self, patient_zero: bool) {
	self.patient_zero = patient_zero && !self.cumulative;
    }

    pub fn set_aggregate_by_country(&mut self, aggregate: bool) {
	self.aggregate_by_country = aggregate;
    }

    pub fn set_sort(&mut self, sort: SortKey) {
	self.sort = sort;
    }

    pub fn set_scale(&mut self, scale: Scale) {
	self.scale = scale;
    }

    pub fn toggle_series(&mut self, index: usize) {
	if !self.hidden.remove(&index) {
	    self.hidden.insert(index);
	}
    }

    /// Percent-encoded JSON, safe to use as a URL fragment.
    pub fn encode(&self) -> Result<String> {
	let fragment = Fragment {
	    checkboxes: Some(self.selected.iter().map(|key| (key.clone(), true)).collect()),
	    cumulative: Some(self.cumulative),
	    patient_zero: Some(self.patient_zero),
	    per_country: Some(self.aggregate_by_country),
	    sort: Some(self.sort),
	    scale: Some(self.scale),
	    hidden_charts: Some(self.hidden.clone())
	};
	let json = serde_json::to_string(&fragment)
	    .map_err(|err| Error::Serialization(err.to_string()))?;
	Ok(utf8_percent_encode(&json, COMPONENT).to_string())
    }

    /// Parses a fragment (with or without its leading `#`). Fields the
    /// fragment does not carry are taken from `fallback`.
    pub fn decode(fragment: &str, fallback: &ViewState) -> Result<ViewState> {

	let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
	if fragment.is_empty() {
	    return Err(Error::Serialization("empty fragment".to_string()));
	}

	let json = percent_decode_str(fragment).decode_utf8()
	    .map_err(|err| Error::Serialization(err.to_string()))?;
	let values : Fragment = serde_json::from_str(&json)
	    .map_err(|err| Error::Serialization(err.to_string()))?;

	Ok(ViewState {
	    selected: values.checkboxes.map_or_else(
		|| fallback.selected.clone(),
		|checkboxes| checkboxes.into_iter()
		    .filter(|(_,checked)| *checked)
		    .map(|(key,_)| key).collect()),
	    cumulative: values.cumulative.unwrap_or(fallback.cumulative),
	    patient_zero: values.patient_zero.unwrap_or(fallback.patient_zero),
	    aggregate_by_country: values.per_country.unwrap_or(fallback.aggregate_by_country),
	    sort: values.sort.unwrap_or(fallback.sort),
	    scale: values.scale.unwrap_or(fallback.scale),
	    hidden: values.hidden_charts.unwrap_or_else(|| fallback.hidden.clone())
	})

    }

    /// Applies a fragment in place. An empty fragment changes nothing; on
    /// error the state is left exactly as it was.
    pub fn restore(&mut self, fragment: &str) -> Result<()> {
	if fragment.trim_start_matches('#').is_empty() {
	    return Ok(());
	}
	*self = Self::decode(fragment, self)?;
	Ok(())
    }

}
