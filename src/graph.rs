use std::{io,fs};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde_json::{Value,json};

use super::error::Result;
use super::header::parse_date;
use super::model::StatType;
use super::state::Scale;
use super::view::{ChartData,RenderPayload};


const CONFIRMED: [&str; 5] = ["#dc3545", "#e4606d", "#b02a37", "#ea868f", "#842029"];
const DEATHS: [&str; 5] = ["#333333", "#5c5c5c", "#1f1f1f", "#858585", "#0a0a0a"];
const RECOVERED: [&str; 5] = ["#0d6efd", "#3d8bfd", "#0a58ca", "#6ea8fe", "#084298"];


pub fn palette(stat: StatType) -> &'static [&'static str; 5] {
    match stat {
	StatType::Confirmed => &CONFIRMED,
	StatType::Deaths => &DEATHS,
	StatType::Recovered => &RECOVERED
    }
}


/// Colour hint per series: the stat's base colour for summed series, a
/// shade cycling with the region otherwise.
pub fn colors(chart: &ChartData) -> Vec<&'static str> {
    let mut regions : Vec<&str> = vec![];
    chart.datasets.iter().map(|s| {
	let shades = palette(s.stat);
	match s.region.as_deref() {
	    None => shades[0],
	    Some(region) => {
		let index = regions.iter().position(|r| *r == region).unwrap_or_else(|| {
		    regions.push(region);
		    regions.len() - 1
		});
		shades[index % shades.len()]
	    }
	}
    }).collect()
}


/// The `{labels, datasets}` document external chart widgets consume.
pub fn chart_json(payload: &RenderPayload) -> Value {
    let chart = &payload.chart;
    json!({
	"labels": chart.labels,
	"datasets": chart.datasets.iter().zip(colors(chart)).enumerate().map(
	    |(i,(s,color))| json!({
		"label": s.label,
		"data": s.data,
		"backgroundColor": color,
		"borderColor": color,
		"fill": false,
		"hidden": payload.hidden.contains(&i)
	    })).collect::<Vec<_>>(),
	"scale": payload.scale,
	"totals": payload.totals,
	"regions": payload.regions
    })
}


pub fn write_json(graph_path: &Path, path: &str, payload: &RenderPayload) -> Result<()> {
    fs::create_dir_all(graph_path)?;
    let out = io::BufWriter::new(File::create(graph_path.join(path))?);
    serde_json::to_writer_pretty(out, &chart_json(payload))?;
    Ok(())
}


pub fn chart_page(graph_path: &Path, path: &str, title: &str,
		  payload: &RenderPayload) -> Result<()> {

    fs::create_dir_all(graph_path)?;
    let mut out = io::BufWriter::new(File::create(graph_path.join(path))?);

    let chart = &payload.chart;
    let calendar = chart.labels.first().map_or(true, |label| parse_date(label).is_some());
    let log = payload.scale == Scale::Logarithmic;
    let visible : Vec<_> = chart.datasets.iter().zip(colors(chart)).enumerate()
	.filter(|(i,_)| !payload.hidden.contains(i))
	.map(|(_,sc)| sc).collect();

    write!(out, "<!DOCTYPE html><html><head>")?;
    write!(out, "<meta charset=\"UTF-8\">")?;
    write!(out, "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">")?;
    write!(out, "<title>{}</title>", title)?;
    write!(out, "<script src=\"https://cdn.jsdelivr.net/npm/vega@5\"></script>")?;
    write!(out, "<script src=\"https://cdn.jsdelivr.net/npm/vega-lite@4\"></script>")?;
    write!(out, "<script src=\"https://cdn.jsdelivr.net/npm/vega-embed\"></script>")?;
    write!(out, "</head>")?;
    write!(out, "<body>")?;
    write!(out, "<div class=\"total-stats\" style=\"position: absolute; top: 0; left: 0; right: 0; height: 2em;\">")?;
    for total in payload.totals.stats.iter() {
	write!(out, "<span style=\"color: white; background-color: {}; padding: 0 0.5em;\">{}: {} ({})</span>",
	       palette(total.stat)[0], total.stat, total.last, total.growth_label())?;
    }
    write!(out, "</div>")?;
    write!(out, "<div id=\"vis\" style=\"overflow: hidden; position: absolute;top: 2em; left: 0; right: 0; bottom: 0;\"></div>")?;
    write!(out, "<script type=\"text/javascript\">")?;
    write!(out, "var spec = ")?;

    serde_json::to_writer_pretty(out.by_ref(), &json!({
	"$schema": "https://vega.github.io/schema/vega-lite/v4.json",
	"height": "container",
	"width": "container",
	"title": title,
	"data": {
	    "values": visible.iter().flat_map(
		|(s,_)| chart.labels.iter().zip(s.data.iter()).filter_map(
		    move |(x,val)| match log && *val <= 0 {
			true => None,
			false => Some(json!({
			    "X": x,
			    "Series": s.label,
			    "Value": val
			}))
		    })
	    ).collect::<Vec<_>>()
	},
	"encoding": {
	    "color": {
		"field": "Series",
		"type": "nominal",
		"scale": {
		    "domain": visible.iter().map(|(s,_)| s.label.clone()).collect::<Vec<_>>(),
		    "range": visible.iter().map(|(_,c)| *c).collect::<Vec<_>>()
		}
	    },
	    "x": match calendar {
		true => json!({
		    "field": "X",
		    "timeUnit": "utcyearmonthdate",
		    "title": "Date",
		    "type": "temporal"
		}),
		false => json!({
		    "field": "X",
		    "title": "Days since first case",
		    "type": "quantitative"
		})
	    },
	    "y": {
		"field": "Value",
		"title": "Count",
		"scale": match log {
		    true => json!({"type": "log"}),
		    false => json!({})
		},
		"type": "quantitative"
	    }
	},
	"layer": [
	    {
		"mark": "line",
		"selection": {
		    "Highlight": {"bind":"legend","type":"multi","fields":["Series"]},
		    "Grid": {"bind":"scales","type":"interval"}
		},
		"encoding": {
		    "opacity": {"value":0.1,"condition":{"value":1,"selection":"Highlight"}}
		}
	    },
	    {
		"mark": {"type": "point", "tooltip": {"content": "data"}},
		"selection": {
		    "Hover": {
			"nearest": true,
			"empty": "none",
			"clear": "mouseout",
			"type": "single",
			"on": "mouseover",
			"fields": ["X"]
		    }
		},
		"encoding": {
		    "opacity": {
			"value": 0,
			"condition": {"value": 1, "selection": "Hover"}
		    }
		}
	    }
	]
    }))?;

    write!(out, ";vegaEmbed('#vis', spec,{{}}).then(function(result) {{")?;
    write!(out, "}}).catch(console.error);")?;
    write!(out, "</script>")?;
    write!(out, "</body></html>")?;

    Ok(())

}


#[cfg(test)]
mod tests {

    use super::*;
    use std::collections::BTreeSet;
    use crate::view::{Series,Totals};

    fn payload() -> RenderPayload {
	let series = |label: &str, stat, region: Option<&str>| Series {
	    label: label.to_string(), stat, region: region.map(String::from), data: vec![0, 1]
	};
	RenderPayload {
	    chart: ChartData {
		labels: vec!["2020-01-01".to_string(), "2020-01-02".to_string()],
		datasets: vec![
		    series("Aa (confirmed)", StatType::Confirmed, Some("Aa")),
		    series("Aa (deaths)", StatType::Deaths, Some("Aa")),
		    series("Bb (confirmed)", StatType::Confirmed, Some("Bb")),
		    series("confirmed", StatType::Confirmed, None),
		]
	    },
	    totals: Totals::default(),
	    scale: Scale::Logarithmic,
	    hidden: vec![1].into_iter().collect::<BTreeSet<_>>(),
	    regions: vec![]
	}
    }

    #[test]
    fn colors_follow_stat_and_region() {
	let colors = colors(&payload().chart);
	assert_eq!(colors, vec![CONFIRMED[0], DEATHS[0], CONFIRMED[1], CONFIRMED[0]]);
    }

    #[test]
    fn json_contract() {
	let value = chart_json(&payload());
	assert_eq!(value["labels"][1], "2020-01-02");
	assert_eq!(value["datasets"][2]["label"], "Bb (confirmed)");
	assert_eq!(value["datasets"][2]["data"], json!([0, 1]));
	assert_eq!(value["datasets"][1]["hidden"], true);
	assert_eq!(value["scale"], "logarithmic");
    }

}
