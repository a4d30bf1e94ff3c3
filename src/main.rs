use std::{io,fs};
use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser,ValueEnum};

use covid19_regions::{csse,ecdc,fill,graph,view};
use covid19_regions::{Result,Error,Dataset,ViewState};


#[derive(Clone,Copy,Debug,ValueEnum)]
enum Source {
    Csse,
    Ecdc
}

#[derive(Parser)]
#[command(name = "covid19-regions", version,
	  about = "Normalizes per-region COVID-19 counts and renders chart views")]
struct Cli {
    /// Data source to load
    #[arg(long, value_enum, default_value = "csse")]
    source: Source,
    /// Download cache directory
    #[arg(long, default_value = "cache")]
    cache: PathBuf,
    /// Output directory for the dataset, chart page and chart payload
    #[arg(long, default_value = "graphs")]
    out: PathBuf,
    /// Local snapshot to read instead of downloading (CSSE: directory, ECDC: xlsx file)
    #[arg(long)]
    input: Option<PathBuf>,
    /// Carry values forward into days a region did not report
    #[arg(long)]
    fill_gaps: bool,
    /// View state fragment, as printed by a previous run
    #[arg(long)]
    state: Option<String>,
    /// Minutes a cached download stays fresh
    #[arg(long, default_value_t = 30)]
    max_age: u64,
}


fn main() {

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if let Err(err) = run(&cli) {
	eprintln!("Error: {:?} source: {}", cli.source, err);
	std::process::exit(1);
    }

}


fn run(cli: &Cli) -> Result<()> {

    let max_age = Duration::from_secs(cli.max_age * 60);

    let mut dataset = match (cli.source, &cli.input) {
	(Source::Csse,Some(dir)) => csse::load_dir(dir)?,
	(Source::Csse,None) => csse::load(&cli.cache, max_age)?,
	(Source::Ecdc,Some(file)) => ecdc::load_file(file)?,
	(Source::Ecdc,None) => ecdc::load(&cli.cache, max_age)?,
    };

    if dataset.total.is_empty() {
	return Err(Error::MissingData);
    }

    if cli.fill_gaps {
	let n = fill::fill_gaps(&mut dataset);
	log::info!("filled {} missing days", n);
    }

    let mismatched = dataset.check_totals();
    if !mismatched.is_empty() {
	log::warn!("totals disagree with regions on {} dates", mismatched.len());
    }

    let by_country = dataset.by_country();
    let mut state = ViewState::new(by_country.regions.keys().cloned());
    if let Some(fragment) = &cli.state {
	if let Err(err) = state.restore(fragment) {
	    log::warn!("keeping default view: {}", err);
	}
    }

    let payload = view::update(&dataset.regions, &by_country.regions, &state);

    fs::create_dir_all(&cli.out)?;
    serde_json::to_writer(io::BufWriter::new(File::create(cli.out.join("dataset.json"))?),
			  &dataset)?;
    graph::write_json(&cli.out, "chart.json", &payload)?;
    graph::chart_page(&cli.out, "chart.html", &title(&dataset, &state), &payload)?;

    log::info!("{} regions, {} countries, {} series",
	       dataset.regions.len(), by_country.regions.len(), payload.chart.datasets.len());
    println!("#{}", state.encode()?);

    Ok(())

}


fn title(dataset: &Dataset, state: &ViewState) -> String {
    let view = match (state.cumulative, state.patient_zero) {
	(true,_) => "Total COVID-19 cases",
	(false,true) => "COVID-19 cases since the first confirmed case",
	(false,false) => "COVID-19 cases",
    };
    let level = match state.aggregate_by_country {
	true => "country",
	false => "region",
    };
    format!("{} by {} ({}, {})", view, level, dataset.source.name,
	    dataset.date.format("%Y-%m-%d %H:%M UTC"))
}
