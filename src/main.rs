mod api;
mod model;
mod normalizer;
mod output;
mod pipeline;
mod session;
mod settings;
mod suggest;

use std::time::Instant;

use anyhow::{Result, bail};
use chrono::{Days, Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use api::FlightApi;
use model::{CabinClass, FlightParams, SearchCriteria, SortKey, StopFilter};
use session::{SearchSession, SearchStatus, can_search};
use settings::Settings;
use suggest::SuggestGate;

#[derive(Parser, Debug)]
#[command(author, version, about = "Flight search against the sky-scrapper API", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Look up airport suggestions for a free-text query
    Airports { query: String },

    /// Search flights and print the filtered, sorted itineraries
    Search(SearchArgs),

    /// Manage the stored RapidAPI key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
}

#[derive(clap::Args, Debug)]
struct SearchArgs {
    /// Origin city or airport, free text resolved through autocomplete
    #[arg(short, long)]
    from: String,

    /// Destination city or airport
    #[arg(short, long)]
    to: String,

    /// Departure date (YYYY-MM-DD); defaults to tomorrow
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Return date (YYYY-MM-DD); defaults to three days after departure
    #[arg(long)]
    return_date: Option<NaiveDate>,

    /// One-way trip, no return leg
    #[arg(long)]
    one_way: bool,

    #[arg(long, default_value_t = 1)]
    adults: u32,

    #[arg(long, value_enum, default_value_t = CabinClass::Economy)]
    cabin: CabinClass,

    /// Sort key, forwarded to the server and applied client-side
    #[arg(long, value_enum, default_value_t = SortKey::Best)]
    sort: SortKey,

    #[arg(long, default_value = "USD")]
    currency: String,

    /// Stop filter applied client-side
    #[arg(long, value_enum, default_value_t = StopFilter::Any)]
    stops: StopFilter,

    /// Keep only these airlines (repeatable)
    #[arg(long = "airline")]
    airlines: Vec<String>,

    #[arg(short, long, default_value = "stdout")]
    output: String,
}

#[derive(Subcommand, Debug)]
enum KeyAction {
    /// Store the key in the config directory
    Set { key: String },
    /// Remove the stored key
    Clear,
    /// Show whether a key is configured
    Show,
}

const NO_FLIGHTS: &str = "No flights found for those dates.";
const MISSING_KEY: &str = "No API key configured. Run `farefinder key set <KEY>` first.";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    match args.command {
        Command::Key { action } => run_key(action),
        Command::Airports { query } => run_airports(&query).await,
        Command::Search(search) => run_search(search).await,
    }
}

fn run_key(action: KeyAction) -> Result<()> {
    match action {
        KeyAction::Set { key } => {
            let path = settings::store_key(&key)?;
            println!("Key stored in {}", path.display());
        }
        KeyAction::Clear => {
            settings::clear_key()?;
            println!("Key cleared.");
        }
        KeyAction::Show => match Settings::load().api_key {
            Some(key) => {
                let prefix: String = key.chars().take(4).collect();
                println!("{prefix}… ({} chars)", key.chars().count());
            }
            None => println!("No key configured."),
        },
    }
    Ok(())
}

async fn run_airports(query: &str) -> Result<()> {
    let Some(api_key) = Settings::load().api_key else {
        bail!(MISSING_KEY);
    };
    let api = FlightApi::new(api_key);

    let mut gate = SuggestGate::new();
    gate.input(query, Instant::now());
    // the query is already final here, so skip ahead to the end of the
    // quiescence window; interactive callers poll with the real clock
    let due = gate.ready_in(Instant::now()).unwrap_or_default();
    let Some(lookup) = gate.poll(Instant::now() + due) else {
        println!("Type at least {} characters.", api::MIN_QUERY_LEN);
        return Ok(());
    };
    let options = api.search_airports(&lookup.query).await?;
    gate.accept(lookup.generation, options);

    if gate.options().is_empty() {
        println!("No airports matched \"{query}\".");
        return Ok(());
    }
    for airport in gate.options() {
        let ids = airport
            .flight_params()
            .map(|p| format!("{} / {}", p.sky_id, p.entity_id))
            .unwrap_or_else(|| "-".to_string());
        println!("{:<30} {:<44} {ids}", airport.title(), airport.subtitle());
    }
    Ok(())
}

async fn run_search(args: SearchArgs) -> Result<()> {
    let settings = Settings::load();
    let Some(api_key) = settings.api_key.clone() else {
        bail!(MISSING_KEY);
    };
    let api = FlightApi::new(api_key);

    let date = args.date.unwrap_or_else(default_depart);
    let return_date = (!args.one_way).then(|| args.return_date.unwrap_or(date + Days::new(3)));

    let origin = resolve_airport(&api, &args.from).await?;
    let destination = resolve_airport(&api, &args.to).await?;

    let criteria = SearchCriteria {
        origin: Some(origin),
        destination: Some(destination),
        date: Some(date),
        return_date,
        one_way: args.one_way,
        adults: args.adults,
        cabin: args.cabin,
        sort_by: args.sort,
        currency: args.currency.clone(),
        ..Default::default()
    };
    if !can_search(&criteria, settings.has_key()) {
        bail!("incomplete search criteria");
    }

    let mut session = SearchSession::new();
    session.set_stop_filter(args.stops);
    for airline in &args.airlines {
        session.toggle_airline(airline);
    }
    session.set_sort(args.sort);

    let generation = session.begin_search();
    let outcome = api
        .search_flights(&criteria)
        .await
        .map_err(|e| e.to_string());
    session.complete_search(generation, outcome);

    if let SearchStatus::Failed(message) = session.status() {
        bail!("{message}");
    }
    if session.results().is_empty() {
        println!("{NO_FLIGHTS}");
        return Ok(());
    }

    let view = session.view();
    let airlines = session.airlines();
    info!(total = session.results().len(), shown = view.len(), "search complete");

    let mut writer = output::create_writer(&args.output, &args.currency)?;
    writer.write_batch(&view)?;
    writer.finish()?;

    if matches!(args.output.as_str(), "stdout" | "table") {
        eprintln!(
            "{} of {} itineraries · airlines: {}",
            view.len(),
            session.results().len(),
            if airlines.is_empty() {
                "-".to_string()
            } else {
                airlines.join(", ")
            }
        );
    }
    Ok(())
}

/// First suggestion wins, like picking the top autocomplete entry.
async fn resolve_airport(api: &FlightApi, query: &str) -> Result<FlightParams> {
    let options = api.search_airports(query).await?;
    let Some(first) = options.first() else {
        bail!("No airport matches \"{query}\"");
    };
    let Some(params) = first.flight_params() else {
        bail!("Airport \"{}\" is missing flight parameters", first.title());
    };
    info!(query, picked = first.title(), "resolved airport");
    Ok(params)
}

/// Tomorrow; the matching return default is three days after departure.
fn default_depart() -> NaiveDate {
    Local::now().date_naive() + Days::new(1)
}
