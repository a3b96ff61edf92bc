use crate::{
    calendar::{extract_events, sync_plan, FileCredentialProvider, GoogleCalendarClient},
    estimate, format_money, parse_budget,
    render::{export_file_stem, save_exports},
    AppState, GenerationClient, Planner, TravelError, TripRequest,
};
use anyhow::Context;
use chrono::NaiveDate;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{env, path::PathBuf, sync::Arc, time::Duration};
use tracing::{error, info};

fn model_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("model")
                .short('m')
                .long("model")
                .value_name("MODEL")
                .help("Model to use (or set TRIP_PLANNER_MODEL)"),
        )
        .arg(
            Arg::new("api-key")
                .short('k')
                .long("api-key")
                .value_name("KEY")
                .help("API key (or set OPENAI_API_KEY env var)"),
        )
        .arg(
            Arg::new("base-url")
                .short('u')
                .long("base-url")
                .value_name("URL")
                .help("Base URL (or set OPENAI_BASE_URL / OPENROUTER_BASE_URL env vars)"),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECONDS")
                .help("Per-request timeout in seconds")
                .default_value("120"),
        )
}

fn budget_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("start")
                .long("start")
                .value_name("YYYY-MM-DD")
                .help("First day of the trip")
                .required(true),
        )
        .arg(
            Arg::new("end")
                .long("end")
                .value_name("YYYY-MM-DD")
                .help("Last day of the trip (inclusive)")
                .required(true),
        )
        .arg(
            Arg::new("budget")
                .short('b')
                .long("budget")
                .value_name("AMOUNT")
                .help("Daily budget per traveler, e.g. 1,000")
                .required(true),
        )
        .arg(
            Arg::new("travelers")
                .short('n')
                .long("travelers")
                .value_name("COUNT")
                .default_value("1"),
        )
}

fn command() -> Command {
    Command::new("trip-planner")
        .version("0.1.0")
        .about("Generate travel itineraries with a hosted LLM and export them as text and PDF")
        .subcommand_required(true)
        .subcommand(model_args(budget_args(
            Command::new("plan")
                .about("Generate a full travel plan")
                .arg(
                    Arg::new("from")
                        .long("from")
                        .value_name("CITY")
                        .help("Starting location")
                        .required(true),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .value_name("CITY")
                        .help("Destination, repeat for multi-city routes (up to 5)")
                        .action(ArgAction::Append)
                        .required(true),
                )
                .arg(
                    Arg::new("return")
                        .long("return")
                        .value_name("CITY")
                        .help("Return city (defaults to the starting location)"),
                )
                .arg(
                    Arg::new("interest")
                        .short('i')
                        .long("interest")
                        .value_name("INTEREST")
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("style")
                        .short('s')
                        .long("style")
                        .value_name("STYLE")
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("language")
                        .short('l')
                        .long("language")
                        .default_value("English"),
                )
                .arg(
                    Arg::new("out-dir")
                        .short('o')
                        .long("out-dir")
                        .value_name("DIR")
                        .default_value("."),
                )
                .arg(
                    Arg::new("extended")
                        .long("extended")
                        .help("Also generate transportation, customs, safety and packing sections")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the generated plan and session history as JSON")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("calendar")
                        .long("calendar")
                        .help("Post itinerary events to Google Calendar")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("calendar-id")
                        .long("calendar-id")
                        .value_name("ID")
                        .help("Calendar to post to (or set GOOGLE_CALENDAR_ID)"),
                )
                .arg(
                    Arg::new("timezone")
                        .long("timezone")
                        .value_name("TZ")
                        .default_value("UTC"),
                ),
        )))
        .subcommand(budget_args(
            Command::new("budget").about("Show the deterministic budget breakdown"),
        ))
        .subcommand(model_args(
            Command::new("chat").about("Ask the travel assistant a question").arg(
                Arg::new("question")
                    .help("The question to ask")
                    .required(true)
                    .index(1),
            ),
        ))
        .subcommand(
            Command::new("render")
                .about("Render a saved text plan to PDF")
                .arg(Arg::new("file").required(true).index(1))
                .arg(
                    Arg::new("destination")
                        .short('d')
                        .long("destination")
                        .help("Destination summary for the page header")
                        .default_value("My Trip"),
                )
                .arg(Arg::new("out").short('o').long("out").value_name("FILE")),
        )
}

/// CLI entry point for the trip planner
pub async fn run() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let matches = command().get_matches();
    let mut state = AppState::new();

    let outcome = match matches.subcommand() {
        Some(("plan", args)) => run_plan(&mut state, args).await,
        Some(("budget", args)) => run_budget(args),
        Some(("chat", args)) => run_chat(&mut state, args).await,
        Some(("render", args)) => run_render(args),
        _ => Ok(()),
    };

    if let Err(err) = &outcome {
        if let Some(travel) = err.downcast_ref::<TravelError>() {
            error!(code = travel.error_code(), "{}", travel);
            eprintln!("{}", travel.user_message());
            std::process::exit(1);
        }
    }
    outcome
}

fn arg<'a>(args: &'a ArgMatches, name: &str) -> Option<&'a str> {
    args.get_one::<String>(name).map(|s| s.as_str())
}

fn list(args: &ArgMatches, name: &str) -> Vec<String> {
    args.get_many::<String>(name)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

fn parse_date(args: &ArgMatches, name: &str) -> Result<NaiveDate, TravelError> {
    let raw = arg(args, name).unwrap_or_default();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        TravelError::InvalidParameter(format!("--{} must be a date like 2025-05-01", name))
    })
}

fn parse_count(args: &ArgMatches, name: &str) -> Result<u32, TravelError> {
    arg(args, name)
        .unwrap_or("1")
        .parse()
        .map_err(|_| TravelError::InvalidParameter(format!("--{} must be a whole number", name)))
}

fn build_planner(args: &ArgMatches) -> anyhow::Result<Planner> {
    let api_key = arg(args, "api-key")
        .map(str::to_string)
        .or_else(|| env::var("OPENAI_API_KEY").ok())
        .ok_or_else(|| {
            TravelError::Config(
                "API key is required. Set OPENAI_API_KEY environment variable or use --api-key"
                    .to_string(),
            )
        })?;

    let mut client = GenerationClient::new(api_key);
    if let Some(base_url) = arg(args, "base-url")
        .map(str::to_string)
        .or_else(|| env::var("OPENAI_BASE_URL").ok())
        .or_else(|| env::var("OPENROUTER_BASE_URL").ok())
    {
        client.set_base_url(base_url);
    }
    if let Some(model) = arg(args, "model")
        .map(str::to_string)
        .or_else(|| env::var("TRIP_PLANNER_MODEL").ok())
    {
        client.set_model(model);
    }

    let timeout_seconds: u64 = arg(args, "timeout")
        .unwrap_or("120")
        .parse()
        .context("--timeout must be a number of seconds")?;
    let timeout = Duration::from_secs(timeout_seconds);
    client.set_timeout(timeout);

    info!("Using model: {}", client.model());
    info!("Base URL: {}", client.base_url());

    Ok(Planner::new(Arc::new(client)).with_timeout(timeout))
}

async fn run_plan(state: &mut AppState, args: &ArgMatches) -> anyhow::Result<()> {
    let starting_location = arg(args, "from").unwrap_or_default().to_string();
    let trip = TripRequest {
        return_city: arg(args, "return")
            .map(str::to_string)
            .unwrap_or_else(|| starting_location.clone()),
        starting_location,
        destinations: list(args, "to"),
        start_date: parse_date(args, "start")?,
        end_date: parse_date(args, "end")?,
        daily_budget_per_person: parse_budget(arg(args, "budget").unwrap_or_default())?,
        traveler_count: parse_count(args, "travelers")?,
        interests: list(args, "interest"),
        travel_styles: list(args, "style"),
        language: arg(args, "language").unwrap_or("English").to_string(),
    };
    trip.validate()?;

    let mut planner = build_planner(args)?;
    if args.get_flag("extended") {
        planner = planner.with_extended_sections();
    }

    info!("Generating plan for {}", trip.route());
    let plan = planner.generate_plan(state, &trip).await?;

    let out_dir = PathBuf::from(arg(args, "out-dir").unwrap_or("."));
    let paths = save_exports(
        &out_dir,
        &export_file_stem(&trip),
        &plan.plan_text,
        &plan.destination_summary,
    )?;

    if args.get_flag("json") {
        let payload = serde_json::json!({
            "plan": plan,
            "history": state.history(),
            "statistics": state.statistics(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("{}\n", plan.plan_text);
        println!("{}", plan.summary());
        println!("\nSaved {} and {}", paths.text.display(), paths.pdf.display());
    }

    if args.get_flag("calendar") {
        let timezone = arg(args, "timezone").unwrap_or("UTC");
        let events = extract_events(&plan.plan_text, &trip, timezone);
        let calendar_id = arg(args, "calendar-id")
            .map(str::to_string)
            .or_else(|| env::var("GOOGLE_CALENDAR_ID").ok())
            .unwrap_or_else(|| "primary".to_string());
        let client = GoogleCalendarClient::new(Arc::new(FileCredentialProvider::from_env()))
            .with_calendar_id(calendar_id);

        // Calendar problems are reported but never undo the generated plan.
        let report = sync_plan(&client, &events).await;
        println!(
            "\nCalendar: {} of {} events created",
            report.created,
            events.len()
        );
        for (title, err) in &report.failures {
            eprintln!("  {}: {}", title, err.user_message());
        }
    }

    Ok(())
}

fn run_budget(args: &ArgMatches) -> anyhow::Result<()> {
    let start = parse_date(args, "start")?;
    let end = parse_date(args, "end")?;
    if end < start {
        return Err(TravelError::InvalidParameter(
            "End date is before start date".to_string(),
        )
        .into());
    }
    let days = ((end - start).num_days() + 1) as u32;
    let budget = estimate(
        days,
        parse_budget(arg(args, "budget").unwrap_or_default())?,
        parse_count(args, "travelers")?,
    )?;

    println!(
        "{} days, {} travelers",
        budget.duration_days, budget.traveler_count
    );
    println!("{:<16}{:>14}{:>14}", "Category", "Per person", "Group");
    for ((name, per_person), (_, group)) in budget
        .per_person_daily
        .entries()
        .into_iter()
        .zip(budget.total_breakdown.entries())
    {
        println!(
            "{:<16}{:>14}{:>14}",
            name,
            format_money(per_person),
            format_money(group)
        );
    }
    println!(
        "\nDaily total for group: {}",
        format_money(budget.daily_total_for_group)
    );
    println!("Trip estimate: {}", format_money(budget.total_estimate));
    Ok(())
}

async fn run_chat(state: &mut AppState, args: &ArgMatches) -> anyhow::Result<()> {
    let planner = build_planner(args)?;
    let question = arg(args, "question").unwrap_or_default();
    let answer = planner.ask(state, question).await?;
    println!("{}", answer);
    Ok(())
}

fn run_render(args: &ArgMatches) -> anyhow::Result<()> {
    let file = PathBuf::from(arg(args, "file").unwrap_or_default());
    let plan_text = std::fs::read_to_string(&file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let destination = arg(args, "destination").unwrap_or("My Trip");

    let out = arg(args, "out")
        .map(PathBuf::from)
        .unwrap_or_else(|| file.with_extension("pdf"));
    let bytes = crate::render::pdf_export(&plan_text, destination)?;
    std::fs::write(&out, bytes).with_context(|| format!("failed to write {}", out.display()))?;
    println!("Saved {}", out.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_definition_is_valid() {
        command().debug_assert();
    }

    #[test]
    fn test_plan_arguments_parse() {
        let matches = command().get_matches_from([
            "trip-planner",
            "plan",
            "--from",
            "Berlin",
            "--to",
            "Rome",
            "--to",
            "Florence",
            "--start",
            "2025-05-01",
            "--end",
            "2025-05-04",
            "--budget",
            "1,200",
            "-n",
            "2",
        ]);
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "plan");
        assert_eq!(list(args, "to"), vec!["Rome", "Florence"]);
        assert_eq!(parse_count(args, "travelers").unwrap(), 2);
        assert_eq!(
            parse_date(args, "start").unwrap(),
            NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()
        );
    }

    #[test]
    fn test_bad_date_is_invalid_parameter() {
        let matches = command().get_matches_from([
            "trip-planner",
            "budget",
            "--start",
            "05/01/2025",
            "--end",
            "2025-05-04",
            "--budget",
            "100",
        ]);
        let (_, args) = matches.subcommand().unwrap();
        assert!(matches!(
            parse_date(args, "start"),
            Err(TravelError::InvalidParameter(_))
        ));
    }
}
