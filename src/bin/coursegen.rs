// operator tooling: migrations, one-off generation, and extractor checks
use std::io::{self, Read};

use clap::{Arg, ArgAction, ArgMatches, Command};
use dotenv::dotenv;

use coursegen::{
    config::{Config, InferenceConfig},
    extract::{self, ExtractOptions},
    generate::course::{self, CourseRequest},
    inference_client, init_tracing,
    store::Store,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_tracing();

    let matches = Command::new("coursegen")
        .subcommand(Command::new("migrate")
                        .aliases(["m", "db"])
                        .about("Apply database migrations"))
        .subcommand(Command::new("generate")
                        .aliases(["gen", "g"])
                        .about("Generate a course and print it as JSON")
                        .arg(Arg::new("title").long("title").required(true))
                        .arg(Arg::new("level").long("level").default_value("Beginner"))
                        .arg(Arg::new("duration").long("duration").default_value("4 weeks")))
        .subcommand(Command::new("extract")
                        .aliases(["x"])
                        .about("Recover JSON from a model response read on stdin")
                        .arg(Arg::new("strict")
                                .long("strict")
                                .action(ArgAction::SetTrue)
                                .help("Strip non-ASCII and repair syntax")))
        .get_matches();

    match matches.subcommand() {
        Some(("migrate", _)) => migrate().await?,
        Some(("generate", args)) => generate(args).await?,
        Some(("extract", args)) => extract_stdin(args)?,
        _ => {
            eprintln!("Invalid command, use coursegen help");
        }
    }
    Ok(())
}

async fn migrate() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let store = Store::connect(&config.database_url).await?;
    store.migrate().await?;
    println!("Migrations applied");
    Ok(())
}

async fn generate(args: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let config = InferenceConfig::from_env()?;
    let client = inference_client(&config)?;

    let request = CourseRequest {
        title: args.get_one::<String>("title").cloned(),
        audience_level: args.get_one::<String>("level").cloned(),
        duration: args.get_one::<String>("duration").cloned(),
    };
    let response = course::generate(client.as_deref(), &request).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn extract_stdin(args: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;

    let options = if args.get_flag("strict") {
        ExtractOptions::strict()
    } else {
        ExtractOptions::lenient()
    };
    match extract::extract_json(&input, &options) {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}
