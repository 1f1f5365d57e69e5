use clap::{crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};
use folio::build::{build_site, describe_plan, Result};
use folio::config::Config;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::path::Path;

fn main() {
    let project = Arg::with_name("project")
        .value_name("DIR")
        .default_value(".")
        .help("The project directory, or any directory below it");

    let matches = App::new("folio")
        .version(crate_version!())
        .about("Builds a static blog from a directory of markdown posts")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .global(true)
                .help("Log every file read and written"),
        )
        .subcommand(
            SubCommand::with_name("build")
                .about("Builds the site")
                .arg(project.clone())
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .value_name("DIR")
                        .default_value("_site")
                        .help("The directory to write the site to"),
                ),
        )
        .subcommand(
            SubCommand::with_name("plan")
                .about("Prints every planned route without writing anything")
                .arg(project),
        )
        .get_matches();

    let level = match matches.is_present("verbose") {
        true => LevelFilter::Debug,
        false => LevelFilter::Info,
    };
    if let Err(err) = SimpleLogger::new().with_level(level).init() {
        eprintln!("failed to initialize logging: {}", err);
    }

    if let Err(err) = run(&matches) {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        ("build", Some(matches)) => {
            let config = load_config(matches, matches.value_of("output").unwrap_or("_site"))?;
            build_site(&config)
        }
        ("plan", Some(matches)) => {
            let config = load_config(matches, "_site")?;
            describe_plan(&config, std::io::stdout())
        }
        _ => Ok(()),
    }
}

fn load_config(matches: &ArgMatches, output: &str) -> Result<Config> {
    let project = std::fs::canonicalize(matches.value_of("project").unwrap_or("."))?;
    Ok(Config::from_directory(&project, Path::new(output))?)
}
