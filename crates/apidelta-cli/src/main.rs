//! `apidelta` - keep generated API tests in step with spec revisions

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

fn cli() -> Command {
    Command::new("apidelta")
        .version(apidelta_core::VERSION)
        .about("Incremental OpenAPI diffing and per-operation fragment extraction")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .value_parser(["trace", "debug", "info", "warn", "error"])
                .help("Log level (overrides RUST_LOG)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print results as JSON"),
        )
        .subcommand(
            Command::new("run")
                .about("Reconcile the latest spec revision against the previous one")
                .arg(
                    Arg::new("config")
                        .long("config")
                        .short('c')
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML pipeline config; flags override its values"),
                )
                .arg(specs_arg())
                .arg(
                    Arg::new("target")
                        .long("target")
                        .short('t')
                        .env("TARGET_FOLDER")
                        .value_parser(value_parser!(PathBuf))
                        .help("Project receiving generated tests"),
                )
                .arg(prefix_arg())
                .arg(
                    Arg::new("language")
                        .long("language")
                        .short('l')
                        .env("TARGET_LANGUAGE")
                        .value_parser(value_parser!(apidelta_core::TargetLanguage))
                        .help("Test language: javascript or typescript"),
                )
                .arg(
                    Arg::new("tests-dir")
                        .long("tests-dir")
                        .value_parser(value_parser!(PathBuf))
                        .help("Tests directory inside the target [default: tests]"),
                )
                .arg(
                    Arg::new("fragments-root")
                        .long("fragments-root")
                        .value_parser(value_parser!(PathBuf))
                        .help("Where run directories are created [default: system temp]"),
                )
                .arg(
                    Arg::new("full")
                        .long("full")
                        .action(ArgAction::SetTrue)
                        .help("Extract every operation even when a previous revision exists"),
                )
                .arg(no_context_arg())
                .arg(
                    Arg::new("llm-command")
                        .long("llm-command")
                        .env("APIDELTA_LLM_COMMAND")
                        .help("Program that reads a prompt on stdin and prints a completion"),
                )
                .arg(
                    Arg::new("llm-arg")
                        .long("llm-arg")
                        .action(ArgAction::Append)
                        .allow_hyphen_values(true)
                        .requires("llm-command")
                        .help("Argument passed to the LLM program (repeatable)"),
                )
                .arg(
                    Arg::new("llm-timeout")
                        .long("llm-timeout")
                        .default_value("300")
                        .value_parser(value_parser!(u64))
                        .help("Seconds allowed per completion"),
                ),
        )
        .subcommand(
            Command::new("diff")
                .about("Diff two spec files")
                .arg(
                    Arg::new("old")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Older revision"),
                )
                .arg(
                    Arg::new("new")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Newer revision"),
                )
                .arg(
                    Arg::new("changes")
                        .long("changes")
                        .action(ArgAction::SetTrue)
                        .help("List per-path changes instead of the summary sets"),
                ),
        )
        .subcommand(
            Command::new("extract")
                .about("Write per-operation fragments of one spec file")
                .arg(
                    Arg::new("spec")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Spec file"),
                )
                .arg(
                    Arg::new("path")
                        .long("path")
                        .short('p')
                        .action(ArgAction::Append)
                        .help("Only extract this path template (repeatable)"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Where the run directory is created [default: system temp]"),
                )
                .arg(no_context_arg()),
        )
        .subcommand(
            Command::new("latest")
                .about("Show the revisions a run would compare")
                .arg(specs_arg().required(true))
                .arg(prefix_arg()),
        )
}

fn specs_arg() -> Arg {
    Arg::new("specs")
        .long("specs")
        .short('s')
        .env("SWAGGER_FILE_PATH")
        .value_parser(value_parser!(PathBuf))
        .help("Folder of timestamped spec revisions")
}

fn prefix_arg() -> Arg {
    Arg::new("prefix")
        .long("prefix")
        .help("Spec file name prefix [default: Swagger]")
}

fn no_context_arg() -> Arg {
    Arg::new("no-context")
        .long("no-context")
        .action(ArgAction::SetTrue)
        .help("Fragments carry only paths and components")
}

fn init_tracing(matches: &ArgMatches) {
    let filter = match matches.get_one::<String>("log-level") {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let json = matches.get_flag("log-json");

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(&matches);

    let json = matches.get_flag("json");
    let outcome = match matches.subcommand() {
        Some(("run", args)) => commands::run(args, json).await,
        Some(("diff", args)) => commands::diff(args, json).await,
        Some(("extract", args)) => commands::extract(args, json).await,
        Some(("latest", args)) => commands::latest(args, json).await,
        _ => Err(anyhow::anyhow!("no subcommand given")),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "apidelta failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
