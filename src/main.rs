mod debug_report;

use aimlet::{CategoryIndex, Interpreter, Options, Predicates};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::io::{self, BufRead, IsTerminal};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "AIMLET_LOG";

fn main() {
    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    init_logging();

    let options = Options::default();
    let store = match load_store(&config.aiml, &options) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let rng = match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let topic = config.topic.clone().unwrap_or_else(|| options.default_topic.clone());
    let mut bot = Interpreter::with_rng(store, rng, options);

    if config.trace {
        debug_report::print_loaded(&config.aiml, bot.topic_count(), bot.category_count(), config.color);
    }

    if let Err(err) = converse(&mut bot, &topic, &config) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

struct CliConfig {
    aiml: String,
    seed: Option<u64>,
    topic: Option<String>,
    trace: bool,
    color: bool,
}

fn converse(bot: &mut Interpreter<CategoryIndex>, default_topic: &str, config: &CliConfig) -> io::Result<()> {
    let mut predicates = Predicates::new();
    let mut that = String::new();

    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        // A template may switch topics by setting the "topic" predicate.
        let topic = predicates.get("topic").unwrap_or(default_topic).to_string();

        if config.trace {
            let details = bot.match_verbose(&line, &topic, &that);
            debug_report::print_match(&line, &details, config.color);
        }

        match bot.respond(&line, &topic, &that, &mut predicates) {
            Ok(reply) => {
                println!("{}", reply.text);
                that = reply.text;
            }
            Err(err) => eprintln!("error: {err}"),
        }
    }
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn load_store(path: &str, options: &Options) -> Result<CategoryIndex, String> {
    let xml = std::fs::read_to_string(path).map_err(|err| format!("error: failed to read '{path}': {err}"))?;
    CategoryIndex::from_aiml(&xml, options).map_err(|err| format!("error: failed to load '{path}': {err}"))
}

fn parse_args() -> Result<CliConfig, String> {
    let mut aiml: Option<String> = None;
    let mut seed: Option<u64> = None;
    let mut topic: Option<String> = None;
    let mut trace = false;
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("aimlet {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--trace" => trace = true,
            "--aiml" | "-a" => {
                let value = args.next().ok_or_else(|| "error: --aiml expects a value".to_string())?;
                aiml = Some(value);
            }
            "--seed" => {
                let value = args.next().ok_or_else(|| "error: --seed expects a value".to_string())?;
                seed = Some(parse_seed(&value)?);
            }
            "--topic" => {
                let value = args.next().ok_or_else(|| "error: --topic expects a value".to_string())?;
                topic = Some(value);
            }
            _ if arg.starts_with("--aiml=") => aiml = Some(arg.trim_start_matches("--aiml=").to_string()),
            _ if arg.starts_with("--seed=") => seed = Some(parse_seed(arg.trim_start_matches("--seed="))?),
            _ if arg.starts_with("--topic=") => topic = Some(arg.trim_start_matches("--topic=").to_string()),
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                if aiml.is_some() {
                    return Err("error: aiml file provided multiple times".to_string());
                }
                aiml = Some(arg);
            }
        }
    }

    let aiml = aiml.ok_or_else(|| format!("error: no aiml file provided\n\n{}", help_text()))?;
    Ok(CliConfig { aiml, seed, topic, trace, color })
}

fn parse_seed(value: &str) -> Result<u64, String> {
    value.parse().map_err(|_| format!("error: invalid --seed '{value}' (expected an unsigned integer)"))
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "aimlet {version}

AIML-style pattern interpreter. Reads one message per stdin line and prints
one reply per line.

Usage:
  aimlet [OPTIONS] --aiml <file>
  aimlet [OPTIONS] <file>

Options:
  -a, --aiml <file>          AIML document to load.
  --seed <n>                 Seed for <random> choices (default: from entropy).
  --topic <name>             Topic used until a rule sets the \"topic\" predicate.
  --trace                    Print the match trace for every line.
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Environment:
  {log_env}                  Log filter (default: warn), e.g. {log_env}=aimlet=debug

Exit codes:
  0  Success.
  1  Load or I/O error.
  2  Invalid arguments.
",
        version = env!("CARGO_PKG_VERSION"),
        log_env = LOG_ENV,
    )
}
