mod debug_report;

use debug_report::RuleReport;
use intentmatch::{Handicaps, Matcher, RuleDefinition, RuleSet, TurnRequest, Utterance};
use serde::Deserialize;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "INTENTMATCH_LOG";

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();

    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(2)
        }
    }
}

struct CliConfig {
    rule_tokens: Vec<String>,
    rules_file: Option<PathBuf>,
    turn_file: Option<PathBuf>,
    text: Option<String>,
    handicaps: Handicaps,
    min_score: f64,
    color: bool,
    json: bool,
}

/// Entry of a `--rules` file.
#[derive(Deserialize)]
struct NamedRule {
    name: String,
    rule: RuleDefinition,
}

/// Returns whether any rule matched.
fn run() -> Result<bool, String> {
    let config = parse_args()?;

    let rules = load_rules(&config)?;
    let turn = load_turn(&config)?;
    let matcher = Matcher::new(config.handicaps);

    let best = rules.best(&matcher, &turn, config.min_score);

    if config.json {
        let ranked: Vec<_> =
            rules.rank(&matcher, &turn).into_iter().filter(|m| m.result.score >= config.min_score).collect();
        let out = serde_json::json!({ "best": best, "ranked": ranked });
        let text = serde_json::to_string_pretty(&out).map_err(|err| format!("error: {err}"))?;
        println!("{text}");
    } else {
        let reports: Vec<RuleReport<'_>> = rules
            .iter()
            .map(|(name, rule)| RuleReport { name: name.as_str(), rule, evaluation: matcher.explain(&turn, rule) })
            .collect();
        debug_report::print_run(&turn, &reports, best.as_ref(), config.color);
    }

    Ok(best.is_some())
}

fn load_rules(config: &CliConfig) -> Result<RuleSet<String>, String> {
    match (&config.rules_file, config.rule_tokens.is_empty()) {
        (Some(_), false) => Err("error: use either --rule or --rules, not both".to_string()),
        (Some(path), true) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|err| format!("error: failed to read {}: {err}", path.display()))?;
            let named: Vec<NamedRule> = serde_json::from_str(&raw)
                .map_err(|err| format!("error: invalid rules file {}: {err}", path.display()))?;
            RuleSet::compile(named.into_iter().map(|n| (n.name, n.rule))).map_err(|err| format!("error: {err}"))
        }
        (None, false) => RuleSet::compile([("rule".to_string(), config.rule_tokens.clone())])
            .map_err(|err| format!("error: {err}")),
        (None, true) => Err(format!("error: no rule provided\n\n{}", help_text())),
    }
}

fn load_turn(config: &CliConfig) -> Result<Utterance, String> {
    let mut turn = match &config.turn_file {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|err| format!("error: failed to read {}: {err}", path.display()))?;
            parse_turn(&raw)?
        }
        None if !io::stdin().is_terminal() => parse_turn(&read_stdin_input()?)?,
        None => Utterance::default(),
    };

    if let Some(text) = &config.text {
        turn.set_text(text.as_str());
    }

    if turn.text(false).trim().is_empty() && turn.intents().is_none() && turn.entities().is_empty() {
        return Err(format!("error: empty turn\n\n{}", help_text()));
    }

    Ok(turn)
}

fn parse_turn(raw: &str) -> Result<Utterance, String> {
    if raw.trim().is_empty() {
        return Ok(Utterance::default());
    }
    serde_json::from_str(raw).map_err(|err| format!("error: invalid turn JSON: {err}"))
}

fn parse_args() -> Result<CliConfig, String> {
    let mut config = CliConfig {
        rule_tokens: Vec::new(),
        rules_file: None,
        turn_file: None,
        text: None,
        handicaps: Handicaps::default(),
        min_score: 0.0,
        color: io::stdout().is_terminal(),
        json: false,
    };
    let mut overrides: Vec<(String, f64)> = Vec::new();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag.to_string(), Some(value.to_string())),
            _ => (arg.clone(), None),
        };
        let mut value = |name: &str| -> Result<String, String> {
            match inline.clone() {
                Some(v) => Ok(v),
                None => args.next().ok_or_else(|| format!("error: {name} expects a value")),
            }
        };

        match flag.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("intentmatch {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => config.color = true,
            "--no-color" => config.color = false,
            "--json" => config.json = true,
            "-r" | "--rule" => config.rule_tokens.push(value("--rule")?),
            "--rules" => config.rules_file = Some(PathBuf::from(value("--rules")?)),
            "--turn" => config.turn_file = Some(PathBuf::from(value("--turn")?)),
            "-t" | "--text" => {
                if config.text.is_some() {
                    return Err("error: text provided multiple times".to_string());
                }
                config.text = Some(value("--text")?);
            }
            "--config" => {
                let path = value("--config")?;
                let raw =
                    std::fs::read_to_string(&path).map_err(|err| format!("error: failed to read {path}: {err}"))?;
                config.handicaps =
                    serde_json::from_str(&raw).map_err(|err| format!("error: invalid config {path}: {err}"))?;
            }
            "--min-score" => config.min_score = parse_float("--min-score", &value("--min-score")?)?,
            "--optional-handicap" | "--redundant-handicap" | "--multi-match-gain" => {
                let parsed = parse_float(&flag, &value(&flag)?)?;
                overrides.push((flag.clone(), parsed));
            }
            _ if flag.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => config.rule_tokens.push(arg),
        }
    }

    // Individual flags win over --config regardless of order.
    for (flag, v) in overrides {
        match flag.as_str() {
            "--optional-handicap" => config.handicaps.optional_handicap = v,
            "--redundant-handicap" => config.handicaps.redundant_handicap = v,
            _ => config.handicaps.multi_match_gain = v,
        }
    }

    Ok(config)
}

fn parse_float(flag: &str, value: &str) -> Result<f64, String> {
    value.parse::<f64>().map_err(|_| format!("error: invalid {flag} '{value}' (expected a number)"))
}

fn read_stdin_input() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer)
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "intentmatch {version}

Score routing rules against one turn of NLU output.

Usage:
  intentmatch [OPTIONS] --rule <token>... [--turn <file.json>]
  intentmatch [OPTIONS] --rules <file.json> [--turn <file.json>]

Rule tokens:
  name                       intent name
  @entity[?][op values]      entity requirement, e.g. @age>=18, @size?, @n<>1,5
  #a|b                       whole normalized text equals a or b
  #a|b#                      normalized text contains a or b
  #😀😃                      raw text made only of these emoji

Options:
  -r, --rule <token>         Add a token to the rule. Bare arguments are tokens too.
  --rules <file.json>        Rank competing rules: [{{\"name\": .., \"rule\": ..}}, ..].
  --turn <file.json>         Turn as {{\"text\", \"intents\", \"entities\"}}.
                             Read from stdin when omitted and stdin is piped.
  -t, --text <text>          Set the turn text.
  --config <file.json>       Handicaps as {{\"optional_handicap\", \"redundant_handicap\",
                             \"multi_match_gain\"}}.
  --optional-handicap <n>    Default: {optional}
  --redundant-handicap <n>   Default: {redundant}
  --multi-match-gain <n>     Default: {gain}
  --min-score <n>            Ignore matches scoring below n. Default: 0
  --json                     Print matches as JSON.
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Environment:
  {log_env}           tracing filter for diagnostics on stderr (default: warn).

Exit codes:
  0  A rule matched.
  1  No rule matched.
  2  Invalid arguments, rules or turn.
",
        version = env!("CARGO_PKG_VERSION"),
        optional = Handicaps::default().optional_handicap,
        redundant = Handicaps::default().redundant_handicap,
        gain = Handicaps::default().multi_match_gain,
        log_env = LOG_ENV,
    )
}
