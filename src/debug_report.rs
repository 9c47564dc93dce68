use intentmatch::{CompiledRule, Evaluation, Match, MatchMode, RankedMatch, TurnRequest, Utterance};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

/// One evaluated rule, as shown in the report.
pub struct RuleReport<'a> {
    pub name: &'a str,
    pub rule: &'a CompiledRule,
    pub evaluation: Evaluation,
}

pub fn print_run(turn: &Utterance, reports: &[RuleReport<'_>], best: Option<&RankedMatch<'_, String>>, color: bool) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Turn: \"{}\"", turn.text(false)), ansi::CYAN)));

    println!("\n{}", palette.paint("━━━ Turn ━━━", ansi::GRAY));
    print_turn(turn, &palette);

    println!("\n{}", palette.paint("━━━ Rules ━━━", ansi::GRAY));
    for report in reports {
        print_rule(report, &palette);
    }

    println!("\n{}", palette.paint("━━━ Result ━━━", ansi::GRAY));
    match best {
        Some(winner) => {
            println!(
                "  {} {} {}",
                palette.paint("winner:", ansi::BLUE),
                palette.bold(palette.paint(winner.key, ansi::GREEN)),
                fmt_match(&winner.result, &palette)
            );
        }
        None => {
            println!("{}", palette.dim("  No rule matched"));
            println!("\n{}", palette.paint("Possible reasons:", ansi::YELLOW));
            println!("  • A required @entity was missing or failed its comparator");
            println!("  • No observed intent carried a wanted intent name");
            println!("  • The score fell below --min-score");
            println!("\n{}", palette.dim("  Tip: Set INTENTMATCH_LOG=debug to see mode selection details"));
        }
    }

    let total: std::time::Duration = reports.iter().map(|r| r.evaluation.trace.elapsed).sum();
    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    println!(
        "  Total: {}  │  Rules: {}",
        palette.paint(format!("{:?}", total), ansi::GREEN),
        palette.dim(reports.len().to_string()),
    );
    println!();
}

fn print_turn(turn: &Utterance, palette: &ansi::Palette) {
    println!("  {} {}", palette.dim("normalized:"), palette.paint(turn.text(true), ansi::YELLOW));

    match turn.intents() {
        None => println!("  {} {}", palette.dim("intents:"), palette.dim("not consulted")),
        Some([]) => println!("  {} {}", palette.dim("intents:"), palette.dim("none")),
        Some(intents) => {
            for intent in intents {
                println!(
                    "  {} {} {}",
                    palette.dim("intent:"),
                    palette.paint(intent.intent.as_deref().unwrap_or("-"), ansi::BLUE),
                    palette.dim(format!("{:.3}", intent.score))
                );
            }
        }
    }

    for entity in turn.entities() {
        println!(
            "  {} {}={} {}",
            palette.dim("entity:"),
            palette.paint(&entity.entity, ansi::CYAN),
            entity.value,
            palette.dim(format!("{:.3}", entity.score))
        );
    }
}

fn print_rule(report: &RuleReport<'_>, palette: &ansi::Palette) {
    let trace = &report.evaluation.trace;
    let mode = match trace.mode {
        MatchMode::EntityRegex => "entity/regex",
        MatchMode::Intent => "intent",
    };

    println!(
        "  {} {} {}",
        palette.bold(palette.paint(report.name, ansi::CYAN)),
        palette.dim("│ mode:"),
        palette.paint(mode, ansi::BLUE)
    );
    println!("      {} {}", palette.dim("tokens:"), fmt_rule(report.rule));

    if !report.rule.regexes.is_empty() {
        let hit = if trace.regex_matched { palette.paint("✓ matched", ansi::GREEN) } else { palette.dim("✗ no match") };
        println!("      {} {}", palette.dim("regex:"), hit);
    }

    if let Some(alignment) = &trace.alignment {
        println!(
            "      {} score {:.3}  handicap {:.3}  matched {}",
            palette.dim("alignment:"),
            alignment.score,
            alignment.handicap,
            alignment.matched
        );
    }

    for candidate in &trace.candidates {
        println!(
            "      {} {} {} → {}  {}",
            palette.dim("candidate:"),
            palette.paint(&candidate.intent, ansi::BLUE),
            palette.dim(format!("{:.3}", candidate.observed_score)),
            palette.paint(format!("{:.3}", candidate.score), ansi::YELLOW),
            palette.dim(format!("entities {}", candidate.matched_entities))
        );
    }

    match &report.evaluation.result {
        Some(found) => println!("      {} {}", palette.dim("result:"), fmt_match(found, palette)),
        None => println!("      {} {}", palette.dim("result:"), palette.dim("✗ no match")),
    }
}

fn fmt_rule(rule: &CompiledRule) -> String {
    let intents = rule.intents.iter().cloned();
    let entities = rule.entities.iter().map(ToString::to_string);
    let regexes = rule.regexes.iter().map(|r| format!("/{}/", r.pattern.as_str()));
    intents.chain(entities).chain(regexes).collect::<Vec<_>>().join(" ")
}

fn fmt_match(found: &Match, palette: &ansi::Palette) -> String {
    let entities: Vec<String> = found.entities.iter().map(|e| format!("{}={}", e.entity, e.value)).collect();
    format!(
        "{} {} {}",
        palette.paint(format!("score {:.4}", found.score), ansi::GREEN),
        palette.paint(found.intent.as_deref().unwrap_or("-"), ansi::BLUE),
        palette.dim(format!("[{}] {:?}", entities.join(", "), found.features))
    )
}
