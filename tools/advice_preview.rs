/// Advice Preview: interactive shell for trying advice over a sampled database.
///
/// Usage: advice_preview --domain <path> --templates <path> [--relation <path>]
///                       [--rows <n>] [--seed <n>] [--log <level>]
///
/// Commands:
///   belief <slot>=<value>, ...  constrain the belief state
///   belief clear                drop all constraints
///   advise                      list ranked advice for the belief state
///   turn <act> [slot] [value]   render a system act with advice appended
///   select                      match the belief state against the table
///   goal                        sample a distinct searchable row
///   summary                     database size and distinct rows
///   seed <n>                    rebuild with a new seed
///   help                        list commands
///   quit                        exit

use dialog_advice::core::stats::StatRow;
use dialog_advice::schema::act::{ActParameter, DialogueAct};
use dialog_advice::schema::belief::BeliefState;
use dialog_advice::schema::slot::ValueId;
use dialog_advice::{DialogueNlg, PipelineError};
use std::io::{self, BufRead, Write};
use tracing::Level;

struct Config {
    domain: String,
    templates: String,
    relation: Option<String>,
    rows: Option<usize>,
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut domain = None;
    let mut templates = None;
    let mut relation = None;
    let mut rows = None;
    let mut seed: u64 = 42;
    let mut level = Level::INFO;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--domain" if i + 1 < args.len() => {
                i += 1;
                domain = Some(args[i].clone());
            }
            "--templates" if i + 1 < args.len() => {
                i += 1;
                templates = Some(args[i].clone());
            }
            "--relation" if i + 1 < args.len() => {
                i += 1;
                relation = Some(args[i].clone());
            }
            "--rows" if i + 1 < args.len() => {
                i += 1;
                rows = args[i].parse().ok();
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            "--log" if i + 1 < args.len() => {
                i += 1;
                level = args[i].parse().unwrap_or(Level::INFO);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    tracing_subscriber::fmt().with_max_level(level).init();

    let (Some(domain), Some(templates)) = (domain, templates) else {
        eprintln!("ERROR: --domain and --templates are required");
        std::process::exit(1);
    };
    let config = Config {
        domain,
        templates,
        relation,
        rows,
    };

    let mut nlg = match build(&config, seed) {
        Ok(nlg) => nlg,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };
    let mut belief = BeliefState::unconstrained(nlg.domain().usr_slots.len());
    let mut current_seed = seed;

    println!("Domain '{}', seed {}", nlg.domain().name, current_seed);
    println!("Type 'help' for commands.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("advice> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        match cmd.to_lowercase().as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => print_help(),
            "belief" => {
                if rest == "clear" {
                    belief = BeliefState::unconstrained(belief.len());
                } else if !rest.is_empty() {
                    match parse_belief(&nlg, rest, belief.clone()) {
                        Ok(b) => belief = b,
                        Err(msg) => {
                            println!("{}", msg);
                            continue;
                        }
                    }
                }
                println!("Belief: {}", describe(&nlg, belief.values()));
            }
            "advise" => match nlg.advise(&belief) {
                Ok(advice) if advice.is_empty() => println!("No advice."),
                Ok(advice) => print_advice(&nlg, &advice),
                Err(e) => println!("ERROR: {}", e),
            },
            "turn" => {
                let act = match parse_act(&nlg, rest) {
                    Ok(act) => act,
                    Err(msg) => {
                        println!("{}", msg);
                        continue;
                    }
                };
                match nlg.system_turn(&[act], &belief) {
                    Ok(turn) => {
                        println!("\n{}\n", turn.text);
                        if let Some(key) = turn.advice.key {
                            println!(
                                "  key: {}  variant: {:?}",
                                key.label(nlg.templates().slots()),
                                turn.advice.variant
                            );
                        }
                        for (slot, value) in &turn.advice.suggestion {
                            let word = nlg.vocab().get_value(slot, *value).unwrap_or("?");
                            println!("  suggests {} = {}", slot, word);
                        }
                    }
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "select" => match nlg.select(belief.values()) {
                Ok(selection) => {
                    println!("{} matching rows", selection.len());
                    for row in selection.rows.iter().take(5) {
                        println!("  #{} {}", row.uid, describe_sys(&nlg, &row.values));
                    }
                }
                Err(e) => println!("ERROR: {}", e),
            },
            "goal" => match nlg.sample_goal() {
                Some(goal) => {
                    let values: Vec<_> = goal.into_iter().map(Some).collect();
                    println!("Goal: {}", describe(&nlg, &values));
                }
                None => println!("Database is empty."),
            },
            "summary" => {
                let summary = nlg.database().summary();
                println!(
                    "{} rows, {} distinct, {} searchable attributes, {} statistics rows",
                    summary.rows,
                    summary.unique_rows,
                    summary.attributes,
                    nlg.database().stats().len()
                );
            }
            "seed" => {
                if rest.is_empty() {
                    println!("Current seed: {}", current_seed);
                    continue;
                }
                match rest.parse::<u64>() {
                    Ok(s) => match build(&config, s) {
                        Ok(rebuilt) => {
                            nlg = rebuilt;
                            current_seed = s;
                            println!("Seed set to {}", current_seed);
                        }
                        Err(e) => println!("ERROR: {}", e),
                    },
                    Err(_) => println!("Invalid seed: {}", rest),
                }
            }
            _ => println!("Unknown command '{}'. Type 'help' for commands.", cmd),
        }
    }
}

fn build(config: &Config, seed: u64) -> Result<DialogueNlg, PipelineError> {
    let mut builder = DialogueNlg::builder()
        .seed(seed)
        .domain_path(&config.domain)
        .templates_path(&config.templates);
    if let Some(ref path) = config.relation {
        builder = builder.relation_path(path);
    }
    if let Some(rows) = config.rows {
        builder = builder.num_rows(rows);
    }
    builder.build()
}

fn parse_belief(nlg: &DialogueNlg, input: &str, mut belief: BeliefState) -> Result<BeliefState, String> {
    for term in input.split(',') {
        let (slot, value) = term
            .split_once('=')
            .ok_or_else(|| format!("Expected <slot>=<value>, got '{}'", term.trim()))?;
        let (slot, value) = (slot.trim(), value.trim());
        let attr = nlg
            .domain()
            .usr_slot_index(slot)
            .ok_or_else(|| format!("Unknown searchable slot '{}'", slot))?;
        if value == "*" {
            belief.set(attr, None);
            continue;
        }
        let id = nlg
            .vocab()
            .lookup_id(slot, value)
            .ok_or_else(|| format!("Unknown value '{}' for '{}'", value, slot))?;
        belief.set(attr, Some(id));
    }
    Ok(belief)
}

/// `turn request area`, `turn explicit_confirm food italian`, `turn greet`.
fn parse_act(nlg: &DialogueNlg, input: &str) -> Result<DialogueAct, String> {
    let mut parts = input.splitn(3, ' ');
    let act = parts.next().filter(|s| !s.is_empty()).ok_or("Usage: turn <act> [slot] [value]")?;
    let Some(slot) = parts.next() else {
        return Ok(DialogueAct::new(act));
    };
    let value = match parts.next().map(str::trim) {
        Some(word) => Some(
            nlg.vocab()
                .lookup_id(slot, word)
                .ok_or_else(|| format!("Unknown value '{}' for '{}'", word, slot))?,
        ),
        None => None,
    };
    Ok(DialogueAct::new(act).with_param(ActParameter::Slot {
        slot: slot.to_string(),
        value,
    }))
}

fn describe(nlg: &DialogueNlg, values: &[Option<ValueId>]) -> String {
    nlg.domain()
        .usr_slots
        .iter()
        .zip(values)
        .map(|(slot, value)| {
            let word = value
                .and_then(|id| nlg.vocab().get_value(&slot.name, id).ok())
                .unwrap_or("*");
            format!("{}={}", slot.name, word)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_sys(nlg: &DialogueNlg, values: &[ValueId]) -> String {
    nlg.domain()
        .sys_slots
        .iter()
        .zip(values)
        .map(|(slot, id)| {
            let word = nlg.vocab().get_value(&slot.name, *id).unwrap_or("?");
            format!("{}={}", slot.name, word)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_advice(nlg: &DialogueNlg, advice: &[StatRow]) {
    println!("\n{:>6}  combination", "count");
    for row in advice {
        println!("{:>6}  {}", row.count, describe(nlg, &row.values));
    }
    println!();
}

fn print_usage() {
    println!("Usage: advice_preview --domain <path> --templates <path> [--relation <path>]");
    println!("                      [--rows <n>] [--seed <n>] [--log <level>]");
}

fn print_help() {
    println!("Commands:");
    println!("  belief <slot>=<value>, ...  constrain the belief state ('*' clears a slot)");
    println!("  belief clear                drop all constraints");
    println!("  advise                      list ranked advice");
    println!("  turn <act> [slot] [value]   render a system act with advice");
    println!("  select                      match the belief state against the table");
    println!("  goal                        sample a distinct searchable row");
    println!("  summary                     database size and distinct rows");
    println!("  seed <n>                    rebuild with a new seed");
    println!("  quit                        exit");
}
