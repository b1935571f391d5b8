/// Template Linter: checks an advice template table against a domain.
///
/// Usage: template_linter <templates.ron> --domain <domain.ron> [--log <level>]

use dialog_advice::core::templates::{reachable_keys, TemplateTable, REQUIRED_VARIANTS};
use dialog_advice::schema::domain::DomainSpec;
use std::path::Path;
use std::process;
use tracing::Level;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: template_linter <templates.ron> --domain <domain.ron> [--log <level>]");
        process::exit(0);
    }

    let templates_path = &args[1];
    let mut domain_path = None;
    let mut level = Level::INFO;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--domain" if i + 1 < args.len() => {
                i += 1;
                domain_path = Some(args[i].clone());
            }
            "--log" if i + 1 < args.len() => {
                i += 1;
                level = args[i].parse().unwrap_or(Level::INFO);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    tracing_subscriber::fmt().with_max_level(level).init();

    let Some(domain_path) = domain_path else {
        eprintln!("ERROR: --domain is required");
        process::exit(1);
    };

    let domain = match DomainSpec::load_from_ron(Path::new(&domain_path)) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("ERROR: Failed to load domain: {}", e);
            process::exit(1);
        }
    };
    let slots = domain.usr_slot_names();

    let table = match TemplateTable::load_from_ron(Path::new(templates_path), &slots) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("ERROR: Failed to load templates: {}", e);
            process::exit(1);
        }
    };

    println!("Loaded {} template keys for domain '{}'", table.len(), domain.name);

    let (errors, warnings) = lint_table(&table);

    println!("\n=== Template Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn lint_table(table: &TemplateTable) -> (Vec<String>, Vec<String>) {
    let slots = table.slots();
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for (key, variant) in table.missing() {
        errors.push(format!("'{}' has no variant {}", key.label(slots), variant));
    }

    for key in reachable_keys(slots.len()) {
        let Some(phrasings) = table.get(&key) else {
            continue;
        };
        let label = key.label(slots);

        if phrasings.len() > REQUIRED_VARIANTS {
            warnings.push(format!(
                "'{}' has {} variants; only the first {} are ever used",
                label,
                phrasings.len(),
                REQUIRED_VARIANTS
            ));
        }

        for (variant, phrasing) in phrasings.iter().enumerate().take(REQUIRED_VARIANTS) {
            let omitted = key.conveyed.difference(phrasing.placeholders());
            if !omitted.is_empty() {
                warnings.push(format!(
                    "'{}' variant {} never mentions {}",
                    label,
                    variant,
                    omitted
                        .iter()
                        .filter_map(|a| slots.get(a).map(String::as_str))
                        .collect::<Vec<_>>()
                        .join(", ")
                ));
            }
        }

        // A lone conveyed attribute is contrasted across two rows in variant 1.
        if key.conveyed.len() == 1 {
            if let (Some(attr), Some(contrast)) = (key.conveyed.iter().next(), phrasings.get(1)) {
                if contrast.occurrences(attr) < 2 {
                    warnings.push(format!(
                        "'{}' variant 1 mentions its conveyed attribute once; the runner-up is dropped",
                        label
                    ));
                }
            }
        }
    }

    (errors, warnings)
}
