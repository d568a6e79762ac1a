use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::PathBuf;

use pharma_scan::gtin;
use pharma_scan::{
    export_to_file, Catalog, CatalogRegistry, Gs1Decoder, MatchResult, MatchType, ParsedCode,
    ScanConfig, ScanRecord, StaticLookup,
};

const USAGE: &str = "\
Usage:
  pharma-scan [--config <json>] decode <raw>...
  pharma-scan [--config <json>] match --catalog <csv> [--lookup <json>] <raw>...
  pharma-scan [--config <json>] batch --catalog <csv> --input <txt> --output <csv|tsv> [--lookup <json>]";

/// Parsed command line: flags with a value plus positional arguments
struct Args {
    command: String,
    config: Option<PathBuf>,
    catalog: Option<PathBuf>,
    lookup: Option<PathBuf>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    codes: Vec<String>,
}

impl Args {
    fn parse(raw: Vec<String>) -> Result<Self> {
        let mut args = Args {
            command: String::new(),
            config: None,
            catalog: None,
            lookup: None,
            input: None,
            output: None,
            codes: Vec::new(),
        };

        let mut iter = raw.into_iter().skip(1);
        while let Some(arg) = iter.next() {
            let slot = match arg.as_str() {
                "--config" => Some(&mut args.config),
                "--catalog" => Some(&mut args.catalog),
                "--lookup" => Some(&mut args.lookup),
                "--input" => Some(&mut args.input),
                "--output" => Some(&mut args.output),
                _ => None,
            };

            match slot {
                Some(slot) => {
                    let value = iter
                        .next()
                        .with_context(|| format!("Missing value for {}", arg))?;
                    *slot = Some(PathBuf::from(value));
                }
                None if args.command.is_empty() => args.command = arg,
                None => args.codes.push(arg),
            }
        }

        Ok(args)
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse(env::args().collect())?;

    let config = match &args.config {
        Some(path) => ScanConfig::from_file(path)?,
        None => ScanConfig::default(),
    };
    let decoder = Gs1Decoder::from_config(&config);

    match args.command.as_str() {
        "decode" => run_decode(&decoder, &args.codes),
        "match" => run_match(&decoder, &args),
        "batch" => run_batch(&decoder, &args),
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

fn run_decode(decoder: &Gs1Decoder, codes: &[String]) -> Result<()> {
    if codes.is_empty() {
        anyhow::bail!("decode: no code given\n{}", USAGE);
    }

    for raw in codes {
        let parsed = decoder.decode(raw);
        warn_check_digit(&parsed);
        println!("{}", serde_json::to_string_pretty(&parsed)?);
    }

    Ok(())
}

fn run_match(decoder: &Gs1Decoder, args: &Args) -> Result<()> {
    if args.codes.is_empty() {
        anyhow::bail!("match: no code given\n{}", USAGE);
    }

    let registry = open_registry(args)?;
    let lookup = open_lookup(args)?;

    for raw in &args.codes {
        let parsed = decoder.decode(raw);
        warn_check_digit(&parsed);
        let matched = resolve(&registry, lookup.as_ref(), &parsed);
        print_match(&parsed, &matched);

        let record = ScanRecord::new(parsed, matched);
        println!("{}", serde_json::to_string_pretty(&record)?);
    }

    Ok(())
}

fn run_batch(decoder: &Gs1Decoder, args: &Args) -> Result<()> {
    let input = args.input.as_deref().context("batch: --input is required")?;
    let output = args.output.as_deref().context("batch: --output is required")?;

    let registry = open_registry(args)?;
    let lookup = open_lookup(args)?;

    println!("\n📂 Reading scans from {}...", input.display());
    let content = fs::read_to_string(input)
        .with_context(|| format!("Failed to read scans: {}", input.display()))?;

    let mut records = Vec::new();
    let mut invalid = 0usize;
    let mut ambiguous = 0usize;
    let mut unmatched = 0usize;

    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        let parsed = decoder.decode(line);
        let matched = resolve(&registry, lookup.as_ref(), &parsed);

        if !parsed.valid {
            invalid += 1;
        }
        match matched.match_type {
            MatchType::Ambiguous => ambiguous += 1,
            MatchType::None => unmatched += 1,
            _ => {}
        }

        records.push(ScanRecord::new(parsed, matched));
    }

    let written = export_to_file(output, &records)?;

    println!("✓ Exported {} scans to {}", written, output.display());
    println!("✓ Invalid codes: {}", invalid);
    println!("✓ Ambiguous matches (need review): {}", ambiguous);
    println!("✓ Unmatched: {}", unmatched);

    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn open_registry(args: &Args) -> Result<CatalogRegistry> {
    let path = args.catalog.as_deref().context("--catalog is required")?;

    println!("📚 Loading catalog {}...", path.display());
    let catalog = Catalog::from_csv(path)?;
    println!("✓ Loaded {} catalog entries", catalog.len());

    Ok(CatalogRegistry::new(catalog))
}

fn open_lookup(args: &Args) -> Result<Option<StaticLookup>> {
    match args.lookup.as_deref() {
        Some(path) => {
            let lookup = StaticLookup::from_json_file(path)?;
            println!("✓ Loaded {} offline lookup entries", lookup.len());
            Ok(Some(lookup))
        }
        None => Ok(None),
    }
}

fn resolve(
    registry: &CatalogRegistry,
    lookup: Option<&StaticLookup>,
    parsed: &ParsedCode,
) -> MatchResult {
    match lookup {
        Some(l) => registry.resolve_with_fallback(parsed, l),
        None => registry.resolve(parsed),
    }
}

fn print_match(parsed: &ParsedCode, matched: &MatchResult) {
    if !parsed.valid {
        eprintln!("❌ Could not read an identifier from {:?}", parsed.raw);
        return;
    }

    match matched.match_type {
        MatchType::Exact | MatchType::Last8 | MatchType::Api => {
            println!(
                "✅ {} → {} [{}]",
                parsed.gtin14,
                matched.product_name,
                matched.match_type.as_str()
            );
        }
        MatchType::Ambiguous => {
            println!(
                "⚠️  {} → {} [AMBIGUOUS, {} candidates]",
                parsed.gtin14,
                matched.product_name,
                matched.candidates.len()
            );
            for candidate in &matched.candidates {
                println!("   - {} {}", candidate.identifier, candidate.product_name);
            }
        }
        MatchType::None => {
            println!("❓ {} → not in catalog", parsed.gtin14);
        }
    }
}

/// Internal short codes (fewer than 8 significant digits) carry no check digit
fn warn_check_digit(parsed: &ParsedCode) {
    let significant = gtin::strip_leading_zeros(&parsed.gtin14).len();
    if parsed.valid
        && parsed.gtin14.len() == 14
        && significant >= 8
        && !gtin::has_valid_check_digit(&parsed.gtin14)
    {
        eprintln!("⚠️  {}: check digit does not match", parsed.gtin14);
    }
}
