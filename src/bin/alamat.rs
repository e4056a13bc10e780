extern crate clap;

use std::error::Error;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read};
use std::process::exit;
use std::time::SystemTime;

use clap::{App, Arg, ArgMatches, SubCommand};
use log::info;
use simple_error::SimpleError;

use alamat::*;

fn output_resolution_as_tsv(input: &str, resolution: &Resolution) {
    let parsed = &resolution.parsed;
    let field = |value: &Option<String>| value.clone().unwrap_or_default();
    print!("{}\t{}\t{:.4}", input, resolution.success, resolution.confidence);
    print!(
        "\t{}\t{}\t{}\t{}\t{}",
        field(&parsed.province),
        field(&parsed.regency_city),
        field(&parsed.district),
        field(&parsed.village),
        field(&parsed.postal_code)
    );
    print!("\t{}", resolution.suggestions.join("|"));
    for hint in resolution.corrections.iter() {
        print!("\t{} -> {}", hint.original, hint.suggested);
    }
    println!();
}

fn output_resolution_as_json(resolution: &Resolution, seqnr: usize) -> Result<(), Box<dyn Error>> {
    if seqnr > 1 {
        println!(",")
    }
    print!("    {}", serde_json::to_string(resolution)?);
    Ok(())
}

///Number of input lines resolved together, on multiple cores unless configured otherwise
const BATCH_SIZE: usize = 1000;

fn process(engine: &AddressEngine, inputstream: impl Read, json: bool, seqnr: &mut usize, progress: bool) -> Result<(), Box<dyn Error>> {
    let mut progresstime = SystemTime::now();
    let f_buffer = BufReader::new(inputstream);
    let mut batch: Vec<String> = Vec::with_capacity(BATCH_SIZE);
    for line in f_buffer.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        batch.push(line);
        if batch.len() >= BATCH_SIZE {
            process_batch(engine, &batch, json, seqnr, progress, &mut progresstime)?;
            batch.clear();
        }
    }
    if !batch.is_empty() {
        process_batch(engine, &batch, json, seqnr, progress, &mut progresstime)?;
    }
    Ok(())
}

fn process_batch(engine: &AddressEngine, batch: &[String], json: bool, seqnr: &mut usize, progress: bool, progresstime: &mut SystemTime) -> Result<(), Box<dyn Error>> {
    let resolutions = engine.resolve_batch(batch);
    for (input, resolution) in batch.iter().zip(resolutions.iter()) {
        *seqnr += 1;
        if progress && *seqnr % 1000 == 1 {
            *progresstime = show_progress(*seqnr, *progresstime);
        }
        if json {
            output_resolution_as_json(resolution, *seqnr)?;
        } else {
            output_resolution_as_tsv(input, resolution);
        }
    }
    Ok(())
}

fn show_progress(seqnr: usize, lasttime: SystemTime) -> SystemTime {
    let now = SystemTime::now();
    if lasttime >= now || seqnr <= 1 {
        eprintln!("@ {}", seqnr);
    } else if let Ok(elapsed) = now.duration_since(lasttime) {
        let rate = 1000.0 / (elapsed.as_millis().max(1) as f64 / 1000.0);
        eprintln!("@ {} - processing speed was {:.0} addresses per second", seqnr, rate);
    }
    now
}

fn output_index(engine: &AddressEngine) {
    let gazetteer = engine.gazetteer();
    for level in Level::ALL {
        for (key, ids) in gazetteer.index().level(level).iter() {
            print!("{}\t{}", level, key);
            for id in ids.iter() {
                if let Some(record) = gazetteer.get(*id) {
                    print!("\t{}", record.get(level));
                }
            }
            println!();
        }
    }
}

fn output_stats(engine: &AddressEngine, json: bool) -> Result<(), Box<dyn Error>> {
    let stats = engine.get_learning_stats();
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("gazetteer_size\t{}", stats.gazetteer_size);
        println!("learned_words\t{}", stats.learned_words);
        println!("address_patterns\t{}", stats.address_patterns);
        println!("corrections\t{}", stats.corrections);
        println!("resolved_total\t{}", stats.resolved_total);
        println!("resolved_successful\t{}", stats.resolved_successful);
        println!("accuracy\t{:.2}", stats.accuracy());
    }
    Ok(())
}

pub fn common_arguments<'a, 'b>() -> Vec<clap::Arg<'a, 'b>> {
    let mut args: Vec<Arg> = Vec::new();
    args.push(Arg::with_name("gazetteer")
        .long("gazetteer")
        .short("g")
        .help("Reference table of administrative regions. The first row is a header naming the columns: province, regency_city, district, village, postal_code (or the Indonesian provinsi, kabupaten_kota, kecamatan, kelurahan_desa, kode_pos). Unknown columns are ignored.")
        .takes_value(true)
        .required(true));
    args.push(Arg::with_name("delimiter")
        .long("delimiter")
        .help("Field delimiter of the reference table")
        .takes_value(true)
        .default_value(","));
    args.push(Arg::with_name("learning-state")
        .long("learning-state")
        .short("L")
        .help("Learning state (JSON) to import before processing, as previously written by --save-learning")
        .takes_value(true));
    args.push(Arg::with_name("json")
        .long("json")
        .short("j")
        .help("Output json instead of tsv")
        .required(false));
    args
}

pub fn resolve_arguments<'a, 'b>() -> Vec<clap::Arg<'a, 'b>> {
    let mut args: Vec<Arg> = Vec::new();
    args.push(Arg::with_name("save-learning")
        .long("save-learning")
        .short("s")
        .help("Write the learning state (JSON) to this file after processing")
        .takes_value(true));
    args.push(Arg::with_name("threshold")
        .long("threshold")
        .short("t")
        .help("Minimum similarity (0.0 - 1.0) for the fuzzy province fallback")
        .takes_value(true));
    args.push(Arg::with_name("no-learning")
        .long("no-learning")
        .help("Do not learn from the processed addresses")
        .required(false));
    args.push(Arg::with_name("token-corrections")
        .long("token-corrections")
        .help("Apply learned corrections to whole words only, rather than to any substring")
        .required(false));
    args.push(Arg::with_name("extend-lexicon")
        .long("extend-lexicon")
        .help("Also recognise every name in the gazetteer, not just the built-in lexicon")
        .required(false));
    args.push(Arg::with_name("single-thread")
        .long("single-thread")
        .help("Resolve sequentially rather than on multiple cores")
        .required(false));
    args.push(Arg::with_name("progress")
        .long("progress")
        .help("Show progress")
        .required(false));
    args.push(Arg::with_name("files")
        .help("Input files, one address per line (standard input when omitted)")
        .takes_value(true)
        .multiple(true)
        .required(false));
    args
}

fn build_config(rootargs: &ArgMatches, args: &ArgMatches) -> Result<EngineConfig, Box<dyn Error>> {
    let mut config = if let Some(filename) = rootargs.value_of("config") {
        EngineConfig::from_file(filename)?
    } else {
        EngineConfig::from_env()?
    };
    if let Some(threshold) = args.value_of("threshold") {
        let threshold = threshold
            .parse::<f64>()
            .map_err(|_| SimpleError::new("Threshold should be a floating point number between 0.0 and 1.0"))?;
        config = config.with_fuzzy_threshold(threshold);
    }
    if args.is_present("no-learning") {
        config = config.with_learning(false);
    }
    if args.is_present("token-corrections") {
        config = config.with_correction_scope(CorrectionScope::Token);
    }
    if args.is_present("extend-lexicon") {
        config = config.with_lexicon_from_gazetteer();
    }
    if args.is_present("single-thread") {
        config = config.with_single_thread();
    }
    Ok(config)
}

fn build_engine(rootargs: &ArgMatches, args: &ArgMatches) -> Result<AddressEngine, Box<dyn Error>> {
    let config = build_config(rootargs, args)?;
    let delimiter = args.value_of("delimiter").unwrap_or(",");
    let mut delimiter_chars = delimiter.chars();
    let params = match (delimiter_chars.next(), delimiter_chars.next()) {
        (Some(delimiter), None) => TableParams { delimiter },
        _ => return Err(Box::new(SimpleError::new("Delimiter should be a single character"))),
    };
    let mut engine = AddressEngine::new(config);

    let filename = args
        .value_of("gazetteer")
        .ok_or_else(|| SimpleError::new("No gazetteer specified"))?;
    eprintln!("Loading gazetteer...");
    engine
        .load_file(filename, &params)
        .map_err(|e| SimpleError::new(format!("Error reading gazetteer {}: {}", filename, e)))?;

    if let Some(filename) = args.value_of("learning-state") {
        eprintln!("Loading learning state...");
        let json = fs::read_to_string(filename)?;
        engine.import_learning_state(LearningSnapshot::from_json(&json)?);
    }
    Ok(engine)
}

fn run() -> Result<(), Box<dyn Error>> {
    let rootargs = App::new("Alamat")
                    .version("0.1")
                    .about("Indonesian address resolution against a gazetteer of administrative regions")
                    .subcommand(
                        SubCommand::with_name("resolve")
                            .about("Resolve the addresses provided in the input, one per line")
                            .args(&common_arguments())
                            .args(&resolve_arguments())
                    )
                    .subcommand(
                        SubCommand::with_name("index")
                            .about("Output the hierarchical index over the gazetteer")
                            .args(&common_arguments())
                    )
                    .subcommand(
                        SubCommand::with_name("stats")
                            .about("Output gazetteer and learning statistics")
                            .args(&common_arguments())
                    )
                    .arg(Arg::with_name("config")
                        .long("config")
                        .short("c")
                        .help("Configuration file (TOML); ALAMAT_* environment variables override its values")
                        .takes_value(true))
                    .arg(Arg::with_name("debug")
                        .long("debug")
                        .short("D")
                        .help("Debug")
                        .required(false))
                    .get_matches();

    let loglevel = if rootargs.is_present("debug") { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(loglevel)).init();

    let (command, args) = match rootargs.subcommand() {
        (command, Some(args)) => (command, args),
        _ => return Err(Box::new(SimpleError::new("No command specified (use resolve, index or stats)"))),
    };

    let engine = build_engine(&rootargs, args)?;
    let json = args.is_present("json");

    match command {
        "index" => {
            eprintln!("Outputting hierarchical index...");
            output_index(&engine);
        }
        "stats" => {
            output_stats(&engine, json)?;
        }
        _ => {
            eprintln!("Resolving addresses...");
            let progress = args.is_present("progress");
            let mut seqnr = 0;
            if json {
                println!("[");
            }
            let files: Vec<_> = match args.values_of("files") {
                Some(files) => files.collect(),
                None => vec!["-"],
            };
            for filename in files {
                match filename {
                    "-" | "STDIN" | "stdin" => {
                        eprintln!("(reading addresses from standard input, one per line; output follows per batch of {} lines or at end of input)", BATCH_SIZE);
                        let stdin = io::stdin();
                        process(&engine, stdin, json, &mut seqnr, progress)?;
                    }
                    _ => {
                        let f = File::open(filename)
                            .map_err(|e| SimpleError::new(format!("Unable to open file {}: {}", filename, e)))?;
                        process(&engine, f, json, &mut seqnr, progress)?;
                    }
                }
            }
            if json {
                println!("\n]");
            }

            if let Some(filename) = args.value_of("save-learning") {
                let snapshot = engine.export_learning_state();
                fs::write(filename, snapshot.to_json()?)?;
                info!("Learning state written to {}", filename);
            }
            let stats = engine.get_learning_stats();
            eprintln!(
                "Resolved {} addresses, {} successfully ({:.1}%)",
                stats.resolved_total,
                stats.resolved_successful,
                stats.accuracy()
            );
        }
    }
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("ERROR: {}", e);
        exit(1);
    }
}
