use flexi_logger::Logger;
use harmony::Analysis;
use std::env;
use std::fs;
use std::process;

fn print_chords(analysis: &Analysis) {
    for chord in &analysis.chords {
        let part = analysis
            .parts
            .get(chord.part)
            .map(String::as_str)
            .unwrap_or("?");
        let subchords: Vec<String> = analysis.subchords_of(chord).map(|s| s.label()).collect();
        println!(
            "{} {} {}-{} {} [{}]",
            part,
            chord.measure_number,
            chord.start_point,
            chord.end_point,
            chord.label(),
            subchords.join(" ")
        );
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();

    // Keep the handle alive for the whole run
    let _logger = match Logger::try_with_env_or_str("warn").and_then(|logger| logger.start()) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("Warning: logging disabled: {}", e);
            None
        }
    };

    if args.len() < 2 {
        eprintln!("Usage: harmony <score.yaml>");
        eprintln!("       harmony --json <score.yaml>");
        process::exit(1);
    }

    let mut json = false;
    let mut input_path = &args[1];

    // Parse flags
    if args[1] == "--json" {
        json = true;
        if args.len() < 3 {
            eprintln!("Usage: harmony --json <score.yaml>");
            process::exit(1);
        }
        input_path = &args[2];
    }

    // Read input file
    let source = match fs::read_to_string(input_path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", input_path, e);
            process::exit(1);
        }
    };

    let analysis = match harmony::analyze_document(&source) {
        Ok(analysis) => analysis,
        Err(e) => {
            eprintln!("Analysis error: {}", e);
            process::exit(1);
        }
    };

    // Output
    if json {
        match serde_json::to_string_pretty(&analysis) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error writing JSON: {}", e);
                process::exit(1);
            }
        }
    } else {
        print_chords(&analysis);
    }
}
