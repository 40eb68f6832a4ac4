//! CLI entry point: `jpeg2png-rs <in.jpg> <out.png>` (§6).

use std::fs::File;
use std::io::BufWriter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("usage: {} <in.jpg> <out.png>", args.first().map(String::as_str).unwrap_or("jpeg2png-rs"));
        return ExitCode::FAILURE;
    }

    match run(&args[1], &args[2]) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("jpeg2png-rs: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(input_path: &str, output_path: &str) -> jpeg2png_rs::Result<()> {
    let jpeg_bytes = std::fs::read(input_path)?;
    let out = BufWriter::new(File::create(output_path)?);
    jpeg2png_rs::orchestrator::run_default(&jpeg_bytes, out)
}
