use fixpng::{check_signature, convert_with_report, ConvertConfig, ConvertError};
use std::env;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        let program = args.first().map(String::as_str).unwrap_or("fixpng");
        eprintln!("Usage: {program} <input.png> <output.png>");
        return ExitCode::FAILURE;
    }

    let input_path = Path::new(&args[1]);
    let output_path = Path::new(&args[2]);

    let input = match fs::read(input_path) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("Couldn't read file '{}': {e}", input_path.display());
            return ExitCode::FAILURE;
        }
    };

    if check_signature(&input).is_err() {
        eprintln!("This is not a PNG file. I require a PNG file!");
        return ExitCode::FAILURE;
    }

    match run(&input, output_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e}", input_path.display());
            ExitCode::FAILURE
        }
    }
}

fn run(input: &[u8], output_path: &Path) -> Result<(), ConvertError> {
    let config = ConvertConfig::from_env()?;
    let (output, report) = convert_with_report(input, &config)?;
    log::info!(
        "Read {} chunks, recompressed {}, dropped {} private and {} duplicate, wrote {}",
        report.chunks_read,
        report.recompressed,
        report.private_dropped,
        report.duplicates_dropped,
        report.chunks_written
    );

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = BufWriter::new(options.open(output_path)?);
    file.write_all(&output)?;
    file.flush()?;
    Ok(())
}
