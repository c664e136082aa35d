//! Command-line surface.
//!
//! Parses the flag grammar into one immutable [`ShredConfig`] plus the list
//! of target paths, prints the informational screens, runs the interactive
//! confirmation under `--internal`, and drives the walker. Short flags
//! bundle (`-kvn5sf`) with the `-n` count inline, mid-bundle, or as the next
//! token; long options are case-insensitive; later occurrences override
//! earlier ones; unknown flags are fatal.

use crate::config::ShredConfig;
use crate::logging;
use crate::report;
use crate::types::ShredError;
use crate::walker;
use chrono::Local;
use log::info;
use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

const EXIT_FAILURE: u8 = 1;
const EXIT_INFO: u8 = 2;
const EXIT_DECLINED: u8 = 3;

/// What the argument vector asked for.
#[derive(Debug)]
pub enum CliRequest {
    Run {
        config: ShredConfig,
        paths: Vec<PathBuf>,
    },
    Help,
    FullHelp,
    Version,
    Copyright,
}

/// Entry point used by the binary. Returns the process exit code.
pub fn run() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let request = match parse_arguments(&args) {
        Ok(request) => request,
        Err(message) => {
            eprintln!("ERROR: {}", message);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let (config, paths) = match request {
        CliRequest::Run { config, paths } => (config, paths),
        CliRequest::Help => {
            print_help();
            return ExitCode::from(EXIT_INFO);
        }
        CliRequest::FullHelp => {
            print_full_help();
            return ExitCode::from(EXIT_INFO);
        }
        CliRequest::Version => {
            println!("shredbox {}", env!("CARGO_PKG_VERSION"));
            return ExitCode::from(EXIT_INFO);
        }
        CliRequest::Copyright => {
            print_copyright();
            return ExitCode::from(EXIT_INFO);
        }
    };

    logging::init(config.verbose, config.internal);

    if config.internal && !confirm_run(&config, &paths) {
        return ExitCode::from(EXIT_DECLINED);
    }

    let started = Instant::now();
    println!("Beginning Shred at: {}", Local::now().format("%H:%M:%S"));

    for path in &paths {
        walker::process_path(path, &config);
    }

    let elapsed = started.elapsed().as_secs_f64();
    if config.recursive {
        info!(
            "Recursive shredding process completed. {:.6} seconds.",
            elapsed
        );
    } else {
        info!("File shredding process completed. {:.6} seconds.", elapsed);
    }
    println!("Shred completed at: {}", Local::now().format("%H:%M:%S"));

    if report::fatal() {
        ExitCode::from(EXIT_FAILURE)
    } else {
        ExitCode::SUCCESS
    }
}

/// Parse an argument vector. `Err` carries the message for an exit-1 report.
pub fn parse_arguments(args: &[String]) -> Result<CliRequest, ShredError> {
    let mut config = ShredConfig::default();
    let mut paths: Vec<PathBuf> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];

        if let Some(name) = arg.strip_prefix("--") {
            let lower = name.to_ascii_lowercase();
            let (option, inline_value) = match lower.split_once('=') {
                Some((option, value)) => (option.to_string(), Some(value.to_string())),
                None => (lower, None),
            };
            match option.as_str() {
                "help" => return Ok(CliRequest::Help),
                "full-help" => return Ok(CliRequest::FullHelp),
                "version" => return Ok(CliRequest::Version),
                "copyright" => return Ok(CliRequest::Copyright),
                "overwrite-count" => {
                    let value = match inline_value {
                        Some(value) => value,
                        None => {
                            i += 1;
                            args.get(i).cloned().ok_or_else(|| {
                                bad_argument("'--overwrite-count' requires a positive integer")
                            })?
                        }
                    };
                    config.passes = parse_passes(&value)?;
                }
                "recursive" => config.recursive = true,
                "keep-files" => config.keep_files = true,
                "verbose" => config.verbose = true,
                "follow-symlinks" => config.follow_symlinks = true,
                "secure" => config.secure = true,
                "dry" => config.dry_run = true,
                "no-verify" => config.verify = false,
                "force" => config.force = true,
                "internal" => config.internal = true,
                _ => return Err(bad_argument(&format!("Invalid option (--{}).", option))),
            }
        } else if arg.len() > 1 && arg.starts_with('-') {
            let bytes = arg.as_bytes();
            let mut j = 1;
            while j < bytes.len() {
                match bytes[j] as char {
                    'h' => return Ok(CliRequest::Help),
                    'H' => return Ok(CliRequest::FullHelp),
                    'V' => return Ok(CliRequest::Version),
                    'C' => return Ok(CliRequest::Copyright),
                    'n' => {
                        let mut end = j + 1;
                        while end < bytes.len() && bytes[end].is_ascii_digit() {
                            end += 1;
                        }
                        if end > j + 1 {
                            config.passes = parse_passes(&arg[j + 1..end])?;
                            j = end;
                            continue;
                        }
                        i += 1;
                        let value = args
                            .get(i)
                            .ok_or_else(|| bad_argument("'-n' flag requires a positive integer"))?;
                        config.passes = parse_passes(value)?;
                        j = bytes.len();
                        continue;
                    }
                    'r' => config.recursive = true,
                    'k' => config.keep_files = true,
                    'v' => config.verbose = true,
                    'e' => config.follow_symlinks = true,
                    's' => config.secure = true,
                    'd' => config.dry_run = true,
                    'c' => config.verify = false,
                    'f' => config.force = true,
                    flag => return Err(bad_argument(&format!("Invalid flag (-{}).", flag))),
                }
                j += 1;
            }
        } else {
            paths.push(PathBuf::from(arg));
        }
        i += 1;
    }

    if paths.is_empty() {
        return Err(bad_argument("Incorrect usage. Use '-h' for help"));
    }
    Ok(CliRequest::Run { config, paths })
}

fn bad_argument(message: &str) -> ShredError {
    ShredError::BadArgument(message.to_string())
}

fn parse_passes(value: &str) -> Result<u32, ShredError> {
    match value.parse::<u32>() {
        Ok(passes) if passes >= 1 => Ok(passes),
        _ => Err(bad_argument("'-n' flag requires a positive integer")),
    }
}

/// Print the configuration and target list, then ask for confirmation.
/// Anything but `y`/`yes` (case-insensitive) declines.
fn confirm_run(config: &ShredConfig, paths: &[PathBuf]) -> bool {
    println!(
        "Parameters:: Overwrites: {}, Recursive: {}, Keep_files: {}, Follow_symlinks: {}, Secure_mode: {}, Dry_run: {}, Verify: {}, Force: {}",
        config.passes,
        config.recursive,
        config.keep_files,
        config.follow_symlinks,
        config.secure,
        config.dry_run,
        config.verify,
        config.force
    );
    println!("Files: ");
    for path in paths {
        println!("{}", path.display());
    }
    println!();
    println!("Continue? (y/N)");

    let mut reply = String::new();
    if std::io::stdin().lock().read_line(&mut reply).is_err() {
        return false;
    }
    matches!(reply.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn print_help() {
    eprintln!("Usage: shredbox [OPTIONS] <file1> <file2> ...");
    eprintln!();
    eprintln!("Securely overwrite and remove files and directories.");
    eprintln!();
    eprintln!("OPTIONS");
    eprintln!("    -n <overwrites>       Set number of overwrites (default: 3)");
    eprintln!("    -r, --recursive       Shred directories and their contents");
    eprintln!("    -k, --keep-files      Keep files after overwriting (no removal)");
    eprintln!("    -v, --verbose         Enable verbose output for detailed logging");
    eprintln!("    -e, --follow-symlinks Follow symlinks during shredding");
    eprintln!("    -s, --secure          Secure shredding with the fixed pattern schedule");
    eprintln!("    -d, --dry             Show what would be shredded without processing");
    eprintln!("    -c, --no-verify       Skip post-shredding verification (faster)");
    eprintln!("    -f, --force           Attempt permission elevation on denied files");
    eprintln!("    -h, --help            This summary; see -H for the full description");
    eprintln!("    -H, --full-help       Full help in man-page format");
    eprintln!("    -V, --version         Print the version and exit");
    eprintln!("    -C, --copyright       Print copyright information and exit");
}

fn print_full_help() {
    eprintln!("NAME");
    eprintln!("    shredbox - Securely overwrite and remove files");
    eprintln!();
    eprintln!("SYNOPSIS");
    eprintln!("    shredbox [OPTIONS] <file1> <file2> ...");
    eprintln!();
    eprintln!("DESCRIPTION");
    eprintln!("    shredbox is a tool designed to securely overwrite and remove files and directories.");
    eprintln!("    By default, it overwrites the specified files with random data and removes them, ensuring that");
    eprintln!("    data is unrecoverable. The tool offers various options for customizing the shredding process.");
    eprintln!("    This tool almost conforms to DoD 5220.22-M when the '-s' flag is used without the '-c' flag.");
    eprintln!("    This program will exit 2 on this dialogue, 1 on failure, and 0 on success.");
    eprintln!();
    eprintln!("OPTIONS");
    eprintln!("    -n <overwrites>, --overwrite-count <overwrites>");
    eprintln!("        Specifies the number of overwriting passes. By default, 3 passes are performed, but you can");
    eprintln!("        increase this number for higher security. More passes will make the process slower.");
    eprintln!();
    eprintln!("    -r, --recursive");
    eprintln!("        Enables recursive mode. If set, the program will shred the contents of directories as well");
    eprintln!("        as the files themselves. Without this flag, only files are processed.");
    eprintln!();
    eprintln!("    -k, --keep-files");
    eprintln!("        If set, files will be overwritten with random data, but they will not be deleted. This");
    eprintln!("        option is useful to securely wipe a file's contents but retain the file itself.");
    eprintln!();
    eprintln!("    -v, --verbose");
    eprintln!("        Enables verbose output, printing detailed information about each step of the shredding");
    eprintln!("        process. Useful for confirming that the program is functioning as expected.");
    eprintln!();
    eprintln!("    -e, --follow-symlinks");
    eprintln!("        Follow symbolic links and include their targets in the shredding process. Without this");
    eprintln!("        flag, symlinks are ignored.");
    eprintln!();
    eprintln!("    -s, --secure");
    eprintln!("        Enables secure shredding with the fixed pattern schedule and interleaved randomization,");
    eprintln!("        making data recovery significantly more difficult. This mode is slower.");
    eprintln!();
    eprintln!("    -d, --dry");
    eprintln!("        Simulates the shredding process without performing any actual deletion. Use this to");
    eprintln!("        verify which files would be affected before running the program for real.");
    eprintln!();
    eprintln!("    -c, --no-verify");
    eprintln!("        Disables the post-shredding file verification. Normally, the tool verifies that files");
    eprintln!("        have been overwritten, but this step can be skipped for faster operation.");
    eprintln!();
    eprintln!("    -f, --force");
    eprintln!("        When read or write permission is denied, attempt to widen permissions and clear blocking");
    eprintln!("        file attributes before shredding. Never escalates to another user.");
    eprintln!();
    eprintln!("EXAMPLES");
    eprintln!("    shredbox -n 5 -r -v -s file1.txt file2.txt directory1");
    eprintln!("        Overwrites 'file1.txt' and 'file2.txt' with 5 passes, recursively handles 'directory1',");
    eprintln!("        and uses secure mode with verbose output.");
    eprintln!();
    eprintln!("    shredbox -d file1.txt file2.txt");
    eprintln!("        Performs a dry run to show what would be shredded without actual deletion.");
}

fn print_copyright() {
    println!("shredbox {}", env!("CARGO_PKG_VERSION"));
    println!("Copyright (C) 2026 The shredbox authors.");
    println!("License GPLv3+: GNU GPL version 3 or later <https://gnu.org/licenses/gpl.html>.");
    println!("This is free software: you are free to change and redistribute it.");
    println!("There is NO WARRANTY, to the extent permitted by law.");
}
