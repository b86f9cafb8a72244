use std::env;
use std::fs;
use std::io::{self, Read, Write};
use std::process;

use grawk::{run_scan, run_substitution, BackendChoice, Options};

fn main() {
    let args: Vec<String> = env::args().collect();

    match run(&args[1..]) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("grawk: {}", e);
            process::exit(2);
        }
    }
}

fn run(args: &[String]) -> Result<i32, Box<dyn std::error::Error>> {
    let mut options = Options::new();
    let mut backend = BackendChoice::Auto;
    let mut pattern: Option<String> = None;
    let mut input_file: Option<String> = None;
    let mut replacement: Option<String> = None;

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];

        if arg == "--help" || arg == "-h" {
            print_help();
            return Ok(0);
        }

        if arg == "--version" {
            println!("grawk {}", env!("CARGO_PKG_VERSION"));
            return Ok(0);
        }

        if arg == "-i" {
            options.case_insensitive = true;
        } else if arg == "-v" {
            options.invert_match = true;
        } else if arg == "-n" {
            options.print_line_numbers = true;
        } else if arg == "-g" {
            options.global_substitution = true;
        } else if arg == "-F" {
            i += 1;
            if i >= args.len() {
                return Err("option -F requires an argument".into());
            }
            options.field_separator = Some(unescape(&args[i]));
        } else if let Some(fs) = arg.strip_prefix("-F") {
            options.field_separator = Some(unescape(fs));
        } else if arg == "-O" {
            i += 1;
            if i >= args.len() {
                return Err("option -O requires an argument".into());
            }
            options.output_field_separator = unescape(&args[i]);
        } else if arg == "-f" {
            i += 1;
            if i >= args.len() {
                return Err("option -f requires an argument".into());
            }
            options.requested_fields = parse_field_list(&args[i])?;
            options.extract_fields = true;
        } else if arg == "-s" {
            i += 1;
            if i >= args.len() {
                return Err("option -s requires an argument".into());
            }
            replacement = Some(args[i].clone());
            options.substitute = true;
        } else if arg == "--backend" {
            i += 1;
            if i >= args.len() {
                return Err("option --backend requires an argument".into());
            }
            backend = match args[i].as_str() {
                "cpu" => BackendChoice::Cpu,
                "gpu" => BackendChoice::Gpu,
                "auto" => BackendChoice::Auto,
                other => return Err(format!("unknown backend: {}", other).into()),
            };
        } else if arg == "--" {
            // End of options
            i += 1;
            for rest in &args[i..] {
                if pattern.is_none() {
                    pattern = Some(rest.clone());
                } else if input_file.is_none() {
                    input_file = Some(rest.clone());
                }
            }
            break;
        } else if arg.starts_with('-') && arg != "-" {
            return Err(format!("unknown option: {}", arg).into());
        } else if pattern.is_none() {
            // First non-option argument is the pattern
            pattern = Some(arg.clone());
        } else if input_file.is_none() {
            input_file = Some(arg.clone());
        } else {
            return Err(format!("unexpected argument: {}", arg).into());
        }

        i += 1;
    }

    let pattern = pattern.ok_or("no pattern provided")?;

    // Read the whole input up front; the engine consumes one byte slice.
    let input = match input_file.as_deref() {
        None | Some("-") => {
            let mut buf = Vec::new();
            io::stdin().lock().read_to_end(&mut buf)?;
            buf
        }
        Some(path) => fs::read(path)?,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Some(replacement) = replacement {
        let result = run_substitution(&input, pattern.as_bytes(), replacement.as_bytes(), &options)?;
        out.write_all(&result.output)?;
        return Ok(0);
    }

    let result = run_scan(&input, pattern.as_bytes(), &options, backend)?;

    for (idx, record) in result.matches.iter().enumerate() {
        if options.print_line_numbers {
            // 1-based for display, like awk's NR.
            write!(out, "{}:", record.line_num + 1)?;
        }

        if options.extract_fields {
            let fields: Vec<&grawk::FieldRecord> = result
                .fields
                .iter()
                .filter(|f| f.line_idx as usize == idx)
                .collect();
            let mut first = true;
            for &want in &options.requested_fields {
                let Some(field) = fields.iter().find(|f| f.field_idx == want) else {
                    continue;
                };
                if !first {
                    out.write_all(&options.output_field_separator)?;
                }
                out.write_all(field.text(&input, record))?;
                first = false;
            }
            out.write_all(b"\n")?;
        } else {
            out.write_all(record.line(&input))?;
            out.write_all(b"\n")?;
        }
    }

    // No match is not an error.
    Ok(0)
}

/// Translate `\t`, `\n` and `\\` in a separator argument.
fn unescape(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    let mut chars = s.bytes().peekable();
    while let Some(b) = chars.next() {
        if b == b'\\' {
            match chars.next() {
                Some(b't') => out.push(b'\t'),
                Some(b'n') => out.push(b'\n'),
                Some(b'\\') => out.push(b'\\'),
                Some(other) => out.push(other),
                None => out.push(b'\\'),
            }
        } else {
            out.push(b);
        }
    }
    out
}

fn parse_field_list(s: &str) -> Result<Vec<u32>, Box<dyn std::error::Error>> {
    s.split(',')
        .map(|part| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid field number: {}", part).into())
                .and_then(|n| {
                    if n == 0 {
                        Err("field numbers are 1-indexed".into())
                    } else {
                        Ok(n)
                    }
                })
        })
        .collect()
}

fn print_help() {
    println!(
        r#"Usage: grawk [OPTIONS] PATTERN [file]

Scan input line by line for PATTERN (a literal or an ERE-subset regex),
print matching lines or selected fields, or substitute matches.

Options:
  -i               Case-insensitive matching
  -v               Invert match: select non-matching lines
  -n               Prefix output lines with 1-based line numbers
  -F sep           Field separator (default: runs of spaces and tabs)
  -O sep           Output field separator (default: single space)
  -f list          Comma-separated 1-indexed fields to print (implies field
                   extraction)
  -s replacement   Substitute the first match with replacement
  -g               With -s, substitute every match
  --backend which  cpu, gpu, or auto (default: auto)
  --version        Print version information
  --help           Print this help message

Examples:
  grawk error log.txt
  grawk -v -i 'debug' log.txt
  grawk -F: -f 1,3 '' /etc/passwd
  grawk -s universe -g world greeting.txt
  grawk '[0-9]+' data.txt"#
    );
}
