// Imports
//      Standard library
use std::ffi::OsString;
use std::fs;
use std::io;
use std::io::Write;
use std::path::PathBuf;
use std::process::exit;
//      Argument parsing and logging
use clap::error::ErrorKind;
use clap::{Arg, ArgAction, Command};
use tracing::{info, Level};
//      The library
use lilc::{parse_program, unparse, Error};

/*
The formatter is controlled from the driver structure.
It is initialized with the program args, then the run method reads, parses and prints the file.
*/

enum Mode {
    Unparse,
    Parse,
    Check,
}

struct Driver {
    mode: Mode,
    input: PathBuf,
    output: Option<PathBuf>,
    verbosity: u8,
}

impl Driver {
    fn from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let arg_input = Arg::new("INPUT")
            .help("Name of the source file to use")
            .required(true)
            .index(1);
        let arg_output = Arg::new("output")
            .short('o')
            .long("output")
            .value_name("FILE")
            .help("Write the result to FILE instead of stdout");
        let arg_parse_only = Arg::new("parse-only")
            .long("parse-only")
            .action(ArgAction::SetTrue)
            .help("Only parse the source file and dump the tree");
        let arg_check = Arg::new("check")
            .long("check")
            .action(ArgAction::SetTrue)
            .help("Check that the canonical text reads back as the same tree")
            .conflicts_with("parse-only");
        let arg_verbose = Arg::new("verbose")
            .short('v')
            .action(ArgAction::Count)
            .help("Log more (repeat for more detail)");
        let app = Command::new("lilc")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Prints LIL'C source files in canonical form")
            .arg(arg_input)
            .arg(arg_output)
            .arg(arg_parse_only)
            .arg(arg_check)
            .arg(arg_verbose);

        let matches = app.try_get_matches_from(args)?;
        let input = matches.get_one::<String>("INPUT").cloned().unwrap_or_default();
        let mode = if matches.get_flag("parse-only") {
            Mode::Parse
        } else if matches.get_flag("check") {
            Mode::Check
        } else {
            Mode::Unparse
        };

        Ok(Driver{
            mode: mode,
            input: PathBuf::from(input),
            output: matches.get_one::<String>("output").map(PathBuf::from),
            verbosity: matches.get_count("verbose"),
        })
    }

    fn level(&self) -> Level {
        match self.verbosity {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    fn run(self) -> i32 {
        match self.execute() {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("{}: {}", self.input.display(), e);
                e.exit_code()
            }
        }
    }

    fn execute(&self) -> Result<(), Error> {
        let src = fs::read_to_string(&self.input).map_err(|e| Error::Io{path: self.input.clone(), source: e})?;
        let program = parse_program(&src)?;
        info!(file = %self.input.display(), decls = program.decls.len(), "parsed");

        match self.mode {
            Mode::Parse => self.emit(&format!("{:#?}\n", program)),
            Mode::Check => {
                let mut text = String::new();
                unparse(&program, &mut text)?;
                if parse_program(&text)? != program {
                    return Err(Error::RoundTrip{path: self.input.clone()});
                }
                info!(file = %self.input.display(), "canonical text reads back identically");
                Ok(())
            }
            Mode::Unparse => {
                let mut text = String::new();
                unparse(&program, &mut text)?;
                self.emit(&text)
            }
        }
    }

    fn emit(&self, text: &str) -> Result<(), Error> {
        match self.output {
            Some(ref path) => fs::write(path, text).map_err(|e| Error::Io{path: path.clone(), source: e}),
            None => io::stdout()
                .write_all(text.as_bytes())
                .map_err(|e| Error::Io{path: PathBuf::from("<stdout>"), source: e}),
        }
    }
}

fn main() {
    // Get an initialized driver or error out
    let driver = match Driver::from_args(std::env::args_os()) {
        Ok(d) => d,
        Err(e) => {
            let _ = e.print();
            match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => exit(0),
                _ => exit(-1),
            }
        }
    };
    tracing_subscriber::fmt()
        .with_max_level(driver.level())
        .with_target(false)
        .with_writer(io::stderr)
        .init();
    exit(driver.run())
}
