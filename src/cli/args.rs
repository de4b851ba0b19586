//! Command-line argument parsing for the glossa CLI.

/// Default number of passages retrieved for a document query.
pub const DEFAULT_TOP_K: u32 = 5;

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Explain a term, streaming the answer; optionally save it
    Ask { term: String, save: bool },
    /// List saved vocabulary entries
    List,
    /// Show an entry and count a review
    Review { id: String },
    /// Delete an entry
    Remove { id: String },
    /// Check that the backend is reachable
    Health,
    /// Upload a document for the document pipeline
    Upload { path: String, team_key: String },
    /// Ask a question against uploaded documents
    Query { question: String, top_k: u32 },
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Arguments could not be understood
    Invalid(String),
}

/// Parse command-line arguments and return the appropriate command.
///
/// # Examples
///
/// ```
/// use glossa::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["glossa".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), CliCommand::Version);
/// ```
pub fn parse_args<I>(args: I) -> CliCommand
where
    I: Iterator<Item = String>,
{
    // Skip the program name
    let mut args = args.skip(1);
    let Some(command) = args.next() else {
        return CliCommand::Help;
    };
    let rest: Vec<String> = args.collect();

    match command.as_str() {
        "--version" | "-V" | "version" => CliCommand::Version,
        "--help" | "-h" | "help" => CliCommand::Help,
        "ask" => {
            let save = rest.iter().any(|a| a == "--save" || a == "-s");
            let term = words(&rest, &["--save", "-s"]);
            if term.is_empty() {
                CliCommand::Invalid("ask needs a term".to_string())
            } else {
                CliCommand::Ask { term, save }
            }
        }
        "list" => CliCommand::List,
        "review" => single(&rest, "review").map_or_else(CliCommand::Invalid, |id| CliCommand::Review { id }),
        "remove" => single(&rest, "remove").map_or_else(CliCommand::Invalid, |id| CliCommand::Remove { id }),
        "health" => CliCommand::Health,
        "upload" => {
            let Some(team_key) = flag_value(&rest, "--team").filter(|k| !k.trim().is_empty()) else {
                return CliCommand::Invalid("upload needs --team <key>".to_string());
            };
            let positional: Vec<&String> = positional(&rest, &["--team"]);
            match positional.as_slice() {
                [path] => CliCommand::Upload {
                    path: path.to_string(),
                    team_key,
                },
                _ => CliCommand::Invalid("upload needs exactly one file".to_string()),
            }
        }
        "query" => {
            let top_k = match flag_value(&rest, "--top-k") {
                Some(v) => match v.parse() {
                    Ok(k) => k,
                    Err(_) => return CliCommand::Invalid(format!("invalid --top-k value: {}", v)),
                },
                None => DEFAULT_TOP_K,
            };
            let question = positional(&rest, &["--top-k"])
                .into_iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" ");
            if question.is_empty() {
                CliCommand::Invalid("query needs a question".to_string())
            } else {
                CliCommand::Query { question, top_k }
            }
        }
        other => CliCommand::Invalid(format!("unknown command: {}", other)),
    }
}

/// Join the arguments into one phrase, dropping the given switches.
fn words(args: &[String], switches: &[&str]) -> String {
    args.iter()
        .filter(|a| !switches.contains(&a.as_str()))
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Arguments that are neither one of `options` nor an option's value.
fn positional<'a>(args: &'a [String], options: &[&str]) -> Vec<&'a String> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
        } else if options.contains(&arg.as_str()) {
            skip_next = true;
        } else {
            out.push(arg);
        }
    }
    out
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn single(args: &[String], command: &str) -> Result<String, String> {
    match args {
        [id] => Ok(id.clone()),
        _ => Err(format!("{} needs exactly one entry id", command)),
    }
}

/// Usage text printed for `help` and after invalid arguments.
pub const USAGE: &str = "\
Usage: glossa <command>

Commands:
  ask <term> [--save]              explain a term, optionally saving the answer
  list                             list saved entries
  review <id>                      show a saved entry and count a review
  remove <id>                      delete a saved entry
  health                           check the backend
  upload <file> --team <key>       upload a document
  query <question> [--top-k <n>]   ask about uploaded documents
  version                          print the version";
