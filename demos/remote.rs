use std::env;
use std::process::ExitCode;

use argot::{
    argument, command, flag, longest_match, object, parse, string, suggest, usage_line, Parser,
};

enum Invocation {
    List { verbose: bool },
    Add { name: String, url: String, fetch: bool },
    Remove { name: String },
}

fn parser() -> impl Parser<Value = Invocation> {
    // The bare-invocation branch goes first: an empty command line completes
    // through it.
    longest_match!(
        object((flag(["--verbose", "-v"]).with_default(false),))
            .map(|(verbose,)| Invocation::List { verbose }),
        command(
            "add",
            object((
                argument("NAME", string()),
                argument("URL", string()),
                flag(["--fetch", "-f"]).with_default(false),
            )),
        )
        .help("Track a new remote")
        .map(|(name, url, fetch)| Invocation::Add { name, url, fetch }),
        command("remove", object((argument("NAME", string()),)))
            .help("Stop tracking a remote")
            .map(|(name,)| Invocation::Remove { name }),
    )
}

fn main() -> ExitCode {
    let mut tokens: Vec<String> = env::args().skip(1).collect();

    // Hook for shell completion scripts: `remote --complete <words..>`
    // prints one candidate per line for the trailing word.
    if tokens.first().map(String::as_str) == Some("--complete") {
        tokens.remove(0);
        for candidate in suggest(&parser(), tokens) {
            println!("{candidate}");
        }
        return ExitCode::SUCCESS;
    }

    match parse(&parser(), tokens) {
        Ok(Invocation::List { verbose }) => {
            if verbose {
                println!("origin\tgit@example.com:demo.git");
            } else {
                println!("origin");
            }
            ExitCode::SUCCESS
        }
        Ok(Invocation::Add { name, url, fetch }) => {
            println!("added remote `{name}` at {url}");
            if fetch {
                println!("fetching `{name}`..");
            }
            ExitCode::SUCCESS
        }
        Ok(Invocation::Remove { name }) => {
            println!("removed remote `{name}`");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{error}");
            eprintln!("usage: remote {}", usage_line(&parser().usage()));
            ExitCode::FAILURE
        }
    }
}
