use std::env;
use std::process::ExitCode;

use argot::{
    argument, choices, conditional, constant, flag, from_str, merge, object, option, parse_async,
    BoxFuture, Message, Mode, Parser, Suggestion, ValueParser,
};

const SERVICES: [&str; 3] = ["api", "worker", "web"];

/// Resolves a service name against the (pretend) deployment registry.
///
/// Stands in for the control-plane lookup a real deploy tool performs; the
/// conversion suspends, which turns the whole tree async.
struct ServiceName;

impl ValueParser for ServiceName {
    type Value = String;

    fn mode(&self) -> Mode {
        Mode::Async
    }

    fn parse(&self, _token: &str) -> Result<String, Message> {
        Err(Message::from("requires asynchronous execution"))
    }

    fn parse_async<'f>(&'f self, token: &'f str) -> BoxFuture<'f, Result<String, Message>>
    where
        Self::Value: 'f,
    {
        Box::pin(async move {
            // A real implementation would query the registry here.
            if SERVICES.contains(&token) {
                Ok(token.to_string())
            } else {
                Err(Message::new()
                    .text("no service named")
                    .value(token)
                    .text("in the registry"))
            }
        })
    }

    fn format(&self, value: &String) -> String {
        value.clone()
    }

    fn suggest(&self, prefix: &str) -> Vec<Suggestion> {
        SERVICES
            .iter()
            .copied()
            .filter(|name| name.starts_with(prefix))
            .map(Suggestion::literal)
            .collect()
    }
}

fn parser() -> impl Parser<Value = (String, bool, String, u32)> {
    let common = object((
        argument("SERVICE", ServiceName),
        flag(["--dry-run"]).with_default(false),
    ));

    // `up` takes a replica count; `down` always lands on zero.
    let action = conditional(argument("ACTION", choices(["up", "down"])))
        .branch(
            "up",
            option(["--replicas"], from_str::<u32>())
                .with_default(1)
                .boxed(),
        )
        .branch("down", constant(0u32).boxed());

    merge(common, action)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let tokens: Vec<String> = env::args().skip(1).collect();

    match parse_async(&parser(), tokens).await {
        Ok((service, dry_run, action, replicas)) => {
            let plan = match action.as_str() {
                "up" => format!("scale `{service}` to {replicas}"),
                _ => format!("stop `{service}`"),
            };
            if dry_run {
                println!("would {plan}");
            } else {
                println!("{plan}");
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}
