use std::fmt;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use api::{ApiConfig, RestPlatform};
use exam_core::model::{QuestionBody, TopicId};
use services::{
    QuestionForm, Redirect, SessionController, SessionPhase, SessionResolver, StaticAuth,
    SubmitError,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    MissingBaseUrl,
    MissingTopic,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::MissingBaseUrl => {
                write!(f, "no API base url (use --base-url or EXAM_API_URL)")
            }
            ArgsError::MissingTopic => write!(f, "no topic (use --topic or EXAM_TOPIC_ID)"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- --topic <id> [--base-url <url>] [--token <token>]");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_API_URL, EXAM_TOPIC_ID, EXAM_API_TOKEN");
}

struct Args {
    base_url: String,
    topic: TopicId,
    token: Option<String>,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut base_url = std::env::var("EXAM_API_URL").ok().filter(|v| !v.is_empty());
        let mut topic = std::env::var("EXAM_TOPIC_ID").ok().filter(|v| !v.is_empty());
        let mut token = std::env::var("EXAM_API_TOKEN").ok().filter(|v| !v.is_empty());

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--base-url" => {
                    base_url = Some(require_value(&mut args, "--base-url")?);
                }
                "--topic" => {
                    topic = Some(require_value(&mut args, "--topic")?);
                }
                "--token" => {
                    token = Some(require_value(&mut args, "--token")?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            base_url: base_url.ok_or(ArgsError::MissingBaseUrl)?,
            topic: TopicId::new(topic.ok_or(ArgsError::MissingTopic)?),
            token,
        })
    }
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn read_line(prompt: &str) -> io::Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Reads source lines until a single `.` line; empty input keeps the seed.
fn read_source(seed: &str) -> io::Result<String> {
    println!("Enter your solution, end with a single '.' line (empty keeps the template):");
    let mut lines = Vec::new();
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if line == "." {
            break;
        }
        lines.push(line);
    }
    if lines.is_empty() {
        Ok(seed.to_string())
    } else {
        Ok(lines.join("\n"))
    }
}

fn present_question(controller: &SessionController) {
    let Some(question) = controller.current_question() else {
        return;
    };
    let progress = controller.progress();
    println!();
    println!(
        "── Question {}/{} ── {}",
        controller.current_index() + 1,
        progress.total,
        question.title()
    );
    println!("{}", question.content());
    if let QuestionBody::MultipleChoice { options } = question.body() {
        for option in options {
            println!("  [{}] {}", option.id(), option.text());
        }
    }
}

async fn answer_current(controller: &SessionController) -> Result<(), Box<dyn std::error::Error>> {
    let Some(mut form) = controller.current_form() else {
        return Ok(());
    };

    let payload = loop {
        match &mut form {
            QuestionForm::Choice(choice) => {
                let picked = read_line("Your choice: ")?;
                if let Err(err) = choice.select(picked.as_str().into()) {
                    println!("{err}");
                    continue;
                }
            }
            QuestionForm::Code(code) => {
                if let Some(solution) = code.reference_solution() {
                    tracing::debug!(chars = solution.len(), "reference solution available");
                }
                let source = read_source(code.source())?;
                code.set_source(source)?;
            }
        }
        match form.collect_answer() {
            Ok(payload) => break payload,
            Err(err) => println!("{err}"),
        }
    };

    match controller.submit(payload).await {
        Ok(outcome) => {
            if outcome.feedback.is_correct {
                println!("Correct.");
            } else {
                println!("Incorrect.");
            }
            if let Some(explanation) = &outcome.feedback.explanation {
                println!("{explanation}");
            }
        }
        // Recoverable: the question stays answerable, everything else bubbles.
        Err(SubmitError::Evaluation(source)) => {
            println!("Grading failed ({source}); answer again to retry.");
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

async fn drive_session(
    controller: &SessionController,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        match controller.phase() {
            SessionPhase::AwaitingAnswer => {
                present_question(controller);
                answer_current(controller).await?;
            }
            SessionPhase::Reviewing => {
                read_line("Press Enter for the next question... ")?;
                controller.advance()?;
            }
            SessionPhase::Completed => return Ok(()),
            phase => {
                return Err(format!("unexpected session phase: {phase}").into());
            }
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse(std::env::args().skip(1)).map_err(|err| {
        eprintln!("{err}");
        print_usage();
        err
    })?;

    let config = ApiConfig::new(&args.base_url, args.token)?;
    let platform = Arc::new(RestPlatform::new(config));
    let resolver = SessionResolver::new(platform.clone(), Arc::new(StaticAuth(true)));

    let origin = format!("/topics/{}/test", args.topic);
    let session_ref = match resolver.resolve(&args.topic).await {
        Ok(session_ref) => session_ref,
        Err(err) => {
            match Redirect::for_resolve_error(&err, &origin) {
                Redirect::Login { return_to } => {
                    eprintln!("Not signed in; log in and return to {return_to}.");
                }
                Redirect::TestListing => {
                    eprintln!("No test available for this topic; see the test listing.");
                }
                Redirect::ErrorPage => {
                    eprintln!("Could not start a test session; try again later.");
                }
            }
            return Err(err.into());
        }
    };

    let controller = SessionController::new(platform);
    controller.start(&session_ref).await?;
    drive_session(&controller).await?;

    if let Some(report) = controller.report() {
        println!();
        println!(
            "Session complete: {}/{} correct.",
            report.correct(),
            report.total()
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
