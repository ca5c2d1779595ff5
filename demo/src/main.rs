//! formkit signup demo
//!
//! Plays the part of the view for the signup form: fills in the fields from
//! the command line, submits against a simulated endpoint and prints the form
//! after every step.
//!
//! Usage:
//!   formkit-demo --password longenough
//!   formkit-demo --email bad-email --password longpassword
//!   formkit-demo --password longenough --taken test@email.com
//!   formkit-demo --password longenough --double-submit

use anyhow::{Context, Result};
use clap::Parser;
use formkit_demo::{describe, format_frames, run_session, signup_form, Frame, SimulatedEndpoint};
use formkit_form::{FormConfig, FormEvent, FormView, UnexpectedFailurePolicy};
use formkit_schema::{EMAIL_FIELD, PASSWORD_FIELD};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "formkit-demo")]
#[command(about = "Drive the formkit signup form against a simulated endpoint")]
struct Args {
    /// Email to type into the form (defaults to the pre-filled value)
    #[arg(short, long)]
    email: Option<String>,

    /// Password to type into the form
    #[arg(short, long, default_value = "")]
    password: String,

    /// Path to a TOML form configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Simulated endpoint latency in milliseconds
    #[arg(long, default_value = "1000")]
    delay_ms: u64,

    /// Emails the endpoint reports as already registered
    #[arg(long)]
    taken: Vec<String>,

    /// Make the endpoint fail with an unexpected error
    #[arg(long)]
    unreachable: bool,

    /// Show unexpected failures on the form instead of swallowing them
    #[arg(long)]
    surface_failures: bool,

    /// Fire a second submit while the first is in flight
    #[arg(long)]
    double_submit: bool,

    /// Print frames as a JSON array (logs go to stderr)
    #[arg(long)]
    json: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let mut config = match &args.config {
        Some(path) => FormConfig::load(path)
            .with_context(|| format!("Failed to load form config {}", path.display()))?,
        None => FormConfig::default(),
    };
    if args.surface_failures {
        config.unexpected_failure = UnexpectedFailurePolicy::Root;
    }

    let form = signup_form(config).context("Failed to create signup form")?;
    let view = FormView::signup();
    info!(form_id = %form.id(), "signup form ready");

    let mut endpoint = SimulatedEndpoint::new(Duration::from_millis(args.delay_ms));
    for email in &args.taken {
        endpoint = endpoint.with_taken(email.clone());
    }
    if args.unreachable {
        endpoint = endpoint.unreachable();
    }

    let mut inputs = Vec::new();
    if let Some(email) = &args.email {
        inputs.push(FormEvent::input(EMAIL_FIELD, email.clone()));
    }
    inputs.push(FormEvent::input(PASSWORD_FIELD, args.password.clone()));

    let mut frames = run_session(&form, &view, inputs, &endpoint).await?;

    // Re-render while the submission is in flight. Text mode only, so
    // `--json` stdout stays a single document.
    let watcher = (!args.json).then(|| {
        let mut rx = form.subscribe();
        let form = form.clone();
        let view = view.clone();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let submitting = rx.borrow_and_update().state.is_submitting();
                if submitting {
                    debug!("submission in flight");
                    println!("{}\n", view.render(&form));
                }
            }
        })
    });

    let submit = describe(&view, &FormEvent::Submit);
    if args.double_submit {
        let (first, second) = tokio::join!(form.submit(&endpoint), form.submit(&endpoint));
        for outcome in [first, second] {
            frames.push(Frame {
                event: submit.clone(),
                outcome: Some(outcome),
                rendered: view.render(&form),
            });
        }
    } else {
        frames.extend(run_session(&form, &view, vec![FormEvent::Submit], &endpoint).await?);
    }
    if let Some(watcher) = watcher {
        watcher.abort();
    }

    print!("{}", format_frames(&frames, args.json)?);
    if args.json {
        println!();
    }

    Ok(())
}
