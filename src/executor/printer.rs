use colored::{Color, Colorize};
use serde_json::Value;

use crate::error::HttpResponseError;

use super::models::RequestOutcome;

fn status_color(status: u16) -> Color {
    if status >= 400 {
        Color::Red
    } else if status >= 300 {
        Color::Yellow
    } else {
        Color::Green
    }
}

pub fn print_outcome(outcome: &RequestOutcome) {
    println!(
        "{} {}",
        outcome.request.method.bold(),
        outcome.request.url.cyan()
    );
    println!(
        "{} {} {}",
        "Status:".bold(),
        format!("{}", outcome.status).color(status_color(outcome.status)),
        format!("({:.1} ms)", outcome.duration_ms).dimmed()
    );

    if outcome.request.body_bytes > 0 {
        println!(
            "{} {}",
            "Request body:".bold(),
            format!("{} bytes", outcome.request.body_bytes).dimmed()
        );
    }

    println!("{}", "Result".bold());
    println!("{}", pretty_json(&Value::Object(outcome.result.clone())));
}

pub fn print_response_error(error: &HttpResponseError) {
    eprintln!(
        "{} {}",
        "Status:".bold(),
        format!("{}", error.status).color(status_color(error.status))
    );
    for (name, value) in &error.headers {
        eprintln!("  {}: {}", name.cyan(), value.dimmed());
    }
    if !error.body.is_empty() {
        eprintln!("{}", error.body);
    }
}

pub(crate) fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
