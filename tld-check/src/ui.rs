//! Display logic for the tld-check CLI.
//!
//! Colored result lines, grouped `--pretty` output, the stderr spinner,
//! headers and summaries. Uses only the `console` crate.

use console::{pad_str, style, Alignment, Term};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tld_check_lib::{DomainCheckResponse, DomainCheckResult};

const DOMAIN_WIDTH: usize = 30;

// ── Spinner ──────────────────────────────────────────────────────────────────

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// An async braille-dot spinner that writes to stderr so stdout stays clean.
pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Spinner {
    /// Start a new spinner with the given message (e.g. "Checking 6 domains...").
    pub fn start(message: String) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let handle = tokio::spawn(async move {
            let term = Term::stderr();
            let mut idx = 0usize;
            while running_clone.load(Ordering::Relaxed) {
                let frame = SPINNER_FRAMES[idx % SPINNER_FRAMES.len()];
                let _ = term.clear_line();
                let _ = term.write_str(&format!("{} {}", style(frame).cyan(), message));
                idx += 1;
                tokio::time::sleep(Duration::from_millis(80)).await;
            }
            let _ = term.clear_line();
        });

        Self {
            running,
            handle: Some(handle),
        }
    }

    /// Stop the spinner and clear the line.
    pub async fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.await;
        }
    }
}

// ── Status ───────────────────────────────────────────────────────────────────

/// What a result line should say about a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Available,
    /// Reported available because the lookup failed
    Unverified,
    Taken,
    /// Lookup failed and the run was strict
    Unknown,
}

/// Classify a flattened result for display.
pub fn status(result: &DomainCheckResult) -> Status {
    match (result.available, result.lookup_failed) {
        (true, false) => Status::Available,
        (true, true) => Status::Unverified,
        (false, false) => Status::Taken,
        (false, true) => Status::Unknown,
    }
}

// ── Header ───────────────────────────────────────────────────────────────────

/// Print a styled header at the start of a pretty run.
pub fn print_header(keyword: &str, tld_count: usize, concurrency: usize) {
    println!(
        "{} {} {}",
        style("tld-check").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
        style(format!(
            "- Checking '{}' across {} TLD{}",
            keyword,
            tld_count,
            if tld_count == 1 { "" } else { "s" }
        ))
        .dim(),
    );
    println!(
        "{}",
        style(format!("Concurrency: {}", concurrency)).dim()
    );
    println!();
}

// ── Single result line ───────────────────────────────────────────────────────

/// Format and print a single domain result with colors and alignment.
pub fn print_result(result: &DomainCheckResult, show_info: bool, debug: bool) {
    let padded_domain = pad_str(&result.domain, DOMAIN_WIDTH, Alignment::Left, Some(".."));

    match status(result) {
        Status::Available => {
            println!(
                "  {}  {}",
                style(&padded_domain).white(),
                style("AVAILABLE").green().bold(),
            );
        }
        Status::Unverified => {
            println!(
                "  {}  {}  {}",
                style(&padded_domain).white(),
                style("AVAILABLE?").green(),
                style(brief_error(result)).dim(),
            );
        }
        Status::Taken => {
            println!(
                "  {}  {}{}",
                style(&padded_domain).white(),
                style("TAKEN").red().bold(),
                info_suffix(result, show_info),
            );
        }
        Status::Unknown => {
            println!(
                "  {}  {}  {}",
                style(&padded_domain).white(),
                style("UNKNOWN").yellow(),
                style(brief_error(result)).dim(),
            );
        }
    }

    if debug {
        print_message(result, "    ");
    }
}

// ── Grouped output ───────────────────────────────────────────────────────────

/// Print results grouped by status: Available, Taken, Unknown.
/// Empty sections are omitted entirely.
pub fn print_grouped_results(results: &[DomainCheckResult], show_info: bool, debug: bool) {
    let mut available: Vec<&DomainCheckResult> = Vec::new();
    let mut taken: Vec<&DomainCheckResult> = Vec::new();
    let mut unknown: Vec<&DomainCheckResult> = Vec::new();

    for r in results {
        match status(r) {
            Status::Available | Status::Unverified => available.push(r),
            Status::Taken => taken.push(r),
            Status::Unknown => unknown.push(r),
        }
    }

    if !available.is_empty() {
        println!(
            "  {} {}",
            style(format!("── Available ({}) ", available.len()))
                .green()
                .bold(),
            style("─".repeat(40)).green().dim(),
        );
        for r in &available {
            print_grouped_line(r, show_info, debug);
        }
        println!();
    }

    if !taken.is_empty() {
        println!(
            "  {} {}",
            style(format!("── Taken ({}) ", taken.len())).red().bold(),
            style("─".repeat(44)).red().dim(),
        );
        for r in &taken {
            print_grouped_line(r, show_info, debug);
        }
        println!();
    }

    if !unknown.is_empty() {
        println!(
            "  {} {}",
            style(format!("── Unknown ({}) ", unknown.len()))
                .yellow()
                .bold(),
            style("─".repeat(40)).yellow().dim(),
        );
        for r in &unknown {
            print_grouped_line(r, show_info, debug);
        }
        println!();
    }
}

/// Print a single line inside a grouped section.
fn print_grouped_line(result: &DomainCheckResult, show_info: bool, debug: bool) {
    let padded = pad_str(&result.domain, DOMAIN_WIDTH, Alignment::Left, Some(".."));

    match status(result) {
        Status::Available => println!("    {}", style(&padded).white()),
        Status::Taken => println!(
            "    {}{}",
            style(&padded).white(),
            info_suffix(result, show_info)
        ),
        Status::Unverified | Status::Unknown => println!(
            "    {}  {}",
            style(&padded).white(),
            style(brief_error(result)).dim()
        ),
    }

    if debug {
        print_message(result, "      ");
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print the final summary bar with colored counts.
pub fn print_summary(response: &DomainCheckResponse, duration: Duration) {
    let total = response.total_checked;
    let (mut available, mut taken, mut unknown) = (0usize, 0usize, 0usize);
    for result in &response.results {
        match status(result) {
            Status::Available | Status::Unverified => available += 1,
            Status::Taken => taken += 1,
            Status::Unknown => unknown += 1,
        }
    }

    println!();
    println!(
        "  {}",
        style("────────────────────────────────────────────────────").dim()
    );
    println!(
        "  {} domain{} in {:.1}s  {}  {}  {}  {}  {}  {}",
        style(total).bold(),
        if total == 1 { "" } else { "s" },
        duration.as_secs_f64(),
        style("|").dim(),
        style(format!("{} available", available)).green(),
        style("|").dim(),
        style(format!("{} taken", taken)).red(),
        style("|").dim(),
        style(format!("{} unknown", unknown)).yellow(),
    );
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Format registration details (registrar, dates, status, nameservers)
/// into a concise string.
pub fn format_registration(result: &DomainCheckResult) -> String {
    let mut parts = Vec::new();
    if let Some(registrar) = &result.registrar {
        parts.push(format!("Registrar: {}", registrar));
    }
    if let Some(created) = &result.registration_date {
        parts.push(format!("Created: {}", created));
    }
    if let Some(expires) = &result.expiration_date {
        parts.push(format!("Expires: {}", expires));
    }
    if !result.status.is_empty() {
        parts.push(format!("Status: {}", result.status.join(", ")));
    }
    if !result.nameservers.is_empty() {
        parts.push(format!("NS: {}", result.nameservers.join(", ")));
    }
    if parts.is_empty() {
        "No info available".to_string()
    } else {
        parts.join(", ")
    }
}

fn info_suffix(result: &DomainCheckResult, show_info: bool) -> String {
    if show_info {
        format!("  {}", style(format_registration(result)).dim())
    } else {
        String::new()
    }
}

fn print_message(result: &DomainCheckResult, indent: &str) {
    if let Some(message) = &result.message {
        println!("{}{} {}", indent, style("└─").dim(), style(message).dim());
    }
}

/// Extract a brief failure reason from a result whose lookup failed.
fn brief_error(result: &DomainCheckResult) -> &'static str {
    match &result.message {
        Some(msg) => {
            let m = msg.to_lowercase();
            if m.contains("timeout") || m.contains("timed out") {
                "(timeout)"
            } else if m.contains("rate limit") {
                "(rate limited)"
            } else if m.contains("network") || m.contains("dns") || m.contains("connect") {
                "(network error)"
            } else if m.contains("parse") || m.contains("json") {
                "(parsing error)"
            } else if m.contains("http ") {
                "(registry error)"
            } else {
                "(error)"
            }
        }
        None => "(unknown status)",
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
