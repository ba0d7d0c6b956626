use anyhow::Result;
use edlists::{pipeline::DEFAULT_BRICK_DIR, validate::validate_default_brick};
use std::{env, path::PathBuf, process::exit};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Usage: validate_brick [BRICK_DIR] [--json]
    let args: Vec<String> = env::args().skip(1).collect();
    let json = args.iter().any(|a| a == "--json");
    let brick_dir = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BRICK_DIR));

    let report = validate_default_brick(&brick_dir);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for c in &report.checks {
            println!(
                "{} {:<18} {:<40} {}",
                if c.passed { "PASS" } else { "FAIL" },
                c.check,
                c.dataset.as_deref().unwrap_or("-"),
                c.detail
            );
        }
        println!(
            "\n{} checks, {} failed, {} rows total",
            report.checks.len(),
            report.failures().count(),
            report.total_rows
        );
    }

    if !report.is_success() {
        exit(1);
    }
    Ok(())
}
