//! Output Formatting

use pp_api::dto::HealthResponse;
use pp_api::IssuedToken;
use serde::Serialize;

use crate::commands::OutputFormat;

fn print_json<T: Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error formatting JSON: {}", e),
    }
}

pub fn print_health(health: &HealthResponse, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(health),
        OutputFormat::Plain => println!("{}", health.status),
        OutputFormat::Table => {
            println!("People Power Health");
            println!("===================");
            println!("Status:   {}", colorize_status(&health.status));
            println!("Version:  {}", health.version);
            println!("Uptime:   {}s", health.uptime_secs);
            println!("Requests: {}", health.total_requests);
            println!();
            println!("Components:");
            for component in &health.components {
                print!("  - {}: {}", component.name, colorize_status(&component.status));
                if let Some(msg) = &component.message {
                    print!(" ({})", msg);
                }
                println!();
            }
        }
    }
}

pub fn print_token(token: &IssuedToken, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(token),
        OutputFormat::Plain => println!("{}", token.token),
        OutputFormat::Table => {
            println!("Token:   {}", token.token);
            println!("Expires: {}", token.expires_at);
        }
    }
}

fn colorize_status(status: &str) -> String {
    match status {
        "healthy" => format!("\x1b[32m{}\x1b[0m", status),
        "degraded" => format!("\x1b[33m{}\x1b[0m", status),
        _ => format!("\x1b[31m{}\x1b[0m", status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorize_status() {
        assert!(colorize_status("healthy").contains("32m"));
        assert!(colorize_status("unhealthy").contains("31m"));
    }
}
