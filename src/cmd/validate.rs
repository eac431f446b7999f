//! `fmp-relay validate`: check a route file without serving it.
//!
//! Parse errors abort immediately. Validation problems are printed in
//! full (text or JSON) before the command fails, so an editor
//! integration can show every one at once.

use serde::Serialize;

use crate::cli::{ValidateArgs, ValidateFormat};
use crate::config::model::RouteTable;
use crate::config::{sources, validation};
use crate::error::{RelayError, ValidationError};

#[derive(Serialize)]
struct Problem<'a> {
    route: &'a str,
    field: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Report<'a> {
    Valid {
        valid: bool,
        routes: usize,
        fan_out: usize,
    },
    Invalid {
        valid: bool,
        errors: Vec<Problem<'a>>,
    },
}

impl<'a> Report<'a> {
    fn valid(table: &RouteTable) -> Self {
        Self::Valid {
            valid: true,
            routes: table.routes.len(),
            fan_out: table.routes.iter().filter(|r| r.fan_out).count(),
        }
    }

    fn invalid(errors: &'a [ValidationError]) -> Self {
        Self::Invalid {
            valid: false,
            errors: errors
                .iter()
                .map(|e| Problem {
                    route: &e.route,
                    field: &e.field,
                    message: &e.message,
                    suggestion: e.suggestion.as_deref(),
                })
                .collect(),
        }
    }
}

pub async fn execute(args: &ValidateArgs) -> Result<(), RelayError> {
    let display = args.routes.display().to_string();

    match sources::load_route_file(&args.routes).await {
        Ok(table) => {
            match args.format {
                ValidateFormat::Text => println!(
                    "\u{2713} {}",
                    validation::format_validation_report(&display, &table)
                ),
                ValidateFormat::Json => print_json(&Report::valid(&table)),
            }
            Ok(())
        }
        Err(RelayError::RouteValidation { errors }) => {
            match args.format {
                ValidateFormat::Text => {
                    eprintln!("\u{2717} {display}: {} problem(s)\n", errors.len());
                    for error in &errors {
                        eprintln!("{error}");
                    }
                }
                ValidateFormat::Json => print_json(&Report::invalid(&errors)),
            }
            Err(RelayError::RouteValidation { errors })
        }
        Err(other) => Err(other),
    }
}

fn print_json(report: &Report<'_>) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("cannot encode report: {e}"),
    }
}
