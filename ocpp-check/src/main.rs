//! OCPP Check - CLI for the OCPP 1.6 feature catalog
//!
//! Validates OCPP-J frames and bare payloads against the registered features.
//!
//! # Usage
//!
//! ```bash
//! # List registered features
//! ocpp-check --list
//!
//! # Validate a CALL frame
//! ocpp-check --frame '[2,"42","TriggerMessage",{"requestedMessage":"Heartbeat"}]'
//!
//! # Validate a CALLRESULT read from a file (the frame does not name its action)
//! ocpp-check --frame-file result.json --action GetDiagnostics
//!
//! # Validate a bare confirmation payload
//! ocpp-check --action BootNotification --confirmation \
//!     --payload '{"currentTime":"2026-01-20T12:00:00Z","interval":300,"status":"Accepted"}'
//!
//! # Register only some profiles
//! ocpp-check --profile core --profile remotetrigger --list
//! ```
//!
//! Exits with status 1 when the input is rejected.

use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use ocpp_core::ocpp16::{self, Catalog};
use ocpp_core::{
    validate, CallError, CatalogConfig, Dispatcher, FeatureRegistry, FrameError, OcppMessage, Profile,
};
use serde_json::Value;
use tracing::{debug, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Validate OCPP 1.6 frames and payloads
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// List registered features and exit
    #[arg(long)]
    list: bool,

    /// OCPP-J frame to validate (JSON array)
    #[arg(long, conflicts_with_all = ["frame_file", "payload"])]
    frame: Option<String>,

    /// File containing the OCPP-J frame to validate
    #[arg(long, conflicts_with = "payload")]
    frame_file: Option<PathBuf>,

    /// Action name (needed for --payload and CALLRESULT frames)
    #[arg(short, long)]
    action: Option<String>,

    /// Check against the confirmation schema instead of the request schema
    #[arg(long)]
    confirmation: bool,

    /// Bare JSON payload to validate
    #[arg(short, long, requires = "action")]
    payload: Option<String>,

    /// Feature profile to register (can be repeated, default: all)
    #[arg(long)]
    profile: Vec<Profile>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Accepted,
    Rejected,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    // Setup logging
    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let catalog = ocpp16::bootstrap(&catalog_config(&args.profile))?;

    let stdout = io::stdout();
    let verdict = run(&args, &catalog, &mut stdout.lock())?;
    if verdict == Verdict::Rejected {
        std::process::exit(1);
    }

    Ok(())
}

fn catalog_config(profiles: &[Profile]) -> CatalogConfig {
    if profiles.is_empty() {
        CatalogConfig::default()
    } else {
        CatalogConfig::default().only(profiles.iter().copied())
    }
}

fn run(args: &Args, catalog: &Catalog, out: &mut dyn Write) -> Result<Verdict, Box<dyn Error>> {
    if args.list {
        list_features(&catalog.registry, out)?;
        return Ok(Verdict::Accepted);
    }

    if let Some(frame) = &args.frame {
        return check_frame(frame.as_bytes(), args, catalog, out);
    }

    if let Some(path) = &args.frame_file {
        let bytes = fs::read(path)?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());
        return check_frame(&bytes, args, catalog, out);
    }

    if let (Some(action), Some(payload)) = (&args.action, &args.payload) {
        let payload: Value = serde_json::from_str(payload)?;
        return check_payload(action, args.confirmation, &payload, catalog, out);
    }

    Err("Nothing to check: use --list, --frame, --frame-file or --action with --payload".into())
}

fn list_features(registry: &FeatureRegistry, out: &mut dyn Write) -> io::Result<()> {
    for descriptor in registry.iter() {
        let initiator = format!("{:?}", descriptor.initiator());
        writeln!(
            out,
            "{:<32} {:<20} {:<14}{}",
            descriptor.action_name(),
            descriptor.profile().as_str(),
            initiator,
            if descriptor.is_triggerable() { " triggerable" } else { "" }
        )?;
    }
    Ok(())
}

fn check_frame(
    bytes: &[u8],
    args: &Args,
    catalog: &Catalog,
    out: &mut dyn Write,
) -> Result<Verdict, Box<dyn Error>> {
    let message = match OcppMessage::parse(bytes) {
        Ok(message) => message,
        Err(e) => {
            warn!("Unreadable frame: {}", e);
            writeln!(out, "REJECTED {}: {}", e.call_error_code(), e)?;
            return Ok(Verdict::Rejected);
        }
    };

    let dispatcher = Dispatcher::new(&catalog.registry);
    match message {
        OcppMessage::Call(call) => match dispatcher.accept(&call) {
            Ok(descriptor) => {
                writeln!(out, "OK {} request [{}]", descriptor.action_name(), call.message_id)?;
                Ok(Verdict::Accepted)
            }
            Err(call_error) => {
                report_call_error(&call_error, out)?;
                Ok(Verdict::Rejected)
            }
        },
        OcppMessage::CallResult(result) => {
            let action = args
                .action
                .as_deref()
                .ok_or("CALLRESULT frames carry no action: pass --action")?;
            check_payload(action, true, &result.payload, catalog, out)
        }
        OcppMessage::CallError(error) => {
            writeln!(
                out,
                "OK CALLERROR [{}] {}: {}",
                error.message_id, error.error_code, error.error_description
            )?;
            Ok(Verdict::Accepted)
        }
    }
}

fn check_payload(
    action: &str,
    confirmation: bool,
    payload: &Value,
    catalog: &Catalog,
    out: &mut dyn Write,
) -> Result<Verdict, Box<dyn Error>> {
    let descriptor = match catalog.registry.lookup(action) {
        Ok(descriptor) => descriptor,
        Err(e) => {
            writeln!(out, "REJECTED {}: {}", e.call_error_code(), e)?;
            return Ok(Verdict::Rejected);
        }
    };

    let (direction, schema, payload_type) = if confirmation {
        ("confirmation", descriptor.confirmation_schema(), descriptor.confirmation_type())
    } else {
        ("request", descriptor.request_schema(), descriptor.request_type())
    };

    if let Err(errors) = validate(payload, schema, &catalog.registry) {
        writeln!(out, "REJECTED {} {} ({}):", action, direction, errors.call_error_code())?;
        for violation in errors.violations() {
            writeln!(out, "  {}", violation)?;
        }
        return Ok(Verdict::Rejected);
    }

    // Schema limits are wider than the typed fields (e.g. i64 against i32)
    if let Err(e) = payload_type.decode(payload.clone()) {
        let e = FrameError::from(e);
        writeln!(out, "REJECTED {} {} ({}): {}", action, direction, e.call_error_code(), e)?;
        return Ok(Verdict::Rejected);
    }

    writeln!(out, "OK {} {}", action, direction)?;
    Ok(Verdict::Accepted)
}

/// Print the CALLERROR frame a peer would receive
fn report_call_error(call_error: &CallError, out: &mut dyn Write) -> Result<(), Box<dyn Error>> {
    let frame = call_error.to_bytes()?;
    writeln!(out, "REJECTED {}", String::from_utf8_lossy(&frame))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn check(argv: &[&str]) -> (Verdict, String) {
        let args = Args::try_parse_from(std::iter::once("ocpp-check").chain(argv.iter().copied())).unwrap();
        let catalog = ocpp16::bootstrap(&catalog_config(&args.profile)).unwrap();
        let mut out = Vec::new();
        let verdict = run(&args, &catalog, &mut out).unwrap();
        (verdict, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_list() {
        let (verdict, out) = check(&["--list"]);
        assert_eq!(verdict, Verdict::Accepted);
        assert_eq!(out.lines().count(), 8);
        assert!(out.contains("TriggerMessage"));
        assert!(out.lines().any(|l| l.starts_with("Heartbeat") && l.ends_with("triggerable")));
    }

    #[test]
    fn test_list_with_profiles() {
        let (_, out) = check(&["--profile", "core", "--list"]);
        assert_eq!(out.lines().count(), 4);
        assert!(!out.contains("GetDiagnostics"));
    }

    #[test]
    fn test_call_frame_accepted() {
        let (verdict, out) = check(&[
            "--frame",
            r#"[2,"42","TriggerMessage",{"requestedMessage":"StatusNotification","connectorId":1}]"#,
        ]);
        assert_eq!(verdict, Verdict::Accepted);
        assert_eq!(out.trim(), "OK TriggerMessage request [42]");
    }

    #[test]
    fn test_call_frame_rejected() {
        let (verdict, out) = check(&[
            "--frame",
            r#"[2,"43","TriggerMessage",{"requestedMessage":"GetDiagnostics"}]"#,
        ]);
        assert_eq!(verdict, Verdict::Rejected);
        assert!(out.starts_with(r#"REJECTED [4,"43","PropertyConstraintViolation""#));
        assert!(out.contains("requestedMessage"));
    }

    #[test]
    fn test_call_frame_payload_not_an_object() {
        let (verdict, out) = check(&["--frame", r#"[2,"1","Heartbeat","x"]"#]);
        assert_eq!(verdict, Verdict::Rejected);
        assert!(out.starts_with(r#"REJECTED [4,"1","TypeConstraintViolation""#));
    }

    #[test]
    fn test_integer_wider_than_field() {
        let (verdict, out) = check(&[
            "--frame",
            r#"[2,"2","TriggerMessage",{"requestedMessage":"Heartbeat","connectorId":9999999999}]"#,
        ]);
        assert_eq!(verdict, Verdict::Rejected);
        assert!(out.starts_with(r#"REJECTED [4,"2","FormationViolation""#));

        let (verdict, out) = check(&[
            "--action",
            "StatusNotification",
            "--payload",
            r#"{"connectorId":9999999999,"errorCode":"NoError","status":"Available"}"#,
        ]);
        assert_eq!(verdict, Verdict::Rejected);
        assert!(out.starts_with("REJECTED StatusNotification request (FormationViolation)"));
    }

    #[test]
    fn test_trigger_depends_on_profiles() {
        let frame = r#"[2,"44","TriggerMessage",{"requestedMessage":"FirmwareStatusNotification"}]"#;

        let (verdict, _) = check(&["--frame", frame]);
        assert_eq!(verdict, Verdict::Accepted);

        let (verdict, _) = check(&["--profile", "core", "--profile", "remotetrigger", "--frame", frame]);
        assert_eq!(verdict, Verdict::Rejected);
    }

    #[test]
    fn test_unreadable_frame() {
        let (verdict, out) = check(&["--frame", "[9]"]);
        assert_eq!(verdict, Verdict::Rejected);
        assert!(out.starts_with("REJECTED"));
    }

    #[test]
    fn test_frame_file_call_result() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"[3,"7",{{"fileName":"{}"}}]"#, "d".repeat(256)).unwrap();
        let path = file.path().to_str().unwrap();

        let (verdict, out) = check(&["--frame-file", path, "--action", "GetDiagnostics"]);
        assert_eq!(verdict, Verdict::Rejected);
        assert!(out.contains("fileName"));
        assert!(out.contains("maxLength"));
    }

    #[test]
    fn test_frame_file_call_result_needs_action() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"[3,"7",{{}}]"#).unwrap();

        let args = Args::try_parse_from(["ocpp-check", "--frame-file", file.path().to_str().unwrap()]).unwrap();
        let catalog = ocpp16::bootstrap(&CatalogConfig::default()).unwrap();
        assert!(run(&args, &catalog, &mut Vec::new()).is_err());
    }

    #[test]
    fn test_payload() {
        let (verdict, out) = check(&[
            "--action",
            "BootNotification",
            "--confirmation",
            "--payload",
            r#"{"currentTime":"2026-01-20T12:00:00Z","interval":300,"status":"Accepted"}"#,
        ]);
        assert_eq!(verdict, Verdict::Accepted);
        assert_eq!(out.trim(), "OK BootNotification confirmation");

        let (verdict, out) = check(&["--action", "GetDiagnostics", "--payload", r#"{"retries":-1}"#]);
        assert_eq!(verdict, Verdict::Rejected);
        assert!(out.contains("(OccurenceConstraintViolation)"));
        assert_eq!(out.lines().count(), 3);
    }

    #[test]
    fn test_unknown_action() {
        let (verdict, out) = check(&["--action", "Authorize", "--payload", "{}"]);
        assert_eq!(verdict, Verdict::Rejected);
        assert!(out.starts_with("REJECTED NotImplemented"));
    }

    #[test]
    fn test_argument_rules() {
        assert!(Args::try_parse_from(["ocpp-check", "--payload", "{}"]).is_err());
        assert!(Args::try_parse_from(["ocpp-check", "--frame", "[]", "--payload", "{}", "-a", "X"]).is_err());
        assert!(Args::try_parse_from(["ocpp-check", "--profile", "smart", "--list"]).is_err());

        let args = Args::try_parse_from(["ocpp-check"]).unwrap();
        let catalog = ocpp16::bootstrap(&CatalogConfig::default()).unwrap();
        assert!(run(&args, &catalog, &mut Vec::new()).is_err());
    }
}
