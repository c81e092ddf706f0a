use std::io::{self, Read};

use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};
use uischema::{FormRenderer, UiSchema, ValidationError};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read { path: String, source: io::Error },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("invalid schema: {0}")]
    Invalid(#[from] ValidationError),
    #[error("invalid assignment {0:?}; expected NAME=VALUE")]
    InvalidAssignment(String),
    #[error("no button labeled {0:?}")]
    UnknownButton(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned HTTP {status}: {message}")]
    ServerError { status: u16, message: String },
}

#[derive(Parser, Debug)]
#[command(name = "uiforge-cli", about = "Validate, render, and manage UI schemas")]
struct Cli {
    #[arg(long, env = "UIFORGE_BASE_URL", default_value = "http://127.0.0.1:5001")]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone)]
struct CliContext {
    base_url: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the server health endpoint.
    Ping,
    /// Validate a schema file offline.
    Validate(ValidateArgs),
    /// Render a schema file as an indented outline.
    Render(RenderArgs),
    Api(ApiCommand),
}

#[derive(Args, Debug)]
struct ValidateArgs {
    #[arg(help = "Schema file path, or - for stdin")]
    file: String,

    /// Also check a UI name.
    #[arg(long)]
    name: Option<String>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[arg(help = "Schema file path, or - for stdin")]
    file: String,

    /// Field value as NAME=VALUE; repeatable.
    #[arg(long = "set", value_name = "NAME=VALUE")]
    values: Vec<String>,

    /// Activate the button with this label after rendering.
    #[arg(long)]
    press: Option<String>,

    /// Print the view tree as JSON instead of an outline.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
struct ApiCommand {
    #[command(subcommand)]
    command: ApiSubcommand,
}

#[derive(Subcommand, Debug)]
enum ApiSubcommand {
    List,
    Get {
        name: String,
    },
    Save {
        name: String,
        #[arg(help = "Schema file path, or - for stdin")]
        file: String,
    },
    Delete {
        name: String,
    },
    View {
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();
    let ctx = CliContext { base_url: cli.base_url };

    match cli.command {
        Command::Ping => run_ping(&ctx).await,
        Command::Validate(args) => run_validate(&args),
        Command::Render(args) => run_render(&args),
        Command::Api(api) => run_api(&ctx, api).await,
    }
}

async fn run_ping(cli: &CliContext) -> Result<(), CliError> {
    let json = api_request(cli, reqwest::Method::GET, "/health", None).await?;
    print_json(&json)
}

// =============================================================================
// OFFLINE
// =============================================================================

fn run_validate(args: &ValidateArgs) -> Result<(), CliError> {
    if let Some(name) = &args.name {
        uischema::validate_name(name).map_err(|e| e.under("uiName"))?;
    }
    let schema = load_schema(&args.file)?;
    for name in schema.duplicate_input_names() {
        eprintln!("warning: input name {name:?} is used more than once; values will collide");
    }
    println!("valid: {} top-level elements, {} total", schema.len(), schema.node_count());
    Ok(())
}

fn run_render(args: &RenderArgs) -> Result<(), CliError> {
    let schema = load_schema(&args.file)?;
    let mut renderer = FormRenderer::new();
    for assignment in &args.values {
        let (name, value) = parse_assignment(assignment)?;
        renderer.input(name, value);
    }

    let view = renderer.render(&schema);
    if args.json {
        print_json(&serde_json::to_value(&view)?)?;
    } else {
        print!("{}", view.outline());
    }

    if let Some(label) = &args.press {
        if !has_button(&schema, label) {
            return Err(CliError::UnknownButton(label.clone()));
        }
        renderer.activate(label);
    }
    Ok(())
}

fn load_schema(path: &str) -> Result<UiSchema, CliError> {
    let raw: Value = serde_json::from_str(&read_input(path)?)?;
    Ok(uischema::validate(&raw)?)
}

fn read_input(path: &str) -> Result<String, CliError> {
    let read_err = |source| CliError::Read { path: path.to_owned(), source };
    if path == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).map_err(read_err)?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).map_err(read_err)
}

fn parse_assignment(raw: &str) -> Result<(&str, &str), CliError> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name, value)),
        _ => Err(CliError::InvalidAssignment(raw.to_owned())),
    }
}

fn has_button(schema: &UiSchema, label: &str) -> bool {
    let mut found = false;
    for element in schema.elements() {
        element.visit(&mut |el| {
            if matches!(el, uischema::Element::Button { label: l } if l == label) {
                found = true;
            }
        });
    }
    found
}

// =============================================================================
// API
// =============================================================================

async fn run_api(cli: &CliContext, api: ApiCommand) -> Result<(), CliError> {
    let json = match api.command {
        ApiSubcommand::List => api_request(cli, reqwest::Method::GET, "/api/v1/ui", None).await?,
        ApiSubcommand::Get { name } => {
            let path = format!("/api/v1/ui/{}", checked_name(&name)?);
            api_request(cli, reqwest::Method::GET, &path, None).await?
        }
        ApiSubcommand::Save { name, file } => {
            let body = save_body(&name, &read_input(&file)?)?;
            api_request(cli, reqwest::Method::POST, "/api/v1/ui", Some(body)).await?
        }
        ApiSubcommand::Delete { name } => {
            let path = format!("/api/v1/ui/{}", checked_name(&name)?);
            api_request(cli, reqwest::Method::DELETE, &path, None).await?
        }
        ApiSubcommand::View { name } => {
            let path = format!("/api/v1/ui/{}/view", checked_name(&name)?);
            api_request(cli, reqwest::Method::GET, &path, None).await?
        }
    };
    print_json(&json)
}

fn checked_name(name: &str) -> Result<&str, CliError> {
    uischema::validate_name(name).map_err(|e| e.under("uiName"))?;
    Ok(name)
}

/// Build a save request body, running the same checks the server runs so
/// bad input never leaves the machine.
fn save_body(name: &str, raw_schema: &str) -> Result<Value, CliError> {
    let schema: Value = serde_json::from_str(raw_schema)?;
    let body = json!({ "uiName": name, "schema": schema });
    // The server parses the schema one nesting level deeper, inside the body.
    serde_json::from_str::<Value>(&body.to_string())?;
    uischema::validate_save_request(&body)?;
    Ok(body)
}

async fn api_request(
    cli: &CliContext,
    method: reqwest::Method,
    path: &str,
    body: Option<Value>,
) -> Result<Value, CliError> {
    let client = reqwest::Client::new();
    let url = format!("{}{}", cli.base_url.trim_end_matches('/'), path);

    let request = client.request(method, &url);
    let request = if let Some(json) = body { request.json(&json) } else { request };

    let response = request.send().await?;
    let status = response.status();
    let value = response.json::<Value>().await.unwrap_or(Value::Null);

    if !status.is_success() {
        return Err(CliError::ServerError { status: status.as_u16(), message: error_message(&value) });
    }

    Ok(value)
}

/// Human-readable message from an error body `{code, message, path?}`.
fn error_message(body: &Value) -> String {
    let Some(message) = body.get("message").and_then(Value::as_str) else {
        return body.to_string();
    };
    let code = body.get("code").and_then(Value::as_str).unwrap_or("E_UNKNOWN");
    match body.get("path").and_then(Value::as_str) {
        Some(path) => format!("{code} at {path}: {message}"),
        None => format!("{code}: {message}"),
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
