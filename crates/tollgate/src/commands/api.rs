//! Api command - free-form request console.

use anyhow::{Result, anyhow};
use clap::{Args, ValueEnum};
use console::{Style, style};

use tollgate_client::{ApiResponse, ConsoleRequest, Method};

use super::{Context, report_session_events};

/// Arguments for the api command.
#[derive(Args, Debug)]
pub struct ApiArgs {
    /// HTTP method
    #[arg(value_enum, ignore_case = true)]
    pub method: HttpMethod,

    /// Endpoint path relative to the API base URL (e.g. /users/me)
    pub path: String,

    /// JSON request body (POST, PUT and PATCH only)
    #[arg(short, long)]
    pub data: Option<String>,

    /// Query parameter as key=value (repeatable)
    #[arg(short, long = "query", value_parser = parse_key_value)]
    pub query: Vec<(String, String)>,

    /// Bearer token to use when no session is stored
    #[arg(long)]
    pub bearer: Option<String>,

    /// Print response headers
    #[arg(short, long)]
    pub include: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}

/// Run the api command.
pub async fn run(args: ApiArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let mut events = client.session().subscribe();

    let mut request = ConsoleRequest::new(args.method.into(), args.path);
    if let Some(data) = args.data {
        request = request.with_body(data);
    }
    for (key, value) in args.query {
        request = request.with_query(key, value);
    }
    if let Some(token) = args.bearer {
        request = request.with_bearer(token);
    }

    let result = client.console().execute(request).await;
    report_session_events(&mut events);
    let response = result?;

    if ctx.json_output {
        let body = response
            .json()
            .unwrap_or_else(|| serde_json::Value::String(response.body.clone()));
        let output = serde_json::json!({
            "status": response.status,
            "status_text": response.status_text,
            "headers": response.headers,
            "body": body,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_response(&response, args.include);
    }
    Ok(())
}

fn print_response(response: &ApiResponse, include_headers: bool) {
    let status_style = if response.is_success() {
        Style::new().green().bold()
    } else {
        Style::new().red().bold()
    };
    println!(
        "{}",
        status_style.apply_to(format!("{} {}", response.status, response.status_text))
    );

    if include_headers {
        let dim = Style::new().dim();
        for (name, value) in &response.headers {
            println!("{} {}", dim.apply_to(format!("{}:", name)), value);
        }
    }

    if !response.body.is_empty() {
        println!();
        println!("{}", response.pretty_body());
    } else {
        println!("{}", style("(empty body)").dim());
    }
}

fn parse_key_value(s: &str) -> Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("expected key=value, got '{}'", s))?;
    if key.is_empty() {
        return Err(anyhow!("query key must not be empty"));
    }
    Ok((key.to_string(), value.to_string()))
}
