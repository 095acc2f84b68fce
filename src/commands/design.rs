use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use clap::Args;
use owo_colors::{OwoColorize, Stream};
use serde_json::{Value, json};

use crate::config::{self, CliOverrides, Settings};
use crate::designer::{DesignError, RoomDesigner};
use crate::llm::error::{Service, is_api_key_present};
use crate::llm::openai::{ChatMessage, OpenAiChat};
use crate::llm::toolhouse::ToolhouseClient;
use crate::session::{RoomSession, check_description, session_path};

pub const SAMPLE_DESCRIPTION: &str = "Generate an image of a cozy bedroom with soft blue walls, a queen-sized bed with white linens, a wooden nightstand with a small lamp, and a colorful rug on the floor.";

/// Options shared by commands that render the room.
#[derive(Debug, Args, Clone)]
pub struct DesignArgs {
    /// Config profile to load
    #[arg(long)]
    pub profile: Option<String>,
    /// Chat model id
    #[arg(long)]
    pub model: Option<String>,
    /// Tool bundle to request from the tool service
    #[arg(long)]
    pub bundle: Option<String>,
    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
    /// Retries for throttled or failed requests
    #[arg(long)]
    pub retries: Option<u32>,
    /// Base retry delay in milliseconds
    #[arg(long = "retry-delay")]
    pub retry_delay: Option<u64>,
    /// Session file
    #[arg(long)]
    pub session: Option<PathBuf>,
    /// Print the request plan without calling any service
    #[arg(long)]
    pub dry_run: bool,
    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

impl DesignArgs {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            profile: self.profile.clone(),
            model: self.model.clone(),
            bundle: self.bundle.clone(),
            timeout: self.timeout,
            retries: self.retries,
            retry_delay: self.retry_delay,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct InitArgs {
    #[command(flatten)]
    pub design: DesignArgs,
    /// Room description; read from stdin when omitted
    pub description: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct AddArgs {
    #[command(flatten)]
    pub design: DesignArgs,
    /// Component to add to the room
    pub component: String,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// Session file
    #[arg(long)]
    pub session: Option<PathBuf>,
    /// Print the session as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run_init(args: InitArgs) -> Result<(), String> {
    let description = resolve_description(args.description)?;
    check_description(&description).map_err(|err| err.to_string())?;

    let settings = Settings::resolve(&args.design.overrides())?;
    let path = session_path(args.design.session.as_deref())?;
    log_settings(&settings, &path);

    if args.design.dry_run {
        print_plan("init", &settings, &path, &description, None);
        return Ok(());
    }

    let designer = build_designer(&settings)
        .map_err(|err| format!("An error occurred during initialization: {err}"))?;
    let mut session = RoomSession::default();
    let outcome = designer.initialize_room(&mut session, &description).await;
    save(&session, &path)?;

    let images = outcome.map_err(|err| describe_failure("initialization", err))?;
    print_images(
        "Room initialized!",
        &session,
        &images,
        None,
        args.design.json,
    );
    Ok(())
}

pub async fn run_add(args: AddArgs) -> Result<(), String> {
    let path = session_path(args.design.session.as_deref())?;
    let mut session = RoomSession::load(&path).map_err(|err| err.to_string())?;
    session
        .check_component(&args.component)
        .map_err(|err| err.to_string())?;

    let settings = Settings::resolve(&args.design.overrides())?;
    log_settings(&settings, &path);
    let shop_links = config::load_shop_links()?;
    let shop_link = shop_links.lookup(&args.component).map(str::to_string);

    if args.design.dry_run {
        let mut preview = session.clone();
        preview
            .add_component(&args.component)
            .map_err(|err| err.to_string())?;
        print_plan(
            "add",
            &settings,
            &path,
            &preview.cumulative_description(),
            Some(shop_link.as_deref()),
        );
        return Ok(());
    }

    let designer = build_designer(&settings)
        .map_err(|err| format!("An error occurred during update: {err}"))?;
    let outcome = designer.update_room(&mut session, &args.component).await;
    save(&session, &path)?;

    if let Ok(images) = &outcome {
        print_images(
            "Room updated!",
            &session,
            images,
            Some(shop_link.as_deref()),
            args.design.json,
        );
    }

    match &shop_link {
        Some(link) => {
            if !args.design.json {
                println!(
                    "{} {link}",
                    format!("Shop for {}:", args.component)
                        .if_supports_color(Stream::Stdout, |text| text.bold())
                );
            }
        }
        None => tracing::warn!("No shopping link available for '{}'.", args.component),
    }

    outcome
        .map(|_| ())
        .map_err(|err| describe_failure("update", err))
}

pub fn run_show(args: ShowArgs) -> Result<(), String> {
    let path = session_path(args.session.as_deref())?;
    let session = RoomSession::load(&path).map_err(|err| err.to_string())?;

    if args.json {
        let body = json!({
            "description": session.description,
            "components": session.components,
            "cumulative_description": session.cumulative_description(),
            "images": session.images,
        });
        println!("{body}");
        return Ok(());
    }

    println!(
        "{}",
        "Current Room Description".if_supports_color(Stream::Stdout, |text| text.bold())
    );
    println!("{}", session.cumulative_description());

    if !session.images.is_empty() {
        println!();
        println!(
            "{}",
            "Current Room Image".if_supports_color(Stream::Stdout, |text| text.bold())
        );
        for image in &session.images {
            println!("{image}");
        }
    }
    Ok(())
}

fn resolve_description(argument: Option<String>) -> Result<String, String> {
    if let Some(description) = argument {
        return Ok(description);
    }

    let stdin = io::stdin();
    if !stdin.is_terminal() {
        let mut buffer = String::new();
        stdin
            .lock()
            .read_to_string(&mut buffer)
            .map_err(|err| format!("Failed to read description from stdin: {err}"))?;
        let trimmed = buffer.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }

    Ok(SAMPLE_DESCRIPTION.to_string())
}

fn build_designer(
    settings: &Settings,
) -> Result<RoomDesigner<OpenAiChat, ToolhouseClient>, DesignError> {
    let chat = OpenAiChat::from_env(&settings.model, &settings.openai_base_url, settings.retry)?;
    let tools =
        ToolhouseClient::from_env(&settings.toolhouse_base_url, &settings.bundle, settings.retry)?;
    Ok(RoomDesigner::new(chat, tools))
}

fn describe_failure(stage: &str, err: DesignError) -> String {
    match err {
        DesignError::Rule(rule) => rule.to_string(),
        DesignError::NoImages => err.to_string(),
        DesignError::Service(_) => format!("An error occurred during {stage}: {err}"),
    }
}

fn save(session: &RoomSession, path: &Path) -> Result<(), String> {
    session.save(path).map_err(|err| err.to_string())
}

fn log_settings(settings: &Settings, session: &Path) {
    tracing::debug!(
        model = %settings.model,
        bundle = %settings.bundle,
        session = %session.display(),
        chat_api_key_present = is_api_key_present(Service::Chat),
        tools_api_key_present = is_api_key_present(Service::Tools),
        "resolved settings"
    );
}

fn print_plan(
    action: &str,
    settings: &Settings,
    session: &Path,
    prompt: &str,
    shop_link: Option<Option<&str>>,
) {
    let mut body = json!({
        "dry_run": true,
        "action": action,
        "model": settings.model,
        "bundle": settings.bundle,
        "session": session.display().to_string(),
        "messages": [ChatMessage::user(prompt)],
        "request": {
            "timeout_secs": settings.retry.timeout_secs,
            "retries": settings.retry.retries,
            "retry_delay_ms": settings.retry.retry_delay_ms,
        },
        "endpoints": {
            "chat": settings.openai_base_url,
            "tools": settings.toolhouse_base_url,
        },
    });
    if let (Some(link), Value::Object(map)) = (shop_link, &mut body) {
        map.insert("shop_link".to_string(), json!(link));
    }
    println!("{body}");
}

fn print_images(
    headline: &str,
    session: &RoomSession,
    images: &[String],
    shop_link: Option<Option<&str>>,
    as_json: bool,
) {
    if as_json {
        println!("{}", images_body(session, images, shop_link));
        return;
    }

    println!(
        "{}",
        headline.if_supports_color(Stream::Stdout, |text| text.green())
    );
    for image in images {
        println!("{image}");
    }
}

/// JSON result of a render. `shop_link` is present (possibly null) only
/// when the command looked one up.
fn images_body(
    session: &RoomSession,
    images: &[String],
    shop_link: Option<Option<&str>>,
) -> Value {
    let mut body = json!({
        "description": session.cumulative_description(),
        "images": images,
    });
    if let (Some(link), Value::Object(map)) = (shop_link, &mut body) {
        map.insert("shop_link".to_string(), json!(link));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> RoomSession {
        RoomSession {
            description: "a bedroom".to_string(),
            components: vec!["desk".to_string()],
            images: Vec::new(),
        }
    }

    #[test]
    fn add_result_carries_shop_link() {
        let images = vec!["https://x.com/1.png".to_string()];

        let body = images_body(&session(), &images, Some(Some("https://shop.example.com/desk")));

        assert_eq!(
            body,
            json!({
                "description": "a bedroom desk",
                "images": ["https://x.com/1.png"],
                "shop_link": "https://shop.example.com/desk",
            })
        );
    }

    #[test]
    fn add_result_reports_missing_shop_link_as_null() {
        let body = images_body(&session(), &[], Some(None));

        assert_eq!(body["shop_link"], Value::Null);
        assert!(body.as_object().is_some_and(|map| map.contains_key("shop_link")));
    }

    #[test]
    fn init_result_has_no_shop_link() {
        let body = images_body(&session(), &[], None);

        assert!(body.get("shop_link").is_none());
    }
}

