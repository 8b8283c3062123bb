mod prefs;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::prefs::{FileKv, Preferences, PrefsError};

/// Lists shown by `recent` when no limit is given.
const DEFAULT_RECENT_LIMIT: usize = 5;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("not logged in; run `wishlist login <email>` first")]
    NotLoggedIn,
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned HTTP {status}: {message}")]
    ServerError { status: u16, message: String },
    #[error("missing expected field `{0}`")]
    MissingField(&'static str),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("no list for short code `{0}`")]
    UnknownShortCode(String),
    #[error("no preferences path; pass --prefs or set WISHLIST_PREFS")]
    NoPrefsPath,
    #[error(transparent)]
    Prefs(#[from] PrefsError),
}

#[derive(Parser, Debug)]
#[command(name = "wishlist", about = "Wish list API client")]
struct Cli {
    #[arg(long, env = "WISHLIST_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    /// Preferences file. Defaults to `wishlist/prefs.json` in the config dir.
    #[arg(long, env = "WISHLIST_PREFS")]
    prefs: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

struct CliContext {
    base_url: String,
    client: reqwest::Client,
    prefs: Preferences<FileKv>,
}

#[derive(Subcommand, Debug)]
enum Command {
    Ping,
    /// Find or create the account for an email and remember it.
    Login {
        email: String,
    },
    Whoami,
    Rename {
        name: String,
    },
    /// Lists you created, or lists you saved with `--saved`.
    Lists {
        #[arg(long)]
        saved: bool,
    },
    Create {
        name: String,
    },
    Delete {
        list: Uuid,
    },
    /// Show a list by id or short code.
    View(ViewArgs),
    /// Recently viewed lists, newest first.
    Recent {
        #[arg(long, default_value_t = DEFAULT_RECENT_LIMIT)]
        limit: usize,
    },
    /// Drop a list from the recent history.
    Forget {
        list: Uuid,
    },
    Save {
        list: Uuid,
    },
    Unsave {
        list: Uuid,
    },
    Item(ItemCommand),
    /// Add an item from share-sheet style fields.
    ShareItem {
        list: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        url: Option<String>,
    },
    /// Print the list's short link.
    Share {
        list: Uuid,
    },
    Suggest {
        list: Uuid,
    },
    Spoilers(SpoilersCommand),
}

#[derive(Args, Debug)]
struct ViewArgs {
    target: String,
    #[arg(long, conflicts_with = "no_spoilers")]
    spoilers: bool,
    #[arg(long)]
    no_spoilers: bool,
    /// Store the spoiler choice for this list.
    #[arg(long)]
    remember: bool,
}

#[derive(Args, Debug)]
struct ItemCommand {
    #[command(subcommand)]
    command: ItemSubcommand,
}

#[derive(Subcommand, Debug)]
enum ItemSubcommand {
    Add {
        list: Uuid,
        name: String,
        #[arg(long, default_value = "")]
        url: String,
        #[arg(long, default_value = "")]
        details: String,
    },
    /// Change an item's fields; omitted fields keep their value.
    Edit {
        list: Uuid,
        index: usize,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        details: Option<String>,
    },
    Delete {
        list: Uuid,
        index: usize,
    },
    Toggle {
        list: Uuid,
        index: usize,
    },
    Move {
        list: Uuid,
        index: usize,
        direction: Direction,
    },
    Copy {
        list: Uuid,
        index: usize,
        target: Uuid,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Direction {
    Up,
    Down,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

#[derive(Args, Debug)]
struct SpoilersCommand {
    #[command(subcommand)]
    command: SpoilersSubcommand,
}

#[derive(Subcommand, Debug)]
enum SpoilersSubcommand {
    /// Forget the stored spoiler choice for a list.
    Reset { list: Uuid },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let prefs_path = match cli.prefs {
        Some(path) => path,
        None => dirs::config_dir()
            .map(|dir| dir.join("wishlist").join("prefs.json"))
            .ok_or(CliError::NoPrefsPath)?,
    };
    let mut ctx = CliContext {
        base_url: cli.base_url,
        client: reqwest::Client::new(),
        prefs: Preferences::new(FileKv::open(prefs_path)),
    };

    match cli.command {
        Command::Ping => run_ping(&ctx).await,
        Command::Login { email } => run_login(&mut ctx, &email).await,
        Command::Whoami => {
            let user = current_user(&ctx).await?;
            print_json(&user)
        }
        Command::Rename { name } => {
            let id = user_id(&current_user(&ctx).await?)?;
            let user = api_request(&ctx, reqwest::Method::PATCH, &format!("/api/users/{id}"), Some(json!({ "name": name }))).await?;
            print_json(&user)
        }
        Command::Lists { saved } => run_lists(&ctx, saved).await,
        Command::Create { name } => {
            let id = user_id(&current_user(&ctx).await?)?;
            let path = format!("/api/users/{id}/lists");
            let list = api_request(&ctx, reqwest::Method::POST, &path, Some(json!({ "name": name }))).await?;
            print_json(&list)
        }
        Command::Delete { list } => {
            let id = user_id(&current_user(&ctx).await?)?;
            let path = format!("/api/users/{id}/lists/{list}");
            api_request(&ctx, reqwest::Method::DELETE, &path, None).await?;
            ctx.prefs.remove_recent_list(list)?;
            ctx.prefs.remove_spoiler_choice(list)?;
            println!("deleted {list}");
            Ok(())
        }
        Command::View(args) => run_view(&mut ctx, args).await,
        Command::Recent { limit } => run_recent(&ctx, limit).await,
        Command::Forget { list } => {
            ctx.prefs.remove_recent_list(list)?;
            Ok(())
        }
        Command::Save { list } => {
            let id = user_id(&current_user(&ctx).await?)?;
            let path = format!("/api/users/{id}/saved-lists/{list}");
            api_request(&ctx, reqwest::Method::POST, &path, None).await?;
            println!("saved {list}");
            Ok(())
        }
        Command::Unsave { list } => {
            let id = user_id(&current_user(&ctx).await?)?;
            let path = format!("/api/users/{id}/saved-lists/{list}");
            api_request(&ctx, reqwest::Method::DELETE, &path, None).await?;
            println!("removed {list} from saved lists");
            Ok(())
        }
        Command::Item(item) => run_item(&ctx, item).await,
        Command::ShareItem { list, title, text, url } => {
            let path = format!("/api/lists/{list}/shared-items");
            let body = json!({ "title": title, "text": text, "url": url });
            let list = api_request(&ctx, reqwest::Method::POST, &path, Some(body)).await?;
            print_items(&list, true);
            Ok(())
        }
        Command::Share { list } => {
            let path = format!("/api/lists/{list}/short-url");
            let share = api_request(&ctx, reqwest::Method::POST, &path, None).await?;
            let url = share
                .get("url")
                .and_then(Value::as_str)
                .ok_or(CliError::MissingField("url"))?;
            println!("{url}");
            Ok(())
        }
        Command::Suggest { list } => run_suggest(&ctx, list).await,
        Command::Spoilers(spoilers) => match spoilers.command {
            SpoilersSubcommand::Reset { list } => {
                ctx.prefs.remove_spoiler_choice(list)?;
                println!("spoiler choice cleared for {list}");
                Ok(())
            }
        },
    }
}

async fn run_ping(ctx: &CliContext) -> Result<(), CliError> {
    let url = format!("{}/healthz", ctx.base_url.trim_end_matches('/'));
    let response = ctx.client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(CliError::ServerError {
            status: status.as_u16(),
            message: "health check failed".to_owned(),
        });
    }
    println!("ok");
    Ok(())
}

async fn run_login(ctx: &mut CliContext, email: &str) -> Result<(), CliError> {
    let user = api_request(ctx, reqwest::Method::POST, "/api/users", Some(json!({ "email": email }))).await?;
    let normalized = user
        .get("email")
        .and_then(Value::as_str)
        .ok_or(CliError::MissingField("email"))?;
    ctx.prefs.set_last_email(normalized)?;
    println!("logged in as {normalized}");
    Ok(())
}

async fn run_lists(ctx: &CliContext, saved: bool) -> Result<(), CliError> {
    let id = user_id(&current_user(ctx).await?)?;
    let path = format!("/api/users/{id}/lists?saved={saved}");
    let lists = api_request(ctx, reqwest::Method::GET, &path, None).await?;
    for entry in lists.as_array().into_iter().flatten() {
        print_list_line(entry);
    }
    Ok(())
}

async fn run_view(ctx: &mut CliContext, args: ViewArgs) -> Result<(), CliError> {
    let list_id = match Uuid::parse_str(&args.target) {
        Ok(id) => id,
        Err(_) => resolve_short_code(ctx, &args.target).await?,
    };
    let list = api_request(ctx, reqwest::Method::GET, &format!("/api/lists/{list_id}"), None).await?;
    ctx.prefs.add_recent_list(list_id)?;

    let flag = if args.spoilers {
        Some(true)
    } else if args.no_spoilers {
        Some(false)
    } else {
        None
    };
    if let Some(choice) = flag {
        if args.remember {
            ctx.prefs.set_spoiler_choice(list_id, choice)?;
        }
    }
    let show_purchased = flag
        .or_else(|| ctx.prefs.get_spoiler_choice(list_id))
        .unwrap_or(false);

    let name = list.get("name").and_then(Value::as_str).unwrap_or_default();
    println!("{name} ({list_id})");
    print_items(&list, show_purchased);
    if flag.is_none() && !ctx.prefs.has_spoiler_choice(list_id) {
        eprintln!("purchased items hidden; pass --spoilers --remember to always show them");
    }
    Ok(())
}

async fn run_recent(ctx: &CliContext, limit: usize) -> Result<(), CliError> {
    let ids: Vec<String> = ctx
        .prefs
        .get_sorted_recent_list_ids()
        .into_iter()
        .take(limit)
        .map(|id| id.to_string())
        .collect();
    if ids.is_empty() {
        println!("no recent lists");
        return Ok(());
    }
    let path = format!("/api/lists?ids={}", ids.join(","));
    let lists = api_request(ctx, reqwest::Method::GET, &path, None).await?;
    for entry in lists.as_array().into_iter().flatten() {
        print_list_line(entry);
    }
    Ok(())
}

async fn run_item(ctx: &CliContext, item: ItemCommand) -> Result<(), CliError> {
    let (method, path, body) = match item.command {
        ItemSubcommand::Add { list, name, url, details } => (
            reqwest::Method::POST,
            format!("/api/lists/{list}/items"),
            Some(json!({ "name": name, "url": url, "details": details })),
        ),
        ItemSubcommand::Edit { list, index, name, url, details } => {
            let current = api_request(ctx, reqwest::Method::GET, &format!("/api/lists/{list}"), None).await?;
            let existing = &current["items"][index];
            let field = |value: Option<String>, key: &str| {
                value.unwrap_or_else(|| existing[key].as_str().unwrap_or_default().to_owned())
            };
            let body = json!({
                "name": field(name, "name"),
                "url": field(url, "url"),
                "details": field(details, "details"),
            });
            (reqwest::Method::PUT, format!("/api/lists/{list}/items/{index}"), Some(body))
        }
        ItemSubcommand::Delete { list, index } => {
            (reqwest::Method::DELETE, format!("/api/lists/{list}/items/{index}"), None)
        }
        ItemSubcommand::Toggle { list, index } => {
            (reqwest::Method::POST, format!("/api/lists/{list}/items/{index}/purchased"), None)
        }
        ItemSubcommand::Move { list, index, direction } => (
            reqwest::Method::POST,
            format!("/api/lists/{list}/items/{index}/move"),
            Some(json!({ "direction": direction.as_str() })),
        ),
        ItemSubcommand::Copy { list, index, target } => (
            reqwest::Method::POST,
            format!("/api/lists/{list}/items/{index}/copy"),
            Some(json!({ "targetListId": target })),
        ),
    };
    let list = api_request(ctx, method, &path, body).await?;
    print_items(&list, true);
    Ok(())
}

async fn run_suggest(ctx: &CliContext, list: Uuid) -> Result<(), CliError> {
    let path = format!("/api/lists/{list}/suggestions");
    let body = api_request(ctx, reqwest::Method::POST, &path, None).await?;
    let suggestions = body
        .get("suggestions")
        .and_then(Value::as_array)
        .ok_or(CliError::MissingField("suggestions"))?;
    if suggestions.is_empty() {
        println!("no suggestions");
    }
    for suggestion in suggestions {
        let name = suggestion.get("name").and_then(Value::as_str).unwrap_or_default();
        match suggestion.get("description").and_then(Value::as_str) {
            Some(desc) if !desc.is_empty() => println!("- {name}: {desc}"),
            _ => println!("- {name}"),
        }
    }
    Ok(())
}

async fn current_user(ctx: &CliContext) -> Result<Value, CliError> {
    let email = ctx.prefs.get_last_email().ok_or(CliError::NotLoggedIn)?;
    api_request(ctx, reqwest::Method::POST, "/api/users", Some(json!({ "email": email }))).await
}

fn user_id(user: &Value) -> Result<Uuid, CliError> {
    user.get("id")
        .and_then(Value::as_str)
        .and_then(|value| Uuid::parse_str(value).ok())
        .ok_or(CliError::MissingField("id"))
}

async fn resolve_short_code(ctx: &CliContext, code: &str) -> Result<Uuid, CliError> {
    let path = format!("/api/short-urls/{code}");
    match api_request(ctx, reqwest::Method::GET, &path, None).await {
        Ok(body) => body
            .get("listId")
            .and_then(Value::as_str)
            .and_then(|value| Uuid::parse_str(value).ok())
            .ok_or(CliError::MissingField("listId")),
        Err(CliError::ServerError { status: 404, .. }) => Err(CliError::UnknownShortCode(code.to_owned())),
        Err(e) => Err(e),
    }
}

async fn api_request(
    ctx: &CliContext,
    method: reqwest::Method,
    path: &str,
    body: Option<Value>,
) -> Result<Value, CliError> {
    let url = format!("{}{}", ctx.base_url.trim_end_matches('/'), path);

    let request = ctx.client.request(method, &url);
    let request = if let Some(json) = body {
        request.json(&json)
    } else {
        request
    };

    let response = request.send().await?;
    let status = response.status();
    let value = response
        .json::<Value>()
        .await
        .unwrap_or_else(|_| Value::Null);

    if !status.is_success() {
        let message = if status.is_server_error() {
            "something went wrong, try again".to_owned()
        } else {
            status.canonical_reason().unwrap_or("request failed").to_owned()
        };
        return Err(CliError::ServerError { status: status.as_u16(), message });
    }

    Ok(value)
}

fn print_list_line(entry: &Value) {
    let list = &entry["list"];
    let id = list["id"].as_str().unwrap_or_default();
    let name = list["name"].as_str().unwrap_or_default();
    let count = list["items"].as_array().map_or(0, Vec::len);
    match entry["creator"]["name"].as_str() {
        Some(creator) => println!("{id}  {name} ({count} items, by {creator})"),
        None => println!("{id}  {name} ({count} items)"),
    }
}

fn print_items(list: &Value, show_purchased: bool) {
    let items = list["items"].as_array().map(Vec::as_slice).unwrap_or_default();
    if items.is_empty() {
        println!("  (no items)");
    }
    for (index, item) in items.iter().enumerate() {
        let name = item["name"].as_str().unwrap_or_default();
        let mark = if show_purchased && item["purchased"].as_bool().unwrap_or(false) {
            "[x]"
        } else {
            "[ ]"
        };
        println!("{index:>3} {mark} {name}");
        for key in ["affiliateUrl", "url"] {
            if let Some(url) = item[key].as_str().filter(|u| !u.is_empty()) {
                println!("        {url}");
                break;
            }
        }
        if let Some(details) = item["details"].as_str().filter(|d| !d.is_empty()) {
            println!("        {details}");
        }
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
