//! Command-line entry point over `quire_core`.
//!
//! # Responsibility
//! - Wire config, logging and the record store into one `IngestService`.
//! - Print articles as plain, line-oriented text.
//!
//! No network relay client ships with core, so the service runs against an
//! empty registry and every command reads the local store. `articles` lists
//! the stored view without a sync pass.

use log::error;
use quire_core::db::open_db;
use quire_core::{
    default_log_level, init_logging, load_config_from_env, AppConfig, Article, EntityRef,
    IngestService, RelayRegistry, SqliteRecordStore,
};
use std::process::ExitCode;

const USAGE: &str = "usage: quire <ping | relays | articles <author-hex> | article <address> | search [--author <author-hex|address>] <keywords...>>
articles, article and search read the local store only; no relay client is wired into this binary.";

const STORE_ONLY_NOTE: &str =
    "note: no relay client is wired into this binary; showing stored articles only";

enum Command {
    Ping,
    Relays,
    Articles(String),
    Article(String),
    Search {
        author: Option<String>,
        text: String,
    },
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_command(&args) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    match run(command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_command module=cli status=error error={message}");
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn parse_command(args: &[String]) -> Result<Command, String> {
    let Some((name, rest)) = args.split_first() else {
        return Err("missing command".to_string());
    };
    match (name.as_str(), rest) {
        ("ping", []) => Ok(Command::Ping),
        ("relays", []) => Ok(Command::Relays),
        ("articles", [author]) => Ok(Command::Articles(author.clone())),
        ("article", [address]) => Ok(Command::Article(address.clone())),
        ("search", [flag, author, keywords @ ..]) if flag == "--author" && !keywords.is_empty() => {
            Ok(Command::Search {
                author: Some(author.clone()),
                text: keywords.join(" "),
            })
        }
        ("search", keywords) if !keywords.is_empty() && keywords[0] != "--author" => {
            Ok(Command::Search {
                author: None,
                text: keywords.join(" "),
            })
        }
        _ => Err(format!("unrecognized arguments: {}", args.join(" "))),
    }
}

fn run(command: Command) -> Result<(), String> {
    if let Command::Ping = command {
        println!("quire_core ping={}", quire_core::ping());
        println!("quire_core version={}", quire_core::core_version());
        return Ok(());
    }

    let config = load_config_from_env().map_err(|err| err.to_string())?;
    start_logging(&config)?;

    if let Command::Relays = command {
        for relay in &config.relays {
            println!("{relay}");
        }
        return Ok(());
    }

    let conn = open_db(config.db_path()).map_err(|err| err.to_string())?;
    let store = SqliteRecordStore::try_new(&conn).map_err(|err| err.to_string())?;
    let service = IngestService::with_options(
        store,
        RelayRegistry::new().aggregator(),
        config.sync_options(),
    );

    match command {
        Command::Articles(author) => {
            eprintln!("{STORE_ONLY_NOTE}");
            let articles = service
                .stored_articles(author.trim())
                .map_err(|err| err.to_string())?;
            articles.iter().for_each(print_summary);
        }
        Command::Article(raw) => {
            let entity = EntityRef::parse_raw(&raw).map_err(|err| err.to_string())?;
            let article = service
                .resolve_entity(&entity)
                .map_err(|err| err.to_string())?;
            print_summary(&article);
            println!();
            println!("{}", article.content);
        }
        Command::Search { author, text } => {
            let articles = match author {
                Some(raw) => {
                    let author = search_author(&raw)?;
                    service.search_articles_by(&author, &text)
                }
                None => service.search_articles(&text),
            }
            .map_err(|err| err.to_string())?;
            articles.iter().for_each(print_summary);
        }
        Command::Ping | Command::Relays => {}
    }
    Ok(())
}

/// Accepts a public key or an article address and yields its author.
fn search_author(raw: &str) -> Result<String, String> {
    let entity = EntityRef::parse_raw(raw).map_err(|err| err.to_string())?;
    entity
        .subject()
        .map(str::to_string)
        .ok_or_else(|| format!("`{raw}` does not name an author"))
}

fn start_logging(config: &AppConfig) -> Result<(), String> {
    let Some(log_dir) = config.log_dir.as_deref() else {
        return Ok(());
    };
    let level = config.log_level.as_deref().unwrap_or(default_log_level());
    init_logging(level, log_dir)
}

fn print_summary(article: &Article) {
    let title = if article.title.is_empty() {
        article.identifier.as_str()
    } else {
        article.title.as_str()
    };
    println!(
        "{}\t{}\t{}\thighlights={}",
        article.created_at, article.address, title, article.applied_highlights
    );
}

#[cfg(test)]
mod tests {
    use super::{parse_command, search_author, Command};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parses_known_commands() {
        assert!(matches!(parse_command(&args(&["ping"])), Ok(Command::Ping)));
        assert!(matches!(
            parse_command(&args(&["articles", "abcd"])),
            Ok(Command::Articles(author)) if author == "abcd"
        ));
        assert!(matches!(
            parse_command(&args(&["search", "rust", "sqlite"])),
            Ok(Command::Search { author: None, text }) if text == "rust sqlite"
        ));
        assert!(matches!(
            parse_command(&args(&["search", "--author", "abcd", "rust"])),
            Ok(Command::Search { author: Some(author), text }) if author == "abcd" && text == "rust"
        ));
    }

    #[test]
    fn search_author_accepts_pubkey_or_address() {
        assert_eq!(search_author("abcd"), Ok("abcd".to_string()));
        assert_eq!(search_author("30023:abcd:post"), Ok("abcd".to_string()));
        assert!(search_author("note:ab01").is_err());
    }

    #[test]
    fn rejects_missing_or_extra_arguments() {
        assert!(parse_command(&args(&[])).is_err());
        assert!(parse_command(&args(&["article"])).is_err());
        assert!(parse_command(&args(&["ping", "extra"])).is_err());
        assert!(parse_command(&args(&["search"])).is_err());
        assert!(parse_command(&args(&["search", "--author", "abcd"])).is_err());
    }
}
