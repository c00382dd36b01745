//! go2web CLI - fetch a page or search the web from the terminal

use clap::{CommandFactory, Parser};
use go2web::{format_results, search, Client, FetchError, PassthroughExtractor, ResponseCache};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Subdirectory of the cache holding raw search result pages
const SEARCH_CACHE: &str = "search";

/// go2web - a simple web client
#[derive(Parser, Debug)]
#[command(name = "go2web")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Make an HTTP request to the specified URL
    #[arg(short, long, value_name = "URL", conflicts_with = "search")]
    url: Option<String>,

    /// Search the term using DuckDuckGo
    #[arg(short, long, value_name = "TERM", num_args = 1..)]
    search: Option<Vec<String>>,

    /// Cache directory (default: ~/.go2web_cache)
    #[arg(long, env = "GO2WEB_CACHE_DIR", value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match (cli.url, cli.search) {
        (Some(url), _) => run_fetch(&url, cli.cache_dir),
        (None, Some(terms)) => run_search(&terms.join(" "), cli.cache_dir),
        (None, None) => {
            if let Err(e) = Cli::command().print_help() {
                eprintln!("Error: {}", e);
            }
            return;
        }
    };

    match result {
        Ok(output) => writeln_safe(&output),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Send logs to stderr; `RUST_LOG` wins over `--verbose`
fn init_tracing(verbose: bool) {
    let default = if verbose { "go2web=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn open_cache(dir: Option<PathBuf>) -> Result<ResponseCache, FetchError> {
    match dir {
        Some(dir) => ResponseCache::new(dir),
        None => ResponseCache::open_default(),
    }
}

fn run_fetch(url: &str, cache_dir: Option<PathBuf>) -> Result<String, FetchError> {
    let client = Client::new(open_cache(cache_dir)?);
    client.fetch(url)
}

fn run_search(query: &str, cache_dir: Option<PathBuf>) -> Result<String, FetchError> {
    let cache = open_cache(cache_dir)?.namespaced(SEARCH_CACHE)?;
    let client = Client::builder()
        .cache(cache)
        .extractor(PassthroughExtractor)
        .build()?;

    let results = search(&client, query)?;
    Ok(format_results(&results))
}

/// Write to stdout, exit silently on broken pipe
fn writeln_safe(s: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", s) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("Error writing to stdout: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_url() {
        let cli = Cli::try_parse_from(["go2web", "-u", "example.com"]).unwrap();
        assert_eq!(cli.url.as_deref(), Some("example.com"));
        assert!(cli.search.is_none());
    }

    #[test]
    fn test_parse_multi_word_search() {
        let cli = Cli::try_parse_from(["go2web", "--search", "rust", "sockets"]).unwrap();
        assert_eq!(
            cli.search,
            Some(vec!["rust".to_string(), "sockets".to_string()])
        );
        assert!(cli.url.is_none());
    }

    #[test]
    fn test_url_and_search_conflict() {
        let result = Cli::try_parse_from(["go2web", "-u", "example.com", "-s", "rust"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_flags_is_valid() {
        let cli = Cli::try_parse_from(["go2web"]).unwrap();
        assert!(cli.url.is_none());
        assert!(cli.search.is_none());
    }

    #[test]
    fn test_cache_dir_flag() {
        let cli =
            Cli::try_parse_from(["go2web", "--cache-dir", "/tmp/c", "-u", "example.com"]).unwrap();
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/c")));
    }

    #[test]
    fn test_open_cache_with_dir() {
        let dir = std::env::temp_dir().join(format!("go2web-cli-test-{}", std::process::id()));
        let cache = open_cache(Some(dir.clone())).unwrap();
        assert_eq!(cache.root(), dir.as_path());
        let _ = std::fs::remove_dir_all(dir);
    }
}
