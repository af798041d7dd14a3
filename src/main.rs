use anyhow::{Context, Result};
use odata_query::config::ResourceConfig;
use odata_query::lexer::Lexer;
use odata_query::parser::Parser;
use odata_query::sql_compiler::{self, SqlDialect, SqlQuery};
use odata_query::{Pipeline, Query};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "resource.json";

const HELP: &str = "\
commands:
  filter <text>      set $filter
  orderby <text>     set $orderby
  top <n> | skip <n> set paging
  count on|off       toggle $count
  tokens <text>      show the tokens of <text>
  ast <text>         show the filter tree of <text>
  show               print the SQL for the current query
  reset              clear the current query
  help | quit";

/// Loads the resource description, falling back to the sample resource.
fn load_config(path: &str) -> ResourceConfig {
    match ResourceConfig::from_json_file(path) {
        Ok(config) => {
            println!("loaded resource '{}' from {}", config.schema.table_name(), path);
            config
        }
        Err(e) => {
            println!("{}; using the sample 'users' resource", e);
            ResourceConfig::sample()
        }
    }
}

fn show(config: &ResourceConfig, query: &Query) {
    let pipeline = Pipeline::new(&config.schema).with_options(config.options.clone());
    match pipeline.apply(SqlQuery::new(config.schema.table_name()), query) {
        Ok(applied) => {
            println!("{}", applied.query.to_sql(SqlDialect::Postgres));
            if let Some(count) = applied.count {
                println!("{}", sql_compiler::render(&count, SqlDialect::Postgres));
            }
        }
        Err(e) => println!("error: {}", e),
    }
}

/// Handles one REPL line. Returns `false` when the session should end.
fn handle(line: &str, config: &ResourceConfig, query: &mut Query) -> Result<bool> {
    let (command, arg) = line.split_once(' ').unwrap_or((line, ""));
    let arg = arg.trim();

    match command {
        "filter" => query.filter = arg.to_string(),
        "orderby" => query.order_by = arg.to_string(),
        "top" => query.top = arg.parse().context("top expects a number")?,
        "skip" => query.skip = arg.parse().context("skip expects a number")?,
        "count" => query.count = arg.eq_ignore_ascii_case("on"),
        "tokens" => {
            for token in Lexer::new(arg) {
                println!("{:?} {:?} {}..{}", token.kind, token.literal, token.span.start, token.span.end);
            }
        }
        "ast" => match Parser::new(Lexer::new(arg)).try_parse_filter() {
            Ok(expr) => println!("{:#?}", expr),
            Err(e) => println!("invalid filter: {}", e),
        },
        "show" => show(config, query),
        "reset" => *query = Query::default(),
        "help" => println!("{}", HELP),
        "quit" | "exit" => return Ok(false),
        other => println!("unknown command '{}', try 'help'", other),
    }

    Ok(true)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = load_config(&path);
    let mut query = Query::default();

    let mut rl = DefaultEditor::new()?;
    println!("{}", HELP);

    loop {
        match rl.readline("query> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;
                match handle(line, &config, &mut query) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => println!("error: {:#}", e),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
