//! FX Lens — Binary Entrypoint
//! Interactive terminal front-end over the session: fetch the global
//! sentiment sweep, drill into a currency pair, ask grounded follow-ups,
//! print the week-ahead calendar grid.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fx_lens::analyze::normalize::split_lead;
use fx_lens::config::ai::AiConfig;
use fx_lens::config::app::AppConfig;
use fx_lens::llm::build_client;
use fx_lens::sources::calendar::TradingEconomicsProvider;
use fx_lens::sources::news::BingNewsProvider;
use fx_lens::sources::{CalendarProvider, HeadlineProvider};
use fx_lens::{SentimentReport, Session};

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fx_lens=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let app_cfg = AppConfig::load();
    let ai_cfg = AiConfig::load_from_file("config/ai.json").unwrap_or_else(|e| {
        tracing::warn!(error = %e, "AI config not loaded; LLM disabled");
        AiConfig::disabled()
    });
    let llm = build_client(&ai_cfg);

    let headlines: Arc<dyn HeadlineProvider> = Arc::new(
        BingNewsProvider::from_env(app_cfg.market.clone())
            .context("BING_API_KEY is required for headline fetches")?,
    );
    let calendar: Arc<dyn CalendarProvider> = Arc::new(
        TradingEconomicsProvider::from_env(
            app_cfg.calendar_countries.clone(),
            app_cfg.calendar_days_ahead,
        )
        .context("TRADINGECONOMICS_API_KEY is required for the calendar grid")?,
    );

    let mut session =
        Session::new(app_cfg, headlines, calendar, llm).with_parse_mode(ai_cfg.parse_mode);

    println!("FX Lens — currency market insights");
    print_help();

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        let (cmd, rest) = match line.split_once(' ') {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };

        match cmd {
            "" => {}
            "fetch" => {
                let report = session.fetch_global_sentiment().await;
                render_panel("Global FX Sentiment", &report);
            }
            "pair" => {
                if rest.is_empty() {
                    println!("usage: pair EUR/USD  (known pairs: {})", session.config().pairs.join(", "));
                    continue;
                }
                let report = session.analyze_pair(rest).await;
                render_panel(&format!("{rest} Deep Dive"), &report);
            }
            "ask" => match session.ask_followup(rest).await {
                Ok(Some(reply)) => println!("\n{reply}\n"),
                Ok(None) => println!("(empty question ignored)"),
                Err(e) => println!("Follow-up failed: {e}"),
            },
            "week" => {
                let (grid, notice) = session.week_ahead().await;
                if let Some(msg) = notice {
                    println!("! {msg}");
                }
                render_week(&grid);
            }
            "clear" => {
                session.clear_chat();
                println!("(conversation cleared)");
            }
            "help" => print_help(),
            "quit" | "exit" => break,
            other => println!("unknown command: {other} (try 'help')"),
        }
    }

    Ok(())
}

fn print_help() {
    println!(
        "commands:\n  \
         fetch           fetch and summarize global FX sentiment\n  \
         pair <PAIR>     analyze one currency pair (e.g. pair EUR/USD)\n  \
         ask <question>  follow-up question about the last global summary\n  \
         week            week-ahead economic calendar\n  \
         clear           clear the follow-up conversation\n  \
         quit            exit"
    );
}

fn render_panel(title: &str, report: &SentimentReport) {
    println!("\n== {title} ==");
    if let Some(msg) = &report.notice {
        println!("! {msg}");
    }
    println!("Overall sentiment: {}", report.artifact.overall);
    if !report.artifact.explanation.is_empty() {
        println!("{}", report.artifact.explanation);
    }
    for insight in &report.artifact.insights {
        let seg = split_lead(insight);
        match seg.lead {
            Some(lead) => println!("  • {lead}: {}", seg.body),
            None => println!("  • {}", seg.body),
        }
    }
    let c = &report.artifact.counts;
    println!(
        "Counts: {} positive / {} neutral / {} negative ({} headlines)\n",
        c.positive,
        c.neutral,
        c.negative,
        report.snippets.len()
    );
}

fn render_week(grid: &fx_lens::WeekGrid) {
    println!("\nWeek Ahead (Global Events)");
    for (day, items) in grid.iter() {
        println!("{day}:");
        if items.is_empty() {
            println!("  (no events)");
        } else {
            for item in items {
                println!("  - {item}");
            }
        }
    }
    println!();
}
