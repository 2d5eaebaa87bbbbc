use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use tracing::info;

use loto6_watch::core::config;
use loto6_watch::tools::check::{run_check, CheckOptions};
use loto6_watch::tools::import::run_import;
use loto6_watch::tools::update::run_update;
use loto6_watch::{Scraper, Store, UserPick};

const USAGE: &str = "\
loto6-watch — Loto6 winning-number scraper and prize checker

USAGE:
    loto6-watch update
    loto6-watch check [--from YYYY-MM-DD] [--to YYYY-MM-DD]
    loto6-watch import <file.csv>
    loto6-watch add-pick <n,n,n,n,n,n>
    loto6-watch picks
    loto6-watch draws [count]
";

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("bad date {value:?}, expected YYYY-MM-DD"))
}

fn parse_pick(value: &str) -> Result<UserPick> {
    let numbers: Vec<u8> = value
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<u8>()
                .with_context(|| format!("bad number {:?}", part.trim()))
        })
        .collect::<Result<_>>()?;
    UserPick::new(&numbers).map_err(Into::into)
}

fn fmt_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{n:02}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        eprint!("{USAGE}");
        std::process::exit(2);
    };

    let config = config::load_config();
    let db_path = config.resolve_database_path();
    let mut store = Store::open(&db_path)?;
    info!(db = %db_path.display(), "store opened");

    match command {
        "update" => {
            let scraper = Scraper::new(&config);
            let summary = run_update(&scraper, &mut store, &config.resolve_sources()).await?;
            if summary.scraped == 0 {
                println!("No winning numbers resolved.");
            } else {
                println!(
                    "Scraped {} drawing(s): {} inserted, {} updated.",
                    summary.scraped, summary.inserted, summary.updated
                );
            }
        }
        "check" => {
            let mut options = CheckOptions::default();
            let mut rest = args[1..].iter();
            while let Some(flag) = rest.next() {
                match flag.as_str() {
                    "--from" => {
                        let value = rest.next().context("--from needs a date")?;
                        options.start = Some(parse_date(value)?);
                    }
                    "--to" => {
                        let value = rest.next().context("--to needs a date")?;
                        options.end = Some(parse_date(value)?);
                    }
                    other => bail!("unknown flag {other:?}"),
                }
            }

            let scraper = Scraper::new(&config);
            let outcome = run_check(&scraper, &mut store, options).await?;
            if outcome.draws_considered == 0 {
                // Expected empty state — distinct from a scrape failure,
                // which would have surfaced as an error above.
                println!("No winning numbers resolved for the requested range.");
                return Ok(());
            }

            let mut wins = 0usize;
            for result in &outcome.results {
                if result.tier.is_win() {
                    wins += 1;
                    println!(
                        "🎉 {}  pick [{}]  {} ({} matches{})",
                        result.draw.draw_date,
                        fmt_numbers(&result.picked),
                        result.tier,
                        result.match_count,
                        if result.bonus_match { ", bonus" } else { "" }
                    );
                }
            }
            println!(
                "Checked {} pick/draw combinations across {} drawing(s): {} win(s).",
                outcome.results.len(),
                outcome.draws_considered,
                wins
            );
        }
        "import" => {
            let path = args.get(1).context("import needs a CSV file path")?;
            let summary = run_import(&mut store, std::path::Path::new(path))?;
            println!(
                "Imported {} drawing(s) ({} updated existing).",
                summary.imported, summary.updated
            );
            for error in &summary.errors {
                eprintln!("skipped: {error}");
            }
        }
        "add-pick" => {
            let value = args.get(1).context("add-pick needs six numbers, e.g. 3,8,14,22,29,41")?;
            let pick = parse_pick(value)?;
            store.add_pick(&pick)?;
            println!("Registered pick [{pick}].");
        }
        "picks" => {
            let picks = store.picks()?;
            if picks.is_empty() {
                println!("No registered picks.");
            }
            for pick in picks {
                println!("[{pick}]");
            }
        }
        "draws" => {
            let limit = match args.get(1) {
                Some(v) => v.parse::<usize>().with_context(|| format!("bad count {v:?}"))?,
                None => 10,
            };
            let draws = store.latest_draws(limit)?;
            if draws.is_empty() {
                println!("No drawings stored; run `loto6-watch update` first.");
            }
            for draw in draws {
                println!("{draw}");
            }
        }
        _ => {
            eprint!("{USAGE}");
            std::process::exit(2);
        }
    }

    Ok(())
}
