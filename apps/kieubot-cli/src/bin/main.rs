use std::env;

use tracing_subscriber::EnvFilter;

use kieubot_core::config::Settings;
use kieubot_core::types::{DocType, SearchHit, TypeFilter};
use kieubot_retrieve::{
    Retriever, DEFAULT_K, DEFAULT_NUM_CANDIDATES, SMART_DEFAULT_K, SMART_NUM_CANDIDATES,
};

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() {
        eprintln!("Usage: {} <query|smart> \"<question>\" [k] [type]", prog);
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let (cmd, args) = parse_args();
    let rt = tokio::runtime::Runtime::new()?;

    match cmd.as_str() {
        "query" => {
            let query_text = args.first().cloned().unwrap_or_else(|| {
                eprintln!("Usage: kieubot-cli query \"<question>\" [k] [type]");
                std::process::exit(1)
            });
            let k = match args.get(1) {
                Some(s) => s.parse()?,
                None => DEFAULT_K,
            };
            let filter = match args.get(2) {
                Some(s) => TypeFilter::Equals(s.parse::<DocType>()?),
                None => TypeFilter::None,
            };
            let hits = rt.block_on(async {
                let retriever = Retriever::connect(&settings).await?;
                retriever.retrieve_context(&query_text, k, filter, DEFAULT_NUM_CANDIDATES).await
            })?;
            print_hits(&hits);
        }
        "smart" => {
            let query_text = args.first().cloned().unwrap_or_else(|| {
                eprintln!("Usage: kieubot-cli smart \"<question>\" [k]");
                std::process::exit(1)
            });
            let k = match args.get(1) {
                Some(s) => s.parse()?,
                None => SMART_DEFAULT_K,
            };
            let hits = rt.block_on(async {
                let retriever = Retriever::connect(&settings).await?;
                retriever.smart_retrieve(&query_text, k, SMART_NUM_CANDIDATES).await
            })?;
            print_hits(&hits);
        }
        _ => {
            eprintln!("Unknown command: {}", cmd);
            std::process::exit(1);
        }
    }
    Ok(())
}

fn print_hits(hits: &[SearchHit]) {
    if hits.is_empty() {
        println!("(no results)");
        return;
    }
    for (i, hit) in hits.iter().enumerate() {
        println!("{:>2}. [{}] score={:.4}", i + 1, hit.meta.doc_type, hit.score);
        if let Some(source) = &hit.meta.source {
            match &hit.meta.line_range {
                Some(range) => println!("    {} ({})", source, range),
                None => println!("    {}", source),
            }
        }
        println!("    {}", hit.text);
    }
}
