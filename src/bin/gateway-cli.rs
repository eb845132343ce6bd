use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gateway_sdk::GatewayClient;
use serde_json::{Map, Value};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for the edge gateway record store", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8787")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway liveness
    Health,
    /// Show sampled record availability
    Status,
    /// Print a stored chapter
    Get { chapter: u16 },
    /// Store a chapter from a JSON file holding `{ "verses": {...}, "metadata": {...} }`
    Put { chapter: u16, file: PathBuf },
    /// Store many chapters from a JSON file holding `{ "<chapter>": {...}, ... }`
    /// or `{ "chapters": { ... } }`
    Populate { file: PathBuf },
    /// Print the raw value stored under a key
    Raw { key: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = GatewayClient::new(&cli.url);

    match cli.command {
        Commands::Health => print_json(&client.health().await?)?,
        Commands::Status => print_json(&client.status().await?)?,
        Commands::Get { chapter } => match client.get_chapter(chapter).await? {
            Some(record) => print_json(&record)?,
            None => eprintln!("Chapter {} is not stored", chapter),
        },
        Commands::Put { chapter, file } => {
            let record = read_json(&file)?;
            let ack = client.put_chapter(chapter, &record).await?;
            println!("{} ({} verses)", ack.message, ack.verse_count);
        }
        Commands::Populate { file } => {
            let chapters = match read_json(&file)? {
                Value::Object(mut map) => match map.remove("chapters") {
                    Some(Value::Object(chapters)) => chapters,
                    Some(_) => return Err("\"chapters\" must be an object".into()),
                    None => map,
                },
                _ => return Err("populate file must hold a JSON object".into()),
            };
            let results = client.populate(chapters).await?;
            println!("stored {}, failed {}", results.success, results.failed);
            print_failures(&results.chapters);
        }
        Commands::Raw { key } => match client.raw(&key).await? {
            Some(value) => println!("{}", value),
            None => eprintln!("No value under '{}'", key),
        },
    }

    Ok(())
}

fn read_json(path: &PathBuf) -> Result<Value, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn print_json(value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_failures(chapters: &Map<String, Value>) {
    for (chapter, status) in chapters {
        if status.as_str() != Some("success") {
            eprintln!("  chapter {}: {}", chapter, status);
        }
    }
}
