use std::path::PathBuf;
use structopt::StructOpt;

mod text;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

#[derive(Debug, StructOpt)]
#[structopt(name = "w3g", about = "Parse Warcraft III replay (.w3g) files.")]
enum Opt {
  /// Parse a replay and print the full report
  Parse {
    replay: PathBuf,
    /// Output format: text or json
    #[structopt(short, long, default_value = "text", possible_values = &["text", "json"])]
    format: String,
    /// Output file (default: stdout)
    #[structopt(short, long)]
    output: Option<PathBuf>,
    /// JSON indent width
    #[structopt(long, default_value = "2")]
    indent: usize,
  },
  /// Show player information
  Players { replay: PathBuf },
  /// Show chat messages
  Chat { replay: PathBuf },
  /// Show basic replay information (header only, fast)
  Info { replay: PathBuf },
  /// Show game actions
  Actions {
    replay: PathBuf,
    /// Maximum actions to show
    #[structopt(short = "n", long, default_value = "50")]
    limit: usize,
    /// Show decoded action details
    #[structopt(short, long)]
    detail: bool,
    /// Filter by action name substring (e.g. ability_position)
    #[structopt(short, long)]
    filter: Option<String>,
  },
  /// Parse multiple replays into a JSON array
  Batch {
    replays: Vec<PathBuf>,
    /// Output JSON file
    #[structopt(short, long)]
    output: PathBuf,
  },
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_writer(std::io::stderr)
    .init();

  if let Err(e) = run(Opt::from_args()) {
    eprintln!("Error: {}", e);
    std::process::exit(1);
  }
}

fn run(opt: Opt) -> Result<()> {
  match opt {
    Opt::Parse {
      replay,
      format,
      output,
      indent,
    } => {
      let parsed = w3g::Replay::open(replay)?;
      let out = if format == "json" {
        to_json_with_indent(&parsed, indent)?
      } else {
        text::format_replay(&parsed)
      };
      match output {
        Some(path) => {
          std::fs::write(&path, out)?;
          println!("Output written to {}", path.display());
        }
        None => println!("{}", out),
      }
    }
    Opt::Players { replay } => {
      let parsed = w3g::Replay::open(replay)?;
      print!("{}", text::format_players(&parsed));
    }
    Opt::Chat { replay } => {
      let parsed = w3g::Replay::open(replay)?;
      print!("{}", text::format_chat(&parsed));
    }
    Opt::Info { replay } => {
      let header = w3g::Replay::parse_header(replay)?;
      print!("{}", text::format_info(&header));
    }
    Opt::Actions {
      replay,
      limit,
      detail,
      filter,
    } => {
      let parsed = w3g::Replay::open(replay)?;
      print!("{}", text::format_actions(&parsed, limit, detail, filter.as_deref()));
    }
    Opt::Batch { replays, output } => batch(replays, output)?,
  }
  Ok(())
}

/// Parse failures for individual files are soft: reported on stderr, the
/// batch carries on.
fn batch(replays: Vec<PathBuf>, output: PathBuf) -> Result<()> {
  if replays.is_empty() {
    return Err("no replay files specified".into());
  }

  let total = replays.len();
  let mut results = vec![];
  let mut errors = 0;

  for (i, path) in replays.iter().enumerate() {
    eprintln!("[{}/{}] parsing {}", i + 1, total, path.display());
    match w3g::Replay::open(path) {
      Ok(replay) => {
        let mut value = replay.to_json_value();
        value["_source_file"] = serde_json::json!(path.display().to_string());
        results.push(value);
      }
      Err(e) => {
        eprintln!("error parsing {}: {}", path.display(), e);
        errors += 1;
      }
    }
  }

  let json = serde_json::to_string_pretty(&serde_json::Value::Array(results))?;
  std::fs::write(&output, json)?;
  println!(
    "Parsed {} replays to {} ({} errors)",
    total - errors,
    output.display(),
    errors
  );
  Ok(())
}

fn to_json_with_indent(replay: &w3g::Replay, indent: usize) -> Result<String> {
  let value = replay.to_json_value();
  if indent == 0 {
    return Ok(serde_json::to_string(&value)?);
  }
  let indent_bytes = vec![b' '; indent];
  let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent_bytes);
  let mut out = Vec::new();
  let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
  serde::Serialize::serialize(&value, &mut ser)?;
  Ok(String::from_utf8(out)?)
}
