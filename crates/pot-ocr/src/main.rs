use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use clap::{Args as ClapArgs, Parser, Subcommand};
use pot_ocr_core::probe::local_client;
use pot_ocr_core::{HealthProbe, OcrClient, PluginHost, Readiness, ServiceConfig};
use std::io;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

mod context;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory containing the OCR service script
    #[arg(long, global = true)]
    plugin_dir: Option<PathBuf>,

    /// JSON configuration file (defaults to the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the service port
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Keep the service's output in the cache dir instead of discarding it
    #[arg(long, global = true)]
    log_service: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recognize text in an image
    Recognize(RecognizeArgs),
    /// Check whether the service answers its health endpoint
    Health,
    /// Start the service if it is not running and wait until it is ready
    Ensure,
    /// List the languages the service supports
    Languages {
        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },
}

#[derive(ClapArgs, Debug)]
struct RecognizeArgs {
    /// Image file to recognize
    #[arg(required_unless_present = "base64", conflicts_with = "base64")]
    image: Option<PathBuf>,

    /// Base64-encoded image instead of a file
    #[arg(long)]
    base64: Option<String>,

    /// Language identifier understood by the service
    #[arg(long, default_value = "en")]
    lang: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries recognized text only; logs go to stderr.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into());

    fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let config = load_config(&args)?;
    let host = context::build_host(args.plugin_dir.clone(), &config);
    let config = if args.log_service {
        let log_path = host.cache_dir().join("ocr_service.log");
        info!("Service output goes to {}", log_path.display());
        config.with_service_log(log_path)
    } else {
        config
    };
    let host = host.with_service_config(config.clone());

    info!("OCR service endpoint: {}", config.endpoint().base_url());

    match args.command {
        Command::Recognize(recognize) => {
            let image = read_image(&recognize)?;
            let text = pot_ocr_core::recognize(&image, &recognize.lang, &host).await?;
            println!("{}", text);
        }
        Command::Health => {
            let outcome = HealthProbe::new(local_client())
                .probe(&config.endpoint(), config.initial_probe_timeout())
                .await;
            if !outcome.is_reachable() {
                println!("unreachable");
                std::process::exit(1);
            }
            println!("reachable");
        }
        Command::Ensure => {
            let client = OcrClient::new(config);
            let readiness = client.supervisor().ensure_running(&host).await?;
            match readiness {
                Readiness::AlreadyRunning => println!("already running"),
                Readiness::Launched { handle, waited } => {
                    println!("launched (pid {}), ready after {}ms", handle.pid, waited.as_millis())
                }
                Readiness::AwaitedLaunch { waited } => {
                    println!("ready after {}ms", waited.as_millis())
                }
            }
        }
        Command::Languages { json } => {
            let client = OcrClient::new(config);
            let languages = client.supported_languages(&host).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&languages)?);
            } else {
                for language in &languages.languages {
                    let marker = if *language == languages.default { " (default)" } else { "" };
                    println!("{}{}", language, marker);
                }
            }
        }
    }

    Ok(())
}

fn load_config(args: &Args) -> Result<ServiceConfig> {
    let path = args.config.clone().or_else(ServiceConfig::default_path);
    let config = match path {
        Some(path) => ServiceConfig::load(&path)?,
        None => ServiceConfig::default(),
    };
    let config = config.with_env_overrides()?;

    Ok(match args.port {
        Some(port) => config.with_port(port),
        None => config,
    })
}

fn read_image(args: &RecognizeArgs) -> Result<String> {
    if let Some(encoded) = &args.base64 {
        return Ok(encoded.trim().to_string());
    }
    let Some(path) = &args.image else {
        bail!("No image given");
    };

    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read image: {}", path.display()))?;
    if bytes.is_empty() {
        bail!("Image file is empty: {}", path.display());
    }
    Ok(STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_recognize_with_file() {
        let args = Args::try_parse_from(["pot-ocr", "recognize", "shot.png", "--lang", "japan"]).unwrap();
        match args.command {
            Command::Recognize(r) => {
                assert_eq!(r.image, Some(PathBuf::from("shot.png")));
                assert_eq!(r.lang, "japan");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn recognize_needs_an_image() {
        assert!(Args::try_parse_from(["pot-ocr", "recognize"]).is_err());
        assert!(Args::try_parse_from(["pot-ocr", "recognize", "a.png", "--base64", "aW1n"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let args = Args::try_parse_from(["pot-ocr", "health", "--port", "9003"]).unwrap();
        assert_eq!(args.port, Some(9003));
        assert!(matches!(args.command, Command::Health));
    }

    #[test]
    fn base64_input_is_passed_through() {
        let args = RecognizeArgs {
            image: None,
            base64: Some(" aW1n\n".to_string()),
            lang: "en".to_string(),
        };
        assert_eq!(read_image(&args).unwrap(), "aW1n");
    }

    #[test]
    fn image_file_is_encoded() {
        let path = std::env::temp_dir().join(format!("pot-ocr-img-{}.bin", std::process::id()));
        std::fs::write(&path, b"img").unwrap();
        let args = RecognizeArgs {
            image: Some(path.clone()),
            base64: None,
            lang: "en".to_string(),
        };
        let encoded = read_image(&args);
        let _ = std::fs::remove_file(&path);
        assert_eq!(encoded.unwrap(), "aW1n");
    }

    #[test]
    fn port_flag_overrides_config() {
        let missing = std::env::temp_dir().join("pot-ocr-cli-no-config.json");
        let args = Args::try_parse_from([
            "pot-ocr",
            "--config",
            missing.to_str().unwrap(),
            "--port",
            "4555",
            "ensure",
        ])
        .unwrap();
        let config = load_config(&args).unwrap();
        assert_eq!(config.port, 4555);
    }
}
