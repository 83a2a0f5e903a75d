use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use match_stats_ocr::{
    image_analyzer::ImageAnalyzer,
    ocr::tesseract_ocr::TesseractRecognizer,
    server::{self, ServerConfig},
};
use std::{path::PathBuf, sync::Arc};

/// Match stats OCR - reads the post-match summary screen into JSON
#[derive(Parser, Debug)]
#[command(name = "match_stats_ocr")]
#[command(about = "Extract match statistics from summary screenshots", long_about = None)]
struct Args {
    /// Tesseract data directory (defaults to the system installation)
    #[arg(long, global = true)]
    tessdata: Option<String>,

    /// Tesseract language
    #[arg(long, global = true, default_value = "eng")]
    lang: String,

    /// Fail the whole image when OCR fails for a single region
    #[arg(long, global = true, default_value = "false")]
    strict_ocr: bool,

    /// Write every binarized crop into this directory (calibration aid)
    #[arg(long, global = true)]
    dump_crops: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve POST /process-image
    Serve {
        /// Address to listen on
        #[arg(short = 'b', long, default_value = "127.0.0.1:5000")]
        bind: String,

        /// Directory for uploads while they are processed
        #[arg(short = 'u', long, default_value = "temp_uploads")]
        upload_dir: PathBuf,

        /// The only origin allowed to call the endpoint from a browser
        #[arg(long, default_value = "https://eafc-dashboard-mvp.vercel.app")]
        allowed_origin: String,

        /// Number of images processed at the same time
        #[arg(short = 'w', long, default_value = "1")]
        ocr_workers: usize,

        /// Largest accepted request body in bytes
        #[arg(long, default_value = "20971520")]
        max_upload_bytes: usize,
    },
    /// Process one screenshot and print the JSON record
    Extract {
        image: PathBuf,

        /// Indent the JSON output
        #[arg(short = 'p', long, default_value = "false")]
        pretty: bool,
    },
}

fn build_analyzer(args: &Args) -> Result<ImageAnalyzer> {
    let recognizer = TesseractRecognizer::new(args.tessdata.clone(), args.lang.clone());
    recognizer.check_available()?;

    let mut analyzer = ImageAnalyzer::new(Arc::new(recognizer)).strict_ocr(args.strict_ocr);
    if let Some(dir) = &args.dump_crops {
        std::fs::create_dir_all(dir)?;
        analyzer = analyzer.dump_crops_to(dir);
    }
    Ok(analyzer)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter(None, log::LevelFilter::Info)
        .filter(Some("match_stats_ocr"), log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    let args = Args::parse();
    let analyzer = build_analyzer(&args)?;

    match args.command {
        Command::Serve {
            bind,
            upload_dir,
            allowed_origin,
            ocr_workers,
            max_upload_bytes,
        } => {
            if ocr_workers == 0 {
                anyhow::bail!("ocr-workers must be at least 1");
            }

            let config = ServerConfig {
                upload_dir,
                allowed_origin,
                ocr_workers,
                max_upload_bytes,
            };
            info!("Starting with configuration: {:?}", config);

            let app = server::router(analyzer, &config)?;
            let listener = tokio::net::TcpListener::bind(&bind).await?;
            server::serve(listener, app).await
        }
        Command::Extract { image, pretty } => {
            let record = tokio::task::spawn_blocking(move || analyzer.analyze_file(&image)).await??;
            let json = if pretty {
                serde_json::to_string_pretty(&record)?
            } else {
                serde_json::to_string(&record)?
            };
            println!("{json}");
            Ok(())
        }
    }
}
