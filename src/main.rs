use std::env;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;

use outpaint::logger::{self, LogLevel, LoggerConfig};
use outpaint::{
    BackendConfig, Config, Direction, ExpandOutcome, ExpansionEvent, ExpansionOrchestrator,
    GenerationBackend, GenerationOptions, NameKind, SdWebuiClient, CANVAS_SIZE,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logger::init_with_config(LoggerConfig::development().with_level(LogLevel::Debug))?;

    match dotenv::dotenv() {
        Ok(_) => log::info!("✅ .env file loaded successfully"),
        Err(_) => log::warn!("⚠️  No .env file found, using system environment variables"),
    }

    let config = Config::from_env();
    logger::log_config_info(&config);
    let canvas_size = config.canvas_size.unwrap_or(CANVAS_SIZE);

    let mut args = env::args().skip(1);
    let image_path = match args.next() {
        Some(path) => path,
        None => {
            log::error!("❌ Usage: outpaint <image.png> [left|right|up|down] [generate_width] [iterations]");
            return Ok(());
        }
    };
    let direction: Direction = args.next().as_deref().unwrap_or("right").parse()?;
    let generate_width: u32 = args.next().as_deref().unwrap_or("192").parse()?;
    let iterations: u32 = args.next().as_deref().unwrap_or("1").parse()?;

    if generate_width < 32 || generate_width > canvas_size - 32 {
        log::error!(
            "❌ Generate width {} outside 32..={}",
            generate_width,
            canvas_size - 32
        );
        return Ok(());
    }

    let backend_config: BackendConfig = config.backend.clone().unwrap_or_default();
    let backend = Arc::new(SdWebuiClient::new(backend_config)?);
    logger::log_startup_info("outpaint", env!("CARGO_PKG_VERSION"), backend.base_url());

    match backend.progress().await {
        Ok(_) => log::info!("✅ Backend reachable"),
        Err(e) => log::warn!("⚠️  Backend not reachable yet: {}", e),
    }

    let samplers = backend.option_names(NameKind::Samplers).await;
    let schedulers = backend.option_names(NameKind::Schedulers).await;
    log::info!("🎛️  {} samplers available:", samplers.len());
    for name in &samplers {
        log::info!("   {}", name);
    }
    log::info!("🎛️  {} schedulers available:", schedulers.len());
    for name in &schedulers {
        log::info!("   {}", name);
    }

    let mut options = GenerationOptions::default();
    if let Ok(prompt) = env::var("OUTPAINT_PROMPT") {
        options.prompt = prompt;
    }
    if let Ok(negative_prompt) = env::var("OUTPAINT_NEGATIVE_PROMPT") {
        options.negative_prompt = negative_prompt;
    }

    let source = image::open(&image_path)?.to_rgb8();
    log::info!(
        "🖼️  Loaded {} ({}x{})",
        image_path,
        source.width(),
        source.height()
    );

    let (orchestrator, events) = ExpansionOrchestrator::with_canvas_size(backend, canvas_size);
    let orchestrator = match config.poll_interval_ms {
        Some(ms) => orchestrator.with_poll_interval(Duration::from_millis(ms)),
        None => orchestrator,
    };
    orchestrator.set_image(source);

    let listener = tokio::spawn(async move {
        let mut stream = UnboundedReceiverStream::new(events);
        while let Some(event) = stream.next().await {
            match event {
                ExpansionEvent::StatusChanged(status) => log::info!("📡 Status: {}", status),
                ExpansionEvent::Progress(fraction) => {
                    log::info!("⏳ Progress: {:.0}%", fraction * 100.0)
                }
                ExpansionEvent::ImageUpdated(image) => {
                    log::debug!("🖼️  Canvas now {}x{}", image.width(), image.height())
                }
                ExpansionEvent::IterationStarted { current, total } => {
                    log::info!("🔁 Iteration {}/{}", current, total)
                }
            }
        }
    });

    let _timer = logger::timer("expansion");
    let outcome = if iterations > 1 {
        orchestrator
            .generate_consecutive(direction, generate_width, &options, iterations)
            .await
    } else {
        orchestrator.generate(direction, generate_width, &options).await
    };

    match outcome {
        Ok(ExpandOutcome::Completed(image)) => {
            let filename = format!("outpainted_{}.png", chrono::Utc::now().timestamp());
            image.save(&filename)?;
            log::info!(
                "💾 Saved {}x{} result to {}",
                image.width(),
                image.height(),
                filename
            );
        }
        Ok(ExpandOutcome::Cancelled) => log::warn!("⚠️  Generation was cancelled"),
        Ok(ExpandOutcome::CancelRequested) => {}
        Err(e) => log::error!("❌ Generation failed: {}", e),
    }

    drop(orchestrator);
    let _ = listener.await;
    Ok(())
}
