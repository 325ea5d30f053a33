mod cli;

use vidrelay::{
    config::{self, Config},
    relay::Relay,
    remote::YtDlp,
    source::{LinkFile, ProgressLog},
    split::Segmenter,
    telegram::TelegramClient,
    upload::{RunSummary, UploadPipeline},
};
use vidrelay_av::{Cutter, FfmpegCutter, FfprobeProber, MediaProbe, SegmentWorkspace};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "vidrelay=trace,vidrelay_av=trace".to_string()
        } else {
            "vidrelay=debug,vidrelay_av=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_links(cli.config.as_deref()))
        }
        Commands::Send {
            file,
            keep_source,
            caption,
            thumbnail,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(send_file(
                &file,
                cli.config.as_deref(),
                keep_source,
                caption.as_deref(),
                thumbnail.as_deref(),
            ))
        }
        Commands::Split {
            file,
            dry_run,
            output,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(split_file(
                &file,
                cli.config.as_deref(),
                dry_run,
                output.as_deref(),
            ))
        }
        Commands::Probe { file, json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(probe_file(&file, cli.config.as_deref(), json))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("vidrelay {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn build_media_tools(config: &Config) -> Result<(Arc<dyn MediaProbe>, Arc<dyn Cutter>)> {
    let timeout = Duration::from_secs(config.tools.timeout_secs);
    let ffprobe = vidrelay_av::get_tool_path("ffprobe", config.tools.ffprobe_path.as_deref())?;
    let ffmpeg = vidrelay_av::get_tool_path("ffmpeg", config.tools.ffmpeg_path.as_deref())?;

    let probe: Arc<dyn MediaProbe> = Arc::new(FfprobeProber::new(ffprobe).with_timeout(timeout));
    let cutter: Arc<dyn Cutter> = Arc::new(FfmpegCutter::new(ffmpeg).with_timeout(timeout));
    Ok((probe, cutter))
}

fn build_pipeline(config: &Config) -> Result<UploadPipeline> {
    if config.telegram.chat_id.is_empty() {
        anyhow::bail!("telegram.chat_id is not set");
    }

    let client = Arc::new(TelegramClient::new(&config.telegram)?);
    let (probe, cutter) = build_media_tools(config)?;
    let segmenter = Segmenter::from_config(&config.split, probe.clone(), cutter);

    Ok(UploadPipeline::new(
        probe,
        segmenter,
        client.clone(),
        client,
        config.telegram.chat_id.clone(),
        config.split.work_dir(),
    ))
}

async fn run_links(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    for warning in config.warnings() {
        tracing::warn!("{}", warning);
    }

    let pipeline = build_pipeline(&config)?;
    let ytdlp = Arc::new(YtDlp::from_config(&config.tools)?);
    let relay = Relay::new(
        ytdlp.clone(),
        ytdlp,
        pipeline,
        LinkFile::new(&config.links.links_file, config.links.reverse),
        ProgressLog::new(&config.links.progress_file),
        &config.links.download_dir,
    );

    let report = relay.run().await?;

    println!("Relayed: {}", report.completed.len());
    for link in &report.completed {
        println!("  ✓ #{} {}", link.index, link.reference);
    }
    if !report.failed.is_empty() {
        println!("Failed: {}", report.failed.len());
        for (link, reason) in &report.failed {
            println!("  ✗ #{} {}: {}", link.index, link.reference, reason);
        }
    }
    if !report.not_attempted.is_empty() {
        println!("Not attempted: {}", report.not_attempted.len());
    }

    if !report.is_success() {
        anyhow::bail!(
            "{} link(s) not relayed; rerun to resume",
            report.failed.len() + report.not_attempted.len()
        );
    }
    Ok(())
}

async fn send_file(
    file: &Path,
    config_path: Option<&Path>,
    keep_source: bool,
    caption: Option<&str>,
    thumbnail: Option<&Path>,
) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("Input file does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let pipeline = build_pipeline(&config)?.keep_source(keep_source);

    let summary = pipeline
        .run(file, caption, thumbnail)
        .await
        .with_context(|| format!("Failed to relay {}", file.display()))?;

    print_summary(&summary);
    if !summary.is_complete() {
        anyhow::bail!(
            "{} item(s) failed to upload: {:?}",
            summary.failures.len(),
            summary.failed_indices()
        );
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("Source: {}", summary.source.display());
    println!("Split: {}", if summary.split { "yes" } else { "no" });
    for item in &summary.items {
        let remote = item
            .remote
            .as_ref()
            .map(|r| format!(" -> {}", r))
            .unwrap_or_default();
        println!(
            "  [{}] {:.3}s..{:.3}s {:?}{}",
            item.segment.index,
            item.segment.start_seconds,
            item.segment.end_seconds,
            item.state,
            remote
        );
    }
    for (index, err) in &summary.cleanup_failures {
        println!("  cleanup failed for [{}]: {}", index, err);
    }
}

async fn split_file(
    file: &Path,
    config_path: Option<&Path>,
    dry_run: bool,
    output: Option<&Path>,
) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("Input file does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let (probe, cutter) = build_media_tools(&config)?;
    let segmenter = Segmenter::from_config(&config.split, probe.clone(), cutter);

    let media = probe.probe(file).await?;
    let Some(plan) = segmenter.plan_for(&media)? else {
        println!(
            "{} ({} bytes) fits within {} bytes; no split needed",
            file.display(),
            media.size_bytes,
            segmenter.target_max_bytes()
        );
        return Ok(());
    };

    println!(
        "Chunk: {}s, overlap: {}s, duration: {:.3}s",
        plan.chunk_duration_seconds(),
        plan.overlap_seconds(),
        plan.total_duration_seconds()
    );
    for (i, range) in plan.ranges().iter().enumerate() {
        println!("  [{}] {}", i, range);
    }

    if dry_run {
        println!("\n[DRY RUN] Would cut {} segments", plan.ranges().len());
        return Ok(());
    }

    let root = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.split.work_dir());
    let workspace = SegmentWorkspace::create(&root, file)?;
    match segmenter.cut(&media, &plan, &workspace).await {
        Ok(segments) => {
            println!("\nSegments in {}:", workspace.dir().display());
            for segment in segments {
                println!("  {}", segment.output_path.display());
            }
            Ok(())
        }
        Err(e) => {
            let produced = match e {
                vidrelay::Error::Segmentation { index, .. } => index + 1,
                _ => plan.max_iterations(),
            };
            workspace.discard(produced);
            Err(e.into())
        }
    }
}

async fn probe_file(file: &Path, config_path: Option<&Path>, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let ffprobe = vidrelay_av::get_tool_path("ffprobe", config.tools.ffprobe_path.as_deref())?;
    let prober = FfprobeProber::new(ffprobe)
        .with_timeout(Duration::from_secs(config.tools.timeout_secs));
    let media = prober.probe(file).await?;

    if json {
        let json_str = serde_json::to_string_pretty(&media)?;
        println!("{}", json_str);
    } else {
        println!("File: {}", media.source_path.display());
        println!("Container: {}", media.container);
        println!("Size: {} bytes", media.size_bytes);
        let secs = media.duration_seconds as u64;
        let mins = secs / 60;
        let hours = mins / 60;
        println!(
            "Duration: {:02}:{:02}:{:02} ({:.3}s)",
            hours,
            mins % 60,
            secs % 60,
            media.duration_seconds
        );
        match media.video {
            Some(ref video) => println!("Video: {} {}x{}", video.codec, video.width, video.height),
            None => println!("Video: none"),
        }

        let target = config.split.target_max_bytes;
        if media.size_bytes > target {
            println!("\nExceeds {} bytes; would be split", target);
        }
    }

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    println!("Checking external tools...\n");

    let tools = vidrelay_av::check_tools(|name| match name {
        "ffmpeg" => config.tools.ffmpeg_path.as_deref(),
        "ffprobe" => config.tools.ffprobe_path.as_deref(),
        "yt-dlp" => config.tools.yt_dlp_path.as_deref(),
        _ => None,
    });
    let missing = tools.iter().filter(|t| !t.is_available()).count();

    for tool in &tools {
        let status = if tool.is_available() { "✓" } else { "✗" };
        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }
        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
            if tool.configured {
                print!(" [config]");
            }
        }
        println!();
    }

    println!();
    if missing == 0 {
        println!("All required tools are available!");
    } else {
        println!("{} tool(s) missing. Install them or set their paths under [tools].", missing);
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::load_config_or_default(None)?
        }
    };

    println!("  Bot API: {}", config.telegram.api_url);
    println!(
        "  Destination: {}",
        if config.telegram.chat_id.is_empty() {
            "(not set)"
        } else {
            config.telegram.chat_id.as_str()
        }
    );
    println!("  Target segment size: {} bytes", config.split.target_max_bytes);
    println!("  Overlap: {}s", config.split.overlap_seconds);
    println!("  Links file: {}", config.links.links_file.display());

    for warning in config.warnings() {
        println!("  ⚠ {}", warning);
    }

    Ok(())
}
