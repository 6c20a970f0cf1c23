use anyhow::Result;
use clap::{Arg, Command};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use segment_looper::{
    resolve_startup_segment, Bound, Config, LoopSession, SessionCommand, SimulatedPlayer,
    StartupParams,
};

const DEFAULT_SHARE_BASE: &str = "http://localhost:8080/";

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("segment-looper")
        .version("0.1.0")
        .author("TigreRoll")
        .about("Loop a section of a video with a caption line")
        .arg(
            Arg::new("url")
                .short('u')
                .long("url")
                .value_name("URL")
                .help("Page URL carrying v/s/e/t/id query parameters")
                .conflicts_with("video")
        )
        .arg(
            Arg::new("video")
                .long("video")
                .value_name("ID")
                .help("Video id (instead of --url)")
        )
        .arg(
            Arg::new("start")
                .short('s')
                .long("start")
                .value_name("SECONDS")
                .help("Loop start")
        )
        .arg(
            Arg::new("end")
                .short('e')
                .long("end")
                .value_name("SECONDS")
                .help("Loop end")
        )
        .arg(
            Arg::new("text")
                .short('t')
                .long("text")
                .value_name("TEXT")
                .help("Caption line")
        )
        .arg(
            Arg::new("segment")
                .long("segment")
                .value_name("ID")
                .help("Segment id to look up")
        )
        .arg(
            Arg::new("segments")
                .long("segments")
                .value_name("PATH|URL")
                .help("Segment lookup document")
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file")
        )
        .arg(
            Arg::new("share-base")
                .long("share-base")
                .value_name("URL")
                .help("Base URL for the printed share link")
                .default_value(DEFAULT_SHARE_BASE)
        )
        .arg(
            Arg::new("dev")
                .long("dev")
                .help("Developer mode")
                .action(clap::ArgAction::SetTrue)
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue)
        )
        .get_matches();

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => Config::from_file(path)?,
        None => Config::load().unwrap_or_else(|e| {
            eprintln!("Failed to load config, using defaults: {}", e);
            Config::default()
        }),
    };
    if let Some(source) = matches.get_one::<String>("segments") {
        config.segments.source = Some(source.clone());
    }

    let mut params = match matches.get_one::<String>("url") {
        Some(url) => StartupParams::from_url(url)?,
        None => StartupParams::default(),
    };
    if let Some(video) = matches.get_one::<String>("video") {
        params.video_id = video.trim().to_string();
    }
    if let Some(start) = matches.get_one::<String>("start") {
        params.start = start.trim().parse().ok();
    }
    if let Some(end) = matches.get_one::<String>("end") {
        params.end = end.trim().parse().ok();
    }
    if let Some(text) = matches.get_one::<String>("text") {
        params.caption = Some(text.clone()).filter(|t| !t.trim().is_empty());
    }
    if let Some(segment) = matches.get_one::<String>("segment") {
        params.segment_id = Some(segment.clone()).filter(|s| !s.trim().is_empty());
    }
    params.dev_mode |= matches.get_flag("dev");

    // Configure logging based on verbose flag
    let level = if matches.get_flag("verbose") || params.dev_mode {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    tracing_subscriber::fmt()
        .with_target(params.dev_mode)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    config.validate()?;
    if params.dev_mode {
        info!("{}", config.summary());
    }

    let share_base = matches
        .get_one::<String>("share-base")
        .map(String::as_str)
        .unwrap_or(DEFAULT_SHARE_BASE);
    match params.share_link(share_base) {
        Ok(link) => println!("🔗 {}", link),
        Err(e) => warn!("Could not build share link: {}", e),
    }

    let segment = resolve_startup_segment(&config.segments, &params).await;

    let mut session = LoopSession::new(&config, params)?;
    if let Some(segment) = segment {
        session.apply_segment(&segment).await;
    }
    session.attach_player(Arc::new(SimulatedPlayer::new()));

    println!("💬 {}", session.caption());
    println!("{}", session.readout());

    // Print every readout change as it happens
    let mut readouts = session.subscribe();
    let printer = tokio::spawn(async move {
        while readouts.changed().await.is_ok() {
            let line = readouts.borrow_and_update().to_string();
            println!("{}", line);
        }
    });

    info!("Commands: play, stop, speed, s-/s+/s--/s++, e-/e+/e--/e++, hold <bump>, release, set start|end [value], prompt start|end, quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "quit" | "q" | "exit" => break,
            "prompt start" => println!("start = {}", session.entry_prompt(Bound::Start).await),
            "prompt end" => println!("end = {}", session.entry_prompt(Bound::End).await),
            _ => match line.parse::<SessionCommand>() {
                Ok(command) => session.dispatch(command).await,
                Err(e) => warn!("{}", e),
            },
        }
    }

    session.dispatch(SessionCommand::PressCancel).await;
    session.dispatch(SessionCommand::Stop).await;
    drop(session);
    let _ = printer.await;

    Ok(())
}
