//! Chat with the affect layer from the terminal
//!
//! ```text
//! cargo run -p emotive-providers --example console_chat -- [config.yaml]
//! ```
//!
//! Uses Dialogflow and Google TTS when `DIALOGFLOW_PROJECT_ID` and
//! `GOOGLE_ACCESS_TOKEN` are set, an echoing mock otherwise.

use std::sync::Arc;

use anyhow::Result;
use emotive_core::logging::init_console_logging;
use emotive_core::prelude::*;
use emotive_providers::assets::FileAudioAssets;
use emotive_providers::dialogflow::DialogflowClient;
use emotive_providers::google_tts::GoogleTtsClient;
use emotive_providers::mock::MockIntentDetector;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<()> {
    init_console_logging("info");

    let config = match std::env::args().nth(1) {
        Some(path) => AffectConfig::from_yaml_file(path)?,
        None => AffectConfig::default(),
    };

    let mut builder = match DialogflowClient::from_env() {
        Ok(dialogflow) => ChatPipeline::builder(Arc::new(dialogflow)),
        Err(e) => {
            println!("Dialogflow unavailable ({}), echoing instead", e);
            ChatPipeline::builder(Arc::new(MockIntentDetector::echo()))
        }
    };
    if let Ok(tts) = GoogleTtsClient::from_env() {
        builder = builder.speech(Arc::new(tts));
    }
    let pipeline = builder
        .config(config)
        .assets(Arc::new(FileAudioAssets::default()))
        .build()?;

    println!("Type a message (\"debug\" for analysis mode, Ctrl-D to quit)");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match pipeline.chat(DEFAULT_SESSION, &line).await {
            Ok(reply) => println!(
                "[{}] {} ({}{})",
                reply.time,
                reply.content,
                reply.suggested_color.as_deref().unwrap_or("-"),
                if reply.has_audio() { ", audio" } else { "" }
            ),
            Err(e) => println!("(error: {})", e),
        }
    }
    Ok(())
}
