use anyhow::Context;
use clap::Parser;
use iot_panel::config::cli::{parse_switch, PanelCommand, SettingField};
use iot_panel::config::toml_config::PanelConfig;
use iot_panel::domain::model::{ActuatorLevel, Schedule, Transcript, Variant};
use iot_panel::domain::ports::{RemoteStore, ScheduleStore};
use iot_panel::utils::error::{ErrorSeverity, PanelError};
use iot_panel::utils::logger;
use iot_panel::{
    CliConfig, Classifier, FirebaseStore, JsonScheduleStore, LineRecognizer, MemoryStore, Panel,
    PanelEngine, RecordingSession, ScheduleTimer,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let result = match &cli.command {
        PanelCommand::Classify { text } => {
            classify(config.variant(), &text.join(" "));
            Ok(())
        }
        PanelCommand::Schedule { at, action } => save_schedule(&config, at, action).await,
        command if config.uses_firebase() => {
            let url = config.store.url.clone().unwrap_or_default();
            let store = FirebaseStore::new(url, config.store.auth.clone())
                .with_poll_interval(config.poll_interval());
            run(Arc::new(store), &config, command).await
        }
        command => run(Arc::new(MemoryStore::new()), &config, command).await,
    };

    if let Err(e) = result {
        let Some(panel_error) = e.downcast_ref::<PanelError>() else {
            eprintln!("❌ {:#}", e);
            std::process::exit(1);
        };

        tracing::error!(
            "❌ Panel command failed: {:#} (Category: {:?}, Severity: {:?})",
            e,
            panel_error.category(),
            panel_error.severity()
        );
        eprintln!("❌ {}", panel_error.user_friendly_message());
        eprintln!("💡 {}", panel_error.recovery_suggestion());

        let exit_code = match panel_error.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

fn classify(variant: Variant, text: &str) {
    let classifier = Classifier::for_variant(variant);
    let transcript = Transcript::new(text);
    match classifier.classify(&transcript) {
        Some(result) => {
            println!("{} ({})", result.command, result.ack);
            let matched = classifier.explain(&transcript);
            if matched.len() > 1 {
                println!("rule '{}' won over {:?}", result.rule, &matched[1..]);
            }
        }
        None => println!("no command"),
    }
}

async fn save_schedule(config: &PanelConfig, at: &str, action: &str) -> anyhow::Result<()> {
    let schedule: Schedule = format!("{} {}", at, action).parse()?;
    JsonScheduleStore::new(config.schedule_path())
        .save(&schedule)
        .await?;
    println!("⏰ Schedule saved: {}", schedule);
    Ok(())
}

async fn run<S: RemoteStore>(
    store: Arc<S>,
    config: &PanelConfig,
    command: &PanelCommand,
) -> anyhow::Result<()> {
    let panel = Panel::new(store, config.variant()).with_notice_ttl(config.notice_ttl());
    panel.set_language(config.language()).await;

    match command {
        PanelCommand::Show => {
            let snapshot = panel.store().snapshot().await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            Ok(())
        }
        PanelCommand::Set { field, value } => set(&panel, *field, value).await,
        PanelCommand::Listen => listen(panel, config).await,
        PanelCommand::Classify { .. } | PanelCommand::Schedule { .. } => Ok(()),
    }
}

async fn set<S: RemoteStore>(panel: &Panel<S>, field: SettingField, value: &str) -> anyhow::Result<()> {
    let switch = || {
        parse_switch(value).ok_or_else(|| PanelError::InvalidConfigValueError {
            field: format!("{:?}", field),
            value: value.to_string(),
            reason: "expected on/off".to_string(),
        })
    };
    let number = || {
        value
            .parse::<u16>()
            .with_context(|| format!("'{}' is not a number", value))
    };

    let write = match field {
        SettingField::Light => panel.set_light_threshold(number()?).await?,
        SettingField::Temperature => panel.set_temperature_threshold(number()?).await?,
        SettingField::ActiveLight => panel.set_active_light(switch()?),
        SettingField::ActiveTemperature => panel.set_active_temperature(switch()?),
        SettingField::ActiveDistance => panel.set_active_distance(switch()?),
        SettingField::Level => {
            let level = ActuatorLevel::try_from(i64::from(number()?))?;
            panel.set_level(level).await
        }
        SettingField::Led => panel.set_led(switch()?).await,
    };

    // one-shot command: wait for the write so the process does not exit first
    write.await.context("write task panicked")??;
    println!("✅ {:?} updated", field);
    Ok(())
}

async fn listen<S: RemoteStore>(panel: Panel<S>, config: &PanelConfig) -> anyhow::Result<()> {
    let (events_tx, events_rx) = mpsc::channel(8);
    let recognizer = Arc::new(LineRecognizer::new(events_tx));

    let mut engine = PanelEngine::<S, JsonScheduleStore>::new(panel.clone());
    if config.schedule_enabled() {
        let timer = ScheduleTimer::load(
            panel.clone(),
            JsonScheduleStore::new(config.schedule_path()),
            config.repeat_policy(),
        )
        .await?;
        engine = engine.with_timer(Arc::new(timer), config.tick_every());
    }

    println!("🎙️ Type an utterance and press Enter (empty line = recognition error).");
    println!("   ':lang' toggles the language, ':state' prints the panel. Ctrl-D quits.");

    let mut session = RecordingSession::new(Arc::clone(&recognizer), panel.clone());
    let input_panel = panel.clone();
    let input = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            match line.trim() {
                ":lang" => {
                    let language = input_panel.toggle_language().await;
                    println!("🌐 {}", language);
                }
                ":state" => println!("{:#?}", input_panel.state().await),
                utterance => {
                    session.press().await;
                    if let Err(e) = recognizer.feed(utterance).await {
                        tracing::warn!("Utterance dropped: {}", e);
                    }
                    session.release().await;
                }
            }
        }
        // dropping the recognizer closes the event channel and stops the engine
        Ok::<_, std::io::Error>(())
    });

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    let report = engine.run(events_rx, shutdown).await?;
    input.abort();

    let state = panel.state().await;
    println!(
        "👋 {} utterances, {} commands, {} scheduled fires. Level: {:?}, LED: {}",
        report.utterances,
        report.commands_dispatched,
        report.scheduled_fires,
        state.level,
        if state.led { "ON" } else { "OFF" }
    );
    Ok(())
}
