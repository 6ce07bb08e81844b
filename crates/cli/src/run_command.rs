use std::sync::Arc;

use {anyhow::Result, tracing::info};

use {
    envoy_agents::Summarizer,
    envoy_channels::{ChannelPlugin, HistoryBuffer, WatchedSource},
    envoy_chat::{ChatRuntime, Router, SummaryJob, SummarySource},
    envoy_config::EnvoyConfig,
    envoy_cron::{IntervalJob, IntervalScheduler, JobRunFn},
    envoy_telegram::TelegramPlugin,
};

/// Wire the channel, the chat core and the scheduler, then run until
/// Ctrl-C.
pub async fn run(config: EnvoyConfig) -> Result<()> {
    let sources = config
        .sources
        .iter()
        .map(SummarySource::from_config)
        .collect::<envoy_config::Result<Vec<_>>>()?;

    let history = Arc::new(HistoryBuffer::new(config.sources.iter().map(|s| {
        WatchedSource {
            id: s.id.clone(),
            chat_ref: s.chat_ref().to_string(),
            lookback: s.lookback(),
        }
    })));

    let mut channel = TelegramPlugin::from_value(&config.telegram)?
        .with_source_commands(sources.iter().map(|s| s.id.as_str()));

    let runtime = Arc::new(ChatRuntime::new(
        sources,
        config.summary_receivers.clone(),
        channel.outbound(),
        history.clone(),
        Summarizer::from_config(&config.llm),
    ));

    channel
        .start(Arc::new(Router::new(Arc::clone(&runtime))), history)
        .await?;

    let job = SummaryJob::new(Arc::clone(&runtime));
    let on_run: JobRunFn = Arc::new(move |source_id: String| {
        let job = job.clone();
        Box::pin(async move {
            // Outcome and failures are logged by the job.
            let _ = job.run(&source_id).await;
        })
    });
    let scheduler = IntervalScheduler::new(on_run);
    for source in runtime.sources() {
        scheduler
            .add(IntervalJob {
                id: source.id.clone(),
                every: source.lookback,
            })
            .await?;
    }
    scheduler.start().await?;

    info!(
        sources = runtime.sources().len(),
        receivers = runtime.receivers().len(),
        "envoy running, press Ctrl-C to stop"
    );
    tokio::signal::ctrl_c().await?;

    info!("shutting down");
    scheduler.stop().await;
    channel.stop().await?;
    Ok(())
}
