use std::sync::Arc;

use anyhow::Context;

use label_relay::broker::{MemoryBroker, PubSubPublisher, Publisher, PushEnvelope};
use label_relay::config::{BrokerMode, PipelineConfig};
use label_relay::gcp::GcpTokenSource;
use label_relay::line::LineClient;
use label_relay::pipeline::{process_stage, send_stage, StageDeps};
use label_relay::secrets::SecretManagerClient;
use label_relay::server::{router, AppState};
use label_relay::vision::VisionClassifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Arc::new(PipelineConfig::from_env().context("failed to load configuration")?);

    eprintln!("📨 label-relay v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Project: {}", config.project_id);
    eprintln!(
        "   Topics: {} → {} (broker: {})",
        config.process_topic,
        config.send_topic,
        match config.broker_mode {
            BrokerMode::PubSub => "pubsub",
            BrokerMode::Memory => "memory",
        }
    );
    eprintln!("   Webhook: http://0.0.0.0:{}/webhook\n", config.port);

    // One HTTP client for all outbound calls; every request carries the
    // configured timeout so a hung dependency cannot eat the whole
    // invocation budget.
    let client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .context("failed to build HTTP client")?;

    let tokens = Arc::new(GcpTokenSource::new(client.clone(), &config));
    let line = Arc::new(LineClient::new(
        client.clone(),
        config.line_api_base.clone(),
        config.line_content_api_base.clone(),
    ));

    let mut memory_broker = None;
    let publisher: Arc<dyn Publisher> = match config.broker_mode {
        BrokerMode::PubSub => Arc::new(PubSubPublisher::new(
            client.clone(),
            config.pubsub_api_base.clone(),
            config.project_id.clone(),
            Arc::clone(&tokens),
        )),
        BrokerMode::Memory => {
            let broker = Arc::new(MemoryBroker::new());
            memory_broker = Some(Arc::clone(&broker));
            broker
        }
    };

    let deps = StageDeps {
        secrets: Arc::new(SecretManagerClient::new(
            client.clone(),
            config.secrets_api_base.clone(),
            Arc::clone(&tokens),
        )),
        images: line.clone(),
        classifier: Arc::new(VisionClassifier::new(
            client.clone(),
            config.vision_api_base.clone(),
            Arc::clone(&tokens),
        )),
        replies: line,
        publisher,
    };

    // In memory mode the process and send stages consume their topics
    // in-process instead of being pushed to over HTTP. No redelivery:
    // a failed delivery is logged and dropped.
    if let Some(broker) = memory_broker {
        let mut process_rx = broker.subscribe(&config.process_topic);
        let process_config = Arc::clone(&config);
        let process_deps = deps.clone();
        tokio::spawn(async move {
            while let Some(delivery) = process_rx.recv().await {
                let envelope = PushEnvelope::local(
                    delivery.message_id,
                    delivery.publish_time,
                    &delivery.payload,
                );
                if let Err(e) = process_stage(&process_config, &process_deps, &envelope).await {
                    tracing::error!(error = %e, "process stage failed");
                }
            }
        });

        let mut send_rx = broker.subscribe(&config.send_topic);
        let send_config = Arc::clone(&config);
        let send_deps = deps.clone();
        tokio::spawn(async move {
            while let Some(delivery) = send_rx.recv().await {
                let envelope = PushEnvelope::local(
                    delivery.message_id,
                    delivery.publish_time,
                    &delivery.payload,
                );
                if let Err(e) = send_stage(&send_config, &send_deps, &envelope).await {
                    tracing::error!(error = %e, "send stage failed");
                }
            }
        });
    }

    let app = router(AppState {
        config: Arc::clone(&config),
        deps,
    });
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "pipeline server started");
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
