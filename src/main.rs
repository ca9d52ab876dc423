use clap::Parser;
use miette::{IntoDiagnostic, Result};
use pesarail::application::callback::CallbackProcessor;
use pesarail::application::initiator::PushPaymentInitiator;
use pesarail::application::reconciler::StaleRecordReconciler;
use pesarail::application::settlement::SettlementPropagator;
use pesarail::config::GatewayConfig;
use pesarail::domain::ports::{InvoiceStoreRef, PaymentStoreRef, PushGatewayRef};
use pesarail::infrastructure::daraja::{DarajaCredentialProvider, DarajaGateway};
use pesarail::infrastructure::in_memory::{InMemoryInvoiceStore, InMemoryPaymentStore};
use pesarail::interfaces::http::{routes, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to serve the HTTP API on
    #[arg(long, env = "PESARAIL_BIND", default_value = "0.0.0.0:8080")]
    bind: SocketAddr,

    /// Hours a Processing record may wait for a callback before being
    /// expired to Failed
    #[arg(long, default_value_t = 2)]
    stale_after_hours: i64,

    /// Seconds between reconciliation sweeps
    #[arg(long, default_value_t = 300)]
    sweep_interval_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let gateway_config = GatewayConfig::from_env().into_diagnostic()?;

    let store: PaymentStoreRef = Arc::new(InMemoryPaymentStore::new());
    let invoices: InvoiceStoreRef = Arc::new(InMemoryInvoiceStore::new());
    let settlement = SettlementPropagator::new(invoices);

    let credentials = Arc::new(
        DarajaCredentialProvider::new(gateway_config.clone()).into_diagnostic()?,
    );
    let gateway: PushGatewayRef =
        Arc::new(DarajaGateway::new(gateway_config, credentials).into_diagnostic()?);

    let initiator = Arc::new(PushPaymentInitiator::new(
        store.clone(),
        gateway,
        settlement.clone(),
    ));
    let callbacks = Arc::new(CallbackProcessor::new(store.clone(), settlement));

    let reconciler = StaleRecordReconciler::new(
        store.clone(),
        chrono::Duration::hours(cli.stale_after_hours),
    );
    let sweep_interval = std::time::Duration::from_secs(cli.sweep_interval_secs);
    tokio::spawn(async move { reconciler.run(sweep_interval).await });

    let app = routes(AppState {
        initiator,
        callbacks,
        store,
    });

    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .into_diagnostic()?;
    info!(addr = %cli.bind, "pesarail listening");
    axum::serve(listener, app).await.into_diagnostic()?;

    Ok(())
}
