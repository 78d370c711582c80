use clap::Parser;
use urn_correcter::config::Command;
use urn_correcter::utils::error::{CorrecterError, ErrorSeverity};
use urn_correcter::utils::logger::{self, LogFormat};
use urn_correcter::utils::validation::Validate;
use urn_correcter::{
    CliConfig, CorrecterConfig, CorrectionOutcome, GrammarRegistry, LocalRepository, ObjectId,
    UrnCorrecter,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    let format = config
        .logging
        .format
        .parse::<LogFormat>()
        .unwrap_or_default();
    logger::init_cli_logger(cli.verbose, &config.logging.level, format);
    tracing::debug!("Resolved config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let Command::Correct { object_id } = &cli.command;

    match run(object_id, &config, cli.dry_run).await {
        Ok(CorrectionOutcome::Corrected(report)) => {
            tracing::info!(
                object_id = %report.object_id,
                previous = %report.previous,
                corrected = %report.corrected,
                committed = report.committed,
                "Correction finished"
            );
        }
        Ok(CorrectionOutcome::ObjectMissing) => {
            tracing::warn!("Nothing corrected for {}", object_id);
        }
        Err(e) => exit_with(e),
    }

    Ok(())
}

async fn run(
    object_id: &str,
    config: &CorrecterConfig,
    dry_run: bool,
) -> urn_correcter::Result<CorrectionOutcome> {
    let object_id: ObjectId = object_id.parse()?;
    let correcter = UrnCorrecter::new(
        LocalRepository::open(&config.storage.data_dir)?,
        config.service_registry(),
        GrammarRegistry::with_builtin(),
        config.settings(dry_run),
    );
    correcter.correct(&object_id).await
}

fn exit_with(e: CorrecterError) -> ! {
    tracing::error!(
        "❌ Correction failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code)
}
