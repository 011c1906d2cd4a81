//! # Auth Broker 主程序

use std::path::PathBuf;

use auth_broker::{
    AppState, AuthServer, ConfigManager, Result,
    error::Context,
    lerror, linfo,
    logging::{self, LogComponent, LogStage},
};
use clap::Parser;

/// 命令行参数
#[derive(Debug, Parser)]
#[command(name = "auth-broker", version, about = "Multi-provider OAuth2/OIDC authentication broker")]
struct Cli {
    /// 配置文件路径，优先于 AUTH_BROKER_CONFIG_PATH
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 默认日志级别，RUST_LOG 存在时以其为准
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level.as_deref());

    if let Err(e) = run(cli).await {
        lerror!(
            "system",
            LogStage::Startup,
            LogComponent::Main,
            "service_start_failed",
            &format!("服务启动失败: {e}"),
            error = ?e
        );
        std::process::exit(1);
    }

    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::Main,
        "service_shutdown",
        "服务正常关闭"
    );
}

async fn run(cli: Cli) -> Result<()> {
    let manager = match cli.config {
        Some(path) => ConfigManager::from_file(path)?,
        None => ConfigManager::new()?,
    };

    linfo!(
        "system",
        LogStage::Configuration,
        LogComponent::Main,
        "config_loaded",
        "配置加载完成",
        source = ?manager.source(),
        overrides = manager.override_count()
    );

    let state = AppState::from_config(manager.into_config()).context("装配认证组件失败")?;
    AuthServer::new(state).serve().await
}
