mod cli;
mod logging;
mod runner;
mod settings;

use clap::Parser;
use tracing::{Instrument, debug, info, info_span};
use uuid::Uuid;

use crate::cli::Cli;

/// # Summary
/// 应用启动入口，纯粹的 DI 容器。
///
/// # Logic
/// 1. 读取 `.env`，解析命令行。
/// 2. 加载并校验配置 (非 dry-run 时必须注入后端凭据)。
/// 3. 初始化全局日志。
/// 4. 在带 run_id 的 span 中装配并执行任务。
/// 5. 打印汇总行；任务完成即以 0 退出，无论条目是否全部成功。
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    let mut config = settings::load(cli.config.as_deref())?;
    settings::apply_batch_size(&mut config, cli.batch_size);
    config.validate(!cli.dry_run)?;

    let _log_guard = logging::init(&config.logging)?;
    match dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(e) => debug!(error = %e, "No .env file loaded"),
    }

    let label = cli.command.label();
    let span = info_span!("run", run_id = %Uuid::new_v4(), job = %label, dry_run = cli.dry_run);
    let summary = async {
        info!(backend = ?config.backend, "invsim starting");
        runner::run(&cli.command, &config, cli.dry_run).await
    }
    .instrument(span)
    .await?;

    info!(
        items = summary.items,
        items_with_data = summary.items_with_data,
        attempted = summary.write.attempted,
        succeeded = summary.write.succeeded,
        "Run finished"
    );
    println!("{summary}");

    Ok(())
}
