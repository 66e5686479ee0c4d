use invsim_core::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

/// # Summary
/// 初始化全局日志。
///
/// # Logic
/// 1. `RUST_LOG` 优先，否则使用配置的级别。
/// 2. 控制台输出：JSON 或紧凑文本。
/// 3. 配置了目录时额外写入按天滚动的日志文件。
///
/// # Returns
/// 文件日志的后台写入守卫，需持有到进程结束。
pub fn init(config: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    if config.json {
        layers.push(fmt::layer().json().with_target(true).boxed());
    } else {
        layers.push(fmt::layer().with_target(true).compact().boxed());
    }

    let guard = match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "invsim.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(fmt::layer().with_writer(writer).with_ansi(false).boxed());
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()?;

    Ok(guard)
}
