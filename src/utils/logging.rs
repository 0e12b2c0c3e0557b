/// 日志工具模块
///
/// 提供日志初始化与格式化输出的辅助函数
use crate::config::Config;
use crate::orchestrator::{ServiceSnapshot, SubmitReport};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// `RUST_LOG` 优先；未设置时按 `verbose` 选择 debug 或 info。重复调用无副作用。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 程序启动 - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("🌐 站点: {}", config.origin());
    info!(
        "📊 最大并发数: {} | 请求间隔: {}ms | 每批: {} 个",
        config.max_concurrent, config.min_interval_ms, config.batch_size
    );
    info!("💾 会话缓存: {}", config.cache_dir.display());
    info!("{}", "=".repeat(60));
}

/// 记录一次提交的结果
pub fn log_submit(batch_num: usize, report: &SubmitReport) {
    info!(
        "📦 第 {} 组链接: 有效 {} 个，分 {} 批",
        batch_num, report.accepted, report.batches
    );
}

/// 打印最终统计信息
pub fn print_final_stats(report: &SubmitReport, snapshot: &ServiceSnapshot) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("🔗 已处理链接: {}", snapshot.processed_links);
    info!("✅ 参与分类: {}", report.accepted);
    info!("🪦 标记已故: {}", snapshot.deceased_links);
    info!(
        "⏭️ 跳过: 预览 {} / 无法解析 {} / 重复 {}",
        report.preview, report.rejected, report.already_processed
    );
    info!("💾 缓存条目: {}", snapshot.cache.len());
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
