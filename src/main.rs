use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};
use wiki_deceased::utils::logging;
use wiki_deceased::{
    AnnotatingDecorator, AppResult, Config, JsonFileStore, KeyValueStore,
    LinkClassificationService, LinkHandle, WikiSummaryClient,
};

/// 配置文件路径的环境变量
const CONFIG_ENV: &str = "WIKI_DECEASED_CONFIG";

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = load_config().context("无法加载配置")?;

    // 初始化日志
    logging::init(config.verbose_logging);
    logging::log_startup(&config);

    let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::new(&config.cache_dir));
    let decorator = Arc::new(AnnotatingDecorator::new());
    let fetcher = Arc::new(WikiSummaryClient::new(&config).context("无法创建摘要客户端")?);
    let service =
        LinkClassificationService::from_config(&config, fetcher, Some(store), decorator.clone())?;

    // 首次扫描与后续增量批次走同一条通道
    let (tx, rx) = mpsc::channel(16);
    let feed = tokio::spawn({
        let service = service.clone();
        async move { service.run_feed(rx).await }
    });

    let input = std::env::args().nth(1).map(PathBuf::from);
    match &input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("无法打开输入文件: {}", path.display()))?;
            read_link_batches(BufReader::new(file), tx).await?;
        }
        None => read_link_batches(BufReader::new(tokio::io::stdin()), tx).await?,
    }

    let report = feed.await.context("链接处理任务异常退出")?;
    service.wait_idle().await;
    service.cache().persist();

    for (id, decoration) in decorator.decorations() {
        println!("{}\t{}\t{}", id, decoration.href, decoration.title);
    }

    let snapshot = service.snapshot();
    logging::print_final_stats(&report, &snapshot);
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    Ok(())
}

/// 设置了配置文件路径时从文件加载，否则只用环境变量
fn load_config() -> AppResult<Config> {
    let config = match std::env::var(CONFIG_ENV) {
        Ok(path) if !path.trim().is_empty() => Config::from_toml_file(Path::new(&path))?,
        _ => Config::from_env()?,
    };
    Ok(config)
}

/// 按行读取链接，空行结束一个批次
async fn read_link_batches<R>(reader: R, tx: mpsc::Sender<Vec<LinkHandle>>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut batch = Vec::new();
    let mut next_id = 0u64;

    while let Some(line) = lines.next_line().await.context("读取输入失败")? {
        match LinkHandle::from_line(next_id, &line) {
            Some(link) => {
                debug!("读取链接: {}", logging::truncate_text(&link.href, 80));
                next_id += 1;
                batch.push(link);
            }
            None if !batch.is_empty() => {
                tx.send(std::mem::take(&mut batch))
                    .await
                    .context("链接处理任务已退出")?;
            }
            None => {}
        }
    }

    if !batch.is_empty() {
        tx.send(batch).await.context("链接处理任务已退出")?;
    }
    info!("✓ 输入读取完成，共 {} 个链接", next_id);
    Ok(())
}
