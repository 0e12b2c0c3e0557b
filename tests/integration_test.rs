use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use wiki_deceased::models::Ancestor;
use wiki_deceased::{
    AnnotatingDecorator, Config, FetchError, JsonFileStore, KeyValueStore,
    LinkClassificationService, LinkHandle, LinkId, MemoryStore, SubjectTitle, SummaryFetcher,
    SummaryRecord, WikiSummaryClient,
};

/// 按标题返回预设结果的假客户端，并记录每次请求
struct ScriptedFetcher {
    records: HashMap<String, SummaryRecord>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    fn new() -> Self {
        let mut records = HashMap::new();
        records.insert(
            "Ada_Lovelace".to_string(),
            SummaryRecord::new("English mathematician (1815–1852)", ""),
        );
        records.insert(
            "Isaac_Newton".to_string(),
            SummaryRecord::new(
                "English physicist",
                "<p><b>Sir Isaac Newton</b> was an English polymath.</p>",
            ),
        );
        records.insert(
            "Taylor_Swift".to_string(),
            SummaryRecord::new(
                "American singer-songwriter (born 1989)",
                "<p><b>Taylor Alison Swift</b> is an American singer-songwriter.</p>",
            ),
        );
        Self {
            records,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl SummaryFetcher for ScriptedFetcher {
    fn fetch<'a>(
        &'a self,
        title: &'a SubjectTitle,
    ) -> BoxFuture<'a, Result<SummaryRecord, FetchError>> {
        self.calls.lock().unwrap().push(title.as_str().to_string());
        let result = self
            .records
            .get(title.as_str())
            .cloned()
            .ok_or_else(|| FetchError::Status {
                title: title.to_string(),
                status: 404,
            });
        Box::pin(async move { result })
    }
}

fn test_config() -> Config {
    Config {
        min_interval_ms: 0,
        batch_size: 3,
        ..Config::default()
    }
}

fn build_service(
    fetcher: Arc<ScriptedFetcher>,
    store: Option<Arc<dyn KeyValueStore>>,
) -> (LinkClassificationService, Arc<AnnotatingDecorator>) {
    let decorator = Arc::new(AnnotatingDecorator::new());
    let service =
        LinkClassificationService::from_config(&test_config(), fetcher, store, decorator.clone())
            .expect("创建服务失败");
    (service, decorator)
}

#[tokio::test]
async fn test_page_scan_decorates_only_deceased() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let (service, decorator) = build_service(fetcher.clone(), None);

    let report = service.submit(vec![
        LinkHandle::new(1, "/wiki/Ada_Lovelace").with_title_attr("Ada Lovelace"),
        LinkHandle::new(2, "/wiki/Isaac_Newton"),
        LinkHandle::new(3, "/wiki/Taylor_Swift"),
        LinkHandle::new(4, "/wiki/Nobody_Here"),
    ]);
    service.wait_idle().await;

    assert_eq!(report.accepted, 4);
    assert_eq!(report.batches, 2);

    let decorations = decorator.decorations();
    let ids: Vec<LinkId> = decorations.iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, vec![LinkId(1), LinkId(2)]);
    assert_eq!(decorations[0].1.title, "Ada Lovelace • deceased");
    assert_eq!(decorations[1].1.title, "deceased");

    // 404 得到 Unknown，不写缓存
    let cache = service.cache().snapshot();
    assert_eq!(cache.get("Ada_Lovelace"), Some(&true));
    assert_eq!(cache.get("Isaac_Newton"), Some(&true));
    assert_eq!(cache.get("Taylor_Swift"), Some(&false));
    assert!(!cache.contains_key("Nobody_Here"));
}

#[tokio::test]
async fn test_ineligible_links_never_fetch() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let (service, decorator) = build_service(fetcher.clone(), None);

    let report = service.submit(vec![
        LinkHandle::new(1, "/wiki/Talk:Ada_Lovelace"),
        LinkHandle::new(2, "/wiki/Ada_Lovelace#Early_life"),
        LinkHandle::new(3, "/w/index.php?title=Ada_Lovelace&redlink=1"),
        LinkHandle::new(4, "https://example.org/wiki/Ada_Lovelace"),
        LinkHandle::new(5, "/wiki/Ada_Lovelace").inside(Ancestor::with_role("tooltip")),
        LinkHandle::new(6, "/wiki/Ada_Lovelace")
            .inside(Ancestor::with_classes(["mw-body"]))
            .inside(Ancestor::with_classes(["reference-popup-box"])),
    ]);
    service.wait_idle().await;

    assert_eq!(report.accepted, 0);
    assert_eq!(report.rejected, 4);
    assert_eq!(report.preview, 2);
    assert!(fetcher.calls().is_empty());
    assert!(decorator.is_empty());
    for id in 1..=6 {
        assert!(service.is_processed(LinkId(id)));
    }
}

#[tokio::test]
async fn test_same_title_fetched_once() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let (service, decorator) = build_service(fetcher.clone(), None);

    service.submit(vec![
        LinkHandle::new(1, "/wiki/Ada_Lovelace"),
        LinkHandle::new(2, "https://en.wikipedia.org/wiki/Ada_Lovelace"),
        LinkHandle::new(3, "//en.wikipedia.org/wiki/Ada_Lovelace"),
    ]);
    service.wait_idle().await;

    assert_eq!(fetcher.calls(), vec!["Ada_Lovelace".to_string()]);
    assert_eq!(decorator.len(), 3);
}

#[tokio::test]
async fn test_later_batches_reuse_cache() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let (service, decorator) = build_service(fetcher.clone(), None);

    service.submit(vec![LinkHandle::new(1, "/wiki/Ada_Lovelace")]);
    service.wait_idle().await;
    service.submit(vec![LinkHandle::new(2, "/wiki/Ada_Lovelace")]);
    service.wait_idle().await;

    assert_eq!(fetcher.calls(), vec!["Ada_Lovelace".to_string()]);
    assert_eq!(decorator.len(), 2);
}

#[tokio::test]
async fn test_cache_survives_across_sessions() {
    let dir = tempfile::tempdir().unwrap();

    let first = Arc::new(ScriptedFetcher::new());
    let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::new(dir.path()));
    let (service, _) = build_service(first.clone(), Some(store));
    service.submit(vec![
        LinkHandle::new(1, "/wiki/Ada_Lovelace"),
        LinkHandle::new(2, "/wiki/Taylor_Swift"),
    ]);
    service.wait_idle().await;
    assert_eq!(first.calls().len(), 2);

    // 新会话读取同一目录
    let second = Arc::new(ScriptedFetcher::new());
    let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::new(dir.path()));
    let (service, decorator) = build_service(second.clone(), Some(store));
    assert_eq!(service.cache().len(), 2);

    service.submit(vec![
        LinkHandle::new(1, "/wiki/Ada_Lovelace"),
        LinkHandle::new(2, "/wiki/Taylor_Swift"),
    ]);
    service.wait_idle().await;

    assert!(second.calls().is_empty());
    assert!(decorator.is_decorated(LinkId(1)));
    assert!(!decorator.is_decorated(LinkId(2)));
}

#[tokio::test]
async fn test_malformed_store_payload_starts_empty() {
    let store: Arc<dyn KeyValueStore> =
        Arc::new(MemoryStore::with_payload("wiki-deceased-cache", "{not json"));
    let fetcher = Arc::new(ScriptedFetcher::new());
    let (service, decorator) = build_service(fetcher.clone(), Some(store.clone()));
    assert!(service.cache().is_empty());

    service.submit(vec![LinkHandle::new(1, "/wiki/Ada_Lovelace")]);
    service.wait_idle().await;

    assert!(decorator.is_decorated(LinkId(1)));
    let payload = store.get("wiki-deceased-cache").unwrap().unwrap();
    let saved: HashMap<String, bool> = serde_json::from_str(&payload).unwrap();
    assert_eq!(saved.get("Ada_Lovelace"), Some(&true));
}

/// 真实 API 调用
///
/// 运行方式：
/// ```bash
/// cargo test test_live_page_scan -- --ignored --nocapture
/// ```
#[tokio::test]
#[ignore]
async fn test_live_page_scan() {
    wiki_deceased::utils::logging::init(true);

    let config = Config::default();
    let fetcher = Arc::new(WikiSummaryClient::new(&config).expect("创建客户端失败"));
    let decorator = Arc::new(AnnotatingDecorator::new());
    let service = LinkClassificationService::from_config(&config, fetcher, None, decorator.clone())
        .expect("创建服务失败");

    service.submit(vec![
        LinkHandle::new(1, "/wiki/Ada_Lovelace"),
        LinkHandle::new(2, "/wiki/Wikipedia"),
    ]);
    service.wait_idle().await;

    assert!(decorator.is_decorated(LinkId(1)), "Ada Lovelace 应被标记为已故");
    assert!(!decorator.is_decorated(LinkId(2)));
}
