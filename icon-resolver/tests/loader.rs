use async_trait::async_trait;
use icon_common::{IconData, IconName, IconSet};
use icon_resolver::module::api::{
    ApiRegistry, AttemptOutcome, IconTransport, IconsQuery, PartialProviderConfig, ProviderConfig,
};
use icon_resolver::module::loader::IconLoader;
use icon_resolver::module::storage::{IconLookup, IconStore};
use icon_resolver::LoadError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How a fake host behaves
#[derive(Clone)]
enum HostBehaviour {
    /// Serve icons from the fixture after a delay
    Serve(Duration),
    /// Soft failure
    Down,
    /// Authoritative not found
    NotFound,
    /// Never answers
    Hang,
}

/// In-memory API with per-host behaviour and a request log
struct FakeApi {
    icons: HashMap<String, HashMap<String, IconData>>,
    hosts: HashMap<String, HostBehaviour>,
    requests: Mutex<Vec<(String, IconsQuery)>>,
}

impl FakeApi {
    fn new(hosts: &[(&str, HostBehaviour)]) -> Self {
        let mut mdi = HashMap::new();
        mdi.insert("home".to_string(), IconData::new("<path d=\"M10 20v-6h4v6\"/>"));
        mdi.insert("account".to_string(), IconData::new("<circle r=\"4\"/>"));

        let mut icons = HashMap::new();
        icons.insert("mdi".to_string(), mdi);

        Self {
            icons,
            hosts: hosts
                .iter()
                .map(|(host, behaviour)| (host.to_string(), behaviour.clone()))
                .collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<(String, IconsQuery)> {
        self.requests.lock().clone()
    }

    fn respond(&self, query: &IconsQuery) -> AttemptOutcome<IconSet> {
        let Some(set_icons) = self.icons.get(&query.prefix) else {
            return AttemptOutcome::Hard("404".to_string());
        };

        let mut set = IconSet::new(query.prefix.as_str());
        for name in &query.icons {
            match set_icons.get(name) {
                Some(data) => {
                    set.icons.insert(name.clone(), data.clone());
                }
                None => set.not_found.push(name.clone()),
            }
        }
        AttemptOutcome::Success(set)
    }
}

#[async_trait]
impl IconTransport for FakeApi {
    async fn fetch(
        &self,
        host: &str,
        _config: &ProviderConfig,
        query: &IconsQuery,
        _cancel: CancellationToken,
    ) -> AttemptOutcome<IconSet> {
        self.requests.lock().push((host.to_string(), query.clone()));

        match self.hosts.get(host).cloned().unwrap_or(HostBehaviour::Down) {
            HostBehaviour::Serve(delay) => {
                tokio::time::sleep(delay).await;
                self.respond(query)
            }
            HostBehaviour::Down => AttemptOutcome::Soft("connection refused".to_string()),
            HostBehaviour::NotFound => AttemptOutcome::Hard("404".to_string()),
            HostBehaviour::Hang => std::future::pending().await,
        }
    }
}

fn setup(hosts: &[(&str, HostBehaviour)]) -> (IconLoader, Arc<FakeApi>) {
    let registry = Arc::new(ApiRegistry::with_seed(1));
    registry.set_config(
        "",
        PartialProviderConfig {
            resources: Some(hosts.iter().map(|(host, _)| host.to_string()).collect()),
            rotate: Some(100),
            timeout: Some(1000),
            limit: Some(1),
            ..Default::default()
        },
    );

    let api = Arc::new(FakeApi::new(hosts));
    let loader = IconLoader::new(Arc::new(IconStore::new()), registry, api.clone());
    (loader, api)
}

#[tokio::test(start_paused = true)]
async fn test_load_and_mark_missing() {
    let (loader, api) = setup(&[("https://a", HostBehaviour::Serve(Duration::from_millis(20)))]);

    let report = loader
        .load_icons(&["mdi:home", "mdi:nope", "mdi:home", "Bad:Name"])
        .await;

    assert_eq!(report.loaded, vec![IconName::new("", "mdi", "home")]);
    assert_eq!(report.missing, vec![IconName::new("", "mdi", "nope")]);
    assert!(report.pending.is_empty());
    assert_eq!(report.invalid, vec!["Bad:Name".to_string()]);

    // One request for the whole prefix
    let requests = api.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].1.icons, vec!["home".to_string(), "nope".to_string()]);

    let store = loader.store();
    assert!(store.icon_exists("mdi:home"));
    assert_eq!(store.get_icon_data("mdi:nope"), Some(IconLookup::Missing));
}

#[tokio::test(start_paused = true)]
async fn test_known_names_are_not_fetched_again() {
    let (loader, api) = setup(&[("https://a", HostBehaviour::Serve(Duration::from_millis(20)))]);

    loader.load_icons(&["mdi:home", "mdi:nope"]).await;
    let report = loader.load_icons(&["mdi:home", "mdi:nope"]).await;

    assert_eq!(report.loaded.len(), 1);
    assert_eq!(report.missing.len(), 1);
    assert_eq!(api.requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dead_host_falls_back() {
    let (loader, api) = setup(&[
        ("https://dead", HostBehaviour::Hang),
        ("https://alive", HostBehaviour::Serve(Duration::from_millis(50))),
    ]);

    let started = tokio::time::Instant::now();
    let icon = loader.load_icon("mdi:account").await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(icon.body, "<circle r=\"4\"/>");
    assert_eq!(icon.width, 16.0);
    assert!(elapsed < Duration::from_millis(200), "{:?}", elapsed);

    let hosts: Vec<String> = api.requests().into_iter().map(|(host, _)| host).collect();
    assert_eq!(hosts, vec!["https://dead", "https://alive"]);

    // The next query starts at the host that answered
    loader.load_icon("mdi:home").await.unwrap();
    assert_eq!(api.requests().last().unwrap().0, "https://alive");
}

#[tokio::test(start_paused = true)]
async fn test_hard_failure_marks_missing() {
    let (loader, api) = setup(&[
        ("https://a", HostBehaviour::NotFound),
        ("https://b", HostBehaviour::Serve(Duration::ZERO)),
    ]);

    let result = loader.load_icon("mdi:home").await;
    assert_eq!(result, Err(LoadError::NotFound("mdi:home".to_string())));
    assert_eq!(api.requests().len(), 1);
    assert_eq!(
        loader.store().get_icon_data("mdi:home"),
        Some(IconLookup::Missing)
    );
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_hosts_leave_icons_unknown() {
    let (loader, api) = setup(&[
        ("https://a", HostBehaviour::Down),
        ("https://b", HostBehaviour::Down),
    ]);

    let report = loader.load_icons(&["mdi:home"]).await;
    assert_eq!(report.pending, vec![IconName::new("", "mdi", "home")]);
    assert_eq!(
        loader.store().get_icon_data("mdi:home"),
        Some(IconLookup::Unknown)
    );
    assert_eq!(api.requests().len(), 2);

    // Could not determine, so a later call tries again
    let result = loader.load_icon("mdi:home").await;
    assert_eq!(result, Err(LoadError::Unavailable("mdi:home".to_string())));
    assert_eq!(api.requests().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_provider_is_pending() {
    let (loader, api) = setup(&[("https://a", HostBehaviour::Serve(Duration::ZERO))]);

    let report = loader.load_icons(&["@elsewhere:mdi:home"]).await;
    assert_eq!(report.pending.len(), 1);
    assert!(api.requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_locally_added_icons_skip_network() {
    let (loader, api) = setup(&[("https://a", HostBehaviour::Serve(Duration::ZERO))]);
    assert!(loader
        .store()
        .add_icon("custom:logo", IconData::new("<rect/>")));

    let icon = loader.load_icon("custom:logo").await.unwrap();
    assert_eq!(icon.body, "<rect/>");
    assert!(api.requests().is_empty());
}
