//! Name → connector table, built once at startup.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::craigslist::CraigslistConnector;
use super::github::GithubConnector;
use super::hackernews::HackerNewsConnector;
use super::reddit::RedditConnector;
use super::search_discovery::SearchDiscoveryConnector;
use super::stub::StubConnector;
use super::Connector;

/// Every source name the system knows about, implemented or not.
pub const ALL_NAMES: [&str; 46] = [
    "reddit",
    "github",
    "hackernews",
    "search_discovery",
    "craigslist",
    "upwork",
    "freelancer",
    "peopleperhour",
    "guru",
    "toptal",
    "contra",
    "worksome",
    "ninety_nine_designs",
    "arc_dev",
    "codementor",
    "topcoder",
    "braintrust",
    "wellfound",
    "indeed",
    "glassdoor",
    "remote_ok",
    "weworkremotely",
    "outsourcely",
    "twitter",
    "threads",
    "instagram",
    "facebook",
    "linkedin",
    "discord",
    "slack",
    "medium",
    "indiehackers",
    "producthunt",
    "notion",
    "clutch",
    "goodfirms",
    "g2",
    "fiverr",
    "bark",
    "thumbtack",
    "designrush",
    "google",
    "bing",
    "duckduckgo",
    "google_jobs",
    "rfp_generic",
];

pub type Constructor = Arc<dyn Fn() -> Arc<dyn Connector> + Send + Sync>;

fn ctor<C: Connector + Default + 'static>() -> Arc<dyn Connector> {
    Arc::new(C::default())
}

/// `"Search-Discovery "` → `"search_discovery"`.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase().replace('-', "_")
}

#[derive(Clone)]
pub struct Registry {
    table: BTreeMap<String, Constructor>,
}

impl Default for Registry {
    fn default() -> Self {
        let mut r = Self::empty();
        r.register("reddit", ctor::<RedditConnector>);
        r.register("github", ctor::<GithubConnector>);
        r.register("hackernews", ctor::<HackerNewsConnector>);
        r.register("craigslist", ctor::<CraigslistConnector>);
        r.register("search_discovery", ctor::<SearchDiscoveryConnector>);
        r
    }
}

impl Registry {
    pub fn empty() -> Self {
        Self {
            table: BTreeMap::new(),
        }
    }

    pub fn register<F>(&mut self, name: &str, ctor: F)
    where
        F: Fn() -> Arc<dyn Connector> + Send + Sync + 'static,
    {
        self.table.insert(normalize_name(name), Arc::new(ctor));
    }

    pub fn is_implemented(&self, name: &str) -> bool {
        self.table.contains_key(&normalize_name(name))
    }

    /// Never fails: unknown names get a [`StubConnector`].
    pub fn resolve(&self, name: &str) -> Arc<dyn Connector> {
        let key = normalize_name(name);
        match self.table.get(&key) {
            Some(ctor) => ctor(),
            None => {
                debug!(platform = %key, "no connector registered; using stub");
                Arc::new(StubConnector::new(key))
            }
        }
    }

    pub fn implemented(&self) -> Vec<&str> {
        self.table.keys().map(String::as_str).collect()
    }

    pub fn all_names() -> &'static [&'static str] {
        &ALL_NAMES
    }
}
