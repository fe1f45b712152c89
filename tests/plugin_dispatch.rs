//! Plugin delivery through the `Logger`.
//!
//! Plugins come from an in-process catalog; a file accepting only emergency
//! messages satisfies the "some destination enabled" check at startup.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fanlog::{
    Error, ErrorCode, InitConfig, Level, LevelSet, Logger, OptionSet, Plugin, PluginCatalog,
    PluginInfo, PluginVersion, PoolConfig, Result,
};

#[derive(Clone, Default)]
struct Inbox(Arc<Mutex<Vec<(Level, String)>>>);

impl Inbox {
    fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().iter().map(|(_, l)| l.clone()).collect()
    }
}

struct Sink {
    inbox: Inbox,
    levels: LevelSet,
    major: u16,
    broken: Arc<AtomicBool>,
    cleaned: Arc<AtomicBool>,
}

impl Plugin for Sink {
    fn query(&self) -> Result<PluginInfo> {
        let mut info = PluginInfo::new(
            PluginVersion::new(1, 2, 3),
            self.levels,
            OptionSet::MSG_ONLY,
            "fanlog tests",
            "in-memory inbox",
        );
        info.interface_major = self.major;
        Ok(info)
    }

    fn write(&self, level: Level, line: &str) -> Result<()> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(Error::PluginFailure("inbox sealed".into()));
        }
        self.inbox.0.lock().unwrap().push((level, line.to_owned()));
        Ok(())
    }

    fn cleanup(&self) -> Result<()> {
        self.cleaned.store(true, Ordering::SeqCst);
        Ok(())
    }
}

struct Harness {
    logger: Logger,
    inboxes: HashMap<&'static str, Inbox>,
    broken: Arc<AtomicBool>,
    cleaned: Arc<AtomicBool>,
    _dir: tempfile::TempDir,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let broken = Arc::new(AtomicBool::new(false));
    let cleaned = Arc::new(AtomicBool::new(false));
    let mut inboxes = HashMap::new();
    let mut catalog = PluginCatalog::new();

    for (name, levels, major) in [
        ("all", LevelSet::ALL, 1),
        ("errors", LevelSet::at_least(Level::Error), 1),
        ("fragile", LevelSet::ALL, 1),
        ("future", LevelSet::ALL, 2),
    ] {
        let inbox = Inbox::default();
        inboxes.insert(name, inbox.clone());
        let broken = if name == "fragile" {
            Arc::clone(&broken)
        } else {
            Arc::default()
        };
        let cleaned = Arc::clone(&cleaned);
        catalog.register(name, move || {
            Box::new(Sink {
                inbox: inbox.clone(),
                levels,
                major,
                broken: Arc::clone(&broken),
                cleaned: Arc::clone(&cleaned),
            })
        });
    }

    let logger = Logger::new();
    logger
        .initialize(
            InitConfig::silent()
                .with_file(
                    dir.path().join("anchor.log"),
                    LevelSet::EMERGENCY,
                    OptionSet::MSG_ONLY,
                )
                .with_squelch(None)
                .with_pool(PoolConfig {
                    workers: 3,
                    queue_capacity: 16,
                    enqueue_timeout: Duration::from_secs(5),
                })
                .with_plugin_loader(Arc::new(catalog)),
        )
        .unwrap();

    Harness {
        logger,
        inboxes,
        broken,
        cleaned,
        _dir: dir,
    }
}

// ============================================================================
// Delivery
// ============================================================================

/// Verifies cleanup runs every queued job exactly once and plugins see
/// their messages in order.
#[test]
fn cleanup_drains_every_job_in_order() {
    const K: usize = 300;
    let h = harness();
    h.logger.load_plugin("all").unwrap();
    h.logger.load_plugin("errors").unwrap();

    for k in 0..K {
        let level = if k % 2 == 0 { Level::Error } else { Level::Info };
        h.logger.log(level, &format!("job {k}")).unwrap();
    }
    let stats = h.logger.pool_stats().unwrap();
    assert_eq!(stats.submitted, K as u64);

    h.logger.cleanup().unwrap();
    assert!(h.cleaned.load(Ordering::SeqCst));

    let all: Vec<String> = (0..K).map(|k| format!("job {k}")).collect();
    let errors: Vec<String> = (0..K).step_by(2).map(|k| format!("job {k}")).collect();
    assert_eq!(h.inboxes["all"].lines(), all);
    assert_eq!(h.inboxes["errors"].lines(), errors);
    assert!(matches!(h.logger.info("late"), Err(Error::NotReady)));
}

/// Verifies a level no plugin wants is reported as having no destination.
#[test]
fn plugin_levels_filter_messages() {
    let h = harness();
    h.logger.load_plugin("errors").unwrap();
    let err = h.logger.info("chatter").unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoDestination);
    h.logger.crit("meltdown").unwrap();
    h.logger.cleanup().unwrap();
    assert_eq!(h.inboxes["errors"].lines(), vec!["meltdown"]);
}

// ============================================================================
// Failure Handling
// ============================================================================

/// Verifies a failing plugin is flagged while its peers keep receiving.
#[test]
fn failing_plugin_is_isolated() {
    let h = harness();
    let fragile = h.logger.load_plugin("fragile").unwrap();
    let healthy = h.logger.load_plugin("all").unwrap();
    h.broken.store(true, Ordering::SeqCst);

    for k in 0..5 {
        h.logger.warn(&format!("w{k}")).unwrap();
    }
    h.logger.unload_plugin(fragile).unwrap();
    assert!(!h.logger.plugin_health(healthy).unwrap().errored);
    h.logger.cleanup().unwrap();

    assert_eq!(h.inboxes["all"].lines().len(), 5);
    assert!(h.inboxes["fragile"].lines().is_empty());
}

/// Verifies health flags of a failing plugin while it is still loaded.
#[test]
fn failures_show_in_health() {
    let h = harness();
    let fragile = h.logger.load_plugin("fragile").unwrap();
    h.broken.store(true, Ordering::SeqCst);
    h.logger.error("first").unwrap();
    h.logger.error("second").unwrap();

    // Wait for the workers to reach both jobs.
    let mut health = h.logger.plugin_health(fragile).unwrap();
    for _ in 0..500 {
        if health.served == 2 {
            break;
        }
        std::thread::sleep(Duration::from_millis(2));
        health = h.logger.plugin_health(fragile).unwrap();
    }
    assert!(health.errored);
    assert_eq!(health.failures, 2);
    assert_eq!(health.last_error.as_deref(), Some("plugin failure: inbox sealed"));
    h.logger.cleanup().unwrap();
}

/// Verifies an incompatible interface version is refused at load.
#[test]
fn incompatible_plugin_is_refused() {
    let h = harness();
    let err = h.logger.load_plugin("future").unwrap_err();
    assert_eq!(err.code(), ErrorCode::PluginVersion);
    assert_eq!(h.logger.get_last_error().code, ErrorCode::PluginVersion);
    assert!(h.logger.plugin_ids().unwrap().is_empty());
    h.logger.cleanup().unwrap();
}

/// Verifies unloading removes the plugin from dispatch.
#[test]
fn unloaded_plugin_receives_nothing_more() {
    let h = harness();
    let id = h.logger.load_plugin("all").unwrap();
    h.logger.notice("before").unwrap();
    h.logger.unload_plugin(id).unwrap();

    assert!(matches!(h.logger.notice("after"), Err(Error::NoDestination)));
    assert!(matches!(h.logger.unload_plugin(id), Err(Error::NoItem(_))));
    h.logger.cleanup().unwrap();
    assert_eq!(h.inboxes["all"].lines(), vec!["before"]);
}
