//! Tests for operations invoked without an ambient tokio runtime.

use std::sync::Arc;

use lazymount::{
    ComponentEntry, LoadState, ManualVisibilitySource, MemoryMountTarget, MountTarget, Node,
    Virtualizer, VirtualizerConfig, VisibilitySource,
};

fn entry(id: &str, target: &Arc<MemoryMountTarget>) -> ComponentEntry {
    let name = id.to_string();
    let target: Arc<dyn MountTarget> = target.clone();
    ComponentEntry::new(id, target, move || {
        let name = name.clone();
        async move { Ok(Node::element(name)) }
    })
}

fn virtualizer() -> (Virtualizer, Arc<ManualVisibilitySource>) {
    let source = Arc::new(ManualVisibilitySource::new());
    let visibility: Arc<dyn VisibilitySource> = source.clone();
    (Virtualizer::new(VirtualizerConfig::default(), Some(visibility)), source)
}

#[test]
fn test_operations_without_runtime_do_not_panic() {
    let (vz, source) = virtualizer();
    let target = Arc::new(MemoryMountTarget::new("root"));

    vz.register(entry("eager", &target).eager());
    assert_eq!(vz.state("eager"), Some(LoadState::Failed));

    vz.register(entry("lazy", &target));
    vz.preload("lazy", true);
    assert_eq!(vz.state("lazy"), Some(LoadState::Failed));

    vz.register(entry("seen", &target));
    source.reveal("seen", 1.0);
    let outcome = vz.tick();
    assert_eq!(outcome.visible.as_ref().map(|id| id.as_str()), Some("seen"));
    assert_eq!(vz.state("seen"), Some(LoadState::Failed));

    assert!(futures::executor::block_on(vz.load("eager")).is_none());
    assert!(!vz.init());
    assert!(target.is_empty());
    assert_eq!(vz.stats().constructions_failed, 4);
}

#[test]
fn test_captured_runtime_serves_calls_from_plain_threads() {
    let runtime = tokio::runtime::Runtime::new().expect("runtime");
    let vz = {
        let _guard = runtime.enter();
        virtualizer().0
    };
    let target = Arc::new(MemoryMountTarget::new("root"));

    vz.register(entry("eager", &target).eager());
    let node = runtime.block_on(vz.load("eager")).expect("loaded");

    assert!(target.contains(&node));
    assert_eq!(vz.state("eager"), Some(LoadState::Loaded));
    assert!(vz.init());
    runtime.block_on(vz.dispose());
}
