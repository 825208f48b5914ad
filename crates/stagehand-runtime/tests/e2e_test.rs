//! End-to-end tests for deploying applications into the local environment.
//!
//! Each test builds an application root in a temporary directory, writes a
//! descriptor next to it, deploys it, and checks which resources resolve.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use stagehand_common::config::StagehandConfig;
use stagehand_common::types::{ResourceKind, ResourceName};
use stagehand_descriptor::descriptor::DeploymentDescriptor;
use stagehand_runtime::engine::Deployer;
use stagehand_runtime::environment::local::LocalEnvironment;
use stagehand_runtime::environment::{DeployOutcome, Environment};
use stagehand_runtime::error::DeploymentError;

const SERVICES_MANIFEST: &str = "\
services:
  SimpleService:
    requires: [\"/queue/container_queue\"]
    requires_env: [BASEDIR]
    params:
      greeting: hello
queues:
  /queue/container_queue:
    durable: true
";

const DESCRIPTOR: &str = "\
application:
  root: apps/alacarte/services
  env: development
environment:
  BASEDIR: /srv/alacarte
ruby:
  version: 1.9
";

/// A workspace holding `apps/alacarte/services` and a descriptor next to it.
struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new(manifest: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = dir.path().join("apps/alacarte/services/config");
        std::fs::create_dir_all(&app).expect("create app root");
        std::fs::write(app.join("stagehand.yml"), manifest).expect("write manifest");
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn app_root(&self) -> PathBuf {
        self.path().join("apps/alacarte/services")
    }

    fn write_descriptor(&self, name: &str, text: &str) -> PathBuf {
        let path = self.path().join(name);
        std::fs::write(&path, text).expect("write descriptor");
        path
    }

    fn rewrite_manifest(&self, manifest: &str) {
        std::fs::write(self.app_root().join("config/stagehand.yml"), manifest)
            .expect("rewrite manifest");
    }
}

fn service() -> ResourceName {
    "service:SimpleService".parse().expect("name")
}

fn queue() -> ResourceName {
    "/queue/container_queue".parse().expect("name")
}

// ── Deploy, then resolve ─────────────────────────────────────────────

#[test]
fn runtime_injection_makes_service_and_queue_resolvable() {
    let fixture = Fixture::new(SERVICES_MANIFEST);
    let descriptor = fixture.write_descriptor("runtime-injection.yml", DESCRIPTOR);

    let deployer = Deployer::default();
    let receipt = deployer.deploy_file(&descriptor).expect("deploy");
    assert_eq!(receipt.outcome, DeployOutcome::Created);
    assert_eq!(receipt.summary.name, "services");
    assert_eq!(receipt.summary.runtime, "1.9");
    assert_eq!(receipt.summary.resources, vec![queue(), service()]);

    let svc = deployer.fetch(&service()).expect("service resolves");
    assert_eq!(svc.kind(), ResourceKind::Service);
    assert_eq!(svc.deployment(), receipt.id());
    let svc = svc.as_service().expect("service handle");
    assert_eq!(svc.env_var("BASEDIR"), Some("/srv/alacarte"));
    assert_eq!(svc.application_env(), Some("development"));
    assert_eq!(svc.param("greeting"), Some("hello"));
    assert_eq!(
        svc.env_var("APP_ROOT").map(PathBuf::from),
        Some(fixture.app_root())
    );

    assert!(deployer.fetch(&queue()).is_some());
    assert!(
        deployer
            .fetch_str("/queue/container_queue")
            .expect("valid name")
            .is_some()
    );
}

#[test]
fn unreachable_root_fails_and_leaves_nothing_resolvable() {
    let fixture = Fixture::new(SERVICES_MANIFEST);
    let descriptor = fixture.write_descriptor(
        "missing.yml",
        "application:\n  root: apps/does-not-exist\nenvironment:\n  BASEDIR: /srv\n",
    );

    let deployer = Deployer::default();
    let err = deployer.deploy_file(&descriptor).unwrap_err();
    match err {
        DeploymentError::UnreachableRoot { path, .. } => {
            assert_eq!(path, fixture.path().join("apps/does-not-exist"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(deployer.fetch(&service()).is_none());
    assert!(deployer.fetch(&queue()).is_none());
    assert!(deployer.deployments().is_empty());
}

#[test]
fn missing_required_variable_rolls_back_started_queue() {
    let fixture = Fixture::new(SERVICES_MANIFEST);
    let descriptor = fixture.write_descriptor(
        "no-basedir.yml",
        "application:\n  root: apps/alacarte/services\n",
    );

    let deployer = Deployer::default();
    let err = deployer.deploy_file(&descriptor).unwrap_err();
    assert!(matches!(err, DeploymentError::StartFailed { .. }), "got: {err}");
    assert!(deployer.fetch(&queue()).is_none());
    assert!(deployer.deployments().is_empty());
}

// ── Idempotence and replacement ──────────────────────────────────────

#[test]
fn identical_redeploy_is_unchanged() {
    let fixture = Fixture::new(SERVICES_MANIFEST);
    let descriptor = fixture.write_descriptor("app.yml", DESCRIPTOR);

    let deployer = Deployer::default();
    let first = deployer.deploy_file(&descriptor).expect("first deploy");
    let queue_handle = deployer.fetch(&queue()).expect("queue");
    queue_handle
        .as_queue()
        .expect("queue handle")
        .send("kept")
        .expect("send");

    let second = deployer.deploy_file(&descriptor).expect("second deploy");
    assert_eq!(second.outcome, DeployOutcome::Unchanged);
    assert_eq!(second.id(), first.id());
    assert_eq!(deployer.deployments().len(), 1);

    let again = deployer.fetch(&queue()).expect("queue still resolves");
    assert_eq!(again.as_queue().expect("queue handle").depth(), 1);
}

#[test]
fn changed_descriptor_replaces_and_hands_over_durable_messages() {
    let fixture = Fixture::new(SERVICES_MANIFEST);
    let v1 = fixture.write_descriptor("v1.yml", DESCRIPTOR);
    let v2 = fixture.write_descriptor(
        "v2.yml",
        &DESCRIPTOR.replace("/srv/alacarte", "/srv/alacarte-v2"),
    );

    let deployer = Deployer::default();
    let first = deployer.deploy_file(&v1).expect("deploy v1");
    let old_queue = deployer.fetch(&queue()).expect("queue");
    let old_queue = old_queue.as_queue().expect("queue handle").clone();
    old_queue.send("one").expect("send");
    old_queue.send("two").expect("send");

    let second = deployer.deploy_file(&v2).expect("deploy v2");
    assert_eq!(
        second.outcome,
        DeployOutcome::Replaced {
            previous: first.id().clone()
        }
    );
    assert_ne!(second.id(), first.id());
    assert_eq!(deployer.deployments().len(), 1);

    assert!(old_queue.send("late").is_err(), "old handle must be inert");
    assert_eq!(old_queue.receive(), None);

    let svc = deployer.fetch(&service()).expect("service");
    assert_eq!(
        svc.as_service().expect("service handle").env_var("BASEDIR"),
        Some("/srv/alacarte-v2")
    );
    let new_queue = deployer.fetch(&queue()).expect("queue");
    let new_queue = new_queue.as_queue().expect("queue handle");
    assert_eq!(new_queue.receive().as_deref(), Some("one"));
    assert_eq!(new_queue.receive().as_deref(), Some("two"));
}

#[test]
fn failed_replacement_keeps_previous_deployment() {
    let fixture = Fixture::new(SERVICES_MANIFEST);
    let v1 = fixture.write_descriptor("v1.yml", DESCRIPTOR);
    let v2 = fixture.write_descriptor(
        "v2.yml",
        "application:\n  root: apps/alacarte/services\n  env: development\n",
    );

    let deployer = Deployer::default();
    let first = deployer.deploy_file(&v1).expect("deploy v1");
    let _ = deployer.deploy_file(&v2).unwrap_err();

    let svc = deployer.fetch(&service()).expect("service still resolves");
    assert_eq!(svc.deployment(), first.id());
}

// ── Rejections ───────────────────────────────────────────────────────

#[test]
fn unsupported_runtime_is_rejected() {
    let fixture = Fixture::new(SERVICES_MANIFEST);
    let descriptor = fixture.write_descriptor(
        "old-runtime.yml",
        "application:\n  root: apps/alacarte/services\nruntime:\n  version: 1.4\n",
    );

    let deployer = Deployer::default();
    match deployer.deploy_file(&descriptor).unwrap_err() {
        DeploymentError::UnsupportedRuntime {
            requested,
            supported,
        } => {
            assert_eq!(requested, "1.4");
            assert!(supported.contains("1.9"), "supported: {supported}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(deployer.deployments().is_empty());
}

#[test]
fn malformed_descriptor_is_rejected() {
    let deployer = Deployer::default();
    for text in [
        "",
        "- not\n- a mapping\n",
        "environment:\n  BASEDIR: /srv\n",
        "application:\n  root: /srv\nenvironment:\n  NESTED: { a: b }\n",
    ] {
        let err = deployer.deploy_str(text, None).unwrap_err();
        assert!(
            matches!(err, DeploymentError::MalformedDescriptor { .. }),
            "{text:?} gave {err}"
        );
    }
}

#[test]
fn malformed_manifest_is_rejected() {
    let fixture = Fixture::new(SERVICES_MANIFEST);
    fixture.rewrite_manifest("services:\n  A:\n    requires: [\"/queue/undeclared\"]\n");
    let descriptor = fixture.write_descriptor("app.yml", DESCRIPTOR);

    let deployer = Deployer::default();
    let err = deployer.deploy_file(&descriptor).unwrap_err();
    assert!(matches!(err, DeploymentError::MalformedDescriptor { .. }), "got: {err}");
}

// ── Lifecycle ────────────────────────────────────────────────────────

#[test]
fn undeploy_makes_handles_inert() {
    let fixture = Fixture::new(SERVICES_MANIFEST);
    let descriptor = fixture.write_descriptor("app.yml", DESCRIPTOR);

    let deployer = Deployer::default();
    let receipt = deployer.deploy_file(&descriptor).expect("deploy");
    let handle = deployer.fetch(&queue()).expect("queue");
    let queue_handle = handle.as_queue().expect("queue handle");
    queue_handle.send("pending").expect("send");

    deployer.undeploy(receipt.id()).expect("undeploy");
    assert!(deployer.fetch(&service()).is_none());
    assert!(deployer.fetch(&queue()).is_none());
    assert!(queue_handle.send("after").is_err());
    assert_eq!(queue_handle.receive(), None);

    let err = deployer.undeploy(receipt.id()).unwrap_err();
    assert!(matches!(err, DeploymentError::NotDeployed { .. }));
}

#[test]
fn topic_fans_out_to_every_subscriber() {
    let fixture = Fixture::new("topics:\n  /topic/announcements: {}\n");
    let descriptor = fixture.write_descriptor("topics.yml", DESCRIPTOR);

    let deployer = Deployer::default();
    let _ = deployer.deploy_file(&descriptor).expect("deploy");
    let handle = deployer
        .fetch_str("/topic/announcements")
        .expect("valid name")
        .expect("topic resolves");
    let topic = handle.as_topic().expect("topic handle");

    let first = topic.subscribe().expect("subscribe");
    let second = topic.subscribe().expect("subscribe");
    assert_eq!(topic.publish("hello").expect("publish"), 2);
    drop(second);
    assert_eq!(topic.publish("again").expect("publish"), 1);

    assert_eq!(first.receive().as_deref(), Some("hello"));
    assert_eq!(first.receive().as_deref(), Some("again"));
    assert_eq!(first.receive(), None);
}

#[test]
fn application_without_manifest_deploys_with_no_resources() {
    let dir = tempfile::tempdir().expect("tempdir");
    let deployer = Deployer::default();
    let d = DeploymentDescriptor::new(dir.path(), BTreeMap::new(), None).with_name("empty");
    let receipt = deployer.deploy(&d).expect("deploy");
    assert!(receipt.summary.resources.is_empty());
    assert_eq!(receipt.summary.runtime, StagehandConfig::default().default_runtime);
}

// ── State index ──────────────────────────────────────────────────────

#[test]
fn deployments_are_recorded_in_state_file() {
    let fixture = Fixture::new(SERVICES_MANIFEST);
    let descriptor = fixture.write_descriptor("app.yml", DESCRIPTOR);
    let state_file = fixture.path().join("state/deployments.json");

    let env = LocalEnvironment::default().with_state_file(&state_file);
    let deployer = Deployer::new(Box::new(env), StagehandConfig::default());
    let receipt = deployer.deploy_file(&descriptor).expect("deploy");

    let state = stagehand_runtime::state::load_state(&state_file).expect("load state");
    assert_eq!(state.deployments.len(), 1);
    assert_eq!(&state.deployments[0].id, receipt.id());
    assert_eq!(state.deployments[0].resources, vec![queue(), service()]);

    deployer.undeploy(receipt.id()).expect("undeploy");
    let state = stagehand_runtime::state::load_state(&state_file).expect("load state");
    assert!(state.deployments.is_empty());
}

#[test]
fn environment_is_usable_through_trait_object() {
    let fixture = Fixture::new(SERVICES_MANIFEST);
    let env: Box<dyn Environment> = Box::new(LocalEnvironment::default());
    let d = DeploymentDescriptor::new(
        fixture.app_root(),
        BTreeMap::from([("BASEDIR".to_string(), "/srv".to_string())]),
        Some("1.9.3".into()),
    );
    let receipt = env.deploy(&d).expect("deploy");
    assert_eq!(receipt.summary.runtime, "1.9");
    assert!(env.fetch(&service()).is_some());
}
