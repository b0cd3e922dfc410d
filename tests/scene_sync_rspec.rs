//! Behavioural test: an agent leaving the feed takes its overlay with it while
//! the rest of the scene stays put.

#[path = "support/thread_safe_app.rs"]
mod thread_safe_app;

#[path = "support/rspec_runner.rs"]
mod rspec_runner;

use std::sync::MutexGuard;

use bevy::prelude::*;
use rspec::block::Context as Scenario;
use rspec_runner::run_serial;
use serde_json::Value;
use swarm_view::components::{Agent, Target};
use swarm_view::overlay::Overlay;
use swarm_view::store::EntityClass;
use test_utils::fixtures::{agent, body, snapshot};
use test_utils::scene_sync::{apply_snapshot, count, headless_app, stored, CapturedErrors};
use thread_safe_app::{lock_app, share, SharedApp, ThreadSafeApp};

fn crowded() -> Value {
    snapshot(
        vec![agent("a1", "0", [100.0, 100.0]), agent("a2", "0", [500.0, 200.0])],
        vec![body("0", [400.0, 300.0], 12.0)],
        vec![],
    )
}

fn thinned() -> Value {
    snapshot(
        vec![agent("a1", "0", [120.0, 100.0])],
        vec![body("0", [400.0, 300.0], 12.0)],
        vec![],
    )
}

#[derive(Debug, Clone)]
struct DepartureFixture {
    app: SharedApp,
}

impl DepartureFixture {
    fn bootstrap() -> Self {
        Self {
            app: share(headless_app()),
        }
    }

    fn app_guard(&self) -> MutexGuard<'_, ThreadSafeApp> {
        lock_app(&self.app)
    }

    fn reset(&self) {
        let mut app = self.app_guard();
        **app = headless_app();
        apply_snapshot(&mut app, crowded());
    }

    fn send(&self, frame: Value) {
        apply_snapshot(&mut self.app_guard(), frame);
    }

    fn count<T: Component>(&self) -> usize {
        count::<T>(&mut self.app_guard())
    }

    fn is_stored(&self, class: EntityClass, id: &str) -> bool {
        stored(&self.app_guard(), class, id).is_some()
    }

    fn error_count(&self) -> usize {
        self.app_guard().world().resource::<CapturedErrors>().0.len()
    }
}

#[test]
fn departing_agent_is_evicted_with_its_overlay() {
    let fixture = DepartureFixture::bootstrap();
    run_serial(&rspec::given(
        "a scene showing two agents and their target",
        fixture,
        |scenario: &mut Scenario<DepartureFixture>| {
            scenario.before_each(|state| {
                state.reset();
            });

            scenario.then("both agents carry an overlay", |state| {
                assert_eq!(state.count::<Agent>(), 2);
                assert_eq!(state.count::<Overlay>(), 2);
            });

            scenario.when("the next snapshot omits one agent", |scenario| {
                scenario.before_each(|state| state.send(thinned()));

                scenario.then("the departed agent and its overlay are gone", |state| {
                    assert!(!state.is_stored(EntityClass::Agent, "a2"));
                    assert_eq!(state.count::<Agent>(), 1);
                    assert_eq!(state.count::<Overlay>(), 1);
                });

                scenario.then("the remaining entities are untouched", |state| {
                    assert!(state.is_stored(EntityClass::Agent, "a1"));
                    assert!(state.is_stored(EntityClass::Target, "0"));
                    assert_eq!(state.count::<Target>(), 1);
                });

                scenario.then("no sync error is raised", |state| {
                    assert_eq!(state.error_count(), 0);
                });
            });

            scenario.when("the agent reappears", |scenario| {
                scenario.before_each(|state| {
                    state.send(thinned());
                    state.send(crowded());
                });

                scenario.then("it is spawned afresh with a new overlay", |state| {
                    assert!(state.is_stored(EntityClass::Agent, "a2"));
                    assert_eq!(state.count::<Overlay>(), 2);
                });
            });
        },
    ));
}
