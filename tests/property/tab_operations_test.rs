//! Property-based tests for session controller tab operations.
//!
//! For any sequence of creates, closes, and switches that never succeeds in
//! closing the last tab, the live tab count equals 1 + creates − successful
//! closes, the foreground pointer always names a live tab, and the usage
//! history only references live tabs.

use std::cell::RefCell;
use std::rc::Rc;

use havenbrowser::managers::session_controller::{
    SessionController, SessionTuning, Surface, SurfaceHost, TabEventSink,
};
use havenbrowser::services::snapshot_store::SnapshotStore;
use havenbrowser::types::errors::SurfaceError;
use havenbrowser::types::tab::SurfaceEvent;
use proptest::prelude::*;

// --- Minimal surface host; the controller only needs handles ---

struct NullSurface;

impl Surface for NullSurface {
    fn navigate(&mut self, _url: &str) {}
    fn reload(&mut self) -> bool {
        true
    }
    fn show_failure_page(&mut self) {}
    fn activate(&mut self) {}
    fn destroy(&mut self) {}
    fn is_destroyed(&self) -> bool {
        false
    }
}

struct NullHost;

impl SurfaceHost for NullHost {
    type Surface = NullSurface;
    fn create_surface(&mut self, _tab_id: u64, _url: &str) -> Result<NullSurface, SurfaceError> {
        Ok(NullSurface)
    }
}

#[derive(Clone, Default)]
struct CountingSink {
    relayed: Rc<RefCell<usize>>,
}

impl TabEventSink for CountingSink {
    fn surface_event(&mut self, _tab_id: u64, _event: &SurfaceEvent) {
        *self.relayed.borrow_mut() += 1;
    }
    fn tab_restored(&mut self, _tab_id: u64, _url: &str, _title: &str) {}
}

/// Operations performed against the controller.
#[derive(Debug, Clone)]
enum TabOp {
    Create,
    Close(usize),
    Switch(usize),
}

/// Strategy biased toward creates so sequences keep interesting state.
fn arb_tab_ops() -> impl Strategy<Value = Vec<TabOp>> {
    prop::collection::vec(
        prop_oneof![
            3 => Just(TabOp::Create),
            2 => (0..20usize).prop_map(TabOp::Close),
            2 => (0..20usize).prop_map(TabOp::Switch),
        ],
        1..60,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn tab_create_close_invariant(ops in arb_tab_ops()) {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("last-tabs.json"), false);
        let mut controller = SessionController::new(
            NullHost,
            CountingSink::default(),
            store,
            SessionTuning::default(),
        );

        // The session always begins with one tab.
        controller.create_tab("").unwrap();
        let mut expected_count: usize = 1;

        for op in &ops {
            let ids: Vec<u64> = controller.tab_states().iter().map(|t| t.id).collect();
            match op {
                TabOp::Create => {
                    controller.create_tab("").unwrap();
                    expected_count += 1;
                }
                TabOp::Close(idx) => {
                    let target = ids[idx % ids.len()];
                    let result = controller.close_tab(target);
                    if ids.len() == 1 {
                        // The sole remaining tab is never closed.
                        prop_assert!(result.is_err());
                    } else {
                        prop_assert!(result.is_ok());
                        expected_count -= 1;
                    }
                }
                TabOp::Switch(idx) => {
                    let target = ids[idx % ids.len()];
                    prop_assert!(controller.switch_to(target));
                }
            }

            // Count invariant holds after every operation.
            prop_assert_eq!(controller.tab_count(), expected_count);

            // The foreground pointer always names a live tab.
            let live: Vec<u64> = controller.tab_states().iter().map(|t| t.id).collect();
            let current = controller.current_tab_id();
            prop_assert!(current.is_some());
            prop_assert!(live.contains(&current.unwrap()));

            // The usage history never references a dead tab.
            for id in controller.usage_history() {
                prop_assert!(live.contains(id));
            }
        }

        // At least the initial tab is always left.
        prop_assert!(controller.tab_count() >= 1);
    }
}
