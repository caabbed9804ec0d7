//! Common Test Utilities
//!
//! Shared helpers for building on-disk report databases, seeding customer
//! activity and addressing instants in the report timezone.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global test counter for generating unique test database paths
static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a unique test database path for a given test
///
/// Combines the test name, process ID, an atomic counter and the current
/// timestamp so parallel tests never share a file.
pub fn create_unique_test_db_path(test_name: &str) -> String {
    let test_dir = PathBuf::from("test_output/unit_tests");
    std::fs::create_dir_all(&test_dir).unwrap();

    let unique_id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();

    let db_path = test_dir.join(format!(
        "{}_{}_{}_{}.db",
        test_name,
        std::process::id(),
        unique_id,
        timestamp
    ));
    db_path.to_str().unwrap().to_string()
}

/// Instants in the report timezone (UTC+07:00)
pub mod clock {
    pub const HOUR: i64 = 3_600_000;
    pub const DAY: i64 = 24 * HOUR;

    /// 2025-01-06 00:00 +07:00, a Monday
    pub const JAN_06: i64 = 1_736_096_400_000;

    /// `days` after 2025-01-06 at `hour` o'clock local time
    pub fn at(days: i64, hour: i64) -> i64 {
        JAN_06 + days * DAY + hour * HOUR
    }

    /// Last millisecond of the local day `days` after 2025-01-06
    pub fn end_of_day(days: i64) -> i64 {
        JAN_06 + (days + 1) * DAY - 1
    }
}

/// Database setup and teardown utilities
pub mod database {
    use customer_flow_report::analysis::ReportEngine;

    /// Report engine over a temporary database file, removed on drop
    pub struct TestEngine {
        pub engine: ReportEngine,
        path: String,
    }

    impl TestEngine {
        pub fn new(test_name: &str) -> anyhow::Result<Self> {
            let path = super::create_unique_test_db_path(test_name);
            let engine = ReportEngine::new(&path, 2)?;
            Ok(TestEngine { engine, path })
        }

        pub fn path(&self) -> &str {
            &self.path
        }
    }

    impl std::ops::Deref for TestEngine {
        type Target = ReportEngine;

        fn deref(&self) -> &Self::Target {
            &self.engine
        }
    }

    impl std::ops::DerefMut for TestEngine {
        fn deref_mut(&mut self) -> &mut Self::Target {
            &mut self.engine
        }
    }

    impl Drop for TestEngine {
        fn drop(&mut self) {
            if std::path::Path::new(&self.path).exists() {
                let _ = std::fs::remove_file(&self.path);
            }
        }
    }
}

/// Activity fixtures
pub mod fixtures {
    use customer_flow_report::analysis::{ReportEngine, ReportStore};
    use customer_flow_report::database::ActivityOperations;
    use customer_flow_report::types::ActivityRecord;
    use serde_json::{json, Value};

    pub const OWNER: &str = "org-1";

    /// Repeat buyer metrics with a fixed stored repeat profile
    ///
    /// The stored `layer3` block keeps sub-profiles stable across
    /// classification times, so only the given labels drive transitions.
    pub fn customer_metrics(tier: &str, lifecycle: &str, spent: f64, last_order_at: i64) -> Value {
        json!({
            "raw": {
                "totalSpent": spent,
                "orderCount": 3,
                "lastOrderAt": last_order_at
            },
            "layer1": { "journeyStage": "repeat" },
            "layer2": {
                "valueTier": tier,
                "lifecycleStage": lifecycle,
                "channel": "online",
                "loyaltyStage": "repeat",
                "momentumStage": "stable"
            },
            "layer3": {
                "repeat": { "repeatDepth": "R2", "repeatFrequency": "on_track" }
            }
        })
    }

    /// One activity row where the customer's last order is the activity itself
    pub fn activity(customer_id: &str, at: i64, tier: &str, lifecycle: &str, spent: f64) -> ActivityRecord {
        ActivityRecord::new(
            OWNER,
            customer_id,
            at,
            customer_metrics(tier, lifecycle, spent, at),
        )
    }

    pub fn seed<S: ReportStore>(engine: &mut ReportEngine<S>, records: &[ActivityRecord]) {
        engine.store_mut().insert_activity_batch(records).unwrap();
    }
}

/// A week of activity for `fixtures::OWNER`
///
/// | day | event                                          |
/// |-----|------------------------------------------------|
/// | 0   | c1 joins as `new` (100), c4 joins as `low` (200) |
/// | 1   | c2 joins as `low` (300)                         |
/// | 2   | c1 upgrades to `vip` (5000)                     |
/// | 3   | c3 joins as an inactive `vip` (8000)            |
/// | 4   | c4 moves to `medium` and back to `low`          |
pub mod scenario {
    use super::clock::at;
    use super::fixtures::{activity, seed};
    use customer_flow_report::analysis::{ReportEngine, ReportStore};

    pub const CUSTOMERS: i64 = 4;
    pub const TOTAL_LTV: f64 = 5_000.0 + 200.0 + 300.0 + 8_000.0;

    pub fn seed_week<S: ReportStore>(engine: &mut ReportEngine<S>) {
        seed(
            engine,
            &[
                activity("c1", at(0, 10), "new", "active", 100.0),
                activity("c4", at(0, 11), "low", "active", 200.0),
                activity("c2", at(1, 10), "low", "active", 300.0),
                activity("c1", at(2, 10), "vip", "active", 5_000.0),
                activity("c3", at(3, 10), "vip", "inactive", 8_000.0),
                activity("c4", at(4, 10), "medium", "active", 200.0),
                activity("c4", at(4, 18), "low", "active", 200.0),
            ],
        );
    }
}
