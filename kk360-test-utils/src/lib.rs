//! KK360 Test Utilities
//!
//! Centralized test infrastructure for the KK360 workspace:
//! - A small keyed record type for exercising `ListState` generically
//! - Proptest generators for records, filters and operation sequences
//! - Fixtures for common scenarios (attendance roster, applications)
//! - Assertions for list-state invariants

pub use kk360_core::{
    EntityKey, FilterSet, FilterValue, Filterable, Keyed, ListState, ReconcileError,
};

// ============================================================================
// TEST RECORD
// ============================================================================

/// Generic record with one status field and a couple of searchable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub status: String,
    pub class: String,
    pub revision: u32,
}

impl TestRecord {
    pub fn new(id: &str, name: &str, status: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{}@example.org", id),
            status: status.to_string(),
            class: "10".to_string(),
            revision: 0,
        }
    }

    pub fn with_status(&self, status: &str) -> Self {
        Self {
            status: status.to_string(),
            ..self.clone()
        }
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.class = class.to_string();
        self
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = email.to_string();
        self
    }
}

impl Keyed for TestRecord {
    fn key(&self) -> EntityKey {
        EntityKey::new(self.id.clone())
    }
}

impl Filterable for TestRecord {
    fn field_values(&self, field: &str) -> Vec<&str> {
        match field {
            "status" => vec![self.status.as_str()],
            "class" => vec![self.class.as_str()],
            _ => Vec::new(),
        }
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.id.as_str(), self.email.as_str()]
    }
}

pub mod generators {
    //! Proptest strategies for generating list-state inputs.

    use super::*;
    use proptest::prelude::*;

    pub const STATUSES: &[&str] = &["present", "absent", "selected", "rejected"];
    pub const CLASSES: &[&str] = &["9", "10", "11", "12"];
    pub const FILTER_KEYS: &[&str] = &["status", "class", "search"];

    /// Generate an identity key from a small id space so collisions happen.
    pub fn arb_id() -> impl Strategy<Value = String> {
        (0u8..12).prop_map(|n| format!("id-{n}"))
    }

    pub fn arb_status() -> impl Strategy<Value = String> {
        proptest::sample::select(STATUSES).prop_map(str::to_string)
    }

    pub fn arb_class() -> impl Strategy<Value = String> {
        proptest::sample::select(CLASSES).prop_map(str::to_string)
    }

    pub fn arb_record() -> impl Strategy<Value = TestRecord> {
        (arb_id(), "[a-zA-Z ]{0,12}", arb_status(), arb_class(), 0u32..5).prop_map(
            |(id, name, status, class, revision)| TestRecord {
                email: format!("{}@example.org", id),
                id,
                name,
                status,
                class,
                revision,
            },
        )
    }

    /// Records with unique ids, in arbitrary order.
    pub fn arb_unique_records(max: usize) -> impl Strategy<Value = Vec<TestRecord>> {
        proptest::collection::vec(arb_record(), 0..max).prop_map(|records| {
            let mut seen = std::collections::HashSet::new();
            records
                .into_iter()
                .filter(|record| seen.insert(record.id.clone()))
                .collect()
        })
    }

    pub fn arb_filter_value() -> impl Strategy<Value = FilterValue> {
        prop_oneof![
            arb_status().prop_map(FilterValue::Equals),
            Just(FilterValue::equals("all")),
            "[a-z0-9]{0,3}".prop_map(FilterValue::Search),
        ]
    }

    /// A single step applied to a `ListState<TestRecord>`.
    #[derive(Debug, Clone)]
    pub enum Op {
        SetFilter(String, FilterValue),
        ClearFilter(String),
        Apply(String, String),
        CommitOk(String),
        CommitErr(String),
        Upsert(TestRecord),
        Remove(String),
        Load(Vec<TestRecord>),
    }

    pub fn arb_filter_key() -> impl Strategy<Value = String> {
        proptest::sample::select(FILTER_KEYS).prop_map(str::to_string)
    }

    pub fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (arb_filter_key(), arb_filter_value()).prop_map(|(k, v)| Op::SetFilter(k, v)),
            arb_filter_key().prop_map(Op::ClearFilter),
            (arb_id(), arb_status()).prop_map(|(id, status)| Op::Apply(id, status)),
            arb_id().prop_map(Op::CommitOk),
            arb_id().prop_map(Op::CommitErr),
            arb_record().prop_map(Op::Upsert),
            arb_id().prop_map(Op::Remove),
            arb_unique_records(8).prop_map(Op::Load),
        ]
    }

    /// Run one op against the state, ignoring expected precondition errors.
    pub fn apply_op(state: &mut ListState<TestRecord>, op: &Op) {
        match op {
            Op::SetFilter(key, value) => state.set_filter(key.clone(), value.clone()),
            Op::ClearFilter(key) => state.clear_filter(key),
            Op::Apply(id, status) => {
                let status = status.clone();
                let _ = state.apply_optimistic(&EntityKey::new(id.clone()), move |r: &TestRecord| {
                    r.with_status(&status)
                });
            }
            Op::CommitOk(id) => {
                let _ = state.commit(&EntityKey::new(id.clone()), Ok::<_, String>(None));
            }
            Op::CommitErr(id) => {
                let _ = state.commit(
                    &EntityKey::new(id.clone()),
                    Err::<Option<TestRecord>, _>("rejected"),
                );
            }
            Op::Upsert(record) => state.upsert(record.clone()),
            Op::Remove(id) => {
                state.remove(&EntityKey::new(id.clone()));
            }
            Op::Load(records) => {
                let ticket = state.begin_load();
                let _ = state.complete_load(ticket, Ok::<_, String>(records.clone()));
            }
        }
    }
}

pub mod fixtures {
    //! Pre-built fixtures for common testing scenarios.

    use super::*;
    use serde_json::{json, Value};

    /// Load `records` into a fresh state through the normal load path.
    pub fn loaded_state(resource: &str, records: Vec<TestRecord>) -> ListState<TestRecord> {
        let mut state = ListState::new(resource);
        let ticket = state.begin_load();
        let _ = state.complete_load(ticket, Ok::<_, String>(records));
        state
    }

    /// Two students, both absent.
    pub fn absent_roster() -> Vec<TestRecord> {
        vec![
            TestRecord::new("s1", "Anitha", "absent"),
            TestRecord::new("s2", "Bala", "absent"),
        ]
    }

    /// Five applications across two statuses; two of the selected ones
    /// mention "kumar" in different fields.
    pub fn applications() -> Vec<TestRecord> {
        vec![
            TestRecord::new("APP-001", "Ravi Kumar", "selected"),
            TestRecord::new("APP-002", "Kavya", "selected").with_email("kumar.kavya@example.org"),
            TestRecord::new("APP-003", "Suresh KUMAR", "rejected"),
            TestRecord::new("APP-004", "Deepa", "selected"),
            TestRecord::new("APP-005", "Meena", "rejected"),
        ]
    }

    /// Raw attendance payload as `/attendance/:classId` returns it.
    pub fn raw_attendance(class_id: &str) -> Value {
        json!([
            {
                "_id": "s1",
                "user": { "name": "Anitha" },
                "attendance": [{ "class": class_id, "status": "absent" }]
            },
            {
                "_id": "s2",
                "user": { "name": "Bala" },
                "attendance": [{ "class": "other", "status": "present" }]
            }
        ])
    }
}

pub mod assertions {
    //! Assertions for list-state invariants.

    use super::*;

    /// Assert the derived view equals a fresh filter over the items.
    #[track_caller]
    pub fn assert_view_consistent<T>(state: &ListState<T>)
    where
        T: kk360_core::Record + PartialEq + std::fmt::Debug,
    {
        let expected: Vec<&T> = state
            .items()
            .iter()
            .filter(|item| state.filters().matches(*item))
            .collect();
        let actual: Vec<&T> = state.view().collect();
        assert_eq!(actual, expected, "derived view drifted from items + filters");
    }

    /// Assert no key is left pending.
    #[track_caller]
    pub fn assert_no_pending<T: kk360_core::Record>(state: &ListState<T>) {
        let pending = state.pending_keys();
        assert!(pending.is_empty(), "dangling pending keys: {:?}", pending);
    }
}
