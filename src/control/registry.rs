use std::collections::HashSet;
use std::sync::Mutex;

// Ids of everyone currently signed in, pooled or seated. Owned by the process
// and handed to each session by reference; sessions must release their id on
// teardown.
#[derive(Debug, Default)]
pub struct Registry {
    users: Mutex<HashSet<String>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // false if the id is already signed in
    pub fn try_register(&self, user_id: &str) -> bool {
        self.users.lock().unwrap().insert(user_id.to_string())
    }

    pub fn release(&self, user_id: &str) {
        self.users.lock().unwrap().remove(user_id);
    }
}

#[test]
fn test_duplicate_ids() {
    let registry = Registry::new();
    assert!(registry.try_register("u1"));
    assert!(!registry.try_register("u1"));
    assert!(registry.try_register("u2"));

    registry.release("u1");
    assert!(registry.try_register("u1"));
}
