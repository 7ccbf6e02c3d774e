use std::sync::Arc;
use tasknest_core::{
    KeyValueStore, KvTaskListRepository, ManualClock, MemoryStore, Task, TaskList, TaskStore,
    DEFAULT_LIST_ID, DEFAULT_LIST_NAME, TASK_LISTS_KEY,
};

const NOW_MS: i64 = 1_760_000_000_000;

fn open(storage: &Arc<MemoryStore>) -> TaskStore<KvTaskListRepository> {
    let repo = KvTaskListRepository::new(storage.clone());
    TaskStore::load(repo, Arc::new(ManualClock::new(NOW_MS))).unwrap()
}

fn persisted(storage: &MemoryStore) -> Vec<TaskList> {
    let raw = storage.get(TASK_LISTS_KEY).unwrap().unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn fresh_storage_seeds_default_list() {
    let storage = Arc::new(MemoryStore::new());
    let store = open(&storage);

    assert_eq!(store.lists().len(), 1);
    let list = &store.lists()[0];
    assert_eq!(list.id, DEFAULT_LIST_ID);
    assert_eq!(list.name, DEFAULT_LIST_NAME);
    assert!(list.tasks.is_empty());

    let raw = storage.get(TASK_LISTS_KEY).unwrap().unwrap();
    assert_eq!(raw, r#"[{"id":"default-1","name":"My Tasks","tasks":[]}]"#);
}

#[test]
fn corrupt_storage_is_reset_to_default() {
    let storage = Arc::new(MemoryStore::new());
    storage.set(TASK_LISTS_KEY, "{oops").unwrap();

    let store = open(&storage);
    assert_eq!(store.lists(), &[TaskList::default_list()]);
    assert_eq!(persisted(&storage), vec![TaskList::default_list()]);
}

#[test]
fn existing_collection_is_loaded_and_first_list_selected() {
    let storage = Arc::new(MemoryStore::new());
    let lists = vec![
        TaskList::with_id("work", "Work"),
        TaskList::with_id("home", "Home"),
    ];
    storage
        .set(TASK_LISTS_KEY, &serde_json::to_string(&lists).unwrap())
        .unwrap();

    let store = open(&storage);
    assert_eq!(store.lists(), lists.as_slice());
    assert_eq!(store.selected_list_id(), Some("work"));
}

#[test]
fn blank_title_is_a_no_op() {
    let storage = Arc::new(MemoryStore::new());
    let mut store = open(&storage);

    assert_eq!(store.add_task(DEFAULT_LIST_ID, "  ").unwrap(), None);
    assert!(store.list(DEFAULT_LIST_ID).unwrap().tasks.is_empty());
    assert!(persisted(&storage)[0].tasks.is_empty());
}

#[test]
fn add_then_toggle_yields_one_completed_task() {
    let storage = Arc::new(MemoryStore::new());
    let mut store = open(&storage);

    let task_id = store.add_task(DEFAULT_LIST_ID, "Buy milk").unwrap().unwrap();
    assert!(store.toggle_task(DEFAULT_LIST_ID, &task_id).unwrap());

    let list = store.list(DEFAULT_LIST_ID).unwrap();
    assert_eq!(list.tasks.iter().filter(|task| task.completed).count(), 1);
    assert_eq!(list.tasks[0].created_at, NOW_MS);

    let stored = persisted(&storage);
    assert!(stored[0].tasks[0].completed);
    assert_eq!(stored[0].tasks[0].title, "Buy milk");
}

#[test]
fn tasks_append_in_insertion_order() {
    let storage = Arc::new(MemoryStore::new());
    let mut store = open(&storage);

    let first = store.add_task(DEFAULT_LIST_ID, "one").unwrap().unwrap();
    let second = store.add_task(DEFAULT_LIST_ID, "two").unwrap().unwrap();
    let ids: Vec<&str> = store
        .list(DEFAULT_LIST_ID)
        .unwrap()
        .tasks
        .iter()
        .map(|task| task.id.as_str())
        .collect();
    assert_eq!(ids, vec![first.as_str(), second.as_str()]);
}

#[test]
fn delete_task_removes_and_persists() {
    let storage = Arc::new(MemoryStore::new());
    let mut store = open(&storage);
    let keep = store.add_task(DEFAULT_LIST_ID, "keep").unwrap().unwrap();
    let drop_id = store.add_task(DEFAULT_LIST_ID, "drop").unwrap().unwrap();

    assert!(store.delete_task(DEFAULT_LIST_ID, &drop_id).unwrap());
    assert!(!store.delete_task(DEFAULT_LIST_ID, &drop_id).unwrap());

    let stored = persisted(&storage);
    assert_eq!(stored[0].tasks.len(), 1);
    assert_eq!(stored[0].tasks[0].id, keep);
}

#[test]
fn sole_list_cannot_be_deleted() {
    let storage = Arc::new(MemoryStore::new());
    let mut store = open(&storage);

    assert!(!store.delete_list(DEFAULT_LIST_ID).unwrap());
    assert_eq!(store.lists().len(), 1);
    assert_eq!(persisted(&storage).len(), 1);
}

#[test]
fn add_list_selects_it_and_deleting_selected_moves_to_first() {
    let storage = Arc::new(MemoryStore::new());
    let mut store = open(&storage);

    let groceries = store.add_list(" Groceries ").unwrap().unwrap();
    assert_eq!(store.selected_list_id(), Some(groceries.as_str()));
    assert_eq!(store.selected_list().unwrap().name, "Groceries");

    assert!(store.delete_list(&groceries).unwrap());
    assert_eq!(store.selected_list_id(), Some(DEFAULT_LIST_ID));
    assert_eq!(persisted(&storage).len(), 1);
}

#[test]
fn deleting_unselected_list_keeps_selection() {
    let storage = Arc::new(MemoryStore::new());
    let mut store = open(&storage);
    let other = store.add_list("Other").unwrap().unwrap();
    assert!(store.select_list(DEFAULT_LIST_ID));

    assert!(store.delete_list(&other).unwrap());
    assert_eq!(store.selected_list_id(), Some(DEFAULT_LIST_ID));
}

#[test]
fn collection_roundtrips_field_for_field() {
    let mut with_details = Task::new("Plan trip", 10);
    with_details.due_date = Some("2026-12-24".to_string());
    with_details.notes = Some("book early".to_string());
    with_details.completed = true;
    let plain = Task::new("Call mom", 20);

    let mut list = TaskList::with_id("l1", "Personal");
    list.tasks = vec![with_details, plain];
    let lists = vec![list, TaskList::default_list()];

    let json = serde_json::to_string(&lists).unwrap();
    let decoded: Vec<TaskList> = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, lists);

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let plain_json = value[0]["tasks"][1].as_object().unwrap();
    assert!(!plain_json.contains_key("dueDate"));
    assert!(!plain_json.contains_key("notes"));
    assert_eq!(value[0]["tasks"][0]["dueDate"], "2026-12-24");
}

#[test]
fn display_order_is_a_projection() {
    let storage = Arc::new(MemoryStore::new());
    let mut store = open(&storage);

    let a = store.add_task(DEFAULT_LIST_ID, "A").unwrap().unwrap();
    let b = store.add_task(DEFAULT_LIST_ID, "B").unwrap().unwrap();
    let c = store.add_task(DEFAULT_LIST_ID, "C").unwrap().unwrap();
    let d = store.add_task(DEFAULT_LIST_ID, "D").unwrap().unwrap();
    store.toggle_task(DEFAULT_LIST_ID, &a).unwrap();
    store.toggle_task(DEFAULT_LIST_ID, &c).unwrap();

    let list = store.list(DEFAULT_LIST_ID).unwrap();
    let shown: Vec<&str> = list
        .display_order()
        .into_iter()
        .map(|task| task.id.as_str())
        .collect();
    assert_eq!(shown, vec![b.as_str(), d.as_str(), a.as_str(), c.as_str()]);

    let stored: Vec<String> = persisted(&storage)[0]
        .tasks
        .iter()
        .map(|task| task.id.clone())
        .collect();
    assert_eq!(stored, vec![a, b, c, d]);
    assert_eq!(list.summary().to_string(), "2 of 4 completed");
}
