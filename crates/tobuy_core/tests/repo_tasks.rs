mod common;

use common::{for_each_store, texts};
use tobuy_core::{
    move_task, move_task_before, ItemRepository, ItemScope, MemoryStore, RepoError, Task,
    TaskRepository,
};

fn titles(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|task| task.title.as_str()).collect()
}

#[test]
fn add_task_titles_from_current_count() {
    for_each_store(|store| {
        let tasks = TaskRepository::new(store);

        let first = tasks.add_task().unwrap();
        let second = tasks.add_task().unwrap();
        assert_eq!(first.title, "Task 1");
        assert_eq!(second.title, "Task 2");
        assert_ne!(first.id, second.id);
        assert_eq!(tasks.count_tasks().unwrap(), 2);
    });
}

#[test]
fn list_tasks_is_sorted_by_title() {
    for_each_store(|store| {
        let tasks = TaskRepository::new(store);
        for title in ["Pharmacy", "Groceries", "Hardware"] {
            tasks.add_task_titled(title).unwrap();
        }

        let listed = tasks.list_tasks().unwrap();
        assert_eq!(titles(&listed), vec!["Groceries", "Hardware", "Pharmacy"]);
    });
}

#[test]
fn add_task_titled_rejects_blank_title() {
    for_each_store(|store| {
        let tasks = TaskRepository::new(store);
        assert!(matches!(
            tasks.add_task_titled(" \n "),
            Err(RepoError::BlankText)
        ));
        assert_eq!(tasks.count_tasks().unwrap(), 0);
    });
}

#[test]
fn rename_task_changes_sort_position() {
    for_each_store(|store| {
        let tasks = TaskRepository::new(store);
        let bakery = tasks.add_task_titled("Bakery").unwrap();
        tasks.add_task_titled("Market").unwrap();

        let renamed = tasks.rename_task(bakery.id, "  Zoo shop ").unwrap();
        assert_eq!(renamed.title, "Zoo shop");
        assert_eq!(titles(&tasks.list_tasks().unwrap()), vec!["Market", "Zoo shop"]);
        assert_eq!(tasks.get_task(bakery.id).unwrap().unwrap(), renamed);
    });
}

#[test]
fn delete_task_cascades_to_its_items_only() {
    for_each_store(|store| {
        let tasks = TaskRepository::new(store);
        let items = ItemRepository::new(store);
        let groceries = tasks.add_task_titled("Groceries").unwrap();
        let hardware = tasks.add_task_titled("Hardware").unwrap();

        let milk = items
            .add_item(ItemScope::Task(groceries.id), "Milk")
            .unwrap()
            .unwrap();
        items
            .add_item(ItemScope::Task(groceries.id), "Eggs")
            .unwrap();
        items
            .add_item(ItemScope::Task(hardware.id), "Nails")
            .unwrap();
        items.add_item(ItemScope::Flat, "Batteries").unwrap();

        tasks.delete_task(groceries.id).unwrap();

        assert!(tasks.get_task(groceries.id).unwrap().is_none());
        assert!(items
            .list_items(ItemScope::Task(groceries.id))
            .unwrap()
            .is_empty());
        assert!(items.get_item(milk.id).unwrap().is_none());
        assert_eq!(
            texts(&items.list_items(ItemScope::Task(hardware.id)).unwrap()),
            vec!["Nails"]
        );
        assert_eq!(items.list_items(ItemScope::Flat).unwrap().len(), 1);
    });
}

#[test]
fn delete_unknown_task_is_not_found() {
    for_each_store(|store| {
        let tasks = TaskRepository::new(store);
        let missing = uuid::Uuid::new_v4();

        assert!(matches!(
            tasks.delete_task(missing),
            Err(RepoError::TaskNotFound(id)) if id == missing
        ));
    });
}

#[test]
fn move_task_reorders_view_without_persisting() {
    for_each_store(|store| {
        let tasks = TaskRepository::new(store);
        for title in ["A", "B", "C", "D"] {
            tasks.add_task_titled(title).unwrap();
        }

        let mut view = tasks.list_tasks().unwrap();
        move_task(&mut view, 0, 2).unwrap();
        assert_eq!(titles(&view), vec!["B", "C", "A", "D"]);
        move_task_before(&mut view, 3, 0).unwrap();
        assert_eq!(titles(&view), vec!["D", "B", "C", "A"]);

        assert_eq!(titles(&tasks.list_tasks().unwrap()), vec!["A", "B", "C", "D"]);
        assert!(matches!(
            move_task(&mut view, 4, 0),
            Err(RepoError::IndexOutOfRange { index: 4, len: 4 })
        ));
    });
}

#[test]
fn failed_task_commit_leaves_no_task_behind() {
    let store = MemoryStore::new();
    let tasks = TaskRepository::new(&store);
    tasks.add_task().unwrap();

    store.fail_next_commit("read-only volume");
    let err = tasks.add_task().unwrap_err();
    assert!(err.is_persistence());
    assert_eq!(titles(&tasks.list_tasks().unwrap()), vec!["Task 1"]);

    let items = ItemRepository::new(&store);
    let task_id = tasks.list_tasks().unwrap()[0].id;
    items.add_item(ItemScope::Task(task_id), "Milk").unwrap();

    store.fail_next_commit("read-only volume");
    assert!(tasks.delete_task(task_id).unwrap_err().is_persistence());
    assert_eq!(items.list_items(ItemScope::Task(task_id)).unwrap().len(), 1);

    assert_eq!(tasks.add_task().unwrap().title, "Task 2");
}
