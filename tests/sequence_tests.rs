//! Integration tests for id sequence compaction.

use std::sync::Arc;
use task_roster::db::Database;
use task_roster::db::schema::Table;
use task_roster::db::sequence::{KeepGaps, policy_for};
use task_roster::types::{FileKind, FileUpload, Role, TaskFields};

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    let db = Database::open_in_memory().expect("Failed to create in-memory database");
    for email in ["o1@x.com", "alice@x.com", "bob@x.com", "carol@x.com"] {
        db.create_user(email, "").expect("Failed to create user");
    }
    db
}

fn named(name: &str) -> TaskFields {
    TaskFields {
        name: name.to_string(),
        ..Default::default()
    }
}

mod dense_ids {
    use super::*;

    #[test]
    fn deleted_max_task_id_is_reused() {
        let db = setup_db();
        db.create_task("o1@x.com", &named("one")).unwrap();
        db.create_task("o1@x.com", &named("two")).unwrap();
        let (three, _) = db.create_task("o1@x.com", &named("three")).unwrap();
        assert_eq!(three.id, 3);

        db.delete_task(three.id).unwrap();
        let (again, owner) = db.create_task("o1@x.com", &named("again")).unwrap();

        assert_eq!(again.id, 3);
        assert_eq!(owner.id, 3);
    }

    #[test]
    fn gap_below_max_is_not_filled() {
        let db = setup_db();
        for name in ["one", "two", "three"] {
            db.create_task("o1@x.com", &named(name)).unwrap();
        }

        db.delete_task(2).unwrap();
        let (next, _) = db.create_task("o1@x.com", &named("four")).unwrap();

        assert_eq!(next.id, 4);
    }

    #[test]
    fn emptied_table_restarts_at_one() {
        let db = setup_db();
        let (task, _) = db.create_task("o1@x.com", &named("only")).unwrap();
        db.assign(task.id, Role::Manager, "alice@x.com").unwrap();
        db.assign(task.id, Role::Manager, "bob@x.com").unwrap();

        db.delete_task(task.id).unwrap();

        assert_eq!(db.next_id(Table::Tasks).unwrap(), 1);
        assert_eq!(db.next_id(Table::Managers).unwrap(), 1);
    }

    #[test]
    fn cascaded_tables_are_compacted_too() {
        let db = setup_db();
        let (task, _) = db.create_task("o1@x.com", &named("Launch")).unwrap();
        let manager = db.assign(task.id, Role::Manager, "alice@x.com").unwrap();
        db.assign(task.id, Role::Employee, "bob@x.com").unwrap();
        db.assign(task.id, Role::Employee, "carol@x.com").unwrap();
        db.attach_file(task.id, FileKind::Project, &FileUpload::new("a", "u/a"))
            .unwrap();

        db.delete_manager(task.id, manager.id).unwrap();
        let employee = db.assign(task.id, Role::Employee, "bob@x.com").unwrap();
        let file = db
            .attach_file(task.id, FileKind::Project, &FileUpload::new("b", "u/b"))
            .unwrap();

        assert_eq!(employee.id, 1);
        assert_eq!(file.id, 1);
    }

    #[test]
    fn deleted_max_file_id_is_reused() {
        let db = setup_db();
        let (task, _) = db.create_task("o1@x.com", &named("Launch")).unwrap();
        db.attach_file(task.id, FileKind::Planning, &FileUpload::new("a", "u/a"))
            .unwrap();
        let last = db
            .attach_file(task.id, FileKind::Planning, &FileUpload::new("b", "u/b"))
            .unwrap();

        db.delete_planning_file(last.id).unwrap();
        let replacement = db
            .attach_file(task.id, FileKind::Planning, &FileUpload::new("c", "u/c"))
            .unwrap();

        assert_eq!(replacement.id, last.id);
    }

    #[test]
    fn explicit_compaction_reports_next_id() {
        let db = setup_db();
        db.create_task("o1@x.com", &named("one")).unwrap();

        assert_eq!(db.compact_sequence(Table::Tasks).unwrap(), 2);
        assert_eq!(db.compact_sequence(Table::ProjectFiles).unwrap(), 1);
    }
}

mod keep_gaps {
    use super::*;

    #[test]
    fn ids_are_not_reused() {
        let db = setup_db().with_sequence_policy(Arc::new(KeepGaps));
        db.create_task("o1@x.com", &named("one")).unwrap();
        let (two, _) = db.create_task("o1@x.com", &named("two")).unwrap();

        db.delete_task(two.id).unwrap();
        let (next, _) = db.create_task("o1@x.com", &named("three")).unwrap();

        assert_eq!(next.id, 3);
    }

    #[test]
    fn policy_switch_follows_flag() {
        let db = setup_db().with_sequence_policy(policy_for(false));
        let (task, _) = db.create_task("o1@x.com", &named("one")).unwrap();

        db.delete_task(task.id).unwrap();

        assert_eq!(db.next_id(Table::Tasks).unwrap(), 2);
    }
}

mod on_disk {
    use super::*;

    #[test]
    fn compaction_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.db");

        {
            let db = Database::open(&path).unwrap();
            db.create_user("o1@x.com", "").unwrap();
            db.create_task("o1@x.com", &named("one")).unwrap();
            let (two, _) = db.create_task("o1@x.com", &named("two")).unwrap();
            db.delete_task(two.id).unwrap();
        }

        let db = Database::open(&path).unwrap();
        let (next, _) = db.create_task("o1@x.com", &named("again")).unwrap();

        assert_eq!(next.id, 2);
        assert_eq!(db.list_tasks().unwrap().len(), 2);
    }
}
