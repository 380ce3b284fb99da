//! Integration tests for the service layer and its collaborators.

use anyhow::{Result, bail};
use std::sync::{Arc, Mutex};
use task_roster::config::{Config, NotifyConfig};
use task_roster::db::Database;
use task_roster::db::schema::Table;
use task_roster::error::{ErrorCode, ErrorKind};
use task_roster::notify::{Notice, Notifier};
use task_roster::service::RosterService;
use task_roster::storage::ObjectStore;
use task_roster::types::{FileKind, FileUpload, Role, TaskFields, UpdateRequest};

/// Object store that records calls and can be told to fail.
#[derive(Default)]
struct RecordingStore {
    deleted: Mutex<Vec<String>>,
    cleared: Mutex<usize>,
    fail: bool,
}

impl ObjectStore for RecordingStore {
    fn delete(&self, name: &str) -> Result<()> {
        if self.fail {
            bail!("bucket unavailable");
        }
        self.deleted.lock().unwrap().push(name.to_string());
        Ok(())
    }

    fn delete_all(&self) -> Result<()> {
        if self.fail {
            bail!("bucket unavailable");
        }
        *self.cleared.lock().unwrap() += 1;
        Ok(())
    }
}

/// Notifier that records notices and can be told to fail.
#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<Notice>>,
    fail: bool,
}

impl Notifier for RecordingNotifier {
    fn send(&self, notice: &Notice) -> Result<()> {
        if self.fail {
            bail!("mail relay down");
        }
        self.sent.lock().unwrap().push(notice.clone());
        Ok(())
    }
}

/// Notifier that deletes every task as a notice goes out, like a concurrent
/// writer racing the attach.
struct DeletingNotifier {
    db: Database,
    sent: Mutex<Vec<String>>,
}

impl Notifier for DeletingNotifier {
    fn send(&self, notice: &Notice) -> Result<()> {
        for detail in self.db.list_tasks()? {
            self.db.delete_task(detail.task.id)?;
        }
        self.sent.lock().unwrap().push(notice.body.clone());
        Ok(())
    }
}

fn notify_config() -> NotifyConfig {
    NotifyConfig {
        enabled: true,
        recipient: "lead@x.com".to_string(),
    }
}

fn setup_service(
    store: Arc<RecordingStore>,
    notifier: Arc<RecordingNotifier>,
    notify: NotifyConfig,
) -> RosterService {
    let db = Database::open_in_memory().expect("Failed to create in-memory database");
    for email in ["o1@x.com", "alice@x.com", "bob@x.com"] {
        db.create_user(email, "").expect("Failed to create user");
    }
    RosterService::new(db, store, notifier, notify)
}

fn launch(service: &RosterService) -> i64 {
    let fields = TaskFields {
        name: "Launch".to_string(),
        ..Default::default()
    };
    service.create_task("o1@x.com", &fields).unwrap().0.id
}

mod notification_tests {
    use super::*;

    #[test]
    fn planning_file_update_sends_notice() {
        let notifier = Arc::new(RecordingNotifier::default());
        let service = setup_service(Arc::default(), notifier.clone(), notify_config());
        let task_id = launch(&service);
        let request = UpdateRequest {
            planning_file: Some(FileUpload::new("plan.pdf", "u/plan")),
            ..Default::default()
        };

        service.update_task(task_id, &request).unwrap();

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "lead@x.com");
        assert_eq!(sent[0].subject, "planning file");
        assert_eq!(sent[0].body, "planning file uploaded in task: Launch");
    }

    #[test]
    fn notice_uses_name_after_update() {
        let notifier = Arc::new(RecordingNotifier::default());
        let service = setup_service(Arc::default(), notifier.clone(), notify_config());
        let task_id = launch(&service);
        let request = UpdateRequest {
            task: TaskFields {
                name: "Launch v2".to_string(),
                ..Default::default()
            },
            planning_file: Some(FileUpload::new("plan.pdf", "u/plan")),
            ..Default::default()
        };

        service.update_task(task_id, &request).unwrap();

        assert_eq!(
            notifier.sent.lock().unwrap()[0].body,
            "planning file uploaded in task: Launch v2"
        );
    }

    #[test]
    fn project_file_and_members_send_nothing() {
        let notifier = Arc::new(RecordingNotifier::default());
        let service = setup_service(Arc::default(), notifier.clone(), notify_config());
        let task_id = launch(&service);
        let request = UpdateRequest {
            manager_email: Some("alice@x.com".to_string()),
            project_file: Some(FileUpload::new("build.zip", "u/build")),
            ..Default::default()
        };

        service.update_task(task_id, &request).unwrap();

        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn single_planning_attach_sends_notice() {
        let notifier = Arc::new(RecordingNotifier::default());
        let service = setup_service(Arc::default(), notifier.clone(), notify_config());
        let task_id = launch(&service);

        service
            .attach_file(task_id, FileKind::Planning, &FileUpload::new("plan.pdf", "u/plan"))
            .unwrap();

        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn attach_succeeds_when_task_disappears_after_commit() {
        let db = Database::open_in_memory().expect("Failed to create in-memory database");
        db.create_user("o1@x.com", "").unwrap();
        let notifier = Arc::new(DeletingNotifier {
            db: db.clone(),
            sent: Mutex::default(),
        });
        let service = RosterService::new(
            db,
            Arc::new(RecordingStore::default()),
            notifier.clone(),
            notify_config(),
        );
        let task_id = launch(&service);

        let file = service
            .attach_file(task_id, FileKind::Planning, &FileUpload::new("plan.pdf", "u/plan"))
            .unwrap();

        assert_eq!(file.file_name, "plan.pdf");
        assert_eq!(
            *notifier.sent.lock().unwrap(),
            vec!["planning file uploaded in task: Launch".to_string()]
        );
        assert_eq!(service.get_task(task_id).unwrap_err().code, ErrorCode::TaskNotFound);
    }

    #[test]
    fn failing_notifier_does_not_fail_update() {
        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..Default::default()
        });
        let service = setup_service(Arc::default(), notifier, notify_config());
        let task_id = launch(&service);
        let request = UpdateRequest {
            planning_file: Some(FileUpload::new("plan.pdf", "u/plan")),
            ..Default::default()
        };

        let outcome = service.update_task(task_id, &request).unwrap();

        assert!(outcome.planning_file.is_some());
        assert_eq!(service.get_task(task_id).unwrap().planning_files.len(), 1);
    }

    #[test]
    fn disabled_notices_are_not_sent() {
        let notifier = Arc::new(RecordingNotifier::default());
        let notify = NotifyConfig {
            enabled: false,
            ..notify_config()
        };
        let service = setup_service(Arc::default(), notifier.clone(), notify);
        let task_id = launch(&service);

        service
            .attach_file(task_id, FileKind::Planning, &FileUpload::new("plan.pdf", "u/plan"))
            .unwrap();

        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn failed_update_sends_nothing() {
        let notifier = Arc::new(RecordingNotifier::default());
        let service = setup_service(Arc::default(), notifier.clone(), notify_config());
        let task_id = launch(&service);
        service.assign(task_id, Role::Manager, "alice@x.com").unwrap();
        let request = UpdateRequest {
            employee_email: Some("alice@x.com".to_string()),
            planning_file: Some(FileUpload::new("plan.pdf", "u/plan")),
            ..Default::default()
        };

        let err = service.update_task(task_id, &request).unwrap_err();

        assert_eq!(err.code, ErrorCode::AlreadyManager);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }
}

mod storage_tests {
    use super::*;

    #[test]
    fn delete_task_clears_object_store() {
        let store = Arc::new(RecordingStore::default());
        let service = setup_service(store.clone(), Arc::default(), notify_config());
        let task_id = launch(&service);

        let report = service.delete_task(task_id).unwrap();

        assert_eq!(report.removed(Table::Tasks), 1);
        assert_eq!(*store.cleared.lock().unwrap(), 1);
    }

    #[test]
    fn failing_store_after_delete_is_dependency_failure() {
        let store = Arc::new(RecordingStore {
            fail: true,
            ..Default::default()
        });
        let service = setup_service(store, Arc::default(), notify_config());
        let task_id = launch(&service);

        let err = service.delete_task(task_id).unwrap_err();

        assert_eq!(err.code, ErrorCode::StorageFailure);
        assert_eq!(err.kind(), ErrorKind::DependencyFailure);
        assert!(err.details.is_some());
        assert_eq!(
            service.get_task(task_id).unwrap_err().code,
            ErrorCode::TaskNotFound
        );
    }

    #[test]
    fn store_is_not_called_when_task_is_missing() {
        let store = Arc::new(RecordingStore::default());
        let service = setup_service(store.clone(), Arc::default(), notify_config());

        let err = service.delete_task(42).unwrap_err();

        assert_eq!(err.code, ErrorCode::TaskNotFound);
        assert_eq!(*store.cleared.lock().unwrap(), 0);
    }

    #[test]
    fn delete_file_removes_stored_object() {
        let store = Arc::new(RecordingStore::default());
        let service = setup_service(store.clone(), Arc::default(), notify_config());
        let task_id = launch(&service);
        let file = service
            .attach_file(task_id, FileKind::Project, &FileUpload::new("build.zip", "u/build"))
            .unwrap();

        let name = service.delete_project_file(file.id).unwrap();

        assert_eq!(name, "build.zip");
        assert_eq!(*store.deleted.lock().unwrap(), vec!["build.zip".to_string()]);
    }

    #[test]
    fn member_removal_does_not_touch_store() {
        let store = Arc::new(RecordingStore::default());
        let service = setup_service(store.clone(), Arc::default(), notify_config());
        let task_id = launch(&service);
        let manager = service.assign(task_id, Role::Manager, "alice@x.com").unwrap();

        service.delete_manager(task_id, manager.id).unwrap();

        assert!(store.deleted.lock().unwrap().is_empty());
        assert_eq!(*store.cleared.lock().unwrap(), 0);
    }
}

mod config_tests {
    use super::*;

    #[test]
    fn from_config_opens_database_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.db_path = dir.path().join("nested").join("roster.db");
        config.storage.media_dir = dir.path().join("media");

        let service = RosterService::from_config(&config).unwrap();
        service.create_user("o1@x.com", "Olive").unwrap();
        let task_id = launch(&service);
        service.delete_task(task_id).unwrap();

        assert!(config.storage.db_path.exists());
        assert_eq!(service.database().count_rows(Table::Tasks).unwrap(), 0);
    }
}
