use roster_core::{
    CsvRecordStore, Record, RecordFields, RecordPatch, RecordService, RecordStore, ServiceError,
    StoreError, StoreResult, ValidationError,
};
use std::cell::{Cell, RefCell};
use std::fs;
use std::io;

/// In-memory store that counts writes and can be told to fail them.
#[derive(Default)]
struct MemoryStore {
    rows: RefCell<Vec<Record>>,
    saves: Cell<usize>,
    fail_saves: Cell<bool>,
}

impl RecordStore for &MemoryStore {
    fn load(&self) -> StoreResult<Vec<Record>> {
        Ok(self.rows.borrow().clone())
    }

    fn save(&self, records: &[Record]) -> StoreResult<()> {
        if self.fail_saves.get() {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "read-only store",
            )));
        }
        self.saves.set(self.saves.get() + 1);
        *self.rows.borrow_mut() = records.to_vec();
        Ok(())
    }
}

fn fields(id: &str) -> RecordFields {
    RecordFields {
        id: id.to_string(),
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        department: "HRM".to_string(),
        phone_number: "1234567890".to_string(),
        team_size: None,
    }
}

fn seeded(ids: &[&str]) -> MemoryStore {
    let store = MemoryStore::default();
    *store.rows.borrow_mut() = ids
        .iter()
        .map(|id| Record::new(fields(id)).unwrap())
        .collect();
    store
}

#[test]
fn create_into_empty_roster_writes_expected_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("employee_data.csv");
    let mut service = RecordService::open(CsvRecordStore::new(&path)).unwrap();

    let created = service.create(fields("E100")).unwrap();
    assert_eq!(created.id(), "E100");
    assert_eq!(service.len(), 1);

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(
        lines,
        vec![
            "id,fname,lname,department,phNumber,role,team_size",
            "E100,Jane,Doe,HRM,1234567890,Employee,0",
        ]
    );
}

#[test]
fn create_with_existing_id_fails_and_leaves_roster_unchanged() {
    let store = seeded(&["E100"]);
    let mut service = RecordService::open(&store).unwrap();

    let err = service.create(fields("E100")).unwrap_err();
    assert!(matches!(err, ServiceError::DuplicateId(ref id) if id == "E100"));
    assert_eq!(service.len(), 1);
    assert_eq!(store.saves.get(), 0);
}

#[test]
fn create_propagates_validation_errors_without_writing() {
    let store = MemoryStore::default();
    let mut service = RecordService::open(&store).unwrap();

    let mut bad = fields("E1");
    bad.phone_number = "555-1234".to_string();
    let err = service.create(bad).unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::InvalidPhoneNumber { digits: 7 })
    ));
    assert!(service.is_empty());
    assert_eq!(store.saves.get(), 0);
}

#[test]
fn create_manager_persists_team_size() {
    let store = MemoryStore::default();
    let mut service = RecordService::open(&store).unwrap();

    let mut manager = fields("M1");
    manager.team_size = Some(5);
    service.create(manager).unwrap();

    assert_eq!(store.rows.borrow()[0].team_size(), Some(5));
}

#[test]
fn delete_out_of_range_fails_without_rewrite() {
    let store = seeded(&["E1", "E2"]);
    let mut service = RecordService::open(&store).unwrap();

    let err = service.delete(99).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::IndexOutOfRange { index: 99, len: 2 }
    ));
    assert_eq!(service.len(), 2);
    assert_eq!(store.saves.get(), 0);
}

#[test]
fn delete_removes_record_and_persists() {
    let store = seeded(&["E1", "E2", "E3"]);
    let mut service = RecordService::open(&store).unwrap();

    let removed = service.delete(1).unwrap();
    assert_eq!(removed.id(), "E2");

    let ids: Vec<&str> = service.list().iter().map(Record::id).collect();
    assert_eq!(ids, vec!["E1", "E3"]);
    assert_eq!(store.saves.get(), 1);
    assert_eq!(store.rows.borrow().len(), 2);
}

#[test]
fn edit_updates_only_supplied_fields() {
    let store = seeded(&["E1"]);
    let mut service = RecordService::open(&store).unwrap();

    let patch = RecordPatch {
        last_name: Some("Smith".to_string()),
        phone_number: Some("(987) 654-3210".to_string()),
        ..RecordPatch::default()
    };
    let updated = service.edit(0, &patch).unwrap();

    assert_eq!(updated.first_name(), "Jane");
    assert_eq!(updated.last_name(), "Smith");
    assert_eq!(updated.department(), "HRM");
    assert_eq!(updated.phone_number_raw(), "9876543210");
    assert_eq!(store.rows.borrow()[0].last_name(), "Smith");
}

#[test]
fn edit_with_invalid_field_changes_nothing() {
    let store = seeded(&["E1"]);
    let mut service = RecordService::open(&store).unwrap();

    let patch = RecordPatch {
        first_name: Some("Janet".to_string()),
        department: Some("hr".to_string()),
        ..RecordPatch::default()
    };
    let err = service.edit(0, &patch).unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::InvalidDepartment(_))
    ));
    assert_eq!(service.list()[0].first_name(), "Jane");
    assert_eq!(store.saves.get(), 0);
}

#[test]
fn edit_out_of_range_fails() {
    let store = seeded(&["E1"]);
    let mut service = RecordService::open(&store).unwrap();

    let err = service.edit(1, &RecordPatch::default()).unwrap_err();
    assert!(matches!(err, ServiceError::IndexOutOfRange { index: 1, len: 1 }));
    assert_eq!(
        err.to_string(),
        "employee index 1 out of range for roster of 1"
    );
}

#[test]
fn failed_save_rolls_back_in_memory_roster() {
    let store = seeded(&["E1", "E2"]);
    let mut service = RecordService::open(&store).unwrap();
    store.fail_saves.set(true);

    assert!(matches!(
        service.create(fields("E3")).unwrap_err(),
        ServiceError::Store(_)
    ));
    assert_eq!(service.len(), 2);

    let patch = RecordPatch {
        first_name: Some("Janet".to_string()),
        ..RecordPatch::default()
    };
    assert!(service.edit(0, &patch).is_err());
    assert_eq!(service.list()[0].first_name(), "Jane");

    assert!(service.delete(0).is_err());
    let ids: Vec<&str> = service.list().iter().map(Record::id).collect();
    assert_eq!(ids, vec!["E1", "E2"]);
}

#[test]
fn open_loads_existing_store_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roster.csv");
    fs::write(
        &path,
        "id,fname,lname,department,phNumber,role,team_size\n\
         E1,Ann,Lee,OPS,5551234567,Employee,0\n",
    )
    .unwrap();

    let service = RecordService::open(CsvRecordStore::new(&path)).unwrap();
    assert_eq!(service.len(), 1);
    assert_eq!(service.get(0).unwrap().first_name(), "Ann");
    assert_eq!(service.store().path(), path.as_path());
}
