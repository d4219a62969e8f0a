//! Contact book behavior against the SQLite and in-memory stores.

use rolodex::{ContactId, ContactRecord, PartitionKey, Rolodex, RolodexError};
use rolodex_store::Store;
use rolodex_testkit::{generators, TestFixture};

use proptest::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

async fn sqlite_with(users: &[&str]) -> TestFixture<rolodex_store::SqliteStore> {
    init_tracing();
    let fixture = TestFixture::sqlite();
    for user in users {
        fixture.register(user).await;
    }
    fixture
}

async fn phones<S: Store>(rolodex: &Rolodex<S>, owner: &str) -> Vec<String> {
    let mut phones: Vec<String> = rolodex
        .list_contacts(owner)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.phone)
        .collect();
    phones.sort();
    phones
}

#[tokio::test]
async fn add_then_list() {
    let fixture = sqlite_with(&["alice"]).await;
    let rolodex = &fixture.rolodex;

    let id = rolodex
        .add_contact("alice", "Bob Jones", "+91 98765-43210", Some("bob@example.com"))
        .await
        .unwrap();

    let contacts = rolodex.list_contacts("alice").await.unwrap();
    assert_eq!(contacts.len(), 1);
    let bob = &contacts[0];
    assert_eq!(bob.id, id);
    assert_eq!(bob.name, "Bob Jones");
    assert_eq!(bob.phone, "9876543210");
    assert_eq!(bob.email.as_deref(), Some("bob@example.com"));
    assert!(bob.date_added > 0);

    assert_eq!(
        rolodex.store().get_contact(&PartitionKey::from_username("alice"), id).await.unwrap(),
        Some(bob.clone())
    );
}

#[tokio::test]
async fn blank_email_is_stored_as_absent() {
    let fixture = sqlite_with(&["alice"]).await;
    fixture
        .rolodex
        .add_contact("alice", "Bob Jones", "9876543210", Some("   "))
        .await
        .unwrap();
    let contacts = fixture.rolodex.list_contacts("alice").await.unwrap();
    assert_eq!(contacts[0].email, None);
}

#[tokio::test]
async fn list_is_newest_first() {
    let fixture = sqlite_with(&["alice"]).await;
    let first = fixture
        .rolodex
        .add_contact("alice", "Old Timer", "9000000001", None)
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = fixture
        .rolodex
        .add_contact("alice", "New Comer", "9000000002", None)
        .await
        .unwrap();

    let ids: Vec<ContactId> = fixture
        .rolodex
        .list_contacts("alice")
        .await
        .unwrap()
        .iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(ids, vec![second, first]);
}

#[tokio::test]
async fn phone_is_unique_per_owner_only() {
    let fixture = sqlite_with(&["alice", "bob"]).await;
    let rolodex = &fixture.rolodex;

    rolodex
        .add_contact("alice", "Carol King", "9876543210", None)
        .await
        .unwrap();

    // Same number typed differently is still a duplicate.
    for typed in [
        "9876543210",
        "+91 98765 43210",
        "9198765 43210",
        "(987) 654-3210",
    ] {
        let err = rolodex
            .add_contact("alice", "Someone Else", typed, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RolodexError::DuplicatePhone), "{typed}: {err:?}");
    }

    // Another owner may hold the same number.
    rolodex
        .add_contact("bob", "Carol King", "9876543210", None)
        .await
        .unwrap();

    assert_eq!(rolodex.list_contacts("alice").await.unwrap().len(), 1);
    assert_eq!(rolodex.list_contacts("bob").await.unwrap().len(), 1);
}

#[tokio::test]
async fn email_is_unique_per_owner_ignoring_case() {
    let fixture = sqlite_with(&["alice", "bob"]).await;
    let rolodex = &fixture.rolodex;

    rolodex
        .add_contact("alice", "Carol King", "9876543210", Some("carol@example.com"))
        .await
        .unwrap();

    let err = rolodex
        .add_contact("alice", "Carol Two", "8876543210", Some("CAROL@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, RolodexError::DuplicateEmail));
    assert_eq!(err.to_string(), "Email address already exists in your contacts");

    // Phone is checked first.
    let err = rolodex
        .add_contact("alice", "Carol Two", "9876543210", Some("carol@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, RolodexError::DuplicatePhone));

    rolodex
        .add_contact("bob", "Carol King", "8876543210", Some("carol@example.com"))
        .await
        .unwrap();
}

#[tokio::test]
async fn contacts_without_email_do_not_conflict() {
    let fixture = sqlite_with(&["alice"]).await;
    for phone in ["9000000001", "9000000002", "9000000003"] {
        fixture
            .rolodex
            .add_contact("alice", "No Mail", phone, None)
            .await
            .unwrap();
    }
    assert_eq!(fixture.rolodex.list_contacts("alice").await.unwrap().len(), 3);
}

#[tokio::test]
async fn invalid_contact_is_rejected_before_storage() {
    let fixture = sqlite_with(&["alice"]).await;
    let rolodex = &fixture.rolodex;

    let cases = [
        ("B", "9876543210", None),
        ("Bob  Jones", "9876543210", None),
        ("-Bob", "9876543210", None),
        ("B0b", "9876543210", None),
        ("Bob Jones", "", None),
        ("Bob Jones", "12345", None),
        ("Bob Jones", "5876543210", None),
        ("Bob Jones", "9876543210", Some("not-an-email")),
    ];
    for (name, phone, email) in cases {
        let err = rolodex
            .add_contact("alice", name, phone, email)
            .await
            .unwrap_err();
        assert!(
            matches!(err, RolodexError::Validation(_)),
            "{name:?} {phone:?} {email:?}: {err:?}"
        );
    }
    assert!(rolodex.list_contacts("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn update_keeps_own_values_and_checks_others() {
    let fixture = sqlite_with(&["alice", "bob"]).await;
    let rolodex = &fixture.rolodex;

    let carol = rolodex
        .add_contact("alice", "Carol King", "9876543210", Some("carol@example.com"))
        .await
        .unwrap();
    rolodex
        .add_contact("alice", "Dan Brown", "8876543210", Some("dan@example.com"))
        .await
        .unwrap();

    // Re-saving a contact with its own phone and email is fine.
    rolodex
        .update_contact("alice", carol, "Carol Queen", "+91 98765 43210", Some("Carol@Example.com"))
        .await
        .unwrap();
    let updated = rolodex
        .list_contacts("alice")
        .await
        .unwrap()
        .into_iter()
        .find(|c| c.id == carol)
        .unwrap();
    assert_eq!(updated.name, "Carol Queen");
    assert_eq!(updated.phone, "9876543210");

    let err = rolodex
        .update_contact("alice", carol, "Carol Queen", "8876543210", None)
        .await
        .unwrap_err();
    assert!(matches!(err, RolodexError::DuplicatePhone));

    let err = rolodex
        .update_contact("alice", carol, "Carol Queen", "9876543210", Some("dan@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, RolodexError::DuplicateEmail));

    // Bob cannot reach Alice's contact.
    let err = rolodex
        .update_contact("bob", carol, "Mallory", "7000000000", None)
        .await
        .unwrap_err();
    assert!(matches!(err, RolodexError::NotFound));

    let err = rolodex
        .update_contact("alice", ContactId(9999), "Nobody Here", "7000000000", None)
        .await
        .unwrap_err();
    assert!(matches!(err, RolodexError::NotFound));
}

#[tokio::test]
async fn delete_removes_from_list_and_search() {
    let fixture = sqlite_with(&["alice", "bob"]).await;
    let ids = fixture.add_samples("alice").await;
    let rolodex = &fixture.rolodex;

    let err = rolodex.delete_contact("bob", ids[0]).await.unwrap_err();
    assert!(matches!(err, RolodexError::NotFound));

    rolodex.delete_contact("alice", ids[0]).await.unwrap();
    assert_eq!(rolodex.list_contacts("alice").await.unwrap().len(), 2);
    assert!(rolodex.search_contacts("alice", "smith").await.unwrap().is_empty());

    let err = rolodex.delete_contact("alice", ids[0]).await.unwrap_err();
    assert!(matches!(err, RolodexError::NotFound));
    assert_eq!(err.to_string(), "Contact not found");
}

#[tokio::test]
async fn search_is_case_insensitive_substring() {
    let fixture = sqlite_with(&["alice", "bob"]).await;
    fixture.add_samples("alice").await;
    fixture
        .rolodex
        .add_contact("bob", "Alice Smith", "9000000009", None)
        .await
        .unwrap();
    let rolodex = &fixture.rolodex;

    for term in ["alice", "SMITH", "ice sm", "98765", "example.com"] {
        let found = rolodex.search_contacts("alice", term).await.unwrap();
        assert_eq!(found.len(), 1, "{term}");
        assert_eq!(found[0].name, "Alice Smith");
    }

    let found = rolodex.search_contacts("alice", "d'souza").await.unwrap();
    assert_eq!(found.len(), 1);

    assert_eq!(rolodex.search_contacts("alice", "").await.unwrap().len(), 3);
    assert!(rolodex.search_contacts("alice", "zzz").await.unwrap().is_empty());
    // Wildcards are matched literally.
    assert!(rolodex.search_contacts("alice", "%").await.unwrap().is_empty());
    assert!(rolodex.search_contacts("alice", "_").await.unwrap().is_empty());
}

#[tokio::test]
async fn both_stores_search_alike() {
    let sqlite = sqlite_with(&["alice"]).await;
    let memory = TestFixture::with_user("alice").await;
    sqlite.add_samples("alice").await;
    memory.add_samples("alice").await;
    for (name, phone) in [("Kate King", "9000000011"), ("Dan Brown", "9000000012")] {
        sqlite.rolodex.add_contact("alice", name, phone, None).await.unwrap();
        memory.rolodex.add_contact("alice", name, phone, None).await.unwrap();
    }

    for term in ["kate", "KING", "\u{212A}ing", "\u{212A}", "SM", "é", "ß", "_", "%", "", "9000"] {
        let names = |contacts: Vec<rolodex::Contact>| {
            let mut names: Vec<String> = contacts.into_iter().map(|c| c.name).collect();
            names.sort();
            names
        };
        let from_sqlite = names(sqlite.rolodex.search_contacts("alice", term).await.unwrap());
        let from_memory = names(memory.rolodex.search_contacts("alice", term).await.unwrap());
        assert_eq!(from_sqlite, from_memory, "term {term:?}");
    }
}

#[tokio::test]
async fn unknown_owner_is_reported() {
    let fixture = sqlite_with(&[]).await;
    let err = fixture.rolodex.list_contacts("ghost").await.unwrap_err();
    assert!(matches!(err, RolodexError::UnknownOwner(ref o) if o == "ghost"));

    let err = fixture
        .rolodex
        .add_contact("ghost", "Bob Jones", "9876543210", None)
        .await
        .unwrap_err();
    assert!(matches!(err, RolodexError::UnknownOwner(_)));
}

#[tokio::test]
async fn contacts_survive_reopen() {
    let fixture = sqlite_with(&["alice"]).await;
    fixture.add_samples("alice").await;
    let before = phones(&fixture.rolodex, "alice").await;

    let fixture = fixture.reopen();
    assert_eq!(phones(&fixture.rolodex, "alice").await, before);
}

#[tokio::test]
async fn cached_list_sees_every_write() {
    init_tracing();
    let fixture = TestFixture::with_user("alice").await;
    let rolodex = &fixture.rolodex;
    assert!(rolodex.config().cache_contacts);

    let ids = fixture.add_samples("alice").await;
    assert_eq!(rolodex.list_contacts("alice").await.unwrap().len(), 3);

    rolodex
        .update_contact("alice", ids[1], "Robert Jones", "8765432109", None)
        .await
        .unwrap();
    let names: Vec<String> = rolodex
        .list_contacts("alice")
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert!(names.contains(&"Robert Jones".to_string()));

    rolodex.delete_contact("alice", ids[2]).await.unwrap();
    assert_eq!(rolodex.list_contacts("alice").await.unwrap().len(), 2);
}

#[tokio::test]
async fn transient_faults_are_retried() {
    init_tracing();
    let fixture = TestFixture::with_user("alice").await;
    let retries = fixture.rolodex.config().transient_retries;

    fixture.store().fail_next_writes(retries).unwrap();
    fixture
        .rolodex
        .add_contact("alice", "Bob Jones", "9876543210", None)
        .await
        .unwrap();

    fixture.store().fail_next_writes(retries + 1).unwrap();
    let err = fixture
        .rolodex
        .add_contact("alice", "Cat Smith", "8876543210", None)
        .await
        .unwrap_err();
    assert!(matches!(err, RolodexError::StorageFault(_)));
    assert_eq!(err.user_message(), rolodex::GENERIC_FAILURE);
    assert_eq!(fixture.rolodex.list_contacts("alice").await.unwrap().len(), 1);
}

#[tokio::test]
async fn export_import_round_trip() {
    let fixture = sqlite_with(&["alice", "bob"]).await;
    fixture.add_samples("alice").await;
    let rolodex = &fixture.rolodex;

    let json = rolodex.export_json("alice").await.unwrap();
    let report = rolodex.import_json("bob", &json).await.unwrap();
    assert!(report.is_clean());
    assert_eq!(report.imported.len(), 3);

    let mut exported = rolodex.export_contacts("alice").await.unwrap();
    let mut imported = rolodex.export_contacts("bob").await.unwrap();
    exported.sort_by(|a, b| a.phone.cmp(&b.phone));
    imported.sort_by(|a, b| a.phone.cmp(&b.phone));
    assert_eq!(exported, imported);

    // A second import only finds duplicates.
    let report = rolodex.import_json("bob", &json).await.unwrap();
    assert!(report.imported.is_empty());
    assert_eq!(report.rejected.len(), 3);
    assert!(report
        .rejected
        .iter()
        .all(|r| matches!(r.reason, RolodexError::DuplicatePhone)));
}

#[tokio::test]
async fn import_reports_bad_records_and_keeps_going() {
    let fixture = sqlite_with(&["alice"]).await;
    let records = vec![
        ContactRecord {
            name: "Good One".into(),
            phone: "9000000001".into(),
            email: None,
            date_added: 10,
        },
        ContactRecord {
            name: "B".into(),
            phone: "9000000002".into(),
            email: None,
            date_added: 20,
        },
        ContactRecord {
            name: "Same Phone".into(),
            phone: "+91 90000 00001".into(),
            email: None,
            date_added: 30,
        },
        ContactRecord {
            name: "Good Two".into(),
            phone: "9000000003".into(),
            email: Some("two@example.com".into()),
            date_added: 40,
        },
    ];

    let report = fixture.rolodex.import_contacts("alice", &records).await.unwrap();
    assert_eq!(report.imported.len(), 2);

    let rejected: Vec<usize> = report.rejected.iter().map(|r| r.index).collect();
    assert_eq!(rejected, vec![1, 2]);
    assert!(matches!(report.rejected[0].reason, RolodexError::Validation(_)));
    assert!(matches!(report.rejected[1].reason, RolodexError::DuplicatePhone));

    let contacts = fixture.rolodex.list_contacts("alice").await.unwrap();
    assert_eq!(contacts[0].name, "Good Two");
    assert_eq!(contacts[0].date_added, 40);
}

#[tokio::test]
async fn malformed_import_is_a_format_error() {
    let fixture = sqlite_with(&["alice"]).await;
    let err = fixture
        .rolodex
        .import_json("alice", "[{\"name\": 1}]")
        .await
        .unwrap_err();
    assert!(matches!(err, RolodexError::Format(_)));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn typed_phone_variants_collide(
        (canonical, typed) in generators::phone()
            .prop_flat_map(|p| (Just(p.clone()), generators::phone_variant(p))),
        name in generators::name(),
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let fixture = TestFixture::with_user("alice").await;
            fixture
                .rolodex
                .add_contact("alice", &name, &canonical, None)
                .await
                .unwrap();
            let err = fixture
                .rolodex
                .add_contact("alice", &name, &typed, None)
                .await
                .unwrap_err();
            assert!(matches!(err, RolodexError::DuplicatePhone));
        });
    }

    #[test]
    fn imported_records_list_back(records in prop::collection::vec(generators::contact_record(), 1..8)) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let fixture = TestFixture::with_user("alice").await;
            let report = fixture.rolodex.import_contacts("alice", &records).await.unwrap();

            let listed = fixture.rolodex.export_contacts("alice").await.unwrap();
            assert_eq!(listed.len(), report.imported.len());
            for record in &listed {
                assert!(records.contains(record));
            }
        });
    }
}
